//! Result alias shared by handlers and the cart engine

use crate::AppError;

/// Shorthand for fallible operations that surface as API errors
pub type AppResult<T> = Result<T, AppError>;
