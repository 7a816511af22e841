//! Shared utilities
//!
//! - [`error`] - unified error and response types
//! - [`logger`] - tracing setup
//! - [`pagination`] - page-number pagination helpers
//! - [`validation`] - input validation helpers

pub mod error;
pub mod logger;
pub mod pagination;
pub mod result;
pub mod validation;

pub use error::{AppError, AppResponse, ok, ok_with_message};
pub use pagination::{CART_ITEM_PAGE_SIZE, PRODUCT_PAGE_SIZE, PageQuery, Paginated};
pub use result::AppResult;
