//! Authentication module
//!
//! JWT validation and the per-request user context:
//! - [`JwtService`] - token service
//! - [`CurrentUser`] - authenticated user, extracted from the bearer token

pub mod extractor;
pub mod jwt;

pub use jwt::{Claims, CurrentUser, JwtConfig, JwtError, JwtService};
