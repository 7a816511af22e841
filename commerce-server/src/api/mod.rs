//! API route modules
//!
//! Each submodule owns its router; [`crate::routes`] merges them.

pub mod carts;
pub mod health;
pub mod products;
