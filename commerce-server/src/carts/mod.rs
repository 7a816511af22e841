//! Cart domain
//!
//! - [`engine`] - business rules, transactions and retries
//! - [`aggregate`] - pure totals over line items

pub mod aggregate;
pub mod engine;

pub use engine::CartEngine;

#[cfg(test)]
mod tests;
