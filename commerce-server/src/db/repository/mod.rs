//! Repository Module
//!
//! The repository layer is the only sanctioned access path to storage.
//! Every method takes an explicit connection so the engine controls the
//! transaction boundary.

pub mod cart;
pub mod cart_item;
pub mod product;

pub use cart::CartRepository;
pub use cart_item::CartItemRepository;
pub use product::ProductRepository;

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use thiserror::Error;

/// Repository error types
#[derive(Debug, Error)]
pub enum RepoError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Transient SQLITE_BUSY / locked condition; eligible for retry
    #[error("Store busy: {0}")]
    Busy(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for RepoError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => RepoError::NotFound("row not found".to_string()),
            sqlx::Error::Database(db) => {
                if db.is_unique_violation() {
                    RepoError::Duplicate(db.message().to_string())
                } else if is_busy_code(db.code().as_deref()) {
                    RepoError::Busy(db.message().to_string())
                } else {
                    RepoError::Database(db.message().to_string())
                }
            }
            _ => RepoError::Database(err.to_string()),
        }
    }
}

/// SQLITE_BUSY / SQLITE_LOCKED primary and extended result codes
fn is_busy_code(code: Option<&str>) -> bool {
    matches!(code, Some("5" | "6" | "261" | "262" | "517"))
}

/// Result type for repository operations
pub type RepoResult<T> = Result<T, RepoError>;

// ── Row conversion helpers ──────────────────────────────────────────

/// Unix seconds → UTC timestamp (epoch on out-of-range input)
pub(crate) fn from_unix(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

/// Parse a stored canonical decimal string
pub(crate) fn parse_decimal(raw: &str, column: &str) -> RepoResult<Decimal> {
    Decimal::from_str(raw)
        .map_err(|e| RepoError::Database(format!("Corrupt decimal in {column}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn busy_codes_are_classified() {
        assert!(is_busy_code(Some("5")));
        assert!(is_busy_code(Some("517")));
        assert!(!is_busy_code(Some("2067"))); // unique constraint
        assert!(!is_busy_code(None));
    }

    #[test]
    fn decimal_parse_round_trips() {
        assert_eq!(
            parse_decimal("36.50", "price").unwrap().to_string(),
            "36.50"
        );
        assert!(parse_decimal("not-a-number", "price").is_err());
    }
}
