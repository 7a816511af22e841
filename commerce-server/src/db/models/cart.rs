//! Cart Model

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart_item::CartItemDetail;

pub type CartId = i64;

/// Cart lifecycle status
///
/// `Pending` is the only mutable state; `Paid` and `Cancelled` are
/// terminal. The only defined transitions are Pending → Paid and
/// Pending → Cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartStatus {
    Pending,
    Paid,
    Cancelled,
}

impl CartStatus {
    /// Canonical storage form
    pub fn as_str(&self) -> &'static str {
        match self {
            CartStatus::Pending => "PENDING",
            CartStatus::Paid => "PAID",
            CartStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, CartStatus::Pending)
    }
}

impl fmt::Display for CartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CartStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Ok(CartStatus::Pending),
            "PAID" => Ok(CartStatus::Paid),
            "CANCELLED" => Ok(CartStatus::Cancelled),
            other => Err(format!("Unknown cart status: {other}")),
        }
    }
}

/// Cart model (stored fields only)
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: CartId,
    pub user_id: String,
    pub status: CartStatus,
    pub created: DateTime<Utc>,
}

/// Cart with resolved line items and derived aggregates
///
/// `total_price` and `items_count` are computed from the current item
/// set on every read; they are never stored or cached.
#[derive(Debug, Clone, Serialize)]
pub struct CartDetail {
    pub id: CartId,
    pub user_id: String,
    pub status: CartStatus,
    pub created: DateTime<Utc>,
    pub items: Vec<CartItemDetail>,
    pub total_price: Decimal,
    pub items_count: usize,
}

/// Payload for the cart update endpoint.
///
/// Only the status transition is exposed; cart-level fields are not
/// generally updatable, which keeps the single-pending-cart invariant
/// out of reach of field-level writes.
#[derive(Debug, Clone, Deserialize)]
pub struct CartUpdate {
    pub status: CartStatus,
}
