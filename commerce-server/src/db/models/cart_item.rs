//! Cart Item Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::cart::CartId;
use super::product::ProductId;

pub type CartItemId = i64;

/// Line item: the quantity of one product within one cart
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub quantity: i64,
}

/// Line item with denormalized product name and price for API responses
#[derive(Debug, Clone, Serialize)]
pub struct CartItemDetail {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i64,
}

/// Payload for adding a product to a cart
///
/// Adding a product already present in the cart merges by addition
/// rather than creating a second row.
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemCreate {
    pub product: ProductId,
    /// Defaults to 1 when omitted
    pub quantity: Option<i64>,
}

/// Payload for replacing a line item's quantity
#[derive(Debug, Clone, Deserialize)]
pub struct CartItemUpdate {
    pub quantity: i64,
}
