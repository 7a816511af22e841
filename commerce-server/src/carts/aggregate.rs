//! Cart Aggregation
//!
//! Pure derivations over a cart's resolved line items. Totals use exact
//! decimal arithmetic and are recomputed from current data on every
//! read; nothing here is cached.

use rust_decimal::Decimal;

use crate::db::models::{Cart, CartDetail, CartItemDetail};

/// Σ quantity × price over all line items, rescaled to 2 fraction digits
pub fn total_price(items: &[CartItemDetail]) -> Decimal {
    let mut total: Decimal = items
        .iter()
        .map(|item| item.product_price * Decimal::from(item.quantity))
        .sum();
    total.rescale(2);
    total
}

/// Number of line items (not the quantity sum)
pub fn items_count(items: &[CartItemDetail]) -> usize {
    items.len()
}

/// Assemble the API-facing cart view from stored rows
pub fn cart_detail(cart: Cart, items: Vec<CartItemDetail>) -> CartDetail {
    let total_price = total_price(&items);
    let items_count = items_count(&items);
    CartDetail {
        id: cart.id,
        user_id: cart.user_id,
        status: cart.status,
        created: cart.created,
        items,
        total_price,
        items_count,
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn item(id: i64, price: &str, quantity: i64) -> CartItemDetail {
        CartItemDetail {
            id,
            cart_id: 1,
            product_id: id,
            product_name: format!("Product {id}"),
            product_price: Decimal::from_str(price).unwrap(),
            quantity,
        }
    }

    #[test]
    fn total_is_exact_decimal_sum() {
        // (10.00 × 2) + (5.50 × 3) = 36.50
        let items = vec![item(1, "10.00", 2), item(2, "5.50", 3)];
        assert_eq!(total_price(&items).to_string(), "36.50");
        assert_eq!(items_count(&items), 2);
    }

    #[test]
    fn empty_cart_totals_to_zero() {
        let items: Vec<CartItemDetail> = vec![];
        assert_eq!(total_price(&items).to_string(), "0.00");
        assert_eq!(items_count(&items), 0);
    }

    #[test]
    fn count_ignores_quantities() {
        let items = vec![item(1, "1.00", 99)];
        assert_eq!(items_count(&items), 1);
    }
}
