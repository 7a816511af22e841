//! Cart Item Repository
//!
//! Line-item primitives keyed by the `one_product_per_cart` unique
//! index. The merge path is an additive `UPDATE`, so the increment
//! happens inside the store and concurrent merges cannot lose updates.

use sqlx::SqliteConnection;

use super::{RepoError, RepoResult, parse_decimal};
use crate::db::models::{
    Cart, CartId, CartItem, CartItemDetail, CartItemId, CartStatus, ProductId,
};

/// Raw cart_items row
#[derive(Debug, sqlx::FromRow)]
struct CartItemRow {
    id: i64,
    cart_id: i64,
    product_id: i64,
    quantity: i64,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        CartItem {
            id: row.id,
            cart_id: row.cart_id,
            product_id: row.product_id,
            quantity: row.quantity,
        }
    }
}

/// Line item joined with its product's name and price
#[derive(Debug, sqlx::FromRow)]
struct CartItemDetailRow {
    id: i64,
    cart_id: i64,
    product_id: i64,
    product_name: String,
    product_price: String,
    quantity: i64,
}

impl CartItemDetailRow {
    fn into_model(self) -> RepoResult<CartItemDetail> {
        Ok(CartItemDetail {
            id: self.id,
            cart_id: self.cart_id,
            product_id: self.product_id,
            product_name: self.product_name,
            product_price: parse_decimal(&self.product_price, "products.price")?,
            quantity: self.quantity,
        })
    }
}

const SELECT_DETAIL: &str = "SELECT ci.id, ci.cart_id, ci.product_id, \
     p.name AS product_name, p.price AS product_price, ci.quantity \
     FROM cart_items ci JOIN products p ON p.id = ci.product_id";

// =============================================================================
// Cart Item Repository
// =============================================================================

pub struct CartItemRepository;

impl CartItemRepository {
    /// Atomic upsert keyed by (cart, product).
    ///
    /// Attempts the insert first; when the row already exists (or a
    /// concurrent insert won the race) falls through to an additive
    /// quantity update. Returns the stored row and whether it was
    /// created by this call.
    pub async fn get_or_create(
        conn: &mut SqliteConnection,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i64,
    ) -> RepoResult<(CartItem, bool)> {
        let inserted: Option<CartItemRow> = sqlx::query_as(
            "INSERT INTO cart_items (cart_id, product_id, quantity) VALUES (?, ?, ?) \
             ON CONFLICT (cart_id, product_id) DO NOTHING \
             RETURNING id, cart_id, product_id, quantity",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(row) = inserted {
            return Ok((row.into(), true));
        }

        // Merge by addition: the increment is evaluated by the store
        let row: CartItemRow = sqlx::query_as(
            "UPDATE cart_items SET quantity = quantity + ? \
             WHERE cart_id = ? AND product_id = ? \
             RETURNING id, cart_id, product_id, quantity",
        )
        .bind(quantity)
        .bind(cart_id)
        .bind(product_id)
        .fetch_one(conn)
        .await?;
        Ok((row.into(), false))
    }

    /// Ownership-scoped item lookup; returns the item together with its
    /// parent cart so callers can check the cart status.
    pub async fn find_for_user(
        conn: &mut SqliteConnection,
        item_id: CartItemId,
        user_id: &str,
    ) -> RepoResult<Option<(CartItem, Cart)>> {
        #[derive(sqlx::FromRow)]
        struct Joined {
            id: i64,
            cart_id: i64,
            product_id: i64,
            quantity: i64,
            user_id: String,
            status: String,
            created: i64,
        }

        let row: Option<Joined> = sqlx::query_as(
            "SELECT ci.id, ci.cart_id, ci.product_id, ci.quantity, \
                    c.user_id, c.status, c.created \
             FROM cart_items ci JOIN carts c ON c.id = ci.cart_id \
             WHERE ci.id = ? AND c.user_id = ?",
        )
        .bind(item_id)
        .bind(user_id)
        .fetch_optional(conn)
        .await?;

        row.map(|r| {
            let status: CartStatus = r
                .status
                .parse()
                .map_err(|e: String| RepoError::Database(format!("Corrupt status: {e}")))?;
            Ok((
                CartItem {
                    id: r.id,
                    cart_id: r.cart_id,
                    product_id: r.product_id,
                    quantity: r.quantity,
                },
                Cart {
                    id: r.cart_id,
                    user_id: r.user_id,
                    status,
                    created: super::from_unix(r.created),
                },
            ))
        })
        .transpose()
    }

    /// Single item detail row
    pub async fn detail(
        conn: &mut SqliteConnection,
        item_id: CartItemId,
    ) -> RepoResult<CartItemDetail> {
        let row: CartItemDetailRow = sqlx::query_as(&format!("{SELECT_DETAIL} WHERE ci.id = ?"))
            .bind(item_id)
            .fetch_one(conn)
            .await?;
        row.into_model()
    }

    /// All detail rows of a cart in stable id order (total computation
    /// iterates this).
    pub async fn details_for_cart(
        conn: &mut SqliteConnection,
        cart_id: CartId,
    ) -> RepoResult<Vec<CartItemDetail>> {
        let rows: Vec<CartItemDetailRow> = sqlx::query_as(&format!(
            "{SELECT_DETAIL} WHERE ci.cart_id = ? ORDER BY ci.id"
        ))
        .bind(cart_id)
        .fetch_all(conn)
        .await?;
        rows.into_iter().map(CartItemDetailRow::into_model).collect()
    }

    /// One page of detail rows
    pub async fn details_page(
        conn: &mut SqliteConnection,
        cart_id: CartId,
        limit: u32,
        offset: i64,
    ) -> RepoResult<Vec<CartItemDetail>> {
        let rows: Vec<CartItemDetailRow> = sqlx::query_as(&format!(
            "{SELECT_DETAIL} WHERE ci.cart_id = ? ORDER BY ci.id LIMIT ? OFFSET ?"
        ))
        .bind(cart_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(conn)
        .await?;
        rows.into_iter().map(CartItemDetailRow::into_model).collect()
    }

    /// Number of line items in a cart (row count, not quantity sum)
    pub async fn count_for_cart(conn: &mut SqliteConnection, cart_id: CartId) -> RepoResult<i64> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE cart_id = ?")
                .bind(cart_id)
                .fetch_one(conn)
                .await?,
        )
    }

    /// Replace a line item's quantity
    pub async fn set_quantity(
        conn: &mut SqliteConnection,
        item_id: CartItemId,
        quantity: i64,
    ) -> RepoResult<CartItem> {
        let row: Option<CartItemRow> = sqlx::query_as(
            "UPDATE cart_items SET quantity = ? WHERE id = ? \
             RETURNING id, cart_id, product_id, quantity",
        )
        .bind(quantity)
        .bind(item_id)
        .fetch_optional(conn)
        .await?;
        row.map(CartItem::from)
            .ok_or_else(|| RepoError::NotFound(format!("Cart item {item_id} not found")))
    }

    /// Delete a line item
    pub async fn delete(conn: &mut SqliteConnection, item_id: CartItemId) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = ?")
            .bind(item_id)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("Cart item {item_id} not found")));
        }
        Ok(())
    }
}
