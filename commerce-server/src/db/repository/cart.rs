//! Cart Repository
//!
//! Persistence primitives for carts. The partial unique index
//! `one_pending_cart_per_user` is the authoritative guard for the
//! single-pending-cart invariant; `get_or_create_pending` turns a lost
//! insert race into a re-fetch of the winner's row.

use chrono::Utc;
use sqlx::SqliteConnection;

use super::{RepoError, RepoResult, from_unix};
use crate::db::models::{Cart, CartId, CartStatus};

/// Raw carts row
#[derive(Debug, sqlx::FromRow)]
struct CartRow {
    id: i64,
    user_id: String,
    status: String,
    created: i64,
}

impl CartRow {
    fn into_model(self) -> RepoResult<Cart> {
        let status: CartStatus = self
            .status
            .parse()
            .map_err(|e: String| RepoError::Database(format!("Corrupt status: {e}")))?;
        Ok(Cart {
            id: self.id,
            user_id: self.user_id,
            status,
            created: from_unix(self.created),
        })
    }
}

const SELECT_CART: &str = "SELECT id, user_id, status, created FROM carts";

// =============================================================================
// Cart Repository
// =============================================================================

pub struct CartRepository;

impl CartRepository {
    /// Find the user's pending cart, if any
    pub async fn find_pending(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> RepoResult<Option<Cart>> {
        let row: Option<CartRow> =
            sqlx::query_as(&format!("{SELECT_CART} WHERE user_id = ? AND status = ?"))
                .bind(user_id)
                .bind(CartStatus::Pending.as_str())
                .fetch_optional(conn)
                .await?;
        row.map(CartRow::into_model).transpose()
    }

    /// Insert a new pending cart.
    ///
    /// A second pending cart for the same user violates
    /// `one_pending_cart_per_user` and surfaces as [`RepoError::Duplicate`].
    pub async fn insert_pending(conn: &mut SqliteConnection, user_id: &str) -> RepoResult<Cart> {
        let row: CartRow = sqlx::query_as(
            "INSERT INTO carts (user_id, status, created) VALUES (?, ?, ?) \
             RETURNING id, user_id, status, created",
        )
        .bind(user_id)
        .bind(CartStatus::Pending.as_str())
        .bind(Utc::now().timestamp())
        .fetch_one(conn)
        .await?;
        row.into_model()
    }

    /// Atomic get-or-create for the user's pending cart.
    ///
    /// Optimistically attempts the insert; when a concurrent request wins
    /// the race the unique-violation is caught and the winner's row is
    /// re-fetched instead of failing the caller.
    pub async fn get_or_create_pending(
        conn: &mut SqliteConnection,
        user_id: &str,
    ) -> RepoResult<(Cart, bool)> {
        if let Some(cart) = Self::find_pending(conn, user_id).await? {
            return Ok((cart, false));
        }
        match Self::insert_pending(conn, user_id).await {
            Ok(cart) => Ok((cart, true)),
            Err(RepoError::Duplicate(_)) => {
                // Lost the race; the winner's row exists now
                let cart = Self::find_pending(conn, user_id).await?.ok_or_else(|| {
                    RepoError::Busy("pending cart vanished during get-or-create".to_string())
                })?;
                Ok((cart, false))
            }
            Err(e) => Err(e),
        }
    }

    /// Ownership-scoped lookup; a cart owned by another user is
    /// indistinguishable from a missing one.
    pub async fn find_for_user(
        conn: &mut SqliteConnection,
        cart_id: CartId,
        user_id: &str,
    ) -> RepoResult<Option<Cart>> {
        let row: Option<CartRow> =
            sqlx::query_as(&format!("{SELECT_CART} WHERE id = ? AND user_id = ?"))
                .bind(cart_id)
                .bind(user_id)
                .fetch_optional(conn)
                .await?;
        row.map(CartRow::into_model).transpose()
    }

    /// All carts of the user, newest first, optionally filtered by status
    pub async fn list_for_user(
        conn: &mut SqliteConnection,
        user_id: &str,
        status: Option<CartStatus>,
    ) -> RepoResult<Vec<Cart>> {
        let rows: Vec<CartRow> = if let Some(status) = status {
            sqlx::query_as(&format!(
                "{SELECT_CART} WHERE user_id = ? AND status = ? ORDER BY created DESC, id DESC"
            ))
            .bind(user_id)
            .bind(status.as_str())
            .fetch_all(conn)
            .await?
        } else {
            sqlx::query_as(&format!(
                "{SELECT_CART} WHERE user_id = ? ORDER BY created DESC, id DESC"
            ))
            .bind(user_id)
            .fetch_all(conn)
            .await?
        };
        rows.into_iter().map(CartRow::into_model).collect()
    }

    /// Write a new status. The caller has already validated the
    /// transition; the `WHERE` clause re-checks the expected current
    /// status so a concurrent transition cannot be overwritten.
    pub async fn set_status(
        conn: &mut SqliteConnection,
        cart_id: CartId,
        expected: CartStatus,
        target: CartStatus,
    ) -> RepoResult<Cart> {
        let row: Option<CartRow> = sqlx::query_as(
            "UPDATE carts SET status = ? WHERE id = ? AND status = ? \
             RETURNING id, user_id, status, created",
        )
        .bind(target.as_str())
        .bind(cart_id)
        .bind(expected.as_str())
        .fetch_optional(conn)
        .await?;
        row.ok_or_else(|| {
            RepoError::Busy(format!("Cart {cart_id} left status {expected} concurrently"))
        })?
        .into_model()
    }

    /// Delete an owned cart; line items cascade
    pub async fn delete(
        conn: &mut SqliteConnection,
        cart_id: CartId,
        user_id: &str,
    ) -> RepoResult<()> {
        let result = sqlx::query("DELETE FROM carts WHERE id = ? AND user_id = ?")
            .bind(cart_id)
            .bind(user_id)
            .execute(conn)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound(format!("Cart {cart_id} not found")));
        }
        Ok(())
    }
}
