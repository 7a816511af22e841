//! Cart Engine
//!
//! Business layer for carts and line items. All identity checks and
//! status rules are enforced here; handlers only translate HTTP.
//!
//! Writes that read and then decide (status gates, the add-item upsert)
//! run inside a `BEGIN IMMEDIATE` transaction, so a concurrent writer
//! cannot interleave between the check and the write. Transient store
//! contention is retried a bounded number of times before surfacing as
//! a service-unavailable error.

use std::time::Duration;

use futures::future::BoxFuture;
use sqlx::SqliteConnection;
use tokio::time::sleep;

use super::aggregate;
use crate::db::DbService;
use crate::db::models::{CartDetail, CartId, CartItemDetail, CartItemId, CartStatus, ProductId};
use crate::db::repository::{
    CartItemRepository, CartRepository, ProductRepository, RepoError,
};
use crate::utils::{
    AppError, AppResult, CART_ITEM_PAGE_SIZE, PageQuery, Paginated, validation::validate_quantity,
};

/// Attempts per write before giving up on store contention
const MAX_WRITE_ATTEMPTS: u32 = 3;

fn store_err(err: sqlx::Error) -> AppError {
    RepoError::from(err).into()
}

/// Resolve a cart's items and assemble the detail view
async fn load_detail(conn: &mut SqliteConnection, cart: crate::db::models::Cart) -> AppResult<CartDetail> {
    let items = CartItemRepository::details_for_cart(conn, cart.id).await?;
    Ok(aggregate::cart_detail(cart, items))
}

// =============================================================================
// Cart Engine
// =============================================================================

#[derive(Clone)]
pub struct CartEngine {
    db: DbService,
}

impl CartEngine {
    pub fn new(db: DbService) -> Self {
        Self { db }
    }

    // ── Write transaction machinery ─────────────────────────────────

    /// Run `op` inside a `BEGIN IMMEDIATE` transaction, retrying on
    /// transient store contention with a short linear backoff.
    async fn write_tx<T, F>(&self, op: F) -> AppResult<T>
    where
        F: for<'c> Fn(&'c mut SqliteConnection) -> BoxFuture<'c, AppResult<T>>,
    {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.try_write_tx(&op).await {
                Err(AppError::StoreConflict(reason)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!(attempt, %reason, "Transient store conflict, retrying write");
                    sleep(Duration::from_millis(u64::from(attempt) * 20)).await;
                }
                outcome => return outcome,
            }
        }
    }

    async fn try_write_tx<T, F>(&self, op: &F) -> AppResult<T>
    where
        F: for<'c> Fn(&'c mut SqliteConnection) -> BoxFuture<'c, AppResult<T>>,
    {
        let mut tx = self.db.begin_immediate().await.map_err(store_err)?;
        match op(tx.conn()).await {
            Ok(value) => {
                tx.commit().await.map_err(store_err)?;
                Ok(value)
            }
            Err(err) => {
                let _ = tx.rollback().await;
                Err(err)
            }
        }
    }

    // ── Cart operations ─────────────────────────────────────────────

    /// Explicitly create a pending cart; fails if one already exists.
    pub async fn create_cart(&self, user_id: &str) -> AppResult<CartDetail> {
        let mut conn = self.db.acquire().await.map_err(store_err)?;
        match CartRepository::insert_pending(&mut conn, user_id).await {
            Ok(cart) => {
                tracing::info!(cart_id = cart.id, user_id, "Created pending cart");
                Ok(aggregate::cart_detail(cart, Vec::new()))
            }
            Err(RepoError::Duplicate(_)) => {
                Err(AppError::conflict("Pending cart already exists"))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// The user's pending cart, created on first access.
    ///
    /// Concurrent first accesses race on the insert; the loser's
    /// unique-violation is absorbed by the repository and the winner's
    /// cart is returned to both callers.
    pub async fn pending_cart(&self, user_id: &str) -> AppResult<CartDetail> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let mut conn = self.db.acquire().await.map_err(store_err)?;
            match CartRepository::get_or_create_pending(&mut conn, user_id).await {
                Ok((cart, created)) => {
                    if created {
                        tracing::info!(cart_id = cart.id, user_id, "Created pending cart");
                    }
                    return load_detail(&mut conn, cart).await;
                }
                Err(RepoError::Busy(reason)) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!(attempt, %reason, "Pending cart get-or-create raced, retrying");
                    sleep(Duration::from_millis(u64::from(attempt) * 20)).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// All carts of the user, newest first, optionally filtered by status
    pub async fn list_carts(
        &self,
        user_id: &str,
        status: Option<CartStatus>,
    ) -> AppResult<Vec<CartDetail>> {
        let mut conn = self.db.acquire().await.map_err(store_err)?;
        let carts = CartRepository::list_for_user(&mut conn, user_id, status).await?;
        let mut details = Vec::with_capacity(carts.len());
        for cart in carts {
            details.push(load_detail(&mut conn, cart).await?);
        }
        Ok(details)
    }

    /// Single cart with resolved items and totals
    pub async fn get_cart(&self, cart_id: CartId, user_id: &str) -> AppResult<CartDetail> {
        let mut conn = self.db.acquire().await.map_err(store_err)?;
        let cart = CartRepository::find_for_user(&mut conn, cart_id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Cart {cart_id} not found")))?;
        load_detail(&mut conn, cart).await
    }

    /// Drive the cart status machine.
    ///
    /// Pending → Paid and Pending → Cancelled are the only real
    /// transitions; writing the current status back is an idempotent
    /// no-op, and anything else on a terminal cart is a conflict.
    pub async fn transition_status(
        &self,
        cart_id: CartId,
        user_id: &str,
        target: CartStatus,
    ) -> AppResult<CartDetail> {
        let user = user_id.to_string();
        self.write_tx(move |conn| {
            let user = user.clone();
            Box::pin(async move {
                let cart = CartRepository::find_for_user(&mut *conn, cart_id, &user)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Cart {cart_id} not found")))?;

                if cart.status == target {
                    return load_detail(conn, cart).await;
                }
                if !cart.status.is_pending() {
                    return Err(AppError::conflict(format!(
                        "Cart {cart_id} is {}; only pending carts can change status",
                        cart.status
                    )));
                }

                let updated =
                    CartRepository::set_status(&mut *conn, cart.id, CartStatus::Pending, target)
                        .await?;
                tracing::info!(cart_id, status = %updated.status, "Cart status changed");
                load_detail(conn, updated).await
            })
        })
        .await
    }

    /// Delete an owned cart; its line items cascade
    pub async fn delete_cart(&self, cart_id: CartId, user_id: &str) -> AppResult<()> {
        let mut conn = self.db.acquire().await.map_err(store_err)?;
        CartRepository::delete(&mut conn, cart_id, user_id).await?;
        tracing::info!(cart_id, user_id, "Cart deleted");
        Ok(())
    }

    // ── Line item operations ────────────────────────────────────────

    /// Add a product to a pending cart.
    ///
    /// Adding a product already in the cart merges by incrementing the
    /// existing line's quantity instead of creating a second line.
    pub async fn add_item(
        &self,
        cart_id: CartId,
        user_id: &str,
        product_id: ProductId,
        quantity: i64,
    ) -> AppResult<CartItemDetail> {
        validate_quantity(quantity)?;
        let user = user_id.to_string();
        self.write_tx(move |conn| {
            let user = user.clone();
            Box::pin(async move {
                let cart = CartRepository::find_for_user(&mut *conn, cart_id, &user)
                    .await?
                    .ok_or_else(|| AppError::not_found(format!("Cart {cart_id} not found")))?;
                if !cart.status.is_pending() {
                    return Err(AppError::conflict("Only pending carts accept items"));
                }
                ProductRepository::find_by_id(&mut *conn, product_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!("Product {product_id} not found"))
                    })?;

                let (item, created) =
                    CartItemRepository::get_or_create(&mut *conn, cart.id, product_id, quantity)
                        .await?;
                tracing::info!(
                    cart_id,
                    product_id,
                    quantity = item.quantity,
                    merged = !created,
                    "Added item to cart"
                );
                Ok(CartItemRepository::detail(&mut *conn, item.id).await?)
            })
        })
        .await
    }

    /// One page of a cart's line items
    pub async fn list_items(
        &self,
        cart_id: CartId,
        user_id: &str,
        query: &PageQuery,
    ) -> AppResult<Paginated<CartItemDetail>> {
        let mut conn = self.db.acquire().await.map_err(store_err)?;
        CartRepository::find_for_user(&mut conn, cart_id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Cart {cart_id} not found")))?;

        let count = CartItemRepository::count_for_cart(&mut conn, cart_id).await?;
        let rows = CartItemRepository::details_page(
            &mut conn,
            cart_id,
            CART_ITEM_PAGE_SIZE,
            query.offset(CART_ITEM_PAGE_SIZE),
        )
        .await?;
        Ok(Paginated::new(count, query.page(), CART_ITEM_PAGE_SIZE, rows))
    }

    /// Single line item, scoped to the owner
    pub async fn get_item(&self, item_id: CartItemId, user_id: &str) -> AppResult<CartItemDetail> {
        let mut conn = self.db.acquire().await.map_err(store_err)?;
        let (item, _cart) = CartItemRepository::find_for_user(&mut conn, item_id, user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Cart item {item_id} not found")))?;
        Ok(CartItemRepository::detail(&mut conn, item.id).await?)
    }

    /// Replace a line item's quantity (pending carts only)
    pub async fn set_item_quantity(
        &self,
        item_id: CartItemId,
        user_id: &str,
        quantity: i64,
    ) -> AppResult<CartItemDetail> {
        validate_quantity(quantity)?;
        let user = user_id.to_string();
        self.write_tx(move |conn| {
            let user = user.clone();
            Box::pin(async move {
                let (item, cart) = CartItemRepository::find_for_user(&mut *conn, item_id, &user)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!("Cart item {item_id} not found"))
                    })?;
                if !cart.status.is_pending() {
                    return Err(AppError::conflict("Cannot modify a non-pending cart"));
                }
                let updated = CartItemRepository::set_quantity(&mut *conn, item.id, quantity).await?;
                Ok(CartItemRepository::detail(&mut *conn, updated.id).await?)
            })
        })
        .await
    }

    /// Remove a line item (pending carts only)
    pub async fn remove_item(&self, item_id: CartItemId, user_id: &str) -> AppResult<()> {
        let user = user_id.to_string();
        self.write_tx(move |conn| {
            let user = user.clone();
            Box::pin(async move {
                let (item, cart) = CartItemRepository::find_for_user(&mut *conn, item_id, &user)
                    .await?
                    .ok_or_else(|| {
                        AppError::not_found(format!("Cart item {item_id} not found"))
                    })?;
                if !cart.status.is_pending() {
                    return Err(AppError::conflict("Cannot modify a non-pending cart"));
                }
                CartItemRepository::delete(&mut *conn, item.id).await?;
                tracing::info!(item_id, cart_id = cart.id, "Removed item from cart");
                Ok(())
            })
        })
        .await
    }
}
