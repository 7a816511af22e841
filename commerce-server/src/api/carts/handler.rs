//! Cart API Handlers
//!
//! Thin HTTP translation over the cart engine; no business rules live
//! here.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{
    CartDetail, CartId, CartItemCreate, CartItemDetail, CartItemId, CartItemUpdate, CartStatus,
    CartUpdate,
};
use crate::utils::{AppResponse, AppResult, PageQuery, Paginated, ok_with_message};

/// Query parameters for the cart listing
#[derive(Debug, Default, Deserialize)]
pub struct CartListQuery {
    pub status: Option<CartStatus>,
}

// =============================================================================
// Cart Handlers
// =============================================================================

/// GET /carts - the user's carts, optionally filtered by status
pub async fn list(
    State(state): State<ServerState>,
    user: CurrentUser,
    Query(query): Query<CartListQuery>,
) -> AppResult<Json<Vec<CartDetail>>> {
    let carts = state.engine.list_carts(&user.id, query.status).await?;
    Ok(Json(carts))
}

/// POST /carts - explicitly create a pending cart
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<CartDetail>> {
    let cart = state.engine.create_cart(&user.id).await?;
    Ok(Json(cart))
}

/// GET /cart/pending - the user's pending cart, created on first access
pub async fn pending(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<CartDetail>> {
    let cart = state.engine.pending_cart(&user.id).await?;
    Ok(Json(cart))
}

/// GET /cart/{id} - single cart with items and totals
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<CartId>,
    user: CurrentUser,
) -> AppResult<Json<CartDetail>> {
    let cart = state.engine.get_cart(id, &user.id).await?;
    Ok(Json(cart))
}

/// PUT/PATCH /cart/{id} - status transition (the only cart-level write)
pub async fn update_status(
    State(state): State<ServerState>,
    Path(id): Path<CartId>,
    user: CurrentUser,
    Json(payload): Json<CartUpdate>,
) -> AppResult<Json<CartDetail>> {
    let cart = state
        .engine
        .transition_status(id, &user.id, payload.status)
        .await?;
    Ok(Json(cart))
}

/// DELETE /cart/{id} - delete a cart and its items
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<CartId>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<()>>> {
    state.engine.delete_cart(id, &user.id).await?;
    Ok(ok_with_message((), "Cart deleted"))
}

// =============================================================================
// Cart Item Handlers
// =============================================================================

/// GET /cart/{id}/items - one page of a cart's line items
pub async fn list_items(
    State(state): State<ServerState>,
    Path(id): Path<CartId>,
    user: CurrentUser,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<CartItemDetail>>> {
    let page = state.engine.list_items(id, &user.id, &query).await?;
    Ok(Json(page))
}

/// POST /cart/{id}/items - add a product (merges quantities on repeat)
pub async fn add_item(
    State(state): State<ServerState>,
    Path(id): Path<CartId>,
    user: CurrentUser,
    Json(payload): Json<CartItemCreate>,
) -> AppResult<Json<CartItemDetail>> {
    let quantity = payload.quantity.unwrap_or(1);
    let item = state
        .engine
        .add_item(id, &user.id, payload.product, quantity)
        .await?;
    Ok(Json(item))
}

/// GET /cart/item/{id} - single line item
pub async fn get_item(
    State(state): State<ServerState>,
    Path(id): Path<CartItemId>,
    user: CurrentUser,
) -> AppResult<Json<CartItemDetail>> {
    let item = state.engine.get_item(id, &user.id).await?;
    Ok(Json(item))
}

/// PUT/PATCH /cart/item/{id} - replace the quantity
pub async fn update_item(
    State(state): State<ServerState>,
    Path(id): Path<CartItemId>,
    user: CurrentUser,
    Json(payload): Json<CartItemUpdate>,
) -> AppResult<Json<CartItemDetail>> {
    let item = state
        .engine
        .set_item_quantity(id, &user.id, payload.quantity)
        .await?;
    Ok(Json(item))
}

/// DELETE /cart/item/{id} - remove a line item
pub async fn remove_item(
    State(state): State<ServerState>,
    Path(id): Path<CartItemId>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<()>>> {
    state.engine.remove_item(id, &user.id).await?;
    Ok(ok_with_message((), "Cart item removed"))
}
