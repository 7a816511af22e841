//! Cart API module
//!
//! Every route requires a bearer token; all reads and writes are scoped
//! to the authenticated user.

mod handler;

use axum::{Router, routing::get};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new()
        .route("/carts", get(handler::list).post(handler::create))
        .route("/cart/pending", get(handler::pending))
        .route(
            "/cart/{id}",
            get(handler::get_by_id)
                .put(handler::update_status)
                .patch(handler::update_status)
                .delete(handler::delete),
        )
        .route(
            "/cart/{id}/items",
            get(handler::list_items).post(handler::add_item),
        )
        .route(
            "/cart/item/{id}",
            get(handler::get_item)
                .put(handler::update_item)
                .patch(handler::update_item)
                .delete(handler::remove_item),
        )
}
