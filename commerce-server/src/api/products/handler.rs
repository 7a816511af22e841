//! Product API Handlers
//!
//! Reads are public; catalog mutations require a staff account.

use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Category, Product, ProductCreate, ProductId, ProductUpdate};
use crate::db::repository::ProductRepository;
use crate::utils::validation::{
    MAX_DESCRIPTION_LEN, MAX_NAME_LEN, validate_optional_text, validate_price,
    validate_required_text,
};
use crate::utils::{
    AppError, AppResponse, AppResult, PRODUCT_PAGE_SIZE, PageQuery, Paginated, ok_with_message,
};

fn require_staff(user: &CurrentUser) -> AppResult<()> {
    if user.is_staff() || user.has_permission("products:write") {
        Ok(())
    } else {
        Err(AppError::forbidden("Staff role required"))
    }
}

async fn list_page(
    state: &ServerState,
    category: Option<Category>,
    query: &PageQuery,
) -> AppResult<Json<Paginated<Product>>> {
    let mut conn = state
        .db
        .acquire()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    let search = query.search.as_deref();

    let count = ProductRepository::count(&mut conn, category, search).await?;
    let products = ProductRepository::list(
        &mut conn,
        category,
        search,
        PRODUCT_PAGE_SIZE,
        query.offset(PRODUCT_PAGE_SIZE),
    )
    .await?;
    Ok(Json(Paginated::new(
        count,
        query.page(),
        PRODUCT_PAGE_SIZE,
        products,
    )))
}

// =============================================================================
// Product Handlers
// =============================================================================

/// GET /products - paginated catalog listing
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<Product>>> {
    list_page(&state, None, &query).await
}

/// GET /category/{name}/products - listing restricted to one category
pub async fn list_by_category(
    State(state): State<ServerState>,
    Path(name): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Paginated<Product>>> {
    let category: Category = name
        .parse()
        .map_err(|_| AppError::not_found(format!("Category {name} not found")))?;
    list_page(&state, Some(category), &query).await
}

/// GET /product/{id} - single product
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<ProductId>,
) -> AppResult<Json<Product>> {
    let mut conn = state
        .db
        .acquire()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    let product = ProductRepository::find_by_id(&mut conn, id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Product {id} not found")))?;
    Ok(Json(product))
}

/// POST /products - create a product (staff only)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<Product>> {
    require_staff(&user)?;
    validate_required_text(&payload.name, "name", MAX_NAME_LEN)?;
    validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
    validate_price(payload.price, "price")?;

    let mut conn = state
        .db
        .acquire()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    let product = ProductRepository::create(&mut conn, payload).await?;
    tracing::info!(product_id = product.id, user_id = %user.id, "Product created");
    Ok(Json(product))
}

/// PUT/PATCH /product/{id} - partial update (staff only)
pub async fn update(
    State(state): State<ServerState>,
    Path(id): Path<ProductId>,
    user: CurrentUser,
    Json(payload): Json<ProductUpdate>,
) -> AppResult<Json<Product>> {
    require_staff(&user)?;
    if let Some(name) = &payload.name {
        validate_required_text(name, "name", MAX_NAME_LEN)?;
    }
    validate_optional_text(&payload.description, "description", MAX_DESCRIPTION_LEN)?;
    if let Some(price) = payload.price {
        validate_price(price, "price")?;
    }

    let mut conn = state
        .db
        .acquire()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    let product = ProductRepository::update(&mut conn, id, payload).await?;
    tracing::info!(product_id = id, user_id = %user.id, "Product updated");
    Ok(Json(product))
}

/// DELETE /product/{id} - remove a product (staff only)
pub async fn delete(
    State(state): State<ServerState>,
    Path(id): Path<ProductId>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<()>>> {
    require_staff(&user)?;
    let mut conn = state
        .db
        .acquire()
        .await
        .map_err(|e| AppError::database(e.to_string()))?;
    ProductRepository::delete(&mut conn, id).await?;
    tracing::info!(product_id = id, user_id = %user.id, "Product deleted");
    Ok(ok_with_message((), "Product deleted"))
}
