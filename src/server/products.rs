use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::access::require_permission;
use crate::server::dto::ListParams;
use crate::server::response::{
    ApiError, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::validate_name;
use crate::types::{Action, Module, ProductInput};

fn validate_product(input: &ProductInput) -> Result<(), ApiError> {
    validate_name(&input.name, "Product")?;
    if input.stock < 0 {
        return Err(ApiError::bad_request("Stock cannot be negative"));
    }
    if input.cost_price < 0.0 || input.selling_price < 0.0 {
        return Err(ApiError::bad_request("Prices cannot be negative"));
    }
    Ok(())
}

pub async fn list_products(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let search = params.search.unwrap_or_default();

    let (products, total) = state
        .store
        .list_products(page, limit, &search)
        .api_err("Failed to list products")?;

    Ok::<_, ApiError>(Json(PaginatedResponse::new(products, total, page, limit)))
}

pub async fn get_product(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let product = state
        .store
        .get_product(id)
        .api_err("Failed to get product")?
        .or_not_found("Product not found")?;

    Ok::<_, ApiError>(Json(product))
}

pub async fn create_product(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProductInput>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Products, Action::Create)?;
    validate_product(&req)?;

    let product = state
        .store
        .create_product(&req)
        .api_err("Failed to create product")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<ProductInput>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Products, Action::Edit)?;
    validate_product(&req)?;

    state
        .store
        .update_product(id, &req)
        .api_err("Failed to update product")?;

    let product = state
        .store
        .get_product(id)
        .api_err("Failed to get product")?
        .or_not_found("Product not found")?;

    Ok::<_, ApiError>(Json(product))
}

pub async fn delete_product(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Products, Action::Delete)?;

    let deleted = state
        .store
        .delete_product(id)
        .api_err("Failed to delete product")?;
    if !deleted {
        return Err(ApiError::not_found("Product not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
