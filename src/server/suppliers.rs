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
use crate::types::{Action, Module, SupplierInput};

pub async fn list_suppliers(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let search = params.search.unwrap_or_default();

    let (suppliers, total) = state
        .store
        .list_suppliers(page, limit, &search)
        .api_err("Failed to list suppliers")?;

    Ok::<_, ApiError>(Json(PaginatedResponse::new(suppliers, total, page, limit)))
}

pub async fn create_supplier(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<SupplierInput>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Suppliers, Action::Create)?;
    validate_name(&req.name, "Supplier")?;

    let supplier = state
        .store
        .create_supplier(&req)
        .api_err("Failed to create supplier")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<SupplierInput>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Suppliers, Action::Edit)?;
    validate_name(&req.name, "Supplier")?;

    state
        .store
        .update_supplier(id, &req)
        .api_err("Failed to update supplier")?;

    let supplier = state
        .store
        .get_supplier(id)
        .api_err("Failed to get supplier")?
        .or_not_found("Supplier not found")?;

    Ok::<_, ApiError>(Json(supplier))
}

pub async fn delete_supplier(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Suppliers, Action::Delete)?;

    let deleted = state
        .store
        .delete_supplier(id)
        .api_err("Failed to delete supplier")?;
    if !deleted {
        return Err(ApiError::not_found("Supplier not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
