use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::access::require_permission;
use crate::server::dto::{AdjustStockRequest, AdjustStockResponse, HistoryParams, StockOpnameRequest};
use crate::server::response::{ApiError, StoreResultExt};
use crate::server::validation::validate_quantity;
use crate::types::{Action, Module};

const DEFAULT_HISTORY_LIMIT: i64 = 50;

pub async fn adjust_stock(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<AdjustStockRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Stock, Action::Edit)?;
    validate_quantity(req.quantity)?;

    let new_stock = state
        .store
        .adjust_stock(
            req.product_id,
            req.direction,
            req.quantity,
            req.note.as_deref(),
        )
        .map_err(|e| match e {
            crate::error::Error::NotFound => ApiError::not_found("Product not found"),
            crate::error::Error::InsufficientStock => {
                ApiError::bad_request("Insufficient stock")
            }
            other => ApiError::from(other),
        })?;

    Ok::<_, ApiError>(Json(AdjustStockResponse { new_stock }))
}

pub async fn stock_opname(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<StockOpnameRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::StockOpname, Action::Create)?;

    if req.items.is_empty() {
        return Err(ApiError::bad_request("No items submitted"));
    }

    state
        .store
        .stock_opname(&req.items, req.note.as_deref())
        .map_err(|e| match e {
            crate::error::Error::NotFound => ApiError::not_found("Product not found"),
            other => ApiError::from(other),
        })?;

    Ok::<_, ApiError>(Json(serde_json::json!({
        "message": "Stock opname applied"
    })))
}

pub async fn list_history(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<HistoryParams>,
) -> impl IntoResponse {
    let limit = params.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, 500);

    let history = state
        .store
        .list_inventory_history(params.product_id, limit)
        .api_err("Failed to list inventory history")?;

    Ok::<_, ApiError>(Json(history))
}
