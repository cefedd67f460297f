use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::access::require_permission;
use crate::server::dto::{CreateSaleRequest, CreateSaleResponse};
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_quantity;
use crate::types::{Action, Module};

const RECENT_SALES_LIMIT: i64 = 50;

pub async fn create_sale(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateSaleRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Transactions, Action::Create)?;

    if req.items.is_empty() {
        return Err(ApiError::bad_request("Cart is empty"));
    }
    for item in &req.items {
        validate_quantity(item.quantity)?;
    }
    if let Some(outlet_id) = req.outlet_id {
        state
            .store
            .get_outlet(outlet_id)
            .api_err("Failed to check outlet")?
            .or_not_found("Outlet not found")?;
    }

    let id = state
        .store
        .create_sale(req.outlet_id, &req.items, req.total_amount)
        .map_err(|e| match e {
            crate::error::Error::NotFound => ApiError::not_found("Product not found"),
            other => ApiError::from(other),
        })?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(CreateSaleResponse { id })))
}

pub async fn list_sales(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let sales = state
        .store
        .list_recent_sales(RECENT_SALES_LIMIT)
        .api_err("Failed to list transactions")?;

    Ok::<_, ApiError>(Json(sales))
}
