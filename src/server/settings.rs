use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::access::require_permission;
use crate::server::response::{ApiError, StoreResultExt};
use crate::types::{Action, Module, Settings};

pub async fn get_settings(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let settings = state
        .store
        .get_settings()
        .api_err("Failed to load settings")?;

    Ok::<_, ApiError>(Json(settings))
}

pub async fn update_settings(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<Settings>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Settings, Action::Edit)?;

    if req.ppn_rate < 0.0 || req.discount_rate < 0.0 {
        return Err(ApiError::bad_request("Rates cannot be negative"));
    }

    state
        .store
        .update_settings(&req)
        .api_err("Failed to update settings")?;

    Ok::<_, ApiError>(Json(req))
}
