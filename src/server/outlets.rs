use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::access::require_permission;
use crate::server::dto::{CreateOutletRequest, UpdateOutletRequest};
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::server::validation::{validate_name, validate_outlet_status};
use crate::types::{Action, Module};

pub async fn list_outlets(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let outlets = state
        .store
        .list_outlets()
        .api_err("Failed to list outlets")?;

    Ok::<_, ApiError>(Json(outlets))
}

pub async fn create_outlet(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateOutletRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Outlets, Action::Create)?;

    validate_name(&req.name, "Outlet")?;
    if req.location.trim().is_empty() {
        return Err(ApiError::bad_request("Name and location are required"));
    }

    let outlet = state
        .store
        .create_outlet(&req.name, &req.location)
        .api_err("Failed to create outlet")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(outlet)))
}

pub async fn update_outlet(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateOutletRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Outlets, Action::Edit)?;

    let mut outlet = state
        .store
        .get_outlet(id)
        .api_err("Failed to get outlet")?
        .or_not_found("Outlet not found")?;

    if let Some(name) = req.name {
        validate_name(&name, "Outlet")?;
        outlet.name = name;
    }
    if let Some(location) = req.location {
        outlet.location = location;
    }
    if let Some(status) = req.status {
        validate_outlet_status(&status)?;
        outlet.status = status;
    }

    state
        .store
        .update_outlet(&outlet)
        .api_err("Failed to update outlet")?;

    Ok::<_, ApiError>(Json(outlet))
}

pub async fn delete_outlet(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Outlets, Action::Delete)?;

    let outlet = state
        .store
        .get_outlet(id)
        .api_err("Failed to get outlet")?
        .or_not_found("Outlet not found")?;

    // Referential guard: outlets stay while users or sales point at them.
    if state
        .store
        .outlet_in_use(outlet.id)
        .api_err("Failed to check outlet references")?
    {
        return Err(ApiError::conflict(
            "Outlet is referenced by users or transactions",
        ));
    }

    state
        .store
        .delete_outlet(outlet.id)
        .api_err("Failed to delete outlet")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
