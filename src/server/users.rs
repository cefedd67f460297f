use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::{PasswordHasher, RequireAuth, SessionClaims};
use crate::server::AppState;
use crate::server::access::{is_superadmin, require_permission};
use crate::server::dto::{CreateUserRequest, ListParams, UpdateUserRequest};
use crate::server::response::{
    ApiError, DEFAULT_PAGE_SIZE, PaginatedResponse, StoreOptionExt, StoreResultExt,
};
use crate::server::validation::{validate_status, validate_username};
use crate::types::{Action, Module, SUPERADMIN_ROLE, User};

/// Superadmin accounts may only be touched by superadmins, and no role may
/// be escalated to superadmin by anyone else.
fn guard_superadmin_tampering(claims: &SessionClaims, role: &str) -> Result<(), ApiError> {
    if role == SUPERADMIN_ROLE && !is_superadmin(claims) {
        return Err(ApiError::forbidden("Forbidden"));
    }
    Ok(())
}

fn check_outlet_exists(state: &AppState, outlet_id: Option<i64>) -> Result<(), ApiError> {
    if let Some(id) = outlet_id {
        state
            .store
            .get_outlet(id)
            .api_err("Failed to check outlet")?
            .or_not_found("Outlet not found")?;
    }
    Ok(())
}

pub async fn list_users(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    let page = params.page.unwrap_or(1).max(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, 100);
    let search = params.search.unwrap_or_default();

    let (users, total) = state
        .store
        .list_users(page, limit, &search)
        .api_err("Failed to list users")?;

    Ok::<_, ApiError>(Json(PaginatedResponse::new(users, total, page, limit)))
}

pub async fn create_user(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Users, Action::Create)?;
    guard_superadmin_tampering(&claims, &req.role)?;

    validate_username(&req.username)?;
    if req.password.is_empty() {
        return Err(ApiError::bad_request("Password cannot be empty"));
    }
    let status = req.status.as_deref().unwrap_or("active");
    validate_status(status)?;
    check_outlet_exists(&state, req.outlet_id)?;

    let hasher = PasswordHasher::new();
    let password_hash = hasher
        .hash(&req.password)
        .map_err(|_| ApiError::internal("Failed to hash password"))?;

    let user = state
        .store
        .create_user(&req.username, &password_hash, &req.role, req.outlet_id, status)
        .map_err(|e| match e {
            crate::error::Error::AlreadyExists => ApiError::conflict("Username already exists"),
            other => ApiError::from(other),
        })?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(user)))
}

pub async fn update_user(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUserRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Users, Action::Edit)?;

    let mut user: User = state
        .store
        .get_user(id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    // Editing an existing superadmin or escalating to one are both gated.
    guard_superadmin_tampering(&claims, &user.role)?;
    if let Some(ref role) = req.role {
        guard_superadmin_tampering(&claims, role)?;
    }

    if let Some(username) = req.username {
        validate_username(&username)?;
        user.username = username;
    }
    if let Some(password) = req.password {
        if password.is_empty() {
            return Err(ApiError::bad_request("Password cannot be empty"));
        }
        let hasher = PasswordHasher::new();
        user.password_hash = hasher
            .hash(&password)
            .map_err(|_| ApiError::internal("Failed to hash password"))?;
    }
    if let Some(role) = req.role {
        user.role = role;
    }
    if req.outlet_id.is_some() {
        check_outlet_exists(&state, req.outlet_id)?;
        user.outlet_id = req.outlet_id;
    }
    if let Some(status) = req.status {
        validate_status(&status)?;
        user.status = status;
    }

    state.store.update_user(&user).map_err(|e| match e {
        crate::error::Error::AlreadyExists => ApiError::conflict("Username already exists"),
        other => ApiError::from(other),
    })?;

    Ok::<_, ApiError>(Json(user))
}

pub async fn delete_user(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Users, Action::Delete)?;

    let user: User = state
        .store
        .get_user(id)
        .api_err("Failed to get user")?
        .or_not_found("User not found")?;

    guard_superadmin_tampering(&claims, &user.role)?;
    if user.id == claims.sub {
        return Err(ApiError::forbidden("Cannot delete your own account"));
    }

    state
        .store
        .delete_user(user.id)
        .api_err("Failed to delete user")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
