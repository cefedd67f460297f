use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};

use crate::auth::PasswordHasher;
use crate::server::AppState;
use crate::server::dto::{LoginRequest, LoginResponse};
use crate::server::response::{ApiError, StoreResultExt};

/// POST /api/login
///
/// Unknown usernames, wrong passwords, and inactive accounts all produce the
/// identical response so the endpoint cannot be used to enumerate accounts.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    if req.username.is_empty() || req.password.is_empty() {
        return Err(ApiError::bad_request("Username and password are required"));
    }

    let invalid = || ApiError::unauthorized("Invalid credentials");

    let user = state
        .store
        .get_user_by_username(&req.username)
        .api_err("Failed to look up user")?
        .ok_or_else(invalid)?;

    let hasher = PasswordHasher::new();
    let verified = hasher
        .verify(&req.password, &user.password_hash)
        .map_err(|_| ApiError::internal("Failed to verify credentials"))?;
    if !verified {
        return Err(invalid());
    }

    if user.status != "active" {
        return Err(invalid());
    }

    let token = state
        .session_key
        .issue(&user)
        .map_err(|_| ApiError::internal("Failed to issue session token"))?;

    Ok(Json(LoginResponse { token, user }))
}
