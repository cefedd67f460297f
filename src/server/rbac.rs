use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::access::{require_permission, require_superadmin};
use crate::server::dto::{
    CreateRoleRequest, PermissionQuery, PermissionRecord, UpdatePermissionsRequest,
};
use crate::server::response::{ApiError, StoreOptionExt, StoreResultExt};
use crate::server::validation::validate_role_name;
use crate::types::{Action, Module, Role, SUPERADMIN_ROLE};

pub async fn list_modules(_auth: RequireAuth) -> impl IntoResponse {
    let modules: Vec<&'static str> = Module::ALL.iter().map(|m| m.as_str()).collect();
    Json(modules)
}

pub async fn list_roles(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let roles = state.store.list_roles().api_err("Failed to list roles")?;
    Ok::<_, ApiError>(Json(roles))
}

pub async fn create_role(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateRoleRequest>,
) -> impl IntoResponse {
    require_superadmin(&claims)?;
    validate_role_name(&req.name)?;

    let role = state.store.create_role(&req.name).map_err(|e| match e {
        crate::error::Error::AlreadyExists => ApiError::conflict("Role already exists"),
        other => ApiError::from(other),
    })?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(role)))
}

pub async fn delete_role(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    require_superadmin(&claims)?;

    let role = state
        .store
        .get_role(id)
        .api_err("Failed to get role")?
        .or_not_found("Role not found")?;

    if role.name == SUPERADMIN_ROLE {
        return Err(ApiError::forbidden("The superadmin role cannot be deleted"));
    }

    state
        .store
        .delete_role(role.id)
        .api_err("Failed to delete role")?;

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

/// Builds the full module grid for a role, filling actions that have no
/// matrix row with `false`.
fn permission_grid(state: &AppState, role: &Role) -> Result<Vec<PermissionRecord>, ApiError> {
    let rows = state
        .store
        .list_role_permissions(role.id)
        .api_err("Failed to list permissions")?;

    let allowed = |module: Module, action: Action| -> bool {
        if role.name == SUPERADMIN_ROLE {
            return true;
        }
        rows.iter()
            .any(|p| p.module == module && p.action == action && p.allowed)
    };

    Ok(Module::ALL
        .iter()
        .map(|&module| PermissionRecord {
            module,
            create: allowed(module, Action::Create),
            edit: allowed(module, Action::Edit),
            delete: allowed(module, Action::Delete),
            show: allowed(module, Action::Show),
        })
        .collect())
}

pub async fn get_permissions(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<PermissionQuery>,
) -> impl IntoResponse {
    let role = match (params.role_id, params.role_name) {
        (Some(id), _) => state
            .store
            .get_role(id)
            .api_err("Failed to get role")?
            .or_not_found("Role not found")?,
        (None, Some(name)) => state
            .store
            .get_role_by_name(&name)
            .api_err("Failed to get role")?
            .or_not_found("Role not found")?,
        (None, None) => {
            return Err(ApiError::bad_request("roleId or roleName is required"));
        }
    };

    let grid = permission_grid(&state, &role)?;
    Ok::<_, ApiError>(Json(grid))
}

pub async fn update_permissions(
    RequireAuth(claims): RequireAuth,
    State(state): State<Arc<AppState>>,
    Json(req): Json<UpdatePermissionsRequest>,
) -> impl IntoResponse {
    require_permission(state.store.as_ref(), &claims, Module::Settings, Action::Edit)?;

    let role = state
        .store
        .get_role(req.role_id)
        .api_err("Failed to get role")?
        .or_not_found("Role not found")?;

    if let Some(records) = req.permissions {
        // Bulk form: the whole batch commits or none of it does.
        let perms: Vec<(Module, Action, bool)> = records
            .iter()
            .flat_map(|r| {
                r.actions()
                    .into_iter()
                    .map(move |(action, allowed)| (r.module, action, allowed))
            })
            .collect();

        state
            .store
            .set_role_permissions(role.id, &perms)
            .api_err("Failed to update permissions")?;
    } else {
        let (Some(module), Some(action), Some(allowed)) = (req.module, req.action, req.allowed)
        else {
            return Err(ApiError::bad_request(
                "module, action, and allowed are required",
            ));
        };

        state
            .store
            .upsert_role_permission(role.id, module, action, allowed)
            .api_err("Failed to update permission")?;
    }

    let grid = permission_grid(&state, &role)?;
    Ok::<_, ApiError>(Json(grid))
}
