use crate::auth::SessionClaims;
use crate::server::response::{ApiError, StoreResultExt};
use crate::store::Store;
use crate::types::{Action, Module, SUPERADMIN_ROLE};

/// Returns true if the caller may perform `action` on `module`.
///
/// Resolution is fail-closed: a role name with no matching Role row has no
/// permissions, and a missing matrix row counts as denied. Only the reserved
/// superadmin role bypasses the matrix.
pub fn check_permission(
    store: &dyn Store,
    claims: &SessionClaims,
    module: Module,
    action: Action,
) -> Result<bool, ApiError> {
    if claims.role == SUPERADMIN_ROLE {
        return Ok(true);
    }

    let Some(role) = store
        .get_role_by_name(&claims.role)
        .api_err("Failed to resolve role")?
    else {
        return Ok(false);
    };

    store
        .get_permission(role.id, module, action)
        .api_err("Failed to check permission")
}

/// Check the permission matrix, returning a forbidden error when denied.
pub fn require_permission(
    store: &dyn Store,
    claims: &SessionClaims,
    module: Module,
    action: Action,
) -> Result<(), ApiError> {
    if !check_permission(store, claims, module, action)? {
        return Err(ApiError::forbidden("Forbidden"));
    }
    Ok(())
}

/// Gate for role administration: only the superadmin role itself passes,
/// regardless of what the permission matrix says.
pub fn require_superadmin(claims: &SessionClaims) -> Result<(), ApiError> {
    if claims.role != SUPERADMIN_ROLE {
        return Err(ApiError::forbidden("Forbidden"));
    }
    Ok(())
}

#[must_use]
pub fn is_superadmin(claims: &SessionClaims) -> bool {
    claims.role == SUPERADMIN_ROLE
}
