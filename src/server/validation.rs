use crate::server::response::ApiError;

const MAX_USERNAME_LEN: usize = 64;
const MAX_ROLE_NAME_LEN: usize = 64;
const MAX_NAME_LEN: usize = 200;

pub fn validate_username(username: &str) -> Result<(), ApiError> {
    if username.is_empty() {
        return Err(ApiError::bad_request("Username cannot be empty"));
    }
    if username.len() > MAX_USERNAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        )));
    }
    if username.contains(char::is_whitespace) {
        return Err(ApiError::bad_request("Username cannot contain whitespace"));
    }
    Ok(())
}

pub fn validate_role_name(name: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request("Role name cannot be empty"));
    }
    if name.len() > MAX_ROLE_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "Role name cannot exceed {MAX_ROLE_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_name(name: &str, entity: &str) -> Result<(), ApiError> {
    if name.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{entity} name is required")));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(ApiError::bad_request(format!(
            "{entity} name cannot exceed {MAX_NAME_LEN} characters"
        )));
    }
    Ok(())
}

pub fn validate_quantity(quantity: i64) -> Result<(), ApiError> {
    if quantity <= 0 {
        return Err(ApiError::bad_request("Quantity must be greater than zero"));
    }
    Ok(())
}

pub fn validate_status(status: &str) -> Result<(), ApiError> {
    match status {
        "active" | "inactive" => Ok(()),
        _ => Err(ApiError::bad_request(
            "Status must be 'active' or 'inactive'",
        )),
    }
}

pub fn validate_outlet_status(status: &str) -> Result<(), ApiError> {
    match status {
        "Active" | "Inactive" => Ok(()),
        _ => Err(ApiError::bad_request(
            "Status must be 'Active' or 'Inactive'",
        )),
    }
}
