mod models;
mod permission;

pub use models::*;
pub use permission::{Action, Module, SUPERADMIN_ROLE};
