pub mod access;
pub mod dto;
mod inventory;
mod login;
mod outlets;
mod products;
mod rbac;
mod reports;
pub mod response;
mod router;
mod settings;
mod suppliers;
mod transactions;
mod users;
pub mod validation;

pub use router::{AppState, create_router};
