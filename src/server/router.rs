use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::auth::SessionKey;
use crate::store::Store;

use super::{
    inventory, login, outlets, products, rbac, reports, settings, suppliers, transactions, users,
};

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub session_key: SessionKey,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, session_key: SessionKey) -> Self {
        Self { store, session_key }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

fn api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/login", post(login::login))
        // Outlets
        .route("/outlets", get(outlets::list_outlets))
        .route("/outlets", post(outlets::create_outlet))
        .route("/outlets/{id}", put(outlets::update_outlet))
        .route("/outlets/{id}", delete(outlets::delete_outlet))
        // Products
        .route("/products", get(products::list_products))
        .route("/products", post(products::create_product))
        .route("/products/{id}", get(products::get_product))
        .route("/products/{id}", put(products::update_product))
        .route("/products/{id}", delete(products::delete_product))
        // Suppliers
        .route("/suppliers", get(suppliers::list_suppliers))
        .route("/suppliers", post(suppliers::create_supplier))
        .route("/suppliers/{id}", put(suppliers::update_supplier))
        .route("/suppliers/{id}", delete(suppliers::delete_supplier))
        // Users
        .route("/users", get(users::list_users))
        .route("/users", post(users::create_user))
        .route("/users/{id}", put(users::update_user))
        .route("/users/{id}", delete(users::delete_user))
        // RBAC
        .route("/rbac/modules", get(rbac::list_modules))
        .route("/rbac/roles", get(rbac::list_roles))
        .route("/rbac/roles", post(rbac::create_role))
        .route("/rbac/roles/{id}", delete(rbac::delete_role))
        .route("/rbac/permissions", get(rbac::get_permissions))
        .route("/rbac/permissions", put(rbac::update_permissions))
        // Inventory ledger
        .route("/inventory/adjust", post(inventory::adjust_stock))
        .route("/inventory/history", get(inventory::list_history))
        .route("/stock-opname", post(inventory::stock_opname))
        // Sales
        .route("/transactions", post(transactions::create_sale))
        .route("/transactions", get(transactions::list_sales))
        // Reports
        .route("/dashboard", get(reports::dashboard))
        .route("/financial/profit-loss", get(reports::profit_loss))
        .route("/reports/balance", get(reports::balance_sheet))
        .route("/reports/transactions", get(reports::transactions_report))
        // Settings
        .route("/settings", get(settings::get_settings))
        .route("/settings", put(settings::update_settings))
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
