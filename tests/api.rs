mod common;

use reqwest::StatusCode;
use serde_json::{Value, json};

use common::test_server::{SUPERADMIN_PASSWORD, TestServer};

async fn create_product(server: &TestServer, token: &str, name: &str, stock: i64) -> i64 {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/api/products", server.base_url))
        .bearer_auth(token)
        .json(&json!({
            "name": name,
            "stock": stock,
            "cost_price": 500.0,
            "selling_price": 800.0,
            "unit": "strip",
            "category": "Analgesic"
        }))
        .send()
        .await
        .expect("create product");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("parse product");
    body["id"].as_i64().expect("product id")
}

async fn get_product_stock(server: &TestServer, token: &str, id: i64) -> i64 {
    let client = reqwest::Client::new();
    let body: Value = client
        .get(format!("{}/api/products/{id}", server.base_url))
        .bearer_auth(token)
        .send()
        .await
        .expect("get product")
        .json()
        .await
        .expect("parse product");
    body["stock"].as_i64().expect("stock")
}

async fn role_id(server: &TestServer, token: &str, name: &str) -> i64 {
    let client = reqwest::Client::new();
    let roles: Value = client
        .get(format!("{}/api/rbac/roles", server.base_url))
        .bearer_auth(token)
        .send()
        .await
        .expect("list roles")
        .json()
        .await
        .expect("parse roles");
    roles
        .as_array()
        .expect("roles array")
        .iter()
        .find(|r| r["name"] == name)
        .unwrap_or_else(|| panic!("role {name} not found"))["id"]
        .as_i64()
        .expect("role id")
}

#[tokio::test]
async fn test_login_and_credential_errors_are_uniform() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/api/login", server.base_url))
        .json(&json!({"username": "superadmin", "password": SUPERADMIN_PASSWORD}))
        .send()
        .await
        .expect("login");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("parse login");
    assert!(body["token"].as_str().is_some());
    assert_eq!(body["user"]["username"], "superadmin");
    assert_eq!(body["user"]["role"], "superadmin");
    assert!(body["user"]["password_hash"].is_null());

    // Wrong password and unknown username must be indistinguishable.
    let wrong_password = client
        .post(format!("{}/api/login", server.base_url))
        .json(&json!({"username": "superadmin", "password": "salah"}))
        .send()
        .await
        .expect("login wrong password");
    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    let wrong_password: Value = wrong_password.json().await.expect("parse");

    let unknown_user = client
        .post(format!("{}/api/login", server.base_url))
        .json(&json!({"username": "tidak-ada", "password": "salah"}))
        .send()
        .await
        .expect("login unknown user");
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    let unknown_user: Value = unknown_user.json().await.expect("parse");

    assert_eq!(wrong_password, unknown_user);
    assert_eq!(wrong_password["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_requests_without_token_are_unauthorized() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("{}/api/products", server.base_url))
        .send()
        .await
        .expect("unauthenticated request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("parse");
    assert_eq!(body["message"], "Unauthorized");

    let resp = client
        .get(format!("{}/api/products", server.base_url))
        .bearer_auth("not-a-real-token")
        .send()
        .await
        .expect("garbage token request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("parse");
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn test_cashier_permission_boundary_on_sales() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let admin_token = server.superadmin_token().await;
    server.seed_user("kasir1", "Cashier", None);
    let cashier_token = server.login("kasir1", SUPERADMIN_PASSWORD).await;

    let product_id = create_product(&server, &admin_token, "Paracetamol 500mg", 100).await;
    let sale_body = json!({
        "items": [{"id": product_id, "quantity": 2, "price": 800.0}],
        "total_amount": 1600.0
    });

    // Cashier has no Transactions/create grant yet.
    let resp = client
        .post(format!("{}/api/transactions", server.base_url))
        .bearer_auth(&cashier_token)
        .json(&sale_body)
        .send()
        .await
        .expect("sale as cashier");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    let body: Value = resp.json().await.expect("parse");
    assert_eq!(body["message"], "Forbidden");

    // Grant it, then the identical request succeeds.
    let cashier_role = role_id(&server, &admin_token, "Cashier").await;
    let resp = client
        .put(format!("{}/api/rbac/permissions", server.base_url))
        .bearer_auth(&admin_token)
        .json(&json!({
            "roleId": cashier_role,
            "module": "Transactions",
            "action": "create",
            "allowed": true
        }))
        .send()
        .await
        .expect("grant permission");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{}/api/transactions", server.base_url))
        .bearer_auth(&cashier_token)
        .json(&sale_body)
        .send()
        .await
        .expect("sale as cashier after grant");
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = resp.json().await.expect("parse");
    assert!(body["id"].as_i64().is_some());
}

#[tokio::test]
async fn test_unknown_role_is_denied_everything() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // The role string on the account has no Role row: fail closed.
    server.seed_user("hantu", "GhostRole", None);
    let token = server.login("hantu", SUPERADMIN_PASSWORD).await;

    let resp = client
        .post(format!("{}/api/products", server.base_url))
        .bearer_auth(&token)
        .json(&json!({"name": "Obat", "stock": 1}))
        .send()
        .await
        .expect("create as ghost role");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_adjust_stock_add_and_history() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.superadmin_token().await;

    let product_id = create_product(&server, &token, "Amoxicillin", 100).await;

    let resp = client
        .post(format!("{}/api/inventory/adjust", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "productId": product_id,
            "type": "add",
            "quantity": 50,
            "note": "restock from PBF"
        }))
        .send()
        .await
        .expect("adjust stock");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("parse");
    assert_eq!(body["newStock"], 150);

    let history: Value = client
        .get(format!(
            "{}/api/inventory/history?productId={product_id}",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("history")
        .json()
        .await
        .expect("parse history");
    let entries = history.as_array().expect("history array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], "adjustment");
    assert_eq!(entries[0]["quantity_change"], 50);
    assert_eq!(entries[0]["previous_stock"], 100);
    assert_eq!(entries[0]["new_stock"], 150);
}

#[tokio::test]
async fn test_adjust_stock_reduce_beyond_stock_fails_cleanly() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.superadmin_token().await;

    let product_id = create_product(&server, &token, "Betadine", 100).await;

    let resp = client
        .post(format!("{}/api/inventory/adjust", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "productId": product_id,
            "type": "reduce",
            "quantity": 200
        }))
        .send()
        .await
        .expect("adjust stock");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("parse");
    assert_eq!(body["message"], "Insufficient stock");

    assert_eq!(get_product_stock(&server, &token, product_id).await, 100);

    let history: Value = client
        .get(format!(
            "{}/api/inventory/history?productId={product_id}",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("history")
        .json()
        .await
        .expect("parse history");
    assert!(history.as_array().expect("array").is_empty());
}

#[tokio::test]
async fn test_stock_opname_noop_and_rollback() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.superadmin_token().await;

    let product_id = create_product(&server, &token, "OBH Combi", 80).await;

    // Matching counts are a no-op, not an error.
    let resp = client
        .post(format!("{}/api/stock-opname", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "items": [{"id": product_id, "system_stock": 80, "actual_stock": 80}]
        }))
        .send()
        .await
        .expect("opname noop");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(get_product_stock(&server, &token, product_id).await, 80);

    // One unknown product poisons the whole batch.
    let resp = client
        .post(format!("{}/api/stock-opname", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "items": [
                {"id": product_id, "system_stock": 80, "actual_stock": 75},
                {"id": 99999, "system_stock": 10, "actual_stock": 5}
            ]
        }))
        .send()
        .await
        .expect("opname batch");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(get_product_stock(&server, &token, product_id).await, 80);

    // A valid correction applies and lands in the ledger.
    let resp = client
        .post(format!("{}/api/stock-opname", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "items": [{"id": product_id, "system_stock": 80, "actual_stock": 75}],
            "note": "monthly count"
        }))
        .send()
        .await
        .expect("opname valid");
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(get_product_stock(&server, &token, product_id).await, 75);

    let history: Value = client
        .get(format!(
            "{}/api/inventory/history?productId={product_id}",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("history")
        .json()
        .await
        .expect("parse history");
    let entries = history.as_array().expect("array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], "opname");
    assert_eq!(entries[0]["quantity_change"], -5);
}

#[tokio::test]
async fn test_sale_decrements_stock_without_ledger_entry() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.superadmin_token().await;

    let product_id = create_product(&server, &token, "Masker Medis", 3).await;

    // Oversell is permitted: stock goes negative and stays visible.
    let resp = client
        .post(format!("{}/api/transactions", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "items": [{"id": product_id, "quantity": 5, "price": 1000.0}],
            "total_amount": 5000.0
        }))
        .send()
        .await
        .expect("create sale");
    assert_eq!(resp.status(), StatusCode::CREATED);

    assert_eq!(get_product_stock(&server, &token, product_id).await, -2);

    let history: Value = client
        .get(format!(
            "{}/api/inventory/history?productId={product_id}",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("history")
        .json()
        .await
        .expect("parse history");
    assert!(history.as_array().expect("array").is_empty());
}

#[tokio::test]
async fn test_sale_with_empty_cart_is_rejected() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.superadmin_token().await;

    let resp = client
        .post(format!("{}/api/transactions", server.base_url))
        .bearer_auth(&token)
        .json(&json!({"items": [], "total_amount": 0.0}))
        .send()
        .await
        .expect("empty sale");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("parse");
    assert_eq!(body["message"], "Cart is empty");
}

#[tokio::test]
async fn test_role_administration_is_superadmin_only() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let admin_token = server.superadmin_token().await;
    server.seed_user("kasir2", "Cashier", None);
    let cashier_token = server.login("kasir2", SUPERADMIN_PASSWORD).await;

    let resp = client
        .post(format!("{}/api/rbac/roles", server.base_url))
        .bearer_auth(&cashier_token)
        .json(&json!({"name": "Apoteker"}))
        .send()
        .await
        .expect("create role as cashier");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .post(format!("{}/api/rbac/roles", server.base_url))
        .bearer_auth(&admin_token)
        .json(&json!({"name": "Apoteker"}))
        .send()
        .await
        .expect("create role");
    assert_eq!(resp.status(), StatusCode::CREATED);

    // Duplicate role names conflict.
    let resp = client
        .post(format!("{}/api/rbac/roles", server.base_url))
        .bearer_auth(&admin_token)
        .json(&json!({"name": "Apoteker"}))
        .send()
        .await
        .expect("duplicate role");
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // The superadmin role row itself is protected.
    let superadmin_role = role_id(&server, &admin_token, "superadmin").await;
    let resp = client
        .delete(format!(
            "{}/api/rbac/roles/{superadmin_role}",
            server.base_url
        ))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("delete superadmin role");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_bulk_permission_update_applies_whole_grid() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.superadmin_token().await;

    let cashier_role = role_id(&server, &token, "Cashier").await;
    let resp = client
        .put(format!("{}/api/rbac/permissions", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "roleId": cashier_role,
            "permissions": [
                {"module": "Products", "create": true, "edit": true, "delete": false, "show": true},
                {"module": "Stock", "create": false, "edit": true, "delete": false, "show": true}
            ]
        }))
        .send()
        .await
        .expect("bulk update");
    assert_eq!(resp.status(), StatusCode::OK);

    let grid: Value = client
        .get(format!(
            "{}/api/rbac/permissions?roleId={cashier_role}",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("get permissions")
        .json()
        .await
        .expect("parse grid");
    let products = grid
        .as_array()
        .expect("grid array")
        .iter()
        .find(|p| p["module"] == "Products")
        .expect("products row");
    assert_eq!(products["create"], true);
    assert_eq!(products["edit"], true);
    assert_eq!(products["delete"], false);
    assert_eq!(products["show"], true);
}

#[tokio::test]
async fn test_user_self_protection_rules() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let admin_token = server.superadmin_token().await;

    // Grant Users CRUD to Cashier so a non-superadmin can reach the handlers.
    let cashier_role = role_id(&server, &admin_token, "Cashier").await;
    client
        .put(format!("{}/api/rbac/permissions", server.base_url))
        .bearer_auth(&admin_token)
        .json(&json!({
            "roleId": cashier_role,
            "permissions": [
                {"module": "Users", "create": true, "edit": true, "delete": true, "show": true}
            ]
        }))
        .send()
        .await
        .expect("grant users module");

    server.seed_user("kasir3", "Cashier", None);
    let cashier_token = server.login("kasir3", SUPERADMIN_PASSWORD).await;

    // A non-superadmin cannot mint a superadmin account.
    let resp = client
        .post(format!("{}/api/users", server.base_url))
        .bearer_auth(&cashier_token)
        .json(&json!({
            "username": "evil-admin",
            "password": "apapun123",
            "role": "superadmin"
        }))
        .send()
        .await
        .expect("escalate create");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Nor edit or delete an existing one.
    let superadmin: Value = client
        .get(format!("{}/api/users?search=superadmin", server.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("find superadmin")
        .json()
        .await
        .expect("parse users");
    let superadmin_id = superadmin["data"][0]["id"].as_i64().expect("id");

    let resp = client
        .delete(format!("{}/api/users/{superadmin_id}", server.base_url))
        .bearer_auth(&cashier_token)
        .send()
        .await
        .expect("delete superadmin as cashier");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // Nobody deletes their own account, superadmin included.
    let resp = client
        .delete(format!("{}/api/users/{superadmin_id}", server.base_url))
        .bearer_auth(&admin_token)
        .send()
        .await
        .expect("self delete");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_outlet_referential_guard() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.superadmin_token().await;

    let outlet: Value = client
        .post(format!("{}/api/outlets", server.base_url))
        .bearer_auth(&token)
        .json(&json!({"name": "Cabang XYZ", "location": "Baktiseraga"}))
        .send()
        .await
        .expect("create outlet")
        .json()
        .await
        .expect("parse outlet");
    let outlet_id = outlet["id"].as_i64().expect("outlet id");
    assert_eq!(outlet["status"], "Active");

    server.seed_user("kasir4", "Cashier", Some(outlet_id));

    let resp = client
        .delete(format!("{}/api/outlets/{outlet_id}", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("delete outlet in use");
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_products_pagination_shape() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.superadmin_token().await;

    for i in 0..12 {
        create_product(&server, &token, &format!("Obat {i:02}"), 10).await;
    }

    let body: Value = client
        .get(format!(
            "{}/api/products?page=2&limit=5",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("list products")
        .json()
        .await
        .expect("parse list");

    assert_eq!(body["data"].as_array().expect("data").len(), 5);
    assert_eq!(body["pagination"]["total"], 12);
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["limit"], 5);
    assert_eq!(body["pagination"]["totalPages"], 3);
}

#[tokio::test]
async fn test_reports_reflect_sales_and_opname() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.superadmin_token().await;

    let product_id = create_product(&server, &token, "Paracetamol", 100).await;

    client
        .post(format!("{}/api/transactions", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "items": [{"id": product_id, "quantity": 10, "price": 800.0}],
            "total_amount": 8000.0
        }))
        .send()
        .await
        .expect("create sale");

    // Shrinkage of 5 units at cost 500 adds 2500 to COGS.
    client
        .post(format!("{}/api/stock-opname", server.base_url))
        .bearer_auth(&token)
        .json(&json!({
            "items": [{"id": product_id, "system_stock": 90, "actual_stock": 85}]
        }))
        .send()
        .await
        .expect("opname");

    let now = chrono::Utc::now();
    let pl: Value = client
        .get(format!(
            "{}/api/financial/profit-loss?month={}&year={}",
            server.base_url,
            now.format("%m"),
            now.format("%Y")
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("profit loss")
        .json()
        .await
        .expect("parse profit loss");

    assert_eq!(pl["revenue"]["total"], 8000.0);
    assert_eq!(pl["cogs"]["total"], 5000.0 + 2500.0);
    assert_eq!(pl["gross_profit"], 8000.0 - 7500.0);
    assert_eq!(pl["net_profit"], pl["gross_profit"]);

    let balance: Value = client
        .get(format!("{}/api/reports/balance", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("balance")
        .json()
        .await
        .expect("parse balance");

    let assets = balance["assets"]["total"].as_f64().expect("assets");
    let liabilities = balance["liabilities"]["total"].as_f64().expect("liabilities");
    let equity = balance["equity"]["total"].as_f64().expect("equity");
    assert!((assets - (liabilities + equity)).abs() < 1e-6);
    assert_eq!(balance["assets"]["cash"], 8000.0);

    let dashboard: Value = client
        .get(format!("{}/api/dashboard", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("dashboard")
        .json()
        .await
        .expect("parse dashboard");
    assert!(dashboard["stockRecommendations"].is_array());
    assert_eq!(dashboard["earnings"].as_array().expect("earnings").len(), 4);

    let start = now.format("%Y-%m-%d").to_string();
    let report: Value = client
        .get(format!(
            "{}/api/reports/transactions?startDate={start}&endDate={start}",
            server.base_url
        ))
        .bearer_auth(&token)
        .send()
        .await
        .expect("transactions report")
        .json()
        .await
        .expect("parse report");
    let transactions = report["transactions"].as_array().expect("transactions");
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["items"][0]["product_name"], "Paracetamol");
}

#[tokio::test]
async fn test_settings_roundtrip_and_modules_list() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.superadmin_token().await;

    let settings: Value = client
        .get(format!("{}/api/settings", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("get settings")
        .json()
        .await
        .expect("parse settings");
    assert_eq!(settings["ppn_rate"], 0.0);

    let resp = client
        .put(format!("{}/api/settings", server.base_url))
        .bearer_auth(&token)
        .json(&json!({"ppn_rate": 11.0, "discount_rate": 2.5}))
        .send()
        .await
        .expect("update settings");
    assert_eq!(resp.status(), StatusCode::OK);

    let settings: Value = client
        .get(format!("{}/api/settings", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("get settings again")
        .json()
        .await
        .expect("parse settings");
    assert_eq!(settings["ppn_rate"], 11.0);
    assert_eq!(settings["discount_rate"], 2.5);

    let modules: Value = client
        .get(format!("{}/api/rbac/modules", server.base_url))
        .bearer_auth(&token)
        .send()
        .await
        .expect("modules")
        .json()
        .await
        .expect("parse modules");
    let modules = modules.as_array().expect("modules array");
    assert_eq!(modules.len(), 11);
    assert!(modules.contains(&json!("Stock Opname")));
}
