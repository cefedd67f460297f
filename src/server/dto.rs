use serde::{Deserialize, Serialize};

use crate::types::{Action, Module, OpnameItem, SaleLine, StockDirection, User};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub page: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateOutletRequest {
    pub name: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOutletRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub role: String,
    #[serde(default)]
    pub outlet_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub outlet_id: Option<i64>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoleRequest {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PermissionQuery {
    #[serde(default, rename = "roleId")]
    pub role_id: Option<i64>,
    #[serde(default, rename = "roleName")]
    pub role_name: Option<String>,
}

/// One row of the permission matrix as the dashboard renders it: a module
/// with its four action flags.
#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionRecord {
    pub module: Module,
    pub create: bool,
    pub edit: bool,
    pub delete: bool,
    pub show: bool,
}

impl PermissionRecord {
    /// Flattens the record into (action, allowed) pairs.
    #[must_use]
    pub fn actions(&self) -> [(Action, bool); 4] {
        [
            (Action::Create, self.create),
            (Action::Edit, self.edit),
            (Action::Delete, self.delete),
            (Action::Show, self.show),
        ]
    }
}

/// Permission update: either a single (module, action) flag or a bulk
/// `permissions` batch. Exactly one form must be present.
#[derive(Debug, Deserialize)]
pub struct UpdatePermissionsRequest {
    #[serde(rename = "roleId")]
    pub role_id: i64,
    #[serde(default)]
    pub module: Option<Module>,
    #[serde(default)]
    pub action: Option<Action>,
    #[serde(default)]
    pub allowed: Option<bool>,
    #[serde(default)]
    pub permissions: Option<Vec<PermissionRecord>>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    #[serde(rename = "productId")]
    pub product_id: i64,
    #[serde(rename = "type")]
    pub direction: StockDirection,
    pub quantity: i64,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AdjustStockResponse {
    #[serde(rename = "newStock")]
    pub new_stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct StockOpnameRequest {
    pub items: Vec<OpnameItem>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryParams {
    #[serde(default, rename = "productId")]
    pub product_id: Option<i64>,
    #[serde(default)]
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    #[serde(default)]
    pub outlet_id: Option<i64>,
    pub items: Vec<SaleLine>,
    pub total_amount: f64,
}

#[derive(Debug, Serialize)]
pub struct CreateSaleResponse {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct ProfitLossQuery {
    pub month: u32,
    pub year: i32,
}

#[derive(Debug, Deserialize)]
pub struct DateRangeQuery {
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct ReportLine {
    pub label: &'static str,
    pub amount: f64,
}

#[derive(Debug, Serialize)]
pub struct ReportSection {
    pub details: Vec<ReportLine>,
    pub total: f64,
}
