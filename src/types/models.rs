use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{Action, Module};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outlet {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlet_id: Option<i64>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RolePermission {
    pub role_id: i64,
    pub module: Module,
    pub action: Action,
    pub allowed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub stock: i64,
    pub cost_price: f64,
    pub selling_price: f64,
    pub unit: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expired_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: i64,
    pub name: String,
    pub contact_person: String,
    pub phone: String,
    pub address: String,
}

/// A persisted sale. `total_amount` is the figure the cashier submitted, not
/// a server-side recomputation of the item lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlet_id: Option<i64>,
    pub total_amount: f64,
    pub transaction_date: DateTime<Utc>,
}

/// A sale line. `price` is copied from the product at sale time so later
/// price edits never rewrite history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: i64,
    pub transaction_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub price: f64,
}

/// Why a stock quantity changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryType {
    Sale,
    Restock,
    Opname,
    Adjustment,
}

impl HistoryType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            HistoryType::Sale => "sale",
            HistoryType::Restock => "restock",
            HistoryType::Opname => "opname",
            HistoryType::Adjustment => "adjustment",
        }
    }

    pub fn parse(s: &str) -> Option<HistoryType> {
        match s {
            "sale" => Some(HistoryType::Sale),
            "restock" => Some(HistoryType::Restock),
            "opname" => Some(HistoryType::Opname),
            "adjustment" => Some(HistoryType::Adjustment),
            _ => None,
        }
    }
}

/// One append-only ledger row. Invariant at write time:
/// `new_stock = previous_stock + quantity_change`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryHistory {
    pub id: i64,
    pub product_id: i64,
    #[serde(rename = "type")]
    pub entry_type: HistoryType,
    pub quantity_change: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Direction of a manual stock adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockDirection {
    Add,
    Reduce,
}

/// Global transaction settings, a single row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Settings {
    pub ppn_rate: f64,
    pub discount_rate: f64,
}

/// Product fields as submitted on create/update.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub stock: i64,
    #[serde(default)]
    pub cost_price: f64,
    #[serde(default)]
    pub selling_price: f64,
    #[serde(default)]
    pub unit: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub expired_date: Option<NaiveDate>,
}

/// Supplier fields as submitted on create/update.
#[derive(Debug, Clone, Deserialize)]
pub struct SupplierInput {
    pub name: String,
    #[serde(default)]
    pub contact_person: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// One sale line joined with its product name, for reports.
#[derive(Debug, Clone, Serialize)]
pub struct SaleItemLine {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub price: f64,
}

/// A sale joined with its outlet name and item lines, for reports.
#[derive(Debug, Clone, Serialize)]
pub struct SaleWithItems {
    pub id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlet_name: Option<String>,
    pub total_amount: f64,
    pub transaction_date: DateTime<Utc>,
    pub items: Vec<SaleItemLine>,
}

/// Dashboard: a product running low.
#[derive(Debug, Clone, Serialize)]
pub struct StockRecommendation {
    pub name: String,
    pub count: i64,
}

/// Dashboard: one revenue bucket of the weekly earnings series.
#[derive(Debug, Clone, Serialize)]
pub struct EarningsBucket {
    pub name: String,
    pub value: f64,
}

/// Dashboard: an outlet with its cashier roster.
#[derive(Debug, Clone, Serialize)]
pub struct OutletRoster {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub cashiers: Vec<String>,
}

/// Dashboard: one cashier with the outlet they are assigned to.
#[derive(Debug, Clone, Serialize)]
pub struct CashierEntry {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlet_name: Option<String>,
}

/// One item of a stock-opname submission. `system_stock` is the value the
/// counter saw when the sheet was printed, not a live read.
#[derive(Debug, Clone, Deserialize)]
pub struct OpnameItem {
    pub id: i64,
    pub system_stock: i64,
    pub actual_stock: i64,
}

/// One line of a sale submission.
#[derive(Debug, Clone, Deserialize)]
pub struct SaleLine {
    pub id: i64,
    pub quantity: i64,
    pub price: f64,
}
