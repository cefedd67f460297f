mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::NaiveDate;

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Outlet operations
    fn create_outlet(&self, name: &str, location: &str) -> Result<Outlet>;
    fn get_outlet(&self, id: i64) -> Result<Option<Outlet>>;
    fn list_outlets(&self) -> Result<Vec<Outlet>>;
    fn update_outlet(&self, outlet: &Outlet) -> Result<()>;
    fn delete_outlet(&self, id: i64) -> Result<bool>;
    fn outlet_in_use(&self, id: i64) -> Result<bool>;

    // User operations
    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
        outlet_id: Option<i64>,
        status: &str,
    ) -> Result<User>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn list_users(&self, page: i64, limit: i64, search: &str) -> Result<(Vec<User>, i64)>;
    fn update_user(&self, user: &User) -> Result<()>;
    fn delete_user(&self, id: i64) -> Result<bool>;
    fn has_superadmin(&self) -> Result<bool>;

    // Role operations
    fn create_role(&self, name: &str) -> Result<Role>;
    fn get_role(&self, id: i64) -> Result<Option<Role>>;
    fn get_role_by_name(&self, name: &str) -> Result<Option<Role>>;
    fn list_roles(&self) -> Result<Vec<Role>>;
    fn delete_role(&self, id: i64) -> Result<bool>;

    // Permission matrix operations
    fn get_permission(&self, role_id: i64, module: Module, action: Action) -> Result<bool>;
    fn list_role_permissions(&self, role_id: i64) -> Result<Vec<RolePermission>>;
    fn upsert_role_permission(
        &self,
        role_id: i64,
        module: Module,
        action: Action,
        allowed: bool,
    ) -> Result<()>;
    /// Applies every (module, action, allowed) triple in one transaction;
    /// any failure rolls the whole batch back.
    fn set_role_permissions(&self, role_id: i64, perms: &[(Module, Action, bool)]) -> Result<()>;

    // Product operations
    fn create_product(&self, input: &ProductInput) -> Result<Product>;
    fn get_product(&self, id: i64) -> Result<Option<Product>>;
    fn list_products(&self, page: i64, limit: i64, search: &str) -> Result<(Vec<Product>, i64)>;
    fn update_product(&self, id: i64, input: &ProductInput) -> Result<()>;
    fn delete_product(&self, id: i64) -> Result<bool>;

    // Supplier operations
    fn create_supplier(&self, input: &SupplierInput) -> Result<Supplier>;
    fn get_supplier(&self, id: i64) -> Result<Option<Supplier>>;
    fn list_suppliers(&self, page: i64, limit: i64, search: &str) -> Result<(Vec<Supplier>, i64)>;
    fn update_supplier(&self, id: i64, input: &SupplierInput) -> Result<()>;
    fn delete_supplier(&self, id: i64) -> Result<bool>;

    // Inventory ledger operations
    /// Adjusts stock by a positive quantity in the given direction and appends
    /// one `adjustment` ledger row, all in one transaction. Returns the new
    /// stock value.
    fn adjust_stock(
        &self,
        product_id: i64,
        direction: StockDirection,
        quantity: i64,
        note: Option<&str>,
    ) -> Result<i64>;
    /// Applies a physical-count correction batch in one transaction. Items
    /// whose actual equals system stock are skipped; the rest get an absolute
    /// stock set plus one `opname` ledger row.
    fn stock_opname(&self, items: &[OpnameItem], note: Option<&str>) -> Result<()>;
    fn list_inventory_history(
        &self,
        product_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<InventoryHistory>>;

    // Sale operations
    /// Persists a sale header plus items and decrements product stock, all in
    /// one transaction. Returns the new sale id.
    fn create_sale(
        &self,
        outlet_id: Option<i64>,
        items: &[SaleLine],
        total_amount: f64,
    ) -> Result<i64>;
    fn list_recent_sales(&self, limit: i64) -> Result<Vec<SaleWithItems>>;
    fn list_sales_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<SaleWithItems>>;

    // Reporting aggregates
    fn lowest_stock_products(&self, limit: i64) -> Result<Vec<StockRecommendation>>;
    fn weekly_revenue(&self, weeks: i64) -> Result<Vec<EarningsBucket>>;
    fn outlets_with_cashiers(&self) -> Result<Vec<OutletRoster>>;
    fn cashier_roster(&self) -> Result<Vec<CashierEntry>>;
    fn revenue_between(&self, start: NaiveDate, end: NaiveDate) -> Result<f64>;
    fn cogs_between(&self, start: NaiveDate, end: NaiveDate) -> Result<f64>;
    /// Net cost of opname corrections in the period: stock lost to shrinkage
    /// is positive (adds to COGS), found stock is negative.
    fn opname_variance_between(&self, start: NaiveDate, end: NaiveDate) -> Result<f64>;
    fn inventory_value(&self) -> Result<f64>;
    fn revenue_total(&self) -> Result<f64>;
    fn cogs_total(&self) -> Result<f64>;

    // Settings operations
    fn get_settings(&self) -> Result<Settings>;
    fn update_settings(&self, settings: &Settings) -> Result<()>;
}
