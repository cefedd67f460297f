use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{Connection, OptionalExtension, params};

use super::Store;
use super::schema::{SCHEMA, SEED};
use crate::error::{Error, Result};
use crate::types::*;

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

fn map_user_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        role: row.get(3)?,
        outlet_id: row.get(4)?,
        status: row.get(5)?,
    })
}

fn map_product_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Product> {
    Ok(Product {
        id: row.get(0)?,
        name: row.get(1)?,
        stock: row.get(2)?,
        cost_price: row.get(3)?,
        selling_price: row.get(4)?,
        unit: row.get(5)?,
        category: row.get(6)?,
        expired_date: row.get::<_, Option<String>>(7)?.and_then(|s| parse_date(&s)),
    })
}

fn map_supplier_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Supplier> {
    Ok(Supplier {
        id: row.get(0)?,
        name: row.get(1)?,
        contact_person: row.get(2)?,
        phone: row.get(3)?,
        address: row.get(4)?,
    })
}

const USER_COLS: &str = "id, username, password_hash, role, outlet_id, status";
const PRODUCT_COLS: &str =
    "id, name, stock, cost_price, selling_price, unit, category, expired_date";
const SUPPLIER_COLS: &str = "id, name, contact_person, phone, address";

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA)?;
        conn.execute_batch(SEED)?;
        Ok(())
    }

    // Outlet operations

    fn create_outlet(&self, name: &str, location: &str) -> Result<Outlet> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO outlets (name, location, status) VALUES (?1, ?2, 'Active')",
            params![name, location],
        )?;
        Ok(Outlet {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            location: location.to_string(),
            status: "Active".to_string(),
        })
    }

    fn get_outlet(&self, id: i64) -> Result<Option<Outlet>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name, location, status FROM outlets WHERE id = ?1",
            params![id],
            |row| {
                Ok(Outlet {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    location: row.get(2)?,
                    status: row.get(3)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_outlets(&self) -> Result<Vec<Outlet>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, location, status FROM outlets ORDER BY id")?;

        let rows = stmt.query_map([], |row| {
            Ok(Outlet {
                id: row.get(0)?,
                name: row.get(1)?,
                location: row.get(2)?,
                status: row.get(3)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_outlet(&self, outlet: &Outlet) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE outlets SET name = ?1, location = ?2, status = ?3 WHERE id = ?4",
            params![outlet.name, outlet.location, outlet.status, outlet.id],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_outlet(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM outlets WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn outlet_in_use(&self, id: i64) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT (SELECT COUNT(*) FROM users WHERE outlet_id = ?1)
                  + (SELECT COUNT(*) FROM transactions WHERE outlet_id = ?1)",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // User operations

    fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
        outlet_id: Option<i64>,
        status: &str,
    ) -> Result<User> {
        let conn = self.conn();
        let result = conn.execute(
            "INSERT INTO users (username, password_hash, role, outlet_id, status)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![username, password_hash, role, outlet_id, status],
        );

        match result {
            Ok(_) => Ok(User {
                id: conn.last_insert_rowid(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                role: role.to_string(),
                outlet_id,
                status: status.to_string(),
            }),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE id = ?1"),
            params![id],
            map_user_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLS} FROM users WHERE username = ?1"),
            params![username],
            map_user_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self, page: i64, limit: i64, search: &str) -> Result<(Vec<User>, i64)> {
        let conn = self.conn();
        let pattern = format!("%{search}%");

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE username LIKE ?1",
            params![pattern],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {USER_COLS} FROM users WHERE username LIKE ?1
             ORDER BY id LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(params![pattern, limit, (page - 1) * limit], map_user_row)?;

        let users = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((users, total))
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let result = self.conn().execute(
            "UPDATE users SET username = ?1, password_hash = ?2, role = ?3, outlet_id = ?4, status = ?5
             WHERE id = ?6",
            params![
                user.username,
                user.password_hash,
                user.role,
                user.outlet_id,
                user.status,
                user.id
            ],
        );

        match result {
            Ok(0) => Err(Error::NotFound),
            Ok(_) => Ok(()),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn delete_user(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM users WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn has_superadmin(&self) -> Result<bool> {
        let conn = self.conn();
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1",
            params![SUPERADMIN_ROLE],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    // Role operations

    fn create_role(&self, name: &str) -> Result<Role> {
        let conn = self.conn();
        let result = conn.execute("INSERT INTO roles (name) VALUES (?1)", params![name]);

        match result {
            Ok(_) => Ok(Role {
                id: conn.last_insert_rowid(),
                name: name.to_string(),
            }),
            Err(e) if is_constraint_violation(&e) => Err(Error::AlreadyExists),
            Err(e) => Err(Error::from(e)),
        }
    }

    fn get_role(&self, id: i64) -> Result<Option<Role>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name FROM roles WHERE id = ?1",
            params![id],
            |row| {
                Ok(Role {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn get_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let conn = self.conn();
        conn.query_row(
            "SELECT id, name FROM roles WHERE name = ?1",
            params![name],
            |row| {
                Ok(Role {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_roles(&self) -> Result<Vec<Role>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name FROM roles ORDER BY name")?;

        let rows = stmt.query_map([], |row| {
            Ok(Role {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn delete_role(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM roles WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Permission matrix operations

    fn get_permission(&self, role_id: i64, module: Module, action: Action) -> Result<bool> {
        let conn = self.conn();
        let allowed: Option<bool> = conn
            .query_row(
                "SELECT allowed FROM role_permissions
                 WHERE role_id = ?1 AND module = ?2 AND action = ?3",
                params![role_id, module.as_str(), action.as_str()],
                |row| row.get(0),
            )
            .optional()?;
        // A missing row means the permission was never granted.
        Ok(allowed.unwrap_or(false))
    }

    fn list_role_permissions(&self, role_id: i64) -> Result<Vec<RolePermission>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT module, action, allowed FROM role_permissions
             WHERE role_id = ?1 ORDER BY module, action",
        )?;

        let rows = stmt.query_map(params![role_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, bool>(2)?,
            ))
        })?;

        let mut perms = Vec::new();
        for row in rows {
            let (module, action, allowed) = row?;
            // Rows with names outside the closed enums are skipped rather
            // than failing the whole listing.
            let (Some(module), Some(action)) = (Module::parse(&module), Action::parse(&action))
            else {
                tracing::warn!("Ignoring unknown permission row: {module}/{action}");
                continue;
            };
            perms.push(RolePermission {
                role_id,
                module,
                action,
                allowed,
            });
        }
        Ok(perms)
    }

    fn upsert_role_permission(
        &self,
        role_id: i64,
        module: Module,
        action: Action,
        allowed: bool,
    ) -> Result<()> {
        self.conn().execute(
            "INSERT INTO role_permissions (role_id, module, action, allowed)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (role_id, module, action) DO UPDATE SET
                allowed = excluded.allowed",
            params![role_id, module.as_str(), action.as_str(), allowed],
        )?;
        Ok(())
    }

    fn set_role_permissions(&self, role_id: i64, perms: &[(Module, Action, bool)]) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        for (module, action, allowed) in perms {
            tx.execute(
                "INSERT INTO role_permissions (role_id, module, action, allowed)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (role_id, module, action) DO UPDATE SET
                    allowed = excluded.allowed",
                params![role_id, module.as_str(), action.as_str(), allowed],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    // Product operations

    fn create_product(&self, input: &ProductInput) -> Result<Product> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO products (name, stock, cost_price, selling_price, unit, category, expired_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                input.name,
                input.stock,
                input.cost_price,
                input.selling_price,
                input.unit,
                input.category,
                input.expired_date.map(|d| d.to_string()),
            ],
        )?;
        Ok(Product {
            id: conn.last_insert_rowid(),
            name: input.name.clone(),
            stock: input.stock,
            cost_price: input.cost_price,
            selling_price: input.selling_price,
            unit: input.unit.clone(),
            category: input.category.clone(),
            expired_date: input.expired_date,
        })
    }

    fn get_product(&self, id: i64) -> Result<Option<Product>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {PRODUCT_COLS} FROM products WHERE id = ?1"),
            params![id],
            map_product_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_products(&self, page: i64, limit: i64, search: &str) -> Result<(Vec<Product>, i64)> {
        let conn = self.conn();
        let pattern = format!("%{search}%");

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM products WHERE name LIKE ?1 OR category LIKE ?1",
            params![pattern],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {PRODUCT_COLS} FROM products
             WHERE name LIKE ?1 OR category LIKE ?1
             ORDER BY id LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(params![pattern, limit, (page - 1) * limit], map_product_row)?;

        let products = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((products, total))
    }

    fn update_product(&self, id: i64, input: &ProductInput) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE products SET name = ?1, stock = ?2, cost_price = ?3, selling_price = ?4,
                    unit = ?5, category = ?6, expired_date = ?7
             WHERE id = ?8",
            params![
                input.name,
                input.stock,
                input.cost_price,
                input.selling_price,
                input.unit,
                input.category,
                input.expired_date.map(|d| d.to_string()),
                id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_product(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM products WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Supplier operations

    fn create_supplier(&self, input: &SupplierInput) -> Result<Supplier> {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO suppliers (name, contact_person, phone, address)
             VALUES (?1, ?2, ?3, ?4)",
            params![input.name, input.contact_person, input.phone, input.address],
        )?;
        Ok(Supplier {
            id: conn.last_insert_rowid(),
            name: input.name.clone(),
            contact_person: input.contact_person.clone(),
            phone: input.phone.clone(),
            address: input.address.clone(),
        })
    }

    fn get_supplier(&self, id: i64) -> Result<Option<Supplier>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SUPPLIER_COLS} FROM suppliers WHERE id = ?1"),
            params![id],
            map_supplier_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_suppliers(&self, page: i64, limit: i64, search: &str) -> Result<(Vec<Supplier>, i64)> {
        let conn = self.conn();
        let pattern = format!("%{search}%");

        let total: i64 = conn.query_row(
            "SELECT COUNT(*) FROM suppliers WHERE name LIKE ?1",
            params![pattern],
            |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {SUPPLIER_COLS} FROM suppliers WHERE name LIKE ?1
             ORDER BY id LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt.query_map(params![pattern, limit, (page - 1) * limit], map_supplier_row)?;

        let suppliers = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        Ok((suppliers, total))
    }

    fn update_supplier(&self, id: i64, input: &SupplierInput) -> Result<()> {
        let rows = self.conn().execute(
            "UPDATE suppliers SET name = ?1, contact_person = ?2, phone = ?3, address = ?4
             WHERE id = ?5",
            params![
                input.name,
                input.contact_person,
                input.phone,
                input.address,
                id
            ],
        )?;

        if rows == 0 {
            return Err(Error::NotFound);
        }
        Ok(())
    }

    fn delete_supplier(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM suppliers WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Inventory ledger operations

    fn adjust_stock(
        &self,
        product_id: i64,
        direction: StockDirection,
        quantity: i64,
        note: Option<&str>,
    ) -> Result<i64> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let current: i64 = tx
            .query_row(
                "SELECT stock FROM products WHERE id = ?1",
                params![product_id],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(Error::NotFound)?;

        let new_stock = match direction {
            StockDirection::Add => {
                tx.execute(
                    "UPDATE products SET stock = stock + ?2 WHERE id = ?1",
                    params![product_id, quantity],
                )?;
                current + quantity
            }
            StockDirection::Reduce => {
                // Conditional form keeps the sufficiency check atomic with the
                // write; zero affected rows means the stock was too low.
                let rows = tx.execute(
                    "UPDATE products SET stock = stock - ?2 WHERE id = ?1 AND stock >= ?2",
                    params![product_id, quantity],
                )?;
                if rows == 0 {
                    return Err(Error::InsufficientStock);
                }
                current - quantity
            }
        };

        let change = match direction {
            StockDirection::Add => quantity,
            StockDirection::Reduce => -quantity,
        };
        tx.execute(
            "INSERT INTO inventory_history
                (product_id, type, quantity_change, previous_stock, new_stock, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                product_id,
                HistoryType::Adjustment.as_str(),
                change,
                current,
                new_stock,
                note,
                format_datetime(&Utc::now()),
            ],
        )?;

        tx.commit()?;
        Ok(new_stock)
    }

    fn stock_opname(&self, items: &[OpnameItem], note: Option<&str>) -> Result<()> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        for item in items {
            if item.actual_stock == item.system_stock {
                continue;
            }

            let rows = tx.execute(
                "UPDATE products SET stock = ?2 WHERE id = ?1",
                params![item.id, item.actual_stock],
            )?;
            if rows == 0 {
                return Err(Error::NotFound);
            }

            tx.execute(
                "INSERT INTO inventory_history
                    (product_id, type, quantity_change, previous_stock, new_stock, note, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    item.id,
                    HistoryType::Opname.as_str(),
                    item.actual_stock - item.system_stock,
                    item.system_stock,
                    item.actual_stock,
                    note,
                    format_datetime(&Utc::now()),
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn list_inventory_history(
        &self,
        product_id: Option<i64>,
        limit: i64,
    ) -> Result<Vec<InventoryHistory>> {
        let conn = self.conn();

        let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<(InventoryHistory, String)> {
            Ok((
                InventoryHistory {
                    id: row.get(0)?,
                    product_id: row.get(1)?,
                    entry_type: HistoryType::Adjustment,
                    quantity_change: row.get(3)?,
                    previous_stock: row.get(4)?,
                    new_stock: row.get(5)?,
                    note: row.get(6)?,
                    created_at: parse_datetime(&row.get::<_, String>(7)?),
                },
                row.get(2)?,
            ))
        };

        let raw = match product_id {
            Some(pid) => {
                let mut stmt = conn.prepare(
                    "SELECT id, product_id, type, quantity_change, previous_stock, new_stock, note, created_at
                     FROM inventory_history WHERE product_id = ?1
                     ORDER BY id DESC LIMIT ?2",
                )?;
                let rows = stmt.query_map(params![pid, limit], map_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
            None => {
                let mut stmt = conn.prepare(
                    "SELECT id, product_id, type, quantity_change, previous_stock, new_stock, note, created_at
                     FROM inventory_history ORDER BY id DESC LIMIT ?1",
                )?;
                let rows = stmt.query_map(params![limit], map_row)?;
                rows.collect::<std::result::Result<Vec<_>, _>>()?
            }
        };

        let mut entries = Vec::with_capacity(raw.len());
        for (mut entry, type_str) in raw {
            entry.entry_type = HistoryType::parse(&type_str).ok_or_else(|| {
                Error::BadRequest(format!("unknown history type '{type_str}' in database"))
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }

    // Sale operations

    fn create_sale(
        &self,
        outlet_id: Option<i64>,
        items: &[SaleLine],
        total_amount: f64,
    ) -> Result<i64> {
        if items.is_empty() {
            return Err(Error::EmptyCart);
        }

        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO transactions (outlet_id, total_amount, transaction_date)
             VALUES (?1, ?2, ?3)",
            params![outlet_id, total_amount, format_datetime(&Utc::now())],
        )?;
        let sale_id = tx.last_insert_rowid();

        for line in items {
            // No sufficiency check and no ledger row on this path: stock is
            // allowed to go negative as a visible oversell signal.
            let rows = tx.execute(
                "UPDATE products SET stock = stock - ?2 WHERE id = ?1",
                params![line.id, line.quantity],
            )?;
            if rows == 0 {
                return Err(Error::NotFound);
            }

            tx.execute(
                "INSERT INTO transaction_items (transaction_id, product_id, quantity, price)
                 VALUES (?1, ?2, ?3, ?4)",
                params![sale_id, line.id, line.quantity, line.price],
            )?;
        }

        tx.commit()?;
        Ok(sale_id)
    }

    fn list_recent_sales(&self, limit: i64) -> Result<Vec<SaleWithItems>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT t.id, o.name, t.total_amount, t.transaction_date
             FROM transactions t
             LEFT JOIN outlets o ON t.outlet_id = o.id
             ORDER BY t.id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit], |row| {
            Ok(SaleWithItems {
                id: row.get(0)?,
                outlet_name: row.get(1)?,
                total_amount: row.get(2)?,
                transaction_date: parse_datetime(&row.get::<_, String>(3)?),
                items: Vec::new(),
            })
        })?;
        let mut sales = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        for sale in &mut sales {
            sale.items = sale_items(&conn, sale.id)?;
        }
        Ok(sales)
    }

    fn list_sales_between(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<SaleWithItems>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT t.id, o.name, t.total_amount, t.transaction_date
             FROM transactions t
             LEFT JOIN outlets o ON t.outlet_id = o.id
             WHERE date(t.transaction_date) >= ?1 AND date(t.transaction_date) <= ?2
             ORDER BY t.transaction_date",
        )?;
        let rows = stmt.query_map(params![start.to_string(), end.to_string()], |row| {
            Ok(SaleWithItems {
                id: row.get(0)?,
                outlet_name: row.get(1)?,
                total_amount: row.get(2)?,
                transaction_date: parse_datetime(&row.get::<_, String>(3)?),
                items: Vec::new(),
            })
        })?;
        let mut sales = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        for sale in &mut sales {
            sale.items = sale_items(&conn, sale.id)?;
        }
        Ok(sales)
    }

    // Reporting aggregates

    fn lowest_stock_products(&self, limit: i64) -> Result<Vec<StockRecommendation>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT name, stock FROM products ORDER BY stock ASC, name LIMIT ?1")?;

        let rows = stmt.query_map(params![limit], |row| {
            Ok(StockRecommendation {
                name: row.get(0)?,
                count: row.get(1)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn weekly_revenue(&self, weeks: i64) -> Result<Vec<EarningsBucket>> {
        let conn = self.conn();
        let today = Utc::now().date_naive();

        let mut buckets = Vec::with_capacity(weeks as usize);
        for i in (0..weeks).rev() {
            let end = today - Duration::days(7 * i);
            let start = end - Duration::days(6);

            let value: f64 = conn.query_row(
                "SELECT COALESCE(SUM(total_amount), 0) FROM transactions
                 WHERE date(transaction_date) >= ?1 AND date(transaction_date) <= ?2",
                params![start.to_string(), end.to_string()],
                |row| row.get(0),
            )?;

            buckets.push(EarningsBucket {
                name: start.format("%d %b").to_string(),
                value,
            });
        }
        Ok(buckets)
    }

    fn outlets_with_cashiers(&self) -> Result<Vec<OutletRoster>> {
        let conn = self.conn();
        let mut stmt =
            conn.prepare("SELECT id, name, location FROM outlets ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(OutletRoster {
                id: row.get(0)?,
                name: row.get(1)?,
                location: row.get(2)?,
                cashiers: Vec::new(),
            })
        })?;
        let mut outlets = rows.collect::<std::result::Result<Vec<_>, _>>()?;

        let mut stmt = conn.prepare(
            "SELECT username FROM users
             WHERE outlet_id = ?1 AND lower(role) = 'cashier'
             ORDER BY username",
        )?;
        for outlet in &mut outlets {
            let rows = stmt.query_map(params![outlet.id], |row| row.get(0))?;
            outlet.cashiers = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        }
        Ok(outlets)
    }

    fn cashier_roster(&self) -> Result<Vec<CashierEntry>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT u.id, u.username, o.name
             FROM users u
             LEFT JOIN outlets o ON u.outlet_id = o.id
             WHERE lower(u.role) = 'cashier'
             ORDER BY u.username",
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(CashierEntry {
                id: row.get(0)?,
                username: row.get(1)?,
                outlet_name: row.get(2)?,
            })
        })?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn revenue_between(&self, start: NaiveDate, end: NaiveDate) -> Result<f64> {
        let conn = self.conn();
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(total_amount), 0) FROM transactions
             WHERE date(transaction_date) >= ?1 AND date(transaction_date) <= ?2",
            params![start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn cogs_between(&self, start: NaiveDate, end: NaiveDate) -> Result<f64> {
        let conn = self.conn();
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(ti.quantity * p.cost_price), 0)
             FROM transaction_items ti
             JOIN transactions t ON ti.transaction_id = t.id
             JOIN products p ON ti.product_id = p.id
             WHERE date(t.transaction_date) >= ?1 AND date(t.transaction_date) <= ?2",
            params![start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn opname_variance_between(&self, start: NaiveDate, end: NaiveDate) -> Result<f64> {
        let conn = self.conn();
        // A negative quantity_change is shrinkage: its cost is positive.
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(-h.quantity_change * p.cost_price), 0)
             FROM inventory_history h
             JOIN products p ON h.product_id = p.id
             WHERE h.type = 'opname'
               AND date(h.created_at) >= ?1 AND date(h.created_at) <= ?2",
            params![start.to_string(), end.to_string()],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn inventory_value(&self) -> Result<f64> {
        let conn = self.conn();
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(stock * cost_price), 0) FROM products",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn revenue_total(&self) -> Result<f64> {
        let conn = self.conn();
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(total_amount), 0) FROM transactions",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    fn cogs_total(&self) -> Result<f64> {
        let conn = self.conn();
        let total: f64 = conn.query_row(
            "SELECT COALESCE(SUM(ti.quantity * p.cost_price), 0)
             FROM transaction_items ti
             JOIN products p ON ti.product_id = p.id",
            [],
            |row| row.get(0),
        )?;
        Ok(total)
    }

    // Settings operations

    fn get_settings(&self) -> Result<Settings> {
        let conn = self.conn();
        let settings = conn
            .query_row(
                "SELECT ppn_rate, discount_rate FROM settings WHERE id = 1",
                [],
                |row| {
                    Ok(Settings {
                        ppn_rate: row.get(0)?,
                        discount_rate: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(settings.unwrap_or(Settings {
            ppn_rate: 0.0,
            discount_rate: 0.0,
        }))
    }

    fn update_settings(&self, settings: &Settings) -> Result<()> {
        self.conn().execute(
            "INSERT INTO settings (id, ppn_rate, discount_rate) VALUES (1, ?1, ?2)
             ON CONFLICT (id) DO UPDATE SET
                ppn_rate = excluded.ppn_rate,
                discount_rate = excluded.discount_rate",
            params![settings.ppn_rate, settings.discount_rate],
        )?;
        Ok(())
    }
}

fn sale_items(conn: &Connection, sale_id: i64) -> Result<Vec<SaleItemLine>> {
    let mut stmt = conn.prepare(
        "SELECT ti.product_id, p.name, ti.quantity, ti.price
         FROM transaction_items ti
         JOIN products p ON ti.product_id = p.id
         WHERE ti.transaction_id = ?1
         ORDER BY ti.id",
    )?;

    let rows = stmt.query_map(params![sale_id], |row| {
        Ok(SaleItemLine {
            product_id: row.get(0)?,
            product_name: row.get(1)?,
            quantity: row.get(2)?,
            price: row.get(3)?,
        })
    })?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}
