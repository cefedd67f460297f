use std::fmt;

use serde::{Deserialize, Serialize};

/// A functional area of the application, the unit of permission granularity.
///
/// The set is closed: permissions reference modules by their display name,
/// and unknown names never resolve to a module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Module {
    Products,
    Stock,
    Outlets,
    Transactions,
    Users,
    SalesReport,
    Forecasting,
    Substitutions,
    Suppliers,
    StockOpname,
    Settings,
}

impl Module {
    pub const ALL: [Module; 11] = [
        Module::Products,
        Module::Stock,
        Module::Outlets,
        Module::Transactions,
        Module::Users,
        Module::SalesReport,
        Module::Forecasting,
        Module::Substitutions,
        Module::Suppliers,
        Module::StockOpname,
        Module::Settings,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Module::Products => "Products",
            Module::Stock => "Stock",
            Module::Outlets => "Outlets",
            Module::Transactions => "Transactions",
            Module::Users => "Users",
            Module::SalesReport => "Sales Report",
            Module::Forecasting => "Forecasting",
            Module::Substitutions => "Substitutions",
            Module::Suppliers => "Suppliers",
            Module::StockOpname => "Stock Opname",
            Module::Settings => "Settings",
        }
    }

    pub fn parse(s: &str) -> Option<Module> {
        Module::ALL.iter().copied().find(|m| m.as_str() == s)
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Module {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Module::parse(&s).ok_or_else(|| format!("unknown module '{s}'"))
    }
}

impl From<Module> for String {
    fn from(m: Module) -> Self {
        m.as_str().to_string()
    }
}

/// An operation on a module. Permission rows exist per (role, module, action).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Edit,
    Delete,
    Show,
}

impl Action {
    pub const ALL: [Action; 4] = [Action::Create, Action::Edit, Action::Delete, Action::Show];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Edit => "edit",
            Action::Delete => "delete",
            Action::Show => "show",
        }
    }

    pub fn parse(s: &str) -> Option<Action> {
        match s {
            "create" => Some(Action::Create),
            "edit" => Some(Action::Edit),
            "delete" => Some(Action::Delete),
            "show" => Some(Action::Show),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The reserved role name that bypasses every permission check.
pub const SUPERADMIN_ROLE: &str = "superadmin";
