use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::auth::RequireAuth;
use crate::server::AppState;
use crate::server::dto::{DateRangeQuery, ProfitLossQuery, ReportLine, ReportSection};
use crate::server::response::{ApiError, StoreResultExt};
use crate::types::{CashierEntry, EarningsBucket, OutletRoster, SaleWithItems, StockRecommendation};

const DASHBOARD_LOW_STOCK_LIMIT: i64 = 5;
const DASHBOARD_REVENUE_WEEKS: i64 = 4;

#[derive(Debug, Serialize)]
pub struct DashboardResponse {
    #[serde(rename = "stockRecommendations")]
    pub stock_recommendations: Vec<StockRecommendation>,
    pub earnings: Vec<EarningsBucket>,
    pub outlets: Vec<OutletRoster>,
    pub cashiers: Vec<CashierEntry>,
}

pub async fn dashboard(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let response = DashboardResponse {
        stock_recommendations: store
            .lowest_stock_products(DASHBOARD_LOW_STOCK_LIMIT)
            .api_err("Failed to load stock recommendations")?,
        earnings: store
            .weekly_revenue(DASHBOARD_REVENUE_WEEKS)
            .api_err("Failed to load earnings")?,
        outlets: store
            .outlets_with_cashiers()
            .api_err("Failed to load outlets")?,
        cashiers: store
            .cashier_roster()
            .api_err("Failed to load cashiers")?,
    };

    Ok::<_, ApiError>(Json(response))
}

#[derive(Debug, Serialize)]
pub struct ProfitLossResponse {
    pub month: u32,
    pub year: i32,
    pub revenue: ReportSection,
    pub cogs: ReportSection,
    pub gross_profit: f64,
    pub expenses: ReportSection,
    pub net_profit: f64,
}

fn month_bounds(month: u32, year: i32) -> Result<(NaiveDate, NaiveDate), ApiError> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ApiError::bad_request("Invalid month or year"))?;
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| ApiError::bad_request("Invalid month or year"))?;
    Ok((start, next_month - Duration::days(1)))
}

pub async fn profit_loss(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProfitLossQuery>,
) -> impl IntoResponse {
    let (start, end) = month_bounds(params.month, params.year)?;
    let store = state.store.as_ref();

    let revenue = store
        .revenue_between(start, end)
        .api_err("Failed to compute revenue")?;
    let cogs = store
        .cogs_between(start, end)
        .api_err("Failed to compute cost of goods sold")?;
    let variance = store
        .opname_variance_between(start, end)
        .api_err("Failed to compute opname variance")?;

    let total_cogs = cogs + variance;
    let gross_profit = revenue - total_cogs;
    // No expense ledger exists; the section is a fixed placeholder.
    let expenses_total = 0.0;

    let response = ProfitLossResponse {
        month: params.month,
        year: params.year,
        revenue: ReportSection {
            details: vec![ReportLine {
                label: "Sales",
                amount: revenue,
            }],
            total: revenue,
        },
        cogs: ReportSection {
            details: vec![
                ReportLine {
                    label: "Cost of goods sold",
                    amount: cogs,
                },
                ReportLine {
                    label: "Stock opname variance",
                    amount: variance,
                },
            ],
            total: total_cogs,
        },
        gross_profit,
        expenses: ReportSection {
            details: vec![ReportLine {
                label: "Other expenses",
                amount: expenses_total,
            }],
            total: expenses_total,
        },
        net_profit: gross_profit - expenses_total,
    };

    Ok::<_, ApiError>(Json(response))
}

#[derive(Debug, Serialize)]
pub struct BalanceAssets {
    pub cash: f64,
    pub inventory: f64,
    pub receivables: f64,
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct BalanceLiabilities {
    pub payables: f64,
    #[serde(rename = "consignmentDebt")]
    pub consignment_debt: f64,
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct BalanceEquity {
    pub initial: f64,
    #[serde(rename = "capitalChanges")]
    pub capital_changes: f64,
    #[serde(rename = "retainedEarnings")]
    pub retained_earnings: f64,
    pub total: f64,
}

#[derive(Debug, Serialize)]
pub struct BalanceSheetResponse {
    pub assets: BalanceAssets,
    pub liabilities: BalanceLiabilities,
    pub equity: BalanceEquity,
}

/// Current-state snapshot, not a historical statement. Equity is back-solved
/// so Assets = Liabilities + Equity always holds.
pub async fn balance_sheet(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let store = state.store.as_ref();

    let cash = store.revenue_total().api_err("Failed to compute cash")?;
    let inventory = store
        .inventory_value()
        .api_err("Failed to compute inventory value")?;
    let cogs = store
        .cogs_total()
        .api_err("Failed to compute cost of goods sold")?;

    let assets_total = cash + inventory;
    let liabilities_total = 0.0;
    let retained_earnings = cash - cogs;
    let equity_total = assets_total - liabilities_total;

    let response = BalanceSheetResponse {
        assets: BalanceAssets {
            cash,
            inventory,
            receivables: 0.0,
            total: assets_total,
        },
        liabilities: BalanceLiabilities {
            payables: 0.0,
            consignment_debt: 0.0,
            total: liabilities_total,
        },
        equity: BalanceEquity {
            initial: equity_total - retained_earnings,
            capital_changes: 0.0,
            retained_earnings,
            total: equity_total,
        },
    };

    Ok::<_, ApiError>(Json(response))
}

#[derive(Debug, Serialize)]
pub struct TransactionsReportResponse {
    pub transactions: Vec<SaleWithItems>,
}

pub async fn transactions_report(
    _auth: RequireAuth,
    State(state): State<Arc<AppState>>,
    Query(params): Query<DateRangeQuery>,
) -> impl IntoResponse {
    let start = NaiveDate::parse_from_str(&params.start_date, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request("startDate must be YYYY-MM-DD"))?;
    let end = NaiveDate::parse_from_str(&params.end_date, "%Y-%m-%d")
        .map_err(|_| ApiError::bad_request("endDate must be YYYY-MM-DD"))?;
    if end < start {
        return Err(ApiError::bad_request("endDate must not precede startDate"));
    }

    let transactions = state
        .store
        .list_sales_between(start, end)
        .api_err("Failed to list transactions")?;

    Ok::<_, ApiError>(Json(TransactionsReportResponse { transactions }))
}
