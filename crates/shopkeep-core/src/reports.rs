//! # Reports
//!
//! Aggregation over rows the database layer has already fetched.
//!
//! ```text
//!   sales ────┐
//!             ├──► PeriodReport      revenue, gross profit, expenses, net, daily
//!   expenses ─┘
//!
//!   today's sales ─────┐
//!   today's expenses ──┤
//!   customers ─────────┼──► DashboardSummary
//!   stock ─────────────┤
//!   recent sales ──────┘
//! ```
//!
//! A sale belongs to the UTC calendar date of its `created_at`. Expenses
//! carry their own date.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CoreResult;
use crate::money::Money;
use crate::types::{Customer, Expense, Sale, StockItem};
use crate::validation::validate_date_range;
use crate::RECENT_SALES_LIMIT;

// =============================================================================
// Period Report
// =============================================================================

/// Revenue for one day that had at least one sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DailyRevenue {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub revenue: Money,
    pub sale_count: i64,
}

/// Totals for an inclusive date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PeriodReport {
    #[ts(as = "String")]
    pub start: NaiveDate,
    #[ts(as = "String")]
    pub end: NaiveDate,
    pub revenue: Money,
    pub gross_profit: Money,
    pub expenses: Money,
    /// Gross profit minus expenses. Negative in a loss-making period.
    pub net_profit: Money,
    pub sale_count: i64,
    pub outstanding_due: Money,
    /// Sorted by date, days without sales omitted.
    pub daily: Vec<DailyRevenue>,
}

impl PeriodReport {
    /// Builds the report. Rows outside `start..=end` are ignored, so callers
    /// may pass a superset.
    pub fn build(
        start: NaiveDate,
        end: NaiveDate,
        sales: &[Sale],
        expenses: &[Expense],
    ) -> CoreResult<Self> {
        validate_date_range(start, end)?;

        let in_range = |date: NaiveDate| date >= start && date <= end;

        let mut revenue = Money::zero();
        let mut gross_profit = Money::zero();
        let mut outstanding_due = Money::zero();
        let mut sale_count = 0;
        let mut by_day: BTreeMap<NaiveDate, (Money, i64)> = BTreeMap::new();

        for sale in sales.iter().filter(|s| in_range(s.date())) {
            revenue += sale.grand_total();
            gross_profit += sale.profit();
            outstanding_due += sale.due();
            sale_count += 1;

            let day = by_day.entry(sale.date()).or_insert((Money::zero(), 0));
            day.0 += sale.grand_total();
            day.1 += 1;
        }

        let expenses: Money = expenses
            .iter()
            .filter(|e| in_range(e.date))
            .map(Expense::amount)
            .sum();

        let daily = by_day
            .into_iter()
            .map(|(date, (revenue, sale_count))| DailyRevenue {
                date,
                revenue,
                sale_count,
            })
            .collect();

        Ok(PeriodReport {
            start,
            end,
            revenue,
            gross_profit,
            expenses,
            net_profit: gross_profit - expenses,
            sale_count,
            outstanding_due,
            daily,
        })
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// The numbers on the home screen.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardSummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub today_revenue: Money,
    pub today_gross_profit: Money,
    pub today_expenses: Money,
    pub today_net_profit: Money,
    pub today_sale_count: i64,
    /// Σ due across all customers.
    pub total_dues: Money,
    /// Σ sale price × stock across all items.
    pub stock_value: Money,
    pub low_stock: Vec<StockItem>,
    pub recent_sales: Vec<Sale>,
}

impl DashboardSummary {
    /// Builds the dashboard for `today`.
    ///
    /// Sales and expenses dated on other days are ignored. `recent` is
    /// re-sorted newest first and cut to [`RECENT_SALES_LIMIT`].
    pub fn build(
        today: NaiveDate,
        sales: &[Sale],
        expenses: &[Expense],
        customers: &[Customer],
        stock: &[StockItem],
        mut recent: Vec<Sale>,
    ) -> Self {
        let todays: Vec<&Sale> = sales.iter().filter(|s| s.date() == today).collect();

        let today_revenue: Money = todays.iter().map(|s| s.grand_total()).sum();
        let today_gross_profit: Money = todays.iter().map(|s| s.profit()).sum();
        let today_expenses: Money = expenses
            .iter()
            .filter(|e| e.date == today)
            .map(Expense::amount)
            .sum();

        let total_dues: Money = customers.iter().map(Customer::due).sum();
        let stock_value: Money = stock.iter().map(StockItem::stock_value).sum();

        let low_stock = stock
            .iter()
            .filter(|item| item.is_low_stock())
            .cloned()
            .collect();

        recent.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.invoice_number.cmp(&a.invoice_number))
        });
        recent.truncate(RECENT_SALES_LIMIT);

        DashboardSummary {
            date: today,
            today_revenue,
            today_gross_profit,
            today_expenses,
            today_net_profit: today_gross_profit - today_expenses,
            today_sale_count: todays.len() as i64,
            total_dues,
            stock_value,
            low_stock,
            recent_sales: recent,
        }
    }
}
