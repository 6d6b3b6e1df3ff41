//! # Report Repository
//!
//! Loads the rows a report needs and hands them to the pure builders in
//! `shopkeep_core::reports`. Also produces the full JSON backup of a shop
//! and restores one.
//!
//! ## Restoring a Backup
//! ```text
//!  BEGIN
//!   1. delete the shop's payments, sale lines, sales, customers, stock, expenses
//!   2. insert stock, customers, expenses, sales (+ lines, payments) under new ids
//!   3. customers.due = Σ due of their sales
//!   4. shops.next_invoice_number = max(invoice_number) + 1
//!   5. settings from the backup
//!  COMMIT
//! ```
//!
//! Ids are regenerated so a backup can be restored into any shop, including
//! a different one than it came from. References between rows are remapped.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use shopkeep_core::{
    Customer, DashboardSummary, DuePayment, Expense, PeriodReport, Sale, SaleDetail, SaleItem,
    Shop, ShopSettings, StockItem, ValidationError, RECENT_SALES_LIMIT,
};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::{new_id, CustomerRepository, ExpenseRepository, SaleRepository, SettingsRepository};
use super::{ShopRepository, StockRepository};
use crate::error::{DbError, DbResult};

/// Backup format version written into every export.
pub const EXPORT_VERSION: u32 = 1;

/// Everything a shop owns, in one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopExport {
    pub version: u32,
    pub exported_at: DateTime<Utc>,
    pub shop: Shop,
    pub settings: ShopSettings,
    pub stock: Vec<StockItem>,
    pub customers: Vec<Customer>,
    pub sales: Vec<SaleDetail>,
    pub expenses: Vec<Expense>,
}

/// Row counts after restoring a backup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub stock: usize,
    pub customers: usize,
    pub sales: usize,
    pub payments: usize,
    pub expenses: usize,
    pub next_invoice_number: i64,
}

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ReportRepository { pool }
    }

    /// Revenue, profit and expenses for `start..=end` (UTC dates).
    pub async fn period_report(
        &self,
        shop_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<PeriodReport> {
        let expenses = ExpenseRepository::new(self.pool.clone())
            .list_between(shop_id, start, end)
            .await?;
        let sales = SaleRepository::new(self.pool.clone())
            .list_between(shop_id, start, end)
            .await?;

        debug!(
            shop_id = %shop_id,
            %start,
            %end,
            sales = sales.len(),
            expenses = expenses.len(),
            "Building period report"
        );
        Ok(PeriodReport::build(start, end, &sales, &expenses)?)
    }

    pub async fn dashboard(&self, shop_id: &str, today: NaiveDate) -> DbResult<DashboardSummary> {
        let sales_repo = SaleRepository::new(self.pool.clone());

        let sales = sales_repo.list_between(shop_id, today, today).await?;
        let recent = sales_repo.recent(shop_id, RECENT_SALES_LIMIT as u32).await?;
        let expenses = ExpenseRepository::new(self.pool.clone())
            .list_between(shop_id, today, today)
            .await?;
        let customers = CustomerRepository::new(self.pool.clone()).list(shop_id).await?;
        let stock = StockRepository::new(self.pool.clone()).list(shop_id).await?;

        Ok(DashboardSummary::build(
            today, &sales, &expenses, &customers, &stock, recent,
        ))
    }

    /// Full snapshot of one shop. The password hash is never serialized.
    pub async fn export(&self, shop_id: &str) -> DbResult<ShopExport> {
        let shop = ShopRepository::new(self.pool.clone()).get(shop_id).await?;
        let settings = SettingsRepository::new(self.pool.clone()).get(shop_id).await?;
        let stock = StockRepository::new(self.pool.clone()).list(shop_id).await?;
        let customers = CustomerRepository::new(self.pool.clone()).list(shop_id).await?;
        let expenses = ExpenseRepository::new(self.pool.clone()).list(shop_id).await?;

        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE shop_id = ? ORDER BY invoice_number",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT si.* FROM sale_items si
             JOIN sales s ON s.id = si.sale_id
             WHERE s.shop_id = ?
             ORDER BY si.rowid",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        let payments = sqlx::query_as::<_, DuePayment>(
            "SELECT dp.* FROM due_payments dp
             JOIN sales s ON s.id = dp.sale_id
             WHERE s.shop_id = ?
             ORDER BY dp.created_at, dp.rowid",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;

        let mut items_by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for item in items {
            items_by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }
        let mut payments_by_sale: HashMap<String, Vec<DuePayment>> = HashMap::new();
        for payment in payments {
            payments_by_sale
                .entry(payment.sale_id.clone())
                .or_default()
                .push(payment);
        }

        let sales: Vec<SaleDetail> = sales
            .into_iter()
            .map(|sale| SaleDetail {
                items: items_by_sale.remove(&sale.id).unwrap_or_default(),
                payments: payments_by_sale.remove(&sale.id).unwrap_or_default(),
                sale,
            })
            .collect();

        info!(
            shop_id = %shop_id,
            stock = stock.len(),
            customers = customers.len(),
            sales = sales.len(),
            expenses = expenses.len(),
            "Shop exported"
        );

        Ok(ShopExport {
            version: EXPORT_VERSION,
            exported_at: Utc::now(),
            shop,
            settings,
            stock,
            customers,
            sales,
            expenses,
        })
    }

    /// Replaces everything `shop_id` owns with the contents of `backup`.
    ///
    /// The shop's login and id are kept. Customer dues are recomputed from
    /// the restored sales and the invoice counter continues after the
    /// highest restored invoice number.
    ///
    /// ## Errors
    /// - `Core(Validation)` for an unknown backup version
    /// - `UniqueViolation` for repeated SKUs or invoice numbers in the backup
    /// - `QueryFailed` for rows that break a table CHECK; nothing is changed
    pub async fn import(&self, shop_id: &str, backup: &ShopExport) -> DbResult<ImportSummary> {
        if backup.version != EXPORT_VERSION {
            warn!(shop_id = %shop_id, version = backup.version, "Unsupported backup version");
            return Err(ValidationError::InvalidFormat {
                field: "version".to_string(),
                reason: format!(
                    "backup version {} is not supported (expected {})",
                    backup.version, EXPORT_VERSION
                ),
            }
            .into());
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Write first so SQLite takes the write lock up front
        let shop_exists = sqlx::query("UPDATE shops SET next_invoice_number = 1 WHERE id = ?")
            .bind(shop_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        if shop_exists == 0 {
            return Err(DbError::not_found("Shop", shop_id));
        }

        for table in ["due_payments", "sale_items"] {
            sqlx::query(&format!(
                "DELETE FROM {table} WHERE sale_id IN (SELECT id FROM sales WHERE shop_id = ?)"
            ))
            .bind(shop_id)
            .execute(&mut *tx)
            .await?;
        }
        for table in ["sales", "customers", "stock_items", "expenses"] {
            sqlx::query(&format!("DELETE FROM {table} WHERE shop_id = ?"))
                .bind(shop_id)
                .execute(&mut *tx)
                .await?;
        }

        let mut stock_ids: HashMap<&str, String> = HashMap::new();
        for item in &backup.stock {
            let id = new_id();
            sqlx::query(
                "INSERT INTO stock_items
                    (id, shop_id, sku, name, category, cost_price_cents, sale_price_cents,
                     stock, reorder_level, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&id)
            .bind(shop_id)
            .bind(&item.sku)
            .bind(&item.name)
            .bind(&item.category)
            .bind(item.cost_price_cents)
            .bind(item.sale_price_cents)
            .bind(item.stock)
            .bind(item.reorder_level)
            .bind(item.created_at)
            .bind(item.updated_at)
            .execute(&mut *tx)
            .await?;
            stock_ids.insert(item.id.as_str(), id);
        }

        let mut customer_ids: HashMap<&str, String> = HashMap::new();
        for customer in &backup.customers {
            let id = new_id();
            sqlx::query(
                "INSERT INTO customers
                    (id, shop_id, name, phone, address, due_cents, created_at, updated_at)
                 VALUES (?, ?, ?, ?, ?, 0, ?, ?)",
            )
            .bind(&id)
            .bind(shop_id)
            .bind(&customer.name)
            .bind(&customer.phone)
            .bind(&customer.address)
            .bind(customer.created_at)
            .bind(customer.updated_at)
            .execute(&mut *tx)
            .await?;
            customer_ids.insert(customer.id.as_str(), id);
        }

        for expense in &backup.expenses {
            sqlx::query(
                "INSERT INTO expenses (id, shop_id, date, title, category, amount_cents, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(new_id())
            .bind(shop_id)
            .bind(expense.date)
            .bind(&expense.title)
            .bind(&expense.category)
            .bind(expense.amount_cents)
            .bind(expense.created_at)
            .execute(&mut *tx)
            .await?;
        }

        let mut payment_count = 0;
        for detail in &backup.sales {
            let sale = &detail.sale;
            let sale_id = new_id();
            // A customer missing from the backup becomes a name-only sale
            let customer_id = sale
                .customer_id
                .as_deref()
                .and_then(|old| customer_ids.get(old))
                .cloned();

            sqlx::query(
                "INSERT INTO sales
                    (id, shop_id, invoice_number, customer_id, customer_name,
                     subtotal_cents, discount_cents, tax_rate_bps, tax_cents, grand_total_cents,
                     amount_paid_cents, due_cents, change_cents, profit_cents, payment_mode, created_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&sale_id)
            .bind(shop_id)
            .bind(sale.invoice_number)
            .bind(&customer_id)
            .bind(&sale.customer_name)
            .bind(sale.subtotal_cents)
            .bind(sale.discount_cents)
            .bind(sale.tax_rate_bps)
            .bind(sale.tax_cents)
            .bind(sale.grand_total_cents)
            .bind(sale.amount_paid_cents)
            .bind(sale.due_cents)
            .bind(sale.change_cents)
            .bind(sale.profit_cents)
            .bind(sale.payment_mode)
            .bind(sale.created_at)
            .execute(&mut *tx)
            .await?;

            for item in &detail.items {
                let stock_item_id = stock_ids
                    .get(item.stock_item_id.as_str())
                    .unwrap_or(&item.stock_item_id);
                sqlx::query(
                    "INSERT INTO sale_items
                        (id, sale_id, stock_item_id, sku, name, category,
                         cost_price_cents, sale_price_cents, quantity, line_total_cents)
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(new_id())
                .bind(&sale_id)
                .bind(stock_item_id)
                .bind(&item.sku)
                .bind(&item.name)
                .bind(&item.category)
                .bind(item.cost_price_cents)
                .bind(item.sale_price_cents)
                .bind(item.quantity)
                .bind(item.line_total_cents)
                .execute(&mut *tx)
                .await?;
            }

            for payment in &detail.payments {
                sqlx::query(
                    "INSERT INTO due_payments
                        (id, sale_id, customer_id, amount_cents, payment_mode, created_at)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(new_id())
                .bind(&sale_id)
                .bind(&customer_id)
                .bind(payment.amount_cents)
                .bind(payment.payment_mode)
                .bind(payment.created_at)
                .execute(&mut *tx)
                .await?;
                payment_count += 1;
            }
        }

        sqlx::query(
            "UPDATE customers
             SET due_cents = (SELECT COALESCE(SUM(due_cents), 0) FROM sales
                              WHERE sales.customer_id = customers.id)
             WHERE shop_id = ?",
        )
        .bind(shop_id)
        .execute(&mut *tx)
        .await?;

        let next_invoice_number: i64 = sqlx::query_scalar(
            "UPDATE shops
             SET next_invoice_number =
                 (SELECT COALESCE(MAX(invoice_number), 0) + 1 FROM sales WHERE shop_id = ?)
             WHERE id = ?
             RETURNING next_invoice_number",
        )
        .bind(shop_id)
        .bind(shop_id)
        .fetch_one(&mut *tx)
        .await?;

        let settings = &backup.settings;
        sqlx::query(
            "UPDATE shop_settings
             SET shop_name = ?, gstin = ?, phone = ?, address = ?,
                 default_tax_bps = ?, currency_symbol = ?, updated_at = ?
             WHERE shop_id = ?",
        )
        .bind(&settings.shop_name)
        .bind(&settings.gstin)
        .bind(&settings.phone)
        .bind(&settings.address)
        .bind(settings.default_tax_bps)
        .bind(&settings.currency_symbol)
        .bind(now)
        .bind(shop_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let summary = ImportSummary {
            stock: backup.stock.len(),
            customers: backup.customers.len(),
            sales: backup.sales.len(),
            payments: payment_count,
            expenses: backup.expenses.len(),
            next_invoice_number,
        };
        info!(
            shop_id = %shop_id,
            from_shop = %backup.shop.id,
            stock = summary.stock,
            customers = summary.customers,
            sales = summary.sales,
            expenses = summary.expenses,
            next_invoice_number,
            "Backup restored"
        );
        Ok(summary)
    }
}
