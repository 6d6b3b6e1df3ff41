//! # Sale Repository
//!
//! The ledger writes. Recording a sale and recording a due payment each
//! touch several tables; each runs in one SQLite transaction so either every
//! row changes or none does.
//!
//! ## Recording a Sale
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │   1. shops.next_invoice_number += 1      → invoice number (write lock) │
//! │   2. resolve customer (load, or insert a new one)                      │
//! │   3. load stock rows → Cart::add (stock check) → quote()               │
//! │   4. stock -= qty  WHERE stock >= qty    (per line, guarded)           │
//! │   5. INSERT sales, INSERT sale_items                                   │
//! │   6. customers.due += sale.due                                         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any failure (unknown item, insufficient stock, bad discount, ...)     │
//! │  returns early; dropping the transaction rolls everything back,        │
//! │  including the invoice number.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Recording a Due Payment
//! ```text
//!  BEGIN
//!   1. sales.due -= amount, amount_paid += amount  WHERE due >= amount
//!   2. customers.due -= amount           (when the customer still exists,
//!                                          CHECK due >= 0 catches drift)
//!   3. INSERT due_payments
//!  COMMIT
//! ```

use chrono::{NaiveDate, Utc};
use shopkeep_core::ledger::validate_due_payment;
use shopkeep_core::validation::validate_new_sale;
use shopkeep_core::{
    Cart, CoreError, Customer, DuePayment, Money, NewCustomer, NewDuePayment, NewSale, Sale,
    SaleCustomer, SaleDetail, SaleItem, SaleTerms, ShopSettings, StockItem,
};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};

use super::customer::insert_customer;
use super::new_id;
use crate::error::{DbError, DbResult};

/// Repository for sales and due payments.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    // =========================================================================
    // Ledger writes
    // =========================================================================

    /// Records a sale atomically and returns it with its lines.
    ///
    /// ## Errors
    /// - `Core(Validation)` for malformed input
    /// - `Core(CustomerNotFound)` / `Core(StockItemNotFound)` for unknown ids
    /// - `Core(InsufficientStock)` if any line exceeds the stock on hand
    /// - `Core(DiscountExceedsSubtotal)` if the discount is too large
    pub async fn record_sale(&self, shop_id: &str, new: &NewSale) -> DbResult<SaleDetail> {
        validate_new_sale(new)?;

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        // Writing first takes SQLite's write lock for the whole transaction.
        let invoice_number: i64 = sqlx::query_scalar(
            "UPDATE shops SET next_invoice_number = next_invoice_number + 1
             WHERE id = ?
             RETURNING next_invoice_number - 1",
        )
        .bind(shop_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Shop", shop_id))?;

        let tax_rate_bps = match new.tax_rate_bps {
            Some(bps) => bps,
            None => sqlx::query_scalar::<_, u32>(
                "SELECT default_tax_bps FROM shop_settings WHERE shop_id = ?",
            )
            .bind(shop_id)
            .fetch_optional(&mut *tx)
            .await?
            .unwrap_or(ShopSettings::DEFAULT_TAX_BPS),
        };

        let customer = match &new.customer {
            SaleCustomer::Existing { id } => sqlx::query_as::<_, Customer>(
                "SELECT * FROM customers WHERE id = ? AND shop_id = ?",
            )
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::CustomerNotFound(id.clone()))?,
            SaleCustomer::New {
                name,
                phone,
                address,
            } => {
                let new_customer = NewCustomer {
                    name: name.clone(),
                    phone: phone.clone(),
                    address: address.clone(),
                };
                insert_customer(&mut tx, shop_id, &new_customer).await?
            }
        };

        let mut cart = Cart::new();
        for line in &new.items {
            let item = sqlx::query_as::<_, StockItem>(
                "SELECT * FROM stock_items WHERE id = ? AND shop_id = ?",
            )
            .bind(&line.stock_item_id)
            .bind(shop_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::StockItemNotFound(line.stock_item_id.clone()))?;

            cart.add(&item, line.quantity)?;
        }

        let quote = cart.quote(&SaleTerms {
            discount_cents: new.discount_cents,
            tax_rate_bps,
            amount_paid_cents: new.amount_paid_cents,
        })?;

        for line in cart.lines() {
            let result = sqlx::query(
                "UPDATE stock_items SET stock = stock - ?, updated_at = ?
                 WHERE id = ? AND shop_id = ? AND stock >= ?",
            )
            .bind(line.quantity)
            .bind(now)
            .bind(&line.stock_item_id)
            .bind(shop_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let available: i64 =
                    sqlx::query_scalar("SELECT stock FROM stock_items WHERE id = ?")
                        .bind(&line.stock_item_id)
                        .fetch_optional(&mut *tx)
                        .await?
                        .unwrap_or(0);
                warn!(sku = %line.sku, available, requested = line.quantity, "Stock guard rejected sale");
                return Err(CoreError::InsufficientStock {
                    sku: line.sku.clone(),
                    available,
                    requested: line.quantity,
                }
                .into());
            }
        }

        let sale = Sale {
            id: new_id(),
            shop_id: shop_id.to_string(),
            invoice_number,
            customer_id: Some(customer.id.clone()),
            customer_name: customer.name.clone(),
            subtotal_cents: quote.subtotal.cents(),
            discount_cents: quote.discount.cents(),
            tax_rate_bps: quote.tax_rate.bps(),
            tax_cents: quote.tax.cents(),
            grand_total_cents: quote.grand_total.cents(),
            amount_paid_cents: quote.amount_paid.cents(),
            due_cents: quote.due.cents(),
            change_cents: quote.change.cents(),
            profit_cents: quote.profit.cents(),
            payment_mode: new.payment_mode,
            created_at: now,
        };

        sqlx::query(
            "INSERT INTO sales
                (id, shop_id, invoice_number, customer_id, customer_name,
                 subtotal_cents, discount_cents, tax_rate_bps, tax_cents, grand_total_cents,
                 amount_paid_cents, due_cents, change_cents, profit_cents, payment_mode, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&sale.id)
        .bind(&sale.shop_id)
        .bind(sale.invoice_number)
        .bind(&sale.customer_id)
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

        let mut items = Vec::with_capacity(cart.len());
        for line in cart.lines() {
            let item = SaleItem {
                id: new_id(),
                sale_id: sale.id.clone(),
                stock_item_id: line.stock_item_id.clone(),
                sku: line.sku.clone(),
                name: line.name.clone(),
                category: line.category.clone(),
                cost_price_cents: line.cost_price_cents,
                sale_price_cents: line.sale_price_cents,
                quantity: line.quantity,
                line_total_cents: line.line_total()?.cents(),
            };

            sqlx::query(
                "INSERT INTO sale_items
                    (id, sale_id, stock_item_id, sku, name, category,
                     cost_price_cents, sale_price_cents, quantity, line_total_cents)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(&item.stock_item_id)
            .bind(&item.sku)
            .bind(&item.name)
            .bind(&item.category)
            .bind(item.cost_price_cents)
            .bind(item.sale_price_cents)
            .bind(item.quantity)
            .bind(item.line_total_cents)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        if quote.due.is_positive() {
            sqlx::query(
                "UPDATE customers SET due_cents = due_cents + ?, updated_at = ?
                 WHERE id = ? AND shop_id = ?",
            )
            .bind(quote.due.cents())
            .bind(now)
            .bind(&customer.id)
            .bind(shop_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            invoice_number,
            grand_total = %quote.grand_total,
            due = %quote.due,
            lines = items.len(),
            "Sale recorded"
        );

        Ok(SaleDetail {
            sale,
            items,
            payments: Vec::new(),
        })
    }

    /// Records a payment against a sale's outstanding due.
    ///
    /// Reduces the sale's due, raises its amount paid, and reduces the
    /// customer's due by the same amount, all in one transaction.
    ///
    /// ## Errors
    /// - `Core(SaleNotFound)` if the sale is not in this shop
    /// - `Core(InvalidPaymentAmount)` unless `0 < amount ≤ sale.due`
    pub async fn record_payment(
        &self,
        shop_id: &str,
        sale_id: &str,
        payment: &NewDuePayment,
    ) -> DbResult<SaleDetail> {
        let amount = Money::from_cents(payment.amount_cents);
        if !amount.is_positive() {
            return Err(CoreError::InvalidPaymentAmount {
                reason: "amount must be greater than zero".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query_as::<_, Sale>(
            "UPDATE sales
             SET due_cents = due_cents - ?, amount_paid_cents = amount_paid_cents + ?
             WHERE id = ? AND shop_id = ? AND due_cents >= ?
             RETURNING *",
        )
        .bind(amount.cents())
        .bind(amount.cents())
        .bind(sale_id)
        .bind(shop_id)
        .bind(amount.cents())
        .fetch_optional(&mut *tx)
        .await?;

        let sale = match updated {
            Some(sale) => sale,
            None => {
                let sale = sqlx::query_as::<_, Sale>(
                    "SELECT * FROM sales WHERE id = ? AND shop_id = ?",
                )
                .bind(sale_id)
                .bind(shop_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| CoreError::SaleNotFound(sale_id.to_string()))?;

                warn!(sale_id = %sale_id, amount = %amount, due = %sale.due(), "Payment rejected");
                validate_due_payment(sale.due(), amount)?;
                return Err(CoreError::InvalidPaymentAmount {
                    reason: format!("amount {} exceeds outstanding due {}", amount, sale.due()),
                }
                .into());
            }
        };

        // The customer's due is the sum of their sales' dues, so this cannot
        // go negative unless the two have drifted apart; the CHECK rejects it.
        if let Some(customer_id) = &sale.customer_id {
            sqlx::query(
                "UPDATE customers SET due_cents = due_cents - ?, updated_at = ?
                 WHERE id = ? AND shop_id = ?",
            )
            .bind(amount.cents())
            .bind(now)
            .bind(customer_id)
            .bind(shop_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| {
                warn!(
                    sale_id = %sale.id,
                    customer_id = %customer_id,
                    amount = %amount,
                    error = %err,
                    "Customer due is out of step with the sale, payment rolled back"
                );
                err
            })?;
        }

        let due_payment = DuePayment {
            id: new_id(),
            sale_id: sale.id.clone(),
            customer_id: sale.customer_id.clone(),
            amount_cents: amount.cents(),
            payment_mode: payment.payment_mode,
            created_at: now,
        };

        sqlx::query(
            "INSERT INTO due_payments (id, sale_id, customer_id, amount_cents, payment_mode, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&due_payment.id)
        .bind(&due_payment.sale_id)
        .bind(&due_payment.customer_id)
        .bind(due_payment.amount_cents)
        .bind(due_payment.payment_mode)
        .bind(due_payment.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            sale_id = %sale.id,
            amount = %amount,
            remaining_due = %sale.due(),
            "Due payment recorded"
        );

        self.get_detail(shop_id, sale_id).await
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Sale> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE id = ? AND shop_id = ?")
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))
    }

    /// A sale with its lines and later payments.
    pub async fn get_detail(&self, shop_id: &str, id: &str) -> DbResult<SaleDetail> {
        let sale = self.get(shop_id, id).await?;

        let items = sqlx::query_as::<_, SaleItem>(
            "SELECT * FROM sale_items WHERE sale_id = ? ORDER BY rowid",
        )
        .bind(&sale.id)
        .fetch_all(&self.pool)
        .await?;

        let payments = sqlx::query_as::<_, DuePayment>(
            "SELECT * FROM due_payments WHERE sale_id = ? ORDER BY created_at, rowid",
        )
        .bind(&sale.id)
        .fetch_all(&self.pool)
        .await?;

        debug!(sale_id = %id, items = items.len(), payments = payments.len(), "Loaded sale detail");
        Ok(SaleDetail {
            sale,
            items,
            payments,
        })
    }

    pub async fn get_by_invoice_number(&self, shop_id: &str, invoice_number: i64) -> DbResult<Sale> {
        sqlx::query_as::<_, Sale>("SELECT * FROM sales WHERE shop_id = ? AND invoice_number = ?")
            .bind(shop_id)
            .bind(invoice_number)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", format!("invoice #{}", invoice_number)))
    }

    /// Newest sales first.
    pub async fn list(&self, shop_id: &str, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE shop_id = ?
             ORDER BY created_at DESC, invoice_number DESC
             LIMIT ?",
        )
        .bind(shop_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    /// Sales whose UTC date falls in `start..=end`, oldest first.
    pub async fn list_between(
        &self,
        shop_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales
             WHERE shop_id = ? AND date(created_at) BETWEEN ? AND ?
             ORDER BY created_at, invoice_number",
        )
        .bind(shop_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    /// The `n` most recent sales.
    pub async fn recent(&self, shop_id: &str, n: u32) -> DbResult<Vec<Sale>> {
        self.list(shop_id, n).await
    }

    /// Sales with an outstanding due, oldest first.
    pub async fn with_due(&self, shop_id: &str) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE shop_id = ? AND due_cents > 0
             ORDER BY created_at, invoice_number",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{add_item, customer, setup};
    use crate::Database;
    use shopkeep_core::{PaymentMode, SaleLineRequest};

    fn sale_request(
        customer: SaleCustomer,
        lines: &[(&str, i64)],
        discount: i64,
        tax_bps: Option<u32>,
        paid: Option<i64>,
    ) -> NewSale {
        NewSale {
            customer,
            items: lines
                .iter()
                .map(|(id, qty)| SaleLineRequest {
                    stock_item_id: id.to_string(),
                    quantity: *qty,
                })
                .collect(),
            discount_cents: discount,
            tax_rate_bps: tax_bps,
            amount_paid_cents: paid,
            payment_mode: PaymentMode::Cash,
        }
    }

    async fn stock_of(db: &Database, shop_id: &str, id: &str) -> i64 {
        db.stock().get(shop_id, id).await.unwrap().stock
    }

    #[tokio::test]
    async fn test_record_sale_updates_stock_sale_and_customer() {
        let (db, shop_id) = setup().await;
        let rice = add_item(&db, &shop_id, "RICE-5KG", 40_000, 52_500, 10).await;
        let tea = add_item(&db, &shop_id, "TEA-250", 8_000, 10_000, 5).await;
        let asha = db.customers().create(&shop_id, &customer("Asha")).await.unwrap();

        let detail = db
            .sales()
            .record_sale(
                &shop_id,
                &sale_request(
                    SaleCustomer::Existing { id: asha.id.clone() },
                    &[(&rice.id, 2), (&tea.id, 1)],
                    5_000,
                    None, // shop default: 5%
                    Some(50_000),
                ),
            )
            .await
            .unwrap();

        let sale = &detail.sale;
        assert_eq!(sale.invoice_number, 1);
        assert_eq!(sale.subtotal_cents, 115_000);
        assert_eq!(sale.tax_rate_bps, 500);
        assert_eq!(sale.tax_cents, 5_500);
        assert_eq!(sale.grand_total_cents, 115_500);
        assert_eq!(sale.amount_paid_cents, 50_000);
        assert_eq!(sale.due_cents, 65_500);
        // 12_500 × 2 + 2_000, the discount is not taken off
        assert_eq!(sale.profit_cents, 27_000);
        assert_eq!(detail.items.len(), 2);

        assert_eq!(stock_of(&db, &shop_id, &rice.id).await, 8);
        assert_eq!(stock_of(&db, &shop_id, &tea.id).await, 4);

        let asha = db.customers().get(&shop_id, &asha.id).await.unwrap();
        assert_eq!(asha.due_cents, 65_500);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back_everything() {
        let (db, shop_id) = setup().await;
        let rice = add_item(&db, &shop_id, "RICE-5KG", 40_000, 52_500, 10).await;
        let tea = add_item(&db, &shop_id, "TEA-250", 8_000, 10_000, 1).await;

        let err = db
            .sales()
            .record_sale(
                &shop_id,
                &sale_request(
                    SaleCustomer::New {
                        name: "Ravi".to_string(),
                        phone: String::new(),
                        address: String::new(),
                    },
                    &[(&rice.id, 3), (&tea.id, 2)],
                    0,
                    Some(0),
                    Some(0),
                ),
            )
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Core(CoreError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            })
        ));

        // Nothing changed: stock, customers, sales, invoice counter
        assert_eq!(stock_of(&db, &shop_id, &rice.id).await, 10);
        assert!(db.customers().list(&shop_id).await.unwrap().is_empty());
        assert!(db.sales().list(&shop_id, 10).await.unwrap().is_empty());
        assert_eq!(db.shops().get(&shop_id).await.unwrap().next_invoice_number, 1);
    }

    #[tokio::test]
    async fn test_invoice_numbers_are_sequential() {
        let (db, shop_id) = setup().await;
        let tea = add_item(&db, &shop_id, "TEA-250", 8_000, 10_000, 10).await;
        let asha = db.customers().create(&shop_id, &customer("Asha")).await.unwrap();

        for expected in 1..=3 {
            let detail = db
                .sales()
                .record_sale(
                    &shop_id,
                    &sale_request(
                        SaleCustomer::Existing { id: asha.id.clone() },
                        &[(&tea.id, 1)],
                        0,
                        Some(0),
                        None,
                    ),
                )
                .await
                .unwrap();
            assert_eq!(detail.sale.invoice_number, expected);
        }

        let by_number = db.sales().get_by_invoice_number(&shop_id, 2).await.unwrap();
        assert_eq!(by_number.invoice_number, 2);
        assert_eq!(db.sales().recent(&shop_id, 2).await.unwrap()[0].invoice_number, 3);
    }

    #[tokio::test]
    async fn test_new_customer_created_inside_sale() {
        let (db, shop_id) = setup().await;
        let tea = add_item(&db, &shop_id, "TEA-250", 8_000, 10_000, 10).await;

        let detail = db
            .sales()
            .record_sale(
                &shop_id,
                &sale_request(
                    SaleCustomer::New {
                        name: "Ravi".to_string(),
                        phone: "90000 22222".to_string(),
                        address: String::new(),
                    },
                    &[(&tea.id, 1)],
                    0,
                    Some(0),
                    Some(4_000),
                ),
            )
            .await
            .unwrap();

        let customers = db.customers().list(&shop_id).await.unwrap();
        assert_eq!(customers.len(), 1);
        assert_eq!(customers[0].name, "Ravi");
        assert_eq!(customers[0].due_cents, 6_000);
        assert_eq!(detail.sale.customer_id.as_deref(), Some(customers[0].id.as_str()));
    }

    #[tokio::test]
    async fn test_unknown_stock_item_is_rejected() {
        let (db, shop_id) = setup().await;
        let asha = db.customers().create(&shop_id, &customer("Asha")).await.unwrap();

        let err = db
            .sales()
            .record_sale(
                &shop_id,
                &sale_request(
                    SaleCustomer::Existing { id: asha.id },
                    &[("550e8400-e29b-41d4-a716-446655440000", 1)],
                    0,
                    None,
                    None,
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::StockItemNotFound(_))));
    }

    #[tokio::test]
    async fn test_record_payment_moves_both_balances() {
        let (db, shop_id) = setup().await;
        let tea = add_item(&db, &shop_id, "TEA-250", 8_000, 10_000, 10).await;
        let asha = db.customers().create(&shop_id, &customer("Asha")).await.unwrap();

        let sale_for = |paid| {
            sale_request(
                SaleCustomer::Existing { id: asha.id.clone() },
                &[(tea.id.as_str(), 1)],
                0,
                Some(0),
                Some(paid),
            )
        };
        let first = db.sales().record_sale(&shop_id, &sale_for(7_000)).await.unwrap();
        db.sales().record_sale(&shop_id, &sale_for(9_000)).await.unwrap();
        assert_eq!(db.customers().get(&shop_id, &asha.id).await.unwrap().due_cents, 4_000);

        let detail = db
            .sales()
            .record_payment(
                &shop_id,
                &first.sale.id,
                &NewDuePayment {
                    amount_cents: 2_000,
                    payment_mode: PaymentMode::Upi,
                },
            )
            .await
            .unwrap();

        assert_eq!(detail.sale.due_cents, 1_000);
        assert_eq!(detail.sale.amount_paid_cents, 9_000);
        assert_eq!(detail.payments.len(), 1);
        assert_eq!(detail.payments[0].payment_mode, PaymentMode::Upi);
        assert_eq!(db.customers().get(&shop_id, &asha.id).await.unwrap().due_cents, 2_000);

        let with_due = db.sales().with_due(&shop_id).await.unwrap();
        let total_sale_due: i64 = with_due.iter().map(|s| s.due_cents).sum();
        assert_eq!(total_sale_due, 2_000);
    }

    #[tokio::test]
    async fn test_payment_bounds_are_enforced() {
        let (db, shop_id) = setup().await;
        let tea = add_item(&db, &shop_id, "TEA-250", 8_000, 10_000, 10).await;
        let detail = db
            .sales()
            .record_sale(
                &shop_id,
                &sale_request(
                    SaleCustomer::New {
                        name: "Ravi".to_string(),
                        phone: String::new(),
                        address: String::new(),
                    },
                    &[(&tea.id, 1)],
                    0,
                    Some(0),
                    Some(7_000),
                ),
            )
            .await
            .unwrap();

        for amount in [0, -100, 3_001] {
            let err = db
                .sales()
                .record_payment(
                    &shop_id,
                    &detail.sale.id,
                    &NewDuePayment {
                        amount_cents: amount,
                        payment_mode: PaymentMode::Cash,
                    },
                )
                .await
                .unwrap_err();
            assert!(matches!(err, DbError::Core(CoreError::InvalidPaymentAmount { .. })));
        }

        let unchanged = db.sales().get(&shop_id, &detail.sale.id).await.unwrap();
        assert_eq!(unchanged.due_cents, 3_000);

        let err = db
            .sales()
            .record_payment(
                &shop_id,
                "no-such-sale",
                &NewDuePayment {
                    amount_cents: 100,
                    payment_mode: PaymentMode::Cash,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::SaleNotFound(_))));
    }

    #[tokio::test]
    async fn test_list_between_uses_sale_date() {
        let (db, shop_id) = setup().await;
        let tea = add_item(&db, &shop_id, "TEA-250", 8_000, 10_000, 10).await;
        db.sales()
            .record_sale(
                &shop_id,
                &sale_request(
                    SaleCustomer::New {
                        name: "Ravi".to_string(),
                        phone: String::new(),
                        address: String::new(),
                    },
                    &[(&tea.id, 1)],
                    0,
                    Some(0),
                    None,
                ),
            )
            .await
            .unwrap();

        let today = Utc::now().date_naive();
        let yesterday = today.pred_opt().unwrap();

        assert_eq!(db.sales().list_between(&shop_id, today, today).await.unwrap().len(), 1);
        assert!(db
            .sales()
            .list_between(&shop_id, yesterday, yesterday)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_shops_cannot_touch_each_others_sales_or_customers() {
        let (db, shop_a) = setup().await;
        let shop_b = db
            .shops()
            .create_with_settings("other@example.com", "$argon2id$test")
            .await
            .unwrap()
            .id;
        let tea_a = add_item(&db, &shop_a, "TEA-250", 8_000, 10_000, 5).await;
        let tea_b = add_item(&db, &shop_b, "TEA-250", 8_000, 10_000, 5).await;
        let asha = db.customers().create(&shop_a, &customer("Asha")).await.unwrap();

        let detail = db
            .sales()
            .record_sale(
                &shop_a,
                &sale_request(
                    SaleCustomer::Existing { id: asha.id.clone() },
                    &[(&tea_a.id, 1)],
                    0,
                    Some(0),
                    Some(0),
                ),
            )
            .await
            .unwrap();
        let sale_id = detail.sale.id.clone();

        let err = db
            .sales()
            .record_payment(
                &shop_b,
                &sale_id,
                &NewDuePayment {
                    amount_cents: 10_000,
                    payment_mode: PaymentMode::Cash,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::SaleNotFound(_))));
        assert!(db.sales().get(&shop_b, &sale_id).await.unwrap_err().is_not_found());

        let err = db
            .sales()
            .record_sale(
                &shop_b,
                &sale_request(
                    SaleCustomer::Existing { id: asha.id.clone() },
                    &[(&tea_b.id, 1)],
                    0,
                    Some(0),
                    Some(0),
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::CustomerNotFound(_))));

        // Shop A's stock item is unknown to shop B
        let err = db
            .sales()
            .record_sale(
                &shop_b,
                &sale_request(
                    SaleCustomer::New {
                        name: "Ravi".to_string(),
                        phone: String::new(),
                        address: String::new(),
                    },
                    &[(&tea_a.id, 1)],
                    0,
                    Some(0),
                    None,
                ),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::StockItemNotFound(_))));

        // Nothing moved in shop A
        assert_eq!(db.sales().get(&shop_a, &sale_id).await.unwrap().due_cents, 10_000);
        assert_eq!(db.customers().get(&shop_a, &asha.id).await.unwrap().due_cents, 10_000);
        assert_eq!(stock_of(&db, &shop_a, &tea_a.id).await, 4);
        assert_eq!(stock_of(&db, &shop_b, &tea_b.id).await, 5);
    }

    #[tokio::test]
    async fn test_payment_after_customer_force_deleted() {
        let (db, shop_id) = setup().await;
        let tea = add_item(&db, &shop_id, "TEA-250", 8_000, 10_000, 5).await;
        let asha = db.customers().create(&shop_id, &customer("Asha")).await.unwrap();

        let sale_id = db
            .sales()
            .record_sale(
                &shop_id,
                &sale_request(
                    SaleCustomer::Existing { id: asha.id.clone() },
                    &[(&tea.id, 1)],
                    0,
                    Some(0),
                    Some(0),
                ),
            )
            .await
            .unwrap()
            .sale
            .id;

        db.customers().delete(&shop_id, &asha.id, true).await.unwrap();

        let detail = db
            .sales()
            .record_payment(
                &shop_id,
                &sale_id,
                &NewDuePayment {
                    amount_cents: 10_000,
                    payment_mode: PaymentMode::Upi,
                },
            )
            .await
            .unwrap();

        assert_eq!(detail.sale.due_cents, 0);
        assert_eq!(detail.sale.amount_paid_cents, 10_000);
        assert_eq!(detail.sale.customer_id, None);
        assert_eq!(detail.sale.customer_name, "Asha");
        assert_eq!(detail.payments.len(), 1);
        assert_eq!(detail.payments[0].customer_id, None);
    }

    #[tokio::test]
    async fn test_payment_rolls_back_when_customer_due_has_drifted() {
        let (db, shop_id) = setup().await;
        let tea = add_item(&db, &shop_id, "TEA-250", 8_000, 10_000, 5).await;
        let asha = db.customers().create(&shop_id, &customer("Asha")).await.unwrap();

        let sale_id = db
            .sales()
            .record_sale(
                &shop_id,
                &sale_request(
                    SaleCustomer::Existing { id: asha.id.clone() },
                    &[(&tea.id, 1)],
                    0,
                    Some(0),
                    Some(0),
                ),
            )
            .await
            .unwrap()
            .sale
            .id;

        sqlx::query("UPDATE customers SET due_cents = 100 WHERE id = ?")
            .bind(&asha.id)
            .execute(db.pool())
            .await
            .unwrap();

        let err = db
            .sales()
            .record_payment(
                &shop_id,
                &sale_id,
                &NewDuePayment {
                    amount_cents: 10_000,
                    payment_mode: PaymentMode::Cash,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::QueryFailed(_)), "{:?}", err);

        let detail = db.sales().get_detail(&shop_id, &sale_id).await.unwrap();
        assert_eq!(detail.sale.due_cents, 10_000);
        assert_eq!(detail.sale.amount_paid_cents, 0);
        assert!(detail.payments.is_empty());
        assert_eq!(db.customers().get(&shop_id, &asha.id).await.unwrap().due_cents, 100);
    }
}
