//! # Customer Repository
//!
//! Customers and their receivable balance.
//!
//! `due_cents` is never written here except by delete. It moves only through
//! [`super::SaleRepository::record_sale`] and
//! [`super::SaleRepository::record_payment`], which keep it equal to the sum
//! of the customer's sale dues.

use chrono::Utc;
use shopkeep_core::validation::{validate_customer_update, validate_new_customer};
use shopkeep_core::{CoreError, Customer, CustomerUpdate, NewCustomer, Sale};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, warn};

use super::new_id;
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    pub async fn list(&self, shop_id: &str) -> DbResult<Vec<Customer>> {
        let customers = sqlx::query_as::<_, Customer>(
            "SELECT * FROM customers WHERE shop_id = ? ORDER BY name COLLATE NOCASE",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(customers)
    }

    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<Customer> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = ? AND shop_id = ?")
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Customer", id))
    }

    pub async fn create(&self, shop_id: &str, new: &NewCustomer) -> DbResult<Customer> {
        validate_new_customer(new)?;
        let mut conn = self.pool.acquire().await?;
        let customer = insert_customer(&mut conn, shop_id, new).await?;
        info!(customer_id = %customer.id, "Customer created");
        Ok(customer)
    }

    /// Updates contact details. The due balance is left alone.
    pub async fn update(
        &self,
        shop_id: &str,
        id: &str,
        update: &CustomerUpdate,
    ) -> DbResult<Customer> {
        validate_customer_update(update)?;

        let mut customer = self.get(shop_id, id).await?;
        if let Some(name) = &update.name {
            customer.name = name.trim().to_string();
        }
        if let Some(phone) = &update.phone {
            customer.phone = phone.trim().to_string();
        }
        if let Some(address) = &update.address {
            customer.address = address.trim().to_string();
        }
        customer.updated_at = Utc::now();

        sqlx::query(
            "UPDATE customers SET name = ?, phone = ?, address = ?, updated_at = ?
             WHERE id = ? AND shop_id = ?",
        )
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.address)
        .bind(customer.updated_at)
        .bind(id)
        .bind(shop_id)
        .execute(&self.pool)
        .await?;

        Ok(customer)
    }

    /// Deletes a customer.
    ///
    /// A customer who still owes money is only deleted with `force`; the
    /// outstanding amount is written off with them. Their sales stay, with
    /// `customer_id` cleared and the name snapshot intact.
    ///
    /// ## Errors
    /// - `NotFound` if the customer is not in this shop
    /// - `Core(CustomerHasDue)` if `due > 0` and `force` is false
    pub async fn delete(&self, shop_id: &str, id: &str, force: bool) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let due: i64 =
            sqlx::query_scalar("SELECT due_cents FROM customers WHERE id = ? AND shop_id = ?")
                .bind(id)
                .bind(shop_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| DbError::not_found("Customer", id))?;

        if due > 0 && !force {
            warn!(customer_id = %id, due_cents = due, "Refusing to delete customer with dues");
            return Err(CoreError::CustomerHasDue {
                customer_id: id.to_string(),
                due_cents: due,
            }
            .into());
        }

        sqlx::query("UPDATE sales SET customer_id = NULL WHERE customer_id = ? AND shop_id = ?")
            .bind(id)
            .bind(shop_id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("UPDATE due_payments SET customer_id = NULL WHERE customer_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        sqlx::query("DELETE FROM customers WHERE id = ? AND shop_id = ?")
            .bind(id)
            .bind(shop_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        if due > 0 {
            warn!(customer_id = %id, due_cents = due, "Deleted customer with outstanding due");
        } else {
            info!(customer_id = %id, "Customer deleted");
        }
        Ok(())
    }

    /// The customer's purchase history, newest first.
    pub async fn sales_for(&self, shop_id: &str, id: &str) -> DbResult<Vec<Sale>> {
        // Distinguish "no sales" from "no such customer"
        self.get(shop_id, id).await?;

        let sales = sqlx::query_as::<_, Sale>(
            "SELECT * FROM sales WHERE shop_id = ? AND customer_id = ?
             ORDER BY created_at DESC, invoice_number DESC",
        )
        .bind(shop_id)
        .bind(id)
        .fetch_all(&self.pool)
        .await?;
        Ok(sales)
    }

    /// Σ due across all customers of the shop.
    pub async fn total_dues(&self, shop_id: &str) -> DbResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(due_cents), 0) FROM customers WHERE shop_id = ?",
        )
        .bind(shop_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}

/// Inserts a customer on an existing connection or transaction.
pub(crate) async fn insert_customer(
    conn: &mut SqliteConnection,
    shop_id: &str,
    new: &NewCustomer,
) -> DbResult<Customer> {
    let now = Utc::now();
    let customer = Customer {
        id: new_id(),
        shop_id: shop_id.to_string(),
        name: new.name.trim().to_string(),
        phone: new.phone.trim().to_string(),
        address: new.address.trim().to_string(),
        due_cents: 0,
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        "INSERT INTO customers (id, shop_id, name, phone, address, due_cents, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&customer.id)
    .bind(&customer.shop_id)
    .bind(&customer.name)
    .bind(&customer.phone)
    .bind(&customer.address)
    .bind(customer.due_cents)
    .bind(customer.created_at)
    .bind(customer.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(customer)
}
