//! # Expense Repository
//!
//! Shop running costs. Expenses carry a user-chosen date rather than the
//! insert time, so reports can back-date rent paid late.

use chrono::{NaiveDate, Utc};
use shopkeep_core::validation::{validate_date_range, validate_new_expense};
use shopkeep_core::{Expense, NewExpense};
use sqlx::SqlitePool;
use tracing::info;

use super::new_id;
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    pub async fn create(&self, shop_id: &str, new: &NewExpense) -> DbResult<Expense> {
        validate_new_expense(new)?;

        let expense = Expense {
            id: new_id(),
            shop_id: shop_id.to_string(),
            date: new.date,
            title: new.title.trim().to_string(),
            category: new.category.trim().to_string(),
            amount_cents: new.amount_cents,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO expenses (id, shop_id, date, title, category, amount_cents, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&expense.id)
        .bind(&expense.shop_id)
        .bind(expense.date)
        .bind(&expense.title)
        .bind(&expense.category)
        .bind(expense.amount_cents)
        .bind(expense.created_at)
        .execute(&self.pool)
        .await?;

        info!(expense_id = %expense.id, amount = %expense.amount(), "Expense recorded");
        Ok(expense)
    }

    /// All expenses, newest date first.
    pub async fn list(&self, shop_id: &str) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            "SELECT * FROM expenses WHERE shop_id = ? ORDER BY date DESC, created_at DESC",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    /// Expenses dated within `start..=end`, oldest first.
    pub async fn list_between(
        &self,
        shop_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<Expense>> {
        validate_date_range(start, end)?;

        let expenses = sqlx::query_as::<_, Expense>(
            "SELECT * FROM expenses
             WHERE shop_id = ? AND date BETWEEN ? AND ?
             ORDER BY date, created_at",
        )
        .bind(shop_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    pub async fn delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM expenses WHERE id = ? AND shop_id = ?")
            .bind(id)
            .bind(shop_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Expense", id));
        }

        info!(expense_id = %id, "Expense deleted");
        Ok(())
    }
}
