//! # Shop Repository
//!
//! Tenants. A shop is created together with its default settings in one
//! transaction, so a shop without settings never exists.

use chrono::Utc;
use shopkeep_core::{Shop, ShopSettings};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::new_id;
use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct ShopRepository {
    pool: SqlitePool,
}

impl ShopRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ShopRepository { pool }
    }

    /// Creates a shop and its default settings atomically.
    ///
    /// ## Errors
    /// - `UniqueViolation` if the email already has a shop (case-insensitive)
    pub async fn create_with_settings(&self, email: &str, password_hash: &str) -> DbResult<Shop> {
        let email = email.trim();
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let existing: Option<String> = sqlx::query_scalar("SELECT id FROM shops WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_some() {
            return Err(DbError::duplicate("email", email));
        }

        let shop = Shop {
            id: new_id(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            next_invoice_number: 1,
            created_at: now,
        };

        sqlx::query(
            "INSERT INTO shops (id, email, password_hash, next_invoice_number, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&shop.id)
        .bind(&shop.email)
        .bind(&shop.password_hash)
        .bind(shop.next_invoice_number)
        .bind(shop.created_at)
        .execute(&mut *tx)
        .await?;

        let settings = ShopSettings::defaults_for(&shop.id, now);
        sqlx::query(
            "INSERT INTO shop_settings
                (shop_id, shop_name, gstin, phone, address, default_tax_bps, currency_symbol, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&settings.shop_id)
        .bind(&settings.shop_name)
        .bind(&settings.gstin)
        .bind(&settings.phone)
        .bind(&settings.address)
        .bind(settings.default_tax_bps)
        .bind(&settings.currency_symbol)
        .bind(settings.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(shop_id = %shop.id, "Shop created");
        Ok(shop)
    }

    pub async fn get(&self, id: &str) -> DbResult<Shop> {
        sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Shop", id))
    }

    /// Looks up a shop by login email (case-insensitive).
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Shop>> {
        debug!("Looking up shop by email");
        let shop = sqlx::query_as::<_, Shop>("SELECT * FROM shops WHERE email = ?")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(shop)
    }
}
