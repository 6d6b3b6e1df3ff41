//! # Settings Repository
//!
//! Shop name, address, GSTIN and the default tax rate printed on invoices.

use chrono::Utc;
use shopkeep_core::validation::validate_settings_update;
use shopkeep_core::{SettingsUpdate, ShopSettings};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::{DbError, DbResult};

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    pub async fn get(&self, shop_id: &str) -> DbResult<ShopSettings> {
        sqlx::query_as::<_, ShopSettings>("SELECT * FROM shop_settings WHERE shop_id = ?")
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Settings", shop_id))
    }

    /// Applies a partial update and returns the stored result.
    pub async fn update(&self, shop_id: &str, update: &SettingsUpdate) -> DbResult<ShopSettings> {
        validate_settings_update(update)?;

        let mut settings = self.get(shop_id).await?;

        if let Some(name) = &update.shop_name {
            settings.shop_name = name.trim().to_string();
        }
        if let Some(gstin) = &update.gstin {
            settings.gstin = gstin.trim().to_uppercase();
        }
        if let Some(phone) = &update.phone {
            settings.phone = phone.trim().to_string();
        }
        if let Some(address) = &update.address {
            settings.address = address.trim().to_string();
        }
        if let Some(bps) = update.default_tax_bps {
            settings.default_tax_bps = bps;
        }
        if let Some(symbol) = &update.currency_symbol {
            settings.currency_symbol = symbol.trim().to_string();
        }
        settings.updated_at = Utc::now();

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
        .bind(settings.updated_at)
        .bind(shop_id)
        .execute(&self.pool)
        .await?;

        info!(shop_id = %shop_id, "Settings updated");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup;
    use shopkeep_core::CoreError;

    #[tokio::test]
    async fn test_partial_update_keeps_other_fields() {
        let (db, shop_id) = setup().await;

        let updated = db
            .settings()
            .update(
                &shop_id,
                &SettingsUpdate {
                    shop_name: Some("Sharma General Store".to_string()),
                    gstin: Some("27abcde1234f1z5".to_string()),
                    default_tax_bps: Some(1200),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.shop_name, "Sharma General Store");
        assert_eq!(updated.gstin, "27ABCDE1234F1Z5");
        assert_eq!(updated.default_tax_bps, 1200);
        assert_eq!(updated.currency_symbol, "₹");

        let stored = db.settings().get(&shop_id).await.unwrap();
        assert_eq!(stored.shop_name, "Sharma General Store");
        assert_eq!(stored.default_tax_bps, 1200);
    }

    #[tokio::test]
    async fn test_tax_rate_over_100_percent_is_rejected() {
        let (db, shop_id) = setup().await;
        let err = db
            .settings()
            .update(
                &shop_id,
                &SettingsUpdate {
                    default_tax_bps: Some(10_001),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
    }
}
