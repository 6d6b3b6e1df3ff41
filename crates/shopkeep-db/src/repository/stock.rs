//! # Stock Repository
//!
//! Stock items: listing, search, restocking and edits.
//!
//! ## Add or Restock
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  POST /api/stock { sku: "GROBASM7QK2ZD", quantity: 20, ... }           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SKU already in this shop?                                             │
//! │       │                                                                 │
//! │       ├── yes ──► stock = stock + 20   (name/prices untouched)         │
//! │       │                                                                 │
//! │       └── no  ──► INSERT with stock = 20                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Sales never go through this repository; they decrement stock inside the
//! sale transaction in [`super::SaleRepository`].

use chrono::Utc;
use shopkeep_core::validation::{
    validate_new_stock_item, validate_search_query, validate_stock_item_update,
};
use shopkeep_core::{NewStockItem, StockItem, StockItemUpdate};
use sqlx::SqlitePool;
use tracing::{debug, info};

use super::new_id;
use crate::error::{DbError, DbResult};

/// Repository for stock item operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.stock();
///
/// let hits = repo.search(&shop_id, "rice").await?;
/// let item = repo.get(&shop_id, &hits[0].id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

impl StockRepository {
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// All items, alphabetical by name.
    pub async fn list(&self, shop_id: &str) -> DbResult<Vec<StockItem>> {
        let items = sqlx::query_as::<_, StockItem>(
            "SELECT * FROM stock_items WHERE shop_id = ? ORDER BY name COLLATE NOCASE, sku",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    /// Case-insensitive substring search on name or SKU.
    ///
    /// An empty term returns everything.
    pub async fn search(&self, shop_id: &str, term: &str) -> DbResult<Vec<StockItem>> {
        let term = validate_search_query(term)?;
        if term.is_empty() {
            return self.list(shop_id).await;
        }

        debug!(query = %term, "Searching stock");

        let pattern = format!("%{}%", escape_like(&term));
        let items = sqlx::query_as::<_, StockItem>(
            r"SELECT * FROM stock_items
              WHERE shop_id = ?
                AND (name LIKE ? ESCAPE '\' OR sku LIKE ? ESCAPE '\')
              ORDER BY name COLLATE NOCASE, sku",
        )
        .bind(shop_id)
        .bind(&pattern)
        .bind(&pattern)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = items.len(), "Stock search returned items");
        Ok(items)
    }

    pub async fn get(&self, shop_id: &str, id: &str) -> DbResult<StockItem> {
        sqlx::query_as::<_, StockItem>("SELECT * FROM stock_items WHERE id = ? AND shop_id = ?")
            .bind(id)
            .bind(shop_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Stock item", id))
    }

    pub async fn get_by_sku(&self, shop_id: &str, sku: &str) -> DbResult<Option<StockItem>> {
        let item = sqlx::query_as::<_, StockItem>(
            "SELECT * FROM stock_items WHERE shop_id = ? AND sku = ?",
        )
        .bind(shop_id)
        .bind(sku.trim())
        .fetch_optional(&self.pool)
        .await?;
        Ok(item)
    }

    /// Inserts a new item, or adds `quantity` to the existing item with the
    /// same SKU. Returns the item as stored.
    pub async fn add_or_restock(&self, shop_id: &str, new: &NewStockItem) -> DbResult<StockItem> {
        validate_new_stock_item(new)?;

        let sku = new.sku.trim();
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let restocked = sqlx::query_as::<_, StockItem>(
            "UPDATE stock_items SET stock = stock + ?, updated_at = ?
             WHERE shop_id = ? AND sku = ?
             RETURNING *",
        )
        .bind(new.quantity)
        .bind(now)
        .bind(shop_id)
        .bind(sku)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(item) = restocked {
            tx.commit().await?;
            info!(sku = %item.sku, added = new.quantity, stock = item.stock, "Restocked item");
            return Ok(item);
        }

        let item = StockItem {
            id: new_id(),
            shop_id: shop_id.to_string(),
            sku: sku.to_string(),
            name: new.name.trim().to_string(),
            category: normalize_category(new.category.as_deref()),
            cost_price_cents: new.cost_price_cents,
            sale_price_cents: new.sale_price_cents,
            stock: new.quantity,
            reorder_level: new.reorder_level,
            created_at: now,
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO stock_items
                (id, shop_id, sku, name, category, cost_price_cents, sale_price_cents,
                 stock, reorder_level, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.shop_id)
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

        tx.commit().await?;

        info!(sku = %item.sku, stock = item.stock, "Added stock item");
        Ok(item)
    }

    /// Edits an item. Setting `stock` here records a stock-take correction.
    ///
    /// ## Errors
    /// - `NotFound` if the item is not in this shop
    /// - `UniqueViolation` if the new SKU is taken
    pub async fn update(
        &self,
        shop_id: &str,
        id: &str,
        update: &StockItemUpdate,
    ) -> DbResult<StockItem> {
        validate_stock_item_update(update)?;

        let mut item = self.get(shop_id, id).await?;

        if let Some(sku) = &update.sku {
            item.sku = sku.trim().to_string();
        }
        if let Some(name) = &update.name {
            item.name = name.trim().to_string();
        }
        if update.category.is_some() {
            item.category = normalize_category(update.category.as_deref());
        }
        if let Some(cost) = update.cost_price_cents {
            item.cost_price_cents = cost;
        }
        if let Some(price) = update.sale_price_cents {
            item.sale_price_cents = price;
        }
        if let Some(stock) = update.stock {
            item.stock = stock;
        }
        if let Some(level) = update.reorder_level {
            item.reorder_level = level;
        }
        item.updated_at = Utc::now();

        sqlx::query(
            "UPDATE stock_items
             SET sku = ?, name = ?, category = ?, cost_price_cents = ?, sale_price_cents = ?,
                 stock = ?, reorder_level = ?, updated_at = ?
             WHERE id = ? AND shop_id = ?",
        )
        .bind(&item.sku)
        .bind(&item.name)
        .bind(&item.category)
        .bind(item.cost_price_cents)
        .bind(item.sale_price_cents)
        .bind(item.stock)
        .bind(item.reorder_level)
        .bind(item.updated_at)
        .bind(id)
        .bind(shop_id)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::duplicate("sku", &item.sku),
            other => other,
        })?;

        debug!(id = %id, "Updated stock item");
        Ok(item)
    }

    /// Deletes an item. Past sales keep their snapshot lines.
    pub async fn delete(&self, shop_id: &str, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM stock_items WHERE id = ? AND shop_id = ?")
            .bind(id)
            .bind(shop_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Stock item", id));
        }

        info!(id = %id, "Deleted stock item");
        Ok(())
    }

    /// Items at or below their reorder level, emptiest first.
    pub async fn low_stock(&self, shop_id: &str) -> DbResult<Vec<StockItem>> {
        let items = sqlx::query_as::<_, StockItem>(
            "SELECT * FROM stock_items
             WHERE shop_id = ? AND stock <= reorder_level
             ORDER BY stock, name COLLATE NOCASE",
        )
        .bind(shop_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(items)
    }

    pub async fn count(&self, shop_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stock_items WHERE shop_id = ?")
            .bind(shop_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

fn normalize_category(category: Option<&str>) -> Option<String> {
    category
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Escapes LIKE wildcards so user input matches literally.
fn escape_like(term: &str) -> String {
    let mut out = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{add_item, setup};

    #[tokio::test]
    async fn test_add_then_restock_same_sku() {
        let (db, shop_id) = setup().await;

        let first = add_item(&db, &shop_id, "RICE-5KG", 40_000, 52_500, 10).await;
        assert_eq!(first.stock, 10);

        let again = add_item(&db, &shop_id, "RICE-5KG", 1, 1, 5).await;
        assert_eq!(again.id, first.id);
        assert_eq!(again.stock, 15);
        // Restocking never rewrites prices
        assert_eq!(again.sale_price_cents, 52_500);

        assert_eq!(db.stock().count(&shop_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search_is_case_insensitive_on_name_and_sku() {
        let (db, shop_id) = setup().await;
        add_item(&db, &shop_id, "RICE-5KG", 1, 2, 1).await;
        add_item(&db, &shop_id, "TEA-250", 1, 2, 1).await;
        add_item(&db, &shop_id, "100_PCT", 1, 2, 1).await;

        let hits = db.stock().search(&shop_id, "rice").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].sku, "RICE-5KG");

        let hits = db.stock().search(&shop_id, "item tea").await.unwrap();
        assert_eq!(hits.len(), 1);

        // '_' matches literally
        let hits = db.stock().search(&shop_id, "0_p").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].sku, "100_PCT");

        assert_eq!(db.stock().search(&shop_id, "  ").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_update_and_low_stock() {
        let (db, shop_id) = setup().await;
        let item = add_item(&db, &shop_id, "TEA-250", 8_000, 10_000, 10).await;
        assert!(db.stock().low_stock(&shop_id).await.unwrap().is_empty());

        let updated = db
            .stock()
            .update(
                &shop_id,
                &item.id,
                &StockItemUpdate {
                    stock: Some(2),
                    category: Some(String::new()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.stock, 2);
        assert!(updated.category.is_none());

        let low = db.stock().low_stock(&shop_id).await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].id, item.id);
    }

    #[tokio::test]
    async fn test_update_to_taken_sku_fails() {
        let (db, shop_id) = setup().await;
        add_item(&db, &shop_id, "A-1", 1, 2, 1).await;
        let b = add_item(&db, &shop_id, "B-1", 1, 2, 1).await;

        let err = db
            .stock()
            .update(
                &shop_id,
                &b.id,
                &StockItemUpdate {
                    sku: Some("A-1".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "sku"));
    }

    #[tokio::test]
    async fn test_items_are_scoped_to_shop() {
        let (db, shop_id) = setup().await;
        let item = add_item(&db, &shop_id, "A-1", 1, 2, 1).await;

        let other = db
            .shops()
            .create_with_settings("other@example.com", "hash")
            .await
            .unwrap();

        assert!(db.stock().get(&other.id, &item.id).await.unwrap_err().is_not_found());
        assert!(db.stock().delete(&other.id, &item.id).await.is_err());
        assert!(db.stock().list(&other.id).await.unwrap().is_empty());

        db.stock().delete(&shop_id, &item.id).await.unwrap();
        assert_eq!(db.stock().count(&shop_id).await.unwrap(), 0);
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off"), r"50\%\_off");
        assert_eq!(escape_like("plain"), "plain");
    }
}
