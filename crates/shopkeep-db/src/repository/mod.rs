//! # Repository Module
//!
//! Database repositories for Shopkeep.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.sales().record_sale(&shop_id, &new_sale)                   │
//! │       ▼                                                                 │
//! │  SaleRepository                                                        │
//! │  ├── BEGIN                                                             │
//! │  ├── shopkeep-core: Cart, quote(), validate_due_payment()              │
//! │  ├── UPDATE stock / INSERT sale / UPDATE customer                      │
//! │  └── COMMIT (or ROLLBACK on any error)                                 │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Every method takes the caller's shop_id and filters on it. A row      │
//! │  belonging to another shop is reported as NotFound.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ShopRepository`] - Sign-up and login lookups
//! - [`SettingsRepository`] - Invoice header and default tax
//! - [`StockRepository`] - Stock items, search, restock, low stock
//! - [`CustomerRepository`] - Customers and their dues
//! - [`SaleRepository`] - Atomic sale and payment recording
//! - [`ExpenseRepository`] - Expense log
//! - [`ReportRepository`] - Period reports, dashboard, JSON backup and restore

pub mod customer;
pub mod expense;
pub mod report;
pub mod sale;
pub mod settings;
pub mod shop;
pub mod stock;

pub use customer::CustomerRepository;
pub use expense::ExpenseRepository;
pub use report::{ImportSummary, ReportRepository, ShopExport};
pub use sale::SaleRepository;
pub use settings::SettingsRepository;
pub use shop::ShopRepository;
pub use stock::StockRepository;

/// Generates a new entity id.
pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::{Database, DbConfig};
    use shopkeep_core::{NewCustomer, NewStockItem, StockItem};

    /// Fresh in-memory database with one signed-up shop.
    pub async fn setup() -> (Database, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let shop = db
            .shops()
            .create_with_settings("owner@example.com", "$argon2id$test")
            .await
            .unwrap();
        (db, shop.id)
    }

    pub async fn add_item(
        db: &Database,
        shop_id: &str,
        sku: &str,
        cost: i64,
        price: i64,
        qty: i64,
    ) -> StockItem {
        db.stock()
            .add_or_restock(
                shop_id,
                &NewStockItem {
                    sku: sku.to_string(),
                    name: format!("Item {}", sku),
                    category: Some("General".to_string()),
                    cost_price_cents: cost,
                    sale_price_cents: price,
                    quantity: qty,
                    reorder_level: 2,
                },
            )
            .await
            .unwrap()
    }

    pub fn customer(name: &str) -> NewCustomer {
        NewCustomer {
            name: name.to_string(),
            phone: "98765 43210".to_string(),
            address: "MG Road".to_string(),
        }
    }
}
