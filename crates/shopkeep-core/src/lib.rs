//! # shopkeep-core: Pure Business Logic for Shopkeep
//!
//! Everything that decides *what* a sale, a payment or a report is lives
//! here, as pure functions over plain data. Persistence and HTTP sit on top.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Shopkeep Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    Web frontend                                 │   │
//! │  │    Stock ──► New Sale ──► Invoice ──► Dues ──► Reports          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apps/server (axum)                           │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shopkeep-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐   │   │
//! │  │   │  types  │ │  money  │ │ ledger  │ │ reports │ │ invoice │   │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 shopkeep-db (SQLite, transactions)              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (StockItem, Customer, Sale, Expense, ...)
//! - [`money`] - Integer money and basis-point tax rates
//! - [`ledger`] - Cart, sale quotes and due-payment rules
//! - [`reports`] - Period report and dashboard aggregation
//! - [`invoice`] - Printable plain-text invoice
//! - [`sku`] - SKU generation
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use shopkeep_core::money::{Money, TaxRate};
//!
//! // ₹100.00 of goods at 5% GST
//! let taxable = Money::from_cents(10_000);
//! let gst = taxable.calculate_tax(TaxRate::from_bps(500));
//! assert_eq!(gst.cents(), 500);
//! ```

pub mod error;
pub mod invoice;
pub mod ledger;
pub mod money;
pub mod reports;
pub mod sku;
pub mod types;
pub mod validation;

pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{Cart, CartLine, SaleQuote, SaleTerms};
pub use money::{Money, TaxRate};
pub use reports::{DailyRevenue, DashboardSummary, PeriodReport};
pub use types::*;

/// Maximum distinct stock items in a single sale.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of one stock item in a single sale.
///
/// Catches typos like 10000 instead of 10 before they hit the stock count.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Largest accepted unit price, in minor units (₹1,000 crore).
///
/// With [`MAX_LINE_QUANTITY`] and [`MAX_CART_LINES`] this keeps every sale
/// total inside an `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000_000;

/// Number of sales shown in the dashboard's "recent sales" table.
pub const RECENT_SALES_LIMIT: usize = 5;
