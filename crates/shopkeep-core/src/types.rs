//! # Domain Types
//!
//! Entities stored by Shopkeep and the request shapes that create them.
//!
//! ## Entity Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌──────────────┐ 1   1 ┌──────────────┐                                │
//! │  │    Shop      │───────│ ShopSettings │                                │
//! │  └──────┬───────┘       └──────────────┘                                │
//! │         │ 1                                                             │
//! │         │ n                                                             │
//! │  ┌──────▼───────┐     ┌──────────────┐     ┌──────────────┐            │
//! │  │  StockItem   │     │   Customer   │     │   Expense    │            │
//! │  │  stock       │     │   due_cents  │     │   date       │            │
//! │  └──────┬───────┘     └──────┬───────┘     └──────────────┘            │
//! │         │ snapshot           │ 0..1                                     │
//! │  ┌──────▼───────┐ n   1 ┌────▼─────────┐ 1   n ┌──────────────┐        │
//! │  │   SaleItem   │───────│     Sale     │───────│  DuePayment  │        │
//! │  └──────────────┘       │  due_cents   │       └──────────────┘        │
//! │                         └──────────────┘                                │
//! │                                                                         │
//! │  Invariant: customer.due_cents == Σ sale.due_cents of that customer    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Money Fields
//! Every amount is an `i64` in minor units with a `_cents` suffix. Use the
//! accessor methods (`grand_total()`, `due()`, ...) to get a [`Money`].
//!
//! ## Sale Items Are Snapshots
//! A [`SaleItem`] copies name, SKU and both prices at the moment of sale.
//! Editing or deleting the stock item later never rewrites history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, TaxRate};

// =============================================================================
// Shop & Settings
// =============================================================================

/// The authenticated tenant. One shop owner, one shop.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Shop {
    pub id: String,
    pub email: String,

    /// Argon2 PHC string. Never serialized to clients.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,

    /// Next invoice number to hand out. Starts at 1.
    pub next_invoice_number: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Shop details printed on invoices, plus the default GST rate.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShopSettings {
    pub shop_id: String,
    pub shop_name: String,
    pub gstin: String,
    pub phone: String,
    pub address: String,

    /// Tax rate pre-filled on new sales, in basis points.
    pub default_tax_bps: u32,

    pub currency_symbol: String,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl ShopSettings {
    pub const DEFAULT_SHOP_NAME: &'static str = "My Shop";
    pub const DEFAULT_TAX_BPS: u32 = 500;
    pub const DEFAULT_CURRENCY_SYMBOL: &'static str = "₹";

    /// Settings a freshly signed-up shop starts with.
    pub fn defaults_for(shop_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        ShopSettings {
            shop_id: shop_id.into(),
            shop_name: Self::DEFAULT_SHOP_NAME.to_string(),
            gstin: String::new(),
            phone: String::new(),
            address: String::new(),
            default_tax_bps: Self::DEFAULT_TAX_BPS,
            currency_symbol: Self::DEFAULT_CURRENCY_SYMBOL.to_string(),
            updated_at: now,
        }
    }

    #[inline]
    pub fn default_tax(&self) -> TaxRate {
        TaxRate::from_bps(self.default_tax_bps)
    }
}

/// Partial settings update. Absent fields keep their stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SettingsUpdate {
    pub shop_name: Option<String>,
    pub gstin: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub default_tax_bps: Option<u32>,
    pub currency_symbol: Option<String>,
}

// =============================================================================
// Stock
// =============================================================================

/// An item on the shop's shelves.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockItem {
    pub id: String,
    pub shop_id: String,

    /// Unique per shop.
    pub sku: String,

    pub name: String,
    pub category: Option<String>,
    pub cost_price_cents: i64,
    pub sale_price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    /// At or below this level the item shows up as low stock.
    pub reorder_level: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    #[inline]
    pub fn cost_price(&self) -> Money {
        Money::from_cents(self.cost_price_cents)
    }

    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }

    /// True when stock has fallen to the reorder level or below.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.reorder_level
    }

    /// Retail value of everything on hand, saturating at the `i64` bounds.
    #[inline]
    pub fn stock_value(&self) -> Money {
        self.sale_price().saturating_mul(self.stock)
    }

    /// Margin earned per unit sold at the listed price.
    #[inline]
    pub fn unit_margin(&self) -> Money {
        self.sale_price() - self.cost_price()
    }
}

/// Request to add a stock item, or restock it when the SKU already exists.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewStockItem {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    pub cost_price_cents: i64,
    pub sale_price_cents: i64,
    /// Units being added.
    pub quantity: i64,
    #[serde(default)]
    pub reorder_level: i64,
}

/// Editable stock item fields. `stock` is set outright here, which is how a
/// stock-take correction is recorded.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StockItemUpdate {
    pub sku: Option<String>,
    pub name: Option<String>,
    /// `Some("")` clears the category.
    pub category: Option<String>,
    pub cost_price_cents: Option<i64>,
    pub sale_price_cents: Option<i64>,
    pub stock: Option<i64>,
    pub reorder_level: Option<i64>,
}

// =============================================================================
// Customers
// =============================================================================

/// A customer with a running receivable balance.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub shop_id: String,
    pub name: String,
    pub phone: String,
    pub address: String,

    /// Outstanding amount across all of this customer's sales.
    pub due_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    #[inline]
    pub fn due(&self) -> Money {
        Money::from_cents(self.due_cents)
    }

    #[inline]
    pub fn has_due(&self) -> bool {
        self.due_cents > 0
    }

    /// Adds the unpaid part of a new sale to the balance.
    pub fn add_due(&mut self, amount: Money) {
        self.due_cents += amount.cents();
    }

    /// Reduces the balance by a recorded payment, never below zero.
    pub fn apply_payment(&mut self, amount: Money) {
        self.due_cents = (self.due() - amount).clamp_non_negative().cents();
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewCustomer {
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

/// Contact details only. The due balance moves through sales and payments.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

// =============================================================================
// Payment Mode
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentMode {
    #[default]
    Cash,
    Card,
    Upi,
}

impl PaymentMode {
    /// Label printed on invoices.
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMode::Cash => "Cash",
            PaymentMode::Card => "Card",
            PaymentMode::Upi => "UPI",
        }
    }
}

// =============================================================================
// Sales
// =============================================================================

/// A completed sale. Immutable except for `amount_paid_cents` and
/// `due_cents`, which move when a due payment is recorded.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub shop_id: String,

    /// Sequential per shop, starting at 1.
    pub invoice_number: i64,

    /// `None` once the customer has been deleted.
    pub customer_id: Option<String>,

    /// Name at the time of sale, kept after the customer is deleted.
    pub customer_name: String,

    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_rate_bps: u32,
    pub tax_cents: i64,
    pub grand_total_cents: i64,
    pub amount_paid_cents: i64,
    pub due_cents: i64,

    /// Cash handed back when the customer over-paid at the counter.
    pub change_cents: i64,

    pub profit_cents: i64,
    pub payment_mode: PaymentMode,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn taxable_amount(&self) -> Money {
        self.subtotal() - self.discount()
    }

    #[inline]
    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn grand_total(&self) -> Money {
        Money::from_cents(self.grand_total_cents)
    }

    #[inline]
    pub fn amount_paid(&self) -> Money {
        Money::from_cents(self.amount_paid_cents)
    }

    #[inline]
    pub fn due(&self) -> Money {
        Money::from_cents(self.due_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }

    #[inline]
    pub fn profit(&self) -> Money {
        Money::from_cents(self.profit_cents)
    }

    #[inline]
    pub fn is_settled(&self) -> bool {
        self.due_cents == 0
    }

    /// Calendar date (UTC) the sale is reported under.
    #[inline]
    pub fn date(&self) -> NaiveDate {
        self.created_at.date_naive()
    }
}

/// One line of a sale, copied from the stock item when the sale was made.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub stock_item_id: String,
    pub sku: String,
    pub name: String,
    pub category: Option<String>,
    pub cost_price_cents: i64,
    pub sale_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }

    #[inline]
    pub fn sale_price(&self) -> Money {
        Money::from_cents(self.sale_price_cents)
    }
}

/// A payment recorded later against a sale's outstanding due.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DuePayment {
    pub id: String,
    pub sale_id: String,
    pub customer_id: Option<String>,
    pub amount_cents: i64,
    pub payment_mode: PaymentMode,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A sale with its lines and later payments.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
    pub payments: Vec<DuePayment>,
}

/// Who the sale is billed to.
///
/// `New` creates the customer inside the sale transaction, matching the
/// "add customer while billing" flow at the counter.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase", tag = "kind")]
#[ts(export)]
pub enum SaleCustomer {
    Existing {
        id: String,
    },
    New {
        name: String,
        #[serde(default)]
        phone: String,
        #[serde(default)]
        address: String,
    },
}

/// One requested line of a new sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLineRequest {
    pub stock_item_id: String,
    pub quantity: i64,
}

/// Everything needed to record a sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewSale {
    pub customer: SaleCustomer,
    pub items: Vec<SaleLineRequest>,

    #[serde(default)]
    pub discount_cents: i64,

    /// Falls back to the shop's default rate when absent.
    #[serde(default)]
    pub tax_rate_bps: Option<u32>,

    /// Falls back to the grand total (paid in full) when absent.
    #[serde(default)]
    pub amount_paid_cents: Option<i64>,

    #[serde(default)]
    pub payment_mode: PaymentMode,
}

/// Request body for paying off part of a sale's due.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewDuePayment {
    pub amount_cents: i64,
    #[serde(default)]
    pub payment_mode: PaymentMode,
}

// =============================================================================
// Expenses
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Expense {
    pub id: String,
    pub shop_id: String,

    /// Day the expense counts against, chosen by the user.
    #[ts(as = "String")]
    pub date: NaiveDate,

    pub title: String,
    pub category: String,
    pub amount_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewExpense {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub title: String,
    pub category: String,
    pub amount_cents: i64,
}
