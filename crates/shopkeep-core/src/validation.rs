//! # Validation Module
//!
//! Input validation for everything the HTTP layer accepts.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Web form                                                     │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Server handler                                               │
//! │  ├── Type validation (serde deserialization)                           │
//! │  └── THIS MODULE: field rules (lengths, ranges, formats)               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Ledger + SQLite                                              │
//! │  ├── Stock / due rules inside the transaction                          │
//! │  └── UNIQUE, CHECK and foreign key constraints                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shopkeep_core::validation::{validate_sku, validate_quantity};
//!
//! assert!(validate_sku("RICE-5KG").is_ok());
//! assert!(validate_quantity(5).is_ok());
//! ```

use chrono::NaiveDate;

use crate::error::ValidationError;
use crate::types::{
    CustomerUpdate, NewCustomer, NewExpense, NewSale, NewStockItem, SaleCustomer, SettingsUpdate,
    StockItemUpdate,
};
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_SKU_LEN: usize = 50;
const MAX_PHONE_LEN: usize = 30;
const MAX_ADDRESS_LEN: usize = 500;
const MIN_PASSWORD_LEN: usize = 6;

// =============================================================================
// String Validators
// =============================================================================

fn check_length(field: &str, value: &str, min: usize, max: usize) -> ValidationResult<()> {
    let len = value.chars().count();

    if len == 0 && min > 0 {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if len < min {
        return Err(ValidationError::TooShort {
            field: field.to_string(),
            min,
        });
    }

    if len > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, digits, hyphens and underscores
///
/// ## Example
/// ```rust
/// use shopkeep_core::validation::validate_sku;
///
/// assert!(validate_sku("GRO-RICE-A1B2").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();
    check_length("sku", sku, 1, MAX_SKU_LEN)?;

    if !sku
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

/// Validates a stock item name: 2 to 200 characters.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    check_length("name", name.trim(), 2, MAX_NAME_LEN)
}

pub fn validate_customer_name(name: &str) -> ValidationResult<()> {
    check_length("name", name.trim(), 1, MAX_NAME_LEN)
}

/// Validates a phone number. Empty is allowed; otherwise digits, spaces,
/// `+` and `-` only.
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let phone = phone.trim();
    check_length("phone", phone, 0, MAX_PHONE_LEN)?;

    if !phone
        .chars()
        .all(|c| c.is_ascii_digit() || c == ' ' || c == '+' || c == '-')
    {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must contain only digits, spaces, '+' and '-'".to_string(),
        });
    }

    Ok(())
}

pub fn validate_address(address: &str) -> ValidationResult<()> {
    check_length("address", address.trim(), 0, MAX_ADDRESS_LEN)
}

pub fn validate_expense_title(title: &str) -> ValidationResult<()> {
    check_length("title", title.trim(), 2, MAX_NAME_LEN)
}

pub fn validate_expense_category(category: &str) -> ValidationResult<()> {
    check_length("category", category.trim(), 2, MAX_NAME_LEN)
}

/// Validates a search query and returns it trimmed. Empty means "everything".
pub fn validate_search_query(query: &str) -> ValidationResult<String> {
    let query = query.trim();
    check_length("query", query, 0, 100)?;
    Ok(query.to_string())
}

/// Validates an email address shape: `local@domain.tld`.
///
/// ```rust
/// use shopkeep_core::validation::validate_email;
///
/// assert!(validate_email("owner@shop.in").is_ok());
/// assert!(validate_email("owner@shop").is_err());
/// assert!(validate_email("@shop.in").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();
    check_length("email", email, 1, 254)?;

    let invalid = || ValidationError::InvalidFormat {
        field: "email".to_string(),
        reason: "must look like name@example.com".to_string(),
    };

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty()
        || domain.contains('@')
        || email.chars().any(char::is_whitespace)
        || !domain.contains('.')
        || domain.starts_with('.')
        || domain.ends_with('.')
    {
        return Err(invalid());
    }

    Ok(())
}

pub fn validate_password(password: &str) -> ValidationResult<()> {
    check_length("password", password, MIN_PASSWORD_LEN, 128)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity on a sale line or a restock.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed [`MAX_LINE_QUANTITY`]
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Non-negative money amount. Zero is fine (free items, zero discount).
///
/// ```rust
/// use shopkeep_core::validation::validate_non_negative_cents;
///
/// assert!(validate_non_negative_cents("salePrice", 0).is_ok());
/// assert!(validate_non_negative_cents("salePrice", -100).is_err());
/// ```
pub fn validate_non_negative_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Unit price: 0 to [`MAX_PRICE_CENTS`].
///
/// ```rust
/// use shopkeep_core::validation::validate_price_cents;
/// use shopkeep_core::MAX_PRICE_CENTS;
///
/// assert!(validate_price_cents("salePrice", 52_500).is_ok());
/// assert!(validate_price_cents("salePrice", MAX_PRICE_CENTS + 1).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    validate_non_negative_cents(field, cents)?;

    if cents > MAX_PRICE_CENTS {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Strictly positive money amount (expenses, payments).
pub fn validate_positive_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents <= 0 {
        return Err(ValidationError::MustBePositive {
            field: field.to_string(),
        });
    }

    Ok(())
}

pub fn validate_count(field: &str, value: i64) -> ValidationResult<()> {
    if value < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points: 0 to 10000 (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "taxRate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

pub fn validate_date_range(from: NaiveDate, to: NaiveDate) -> ValidationResult<()> {
    if from > to {
        return Err(ValidationError::InvalidFormat {
            field: "from".to_string(),
            reason: format!("start date {} is after end date {}", from, to),
        });
    }

    Ok(())
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
///
/// ```rust
/// use shopkeep_core::validation::validate_uuid;
///
/// assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
/// assert!(validate_uuid("not-a-uuid").is_err());
/// ```
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "id".to_string(),
        });
    }

    uuid::Uuid::parse_str(id).map_err(|_| ValidationError::InvalidFormat {
        field: "id".to_string(),
        reason: "must be a valid UUID".to_string(),
    })?;

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

pub fn validate_new_stock_item(item: &NewStockItem) -> ValidationResult<()> {
    validate_sku(&item.sku)?;
    validate_item_name(&item.name)?;
    if let Some(category) = &item.category {
        check_length("category", category.trim(), 0, MAX_NAME_LEN)?;
    }
    validate_price_cents("costPrice", item.cost_price_cents)?;
    validate_price_cents("salePrice", item.sale_price_cents)?;
    validate_quantity(item.quantity)?;
    validate_count("reorderLevel", item.reorder_level)
}

pub fn validate_stock_item_update(update: &StockItemUpdate) -> ValidationResult<()> {
    if let Some(sku) = &update.sku {
        validate_sku(sku)?;
    }
    if let Some(name) = &update.name {
        validate_item_name(name)?;
    }
    if let Some(category) = &update.category {
        check_length("category", category.trim(), 0, MAX_NAME_LEN)?;
    }
    if let Some(cost) = update.cost_price_cents {
        validate_price_cents("costPrice", cost)?;
    }
    if let Some(price) = update.sale_price_cents {
        validate_price_cents("salePrice", price)?;
    }
    if let Some(stock) = update.stock {
        validate_count("stock", stock)?;
    }
    if let Some(level) = update.reorder_level {
        validate_count("reorderLevel", level)?;
    }
    Ok(())
}

pub fn validate_new_customer(customer: &NewCustomer) -> ValidationResult<()> {
    validate_customer_name(&customer.name)?;
    validate_phone(&customer.phone)?;
    validate_address(&customer.address)
}

pub fn validate_customer_update(update: &CustomerUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.name {
        validate_customer_name(name)?;
    }
    if let Some(phone) = &update.phone {
        validate_phone(phone)?;
    }
    if let Some(address) = &update.address {
        validate_address(address)?;
    }
    Ok(())
}

pub fn validate_new_expense(expense: &NewExpense) -> ValidationResult<()> {
    validate_expense_title(&expense.title)?;
    validate_expense_category(&expense.category)?;
    validate_positive_cents("amount", expense.amount_cents)
}

pub fn validate_settings_update(update: &SettingsUpdate) -> ValidationResult<()> {
    if let Some(name) = &update.shop_name {
        check_length("shopName", name.trim(), 1, MAX_NAME_LEN)?;
    }
    if let Some(gstin) = &update.gstin {
        check_length("gstin", gstin.trim(), 0, 20)?;
    }
    if let Some(phone) = &update.phone {
        validate_phone(phone)?;
    }
    if let Some(address) = &update.address {
        validate_address(address)?;
    }
    if let Some(bps) = update.default_tax_bps {
        validate_tax_rate_bps(bps)?;
    }
    if let Some(symbol) = &update.currency_symbol {
        check_length("currencySymbol", symbol.trim(), 1, 5)?;
    }
    Ok(())
}

/// Shape checks on a sale request. Stock and due rules run later, inside
/// the sale transaction.
pub fn validate_new_sale(sale: &NewSale) -> ValidationResult<()> {
    match &sale.customer {
        SaleCustomer::Existing { id } => validate_uuid(id)?,
        SaleCustomer::New {
            name,
            phone,
            address,
        } => {
            validate_customer_name(name)?;
            validate_phone(phone)?;
            validate_address(address)?;
        }
    }

    if sale.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        });
    }

    if sale.items.len() > MAX_CART_LINES {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_CART_LINES as i64,
        });
    }

    for line in &sale.items {
        validate_uuid(&line.stock_item_id)?;
        validate_quantity(line.quantity)?;
    }

    validate_non_negative_cents("discount", sale.discount_cents)?;
    if let Some(bps) = sale.tax_rate_bps {
        validate_tax_rate_bps(bps)?;
    }
    if let Some(paid) = sale.amount_paid_cents {
        validate_non_negative_cents("amountPaid", paid)?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
