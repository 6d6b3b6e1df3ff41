//! # Error Types
//!
//! Domain-specific error types for shopkeep-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shopkeep-core errors (this file)                                      │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  shopkeep-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  server errors                                                         │
//! │  └── ApiError         - What the HTTP client sees (JSON)               │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business logic errors.
///
/// Raised by the ledger while quoting a sale or applying a payment. The
/// database layer re-raises them from inside transactions so a failed rule
/// rolls back every row touched so far.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Stock item cannot be found.
    #[error("Stock item not found: {0}")]
    StockItemNotFound(String),

    /// Customer cannot be found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    /// Sale cannot be found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Selling more units than are on the shelf.
    ///
    /// ## User Workflow
    /// ```text
    /// Add to sale (qty: 5)
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { sku: "RICE-5KG", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 RICE-5KG in stock"
    /// ```
    #[error("Insufficient stock for {sku}: available {available}, requested {requested}")]
    InsufficientStock {
        sku: String,
        available: i64,
        requested: i64,
    },

    /// A sale was submitted without any items.
    #[error("Sale has no items")]
    EmptyCart,

    /// Sale has exceeded the maximum number of distinct items.
    #[error("Sale cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Discount larger than the subtotal it applies to.
    #[error("Discount {discount_cents} exceeds subtotal {subtotal_cents}")]
    DiscountExceedsSubtotal {
        discount_cents: i64,
        subtotal_cents: i64,
    },

    /// A sale total does not fit in 64 bits.
    #[error("Amount too large while computing {what}")]
    AmountOverflow { what: String },

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Customer still owes money and the caller did not force the delete.
    #[error("Customer {customer_id} has an outstanding due of {due_cents}")]
    CustomerHasDue { customer_id: String, due_cents: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate SKU).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            sku: "RICE-5KG".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for RICE-5KG: available 3, requested 5"
        );

        let err = CoreError::DiscountExceedsSubtotal {
            discount_cents: 500,
            subtotal_cents: 400,
        };
        assert_eq!(err.to_string(), "Discount 500 exceeds subtotal 400");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "sku".to_string(),
        };
        assert_eq!(err.to_string(), "sku is required");

        let err = ValidationError::TooShort {
            field: "title".to_string(),
            min: 2,
        };
        assert_eq!(err.to_string(), "title must be at least 2 characters");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "name".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
