//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Shopkeep                               │
//! │                                                                         │
//! │  Handler                                                               │
//! │  ApiResult<Json<T>>                                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Database Error? ─── DbError::QueryFailed("...") ──┐                   │
//! │         │                                          │                   │
//! │         ▼                                          ▼                   │
//! │  Ledger rule?   ─── CoreError::InsufficientStock ── ApiError ──► HTTP  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success ──────────────────────────────────────────────────────► 200   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! What the client receives when a request fails:
//! ```json
//! { "code": "INSUFFICIENT_STOCK", "message": "Only 3 RICE-5KG in stock, 5 requested" }
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use shopkeep_core::CoreError;
use shopkeep_db::DbError;

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Missing or bad credentials (401)
    Unauthorized,

    /// Duplicate SKU or email (409)
    Conflict,

    /// Not enough units on the shelf (422)
    InsufficientStock,

    /// Business rule rejected the request (422)
    BusinessLogic,

    /// Due payment out of range (422)
    PaymentError,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InsufficientStock | ErrorCode::BusinessLogic | ErrorCode::PaymentError => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    /// Logs the detail and returns a generic message.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        tracing::error!("Internal error: {}", message);
        ApiError::new(ErrorCode::Internal, "Internal server error")
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Core(e) => e.into(),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::validation("Invalid reference")
            }
            DbError::ConnectionFailed(e) => {
                tracing::error!("Database connection failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(e) => {
                tracing::error!("Database migration failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::StockItemNotFound(id) => ApiError::not_found("Stock item", &id),
            CoreError::CustomerNotFound(id) => ApiError::not_found("Customer", &id),
            CoreError::SaleNotFound(id) => ApiError::not_found("Sale", &id),
            CoreError::InsufficientStock {
                sku,
                available,
                requested,
            } => ApiError::new(
                ErrorCode::InsufficientStock,
                format!(
                    "Only {} {} in stock, {} requested",
                    available, sku, requested
                ),
            ),
            CoreError::EmptyCart => ApiError::validation("Sale has no items"),
            CoreError::CartTooLarge { max } => {
                ApiError::validation(format!("Sale cannot have more than {} items", max))
            }
            CoreError::QuantityTooLarge { requested, max } => ApiError::validation(format!(
                "Quantity {} exceeds maximum allowed ({})",
                requested, max
            )),
            e @ CoreError::DiscountExceedsSubtotal { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, e.to_string())
            }
            e @ CoreError::AmountOverflow { .. } => ApiError::validation(e.to_string()),
            CoreError::InvalidPaymentAmount { reason } => ApiError::new(
                ErrorCode::PaymentError,
                format!("Invalid payment amount: {}", reason),
            ),
            e @ CoreError::CustomerHasDue { .. } => {
                ApiError::new(ErrorCode::BusinessLogic, e.to_string())
            }
            CoreError::Validation(e) => ApiError::validation(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.code.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;
    use shopkeep_core::ValidationError;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::Conflict.status(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::PaymentError.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ErrorCode::DatabaseError.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_core_errors_inside_db_errors_keep_their_code() {
        let err: ApiError = DbError::Core(CoreError::InsufficientStock {
            sku: "RICE-5KG".to_string(),
            available: 3,
            requested: 5,
        })
        .into();
        assert_eq!(err.code, ErrorCode::InsufficientStock);
        assert_eq!(err.message, "Only 3 RICE-5KG in stock, 5 requested");

        let err: ApiError = DbError::from(ValidationError::Required {
            field: "name".to_string(),
        })
        .into();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err: ApiError = DbError::duplicate("sku", "TEA-250").into();
        assert_eq!(err.code, ErrorCode::Conflict);
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(ApiError::not_found("Sale", "abc")).unwrap();
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "Sale not found: abc");
    }
}
