//! Error handling for the Kedai POS server
//!
//! Every error renders as `{"error": {"code", "message", "field"?}}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use shared::{
    LedgerError, PaymentError, PricingError, ProductionTransitionError, SalePlanError, SaleStateError,
    StockError,
};

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid payment method: {0}")]
    InvalidPaymentMethod(String),

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Business logic errors
    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Capital ledger is missing")]
    LedgerMissing,

    // External service errors
    #[error("Payment gateway error: {0}")]
    PaymentGateway(String),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
        }
    }
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_CREDENTIALS", "Invalid username or password"),
            ),
            AppError::InvalidToken => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_TOKEN", "Invalid token"),
            ),
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "INSUFFICIENT_PERMISSIONS",
                    "You do not have permission to perform this action",
                ),
            ),
            AppError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", msg.clone()),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("VALIDATION_ERROR", msg.clone()),
            ),
            AppError::InvalidPaymentMethod(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "INVALID_PAYMENT_METHOD".to_string(),
                    message: msg.clone(),
                    field: Some("metode_pembayaran".to_string()),
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message: format!("A record with this {} already exists", field),
                    field: Some(field.clone()),
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::InsufficientStock(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("INSUFFICIENT_STOCK", msg.clone()),
            ),
            AppError::InvalidStateTransition(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new("INVALID_STATE_TRANSITION", msg.clone()),
            ),
            AppError::LedgerMissing => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("LEDGER_MISSING", "Capital ledger has not been set up"),
            ),
            AppError::PaymentGateway(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("PAYMENT_GATEWAY_ERROR", msg.clone()),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", msg.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status_and_detail().0
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        if status.is_server_error() {
            tracing::error!("Error: {:?}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

// ============================================================================
// Domain error conversions
// ============================================================================

impl From<PaymentError> for AppError {
    fn from(e: PaymentError) -> Self {
        AppError::InvalidPaymentMethod(e.to_string())
    }
}

impl From<StockError> for AppError {
    fn from(e: StockError) -> Self {
        match e {
            StockError::Insufficient { .. } => AppError::InsufficientStock(e.to_string()),
            StockError::InvalidQuantity(_) => AppError::validation("jumlah", e.to_string()),
        }
    }
}

impl From<SaleStateError> for AppError {
    fn from(e: SaleStateError) -> Self {
        AppError::InvalidStateTransition(e.to_string())
    }
}

impl From<SalePlanError> for AppError {
    fn from(e: SalePlanError) -> Self {
        match e {
            SalePlanError::InvalidCart(msg) => AppError::validation("barang_dibeli", msg),
            SalePlanError::NotACashier(_) => AppError::validation("kasir_username", e.to_string()),
            SalePlanError::GatewayUnavailable => AppError::PaymentGateway("Payment gateway is not configured".to_string()),
        }
    }
}

impl From<ProductionTransitionError> for AppError {
    fn from(e: ProductionTransitionError) -> Self {
        AppError::InvalidStateTransition(e.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(e: LedgerError) -> Self {
        AppError::ValidationError(e.to_string())
    }
}

impl From<PricingError> for AppError {
    fn from(e: PricingError) -> Self {
        AppError::ValidationError(e.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let first = errors.field_errors().into_iter().next().map(|(field, errs)| {
            let message = errs
                .first()
                .and_then(|e| e.message.as_ref())
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("Invalid value for {}", field));
            (field.to_string(), message)
        });

        match first {
            Some((field, message)) => AppError::Validation { field, message },
            None => AppError::ValidationError(errors.to_string()),
        }
    }
}

/// Whether `e` is a unique-constraint violation, optionally on one named
/// constraint
pub fn is_unique_violation(e: &sqlx::Error, constraint: Option<&str>) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            db.code().as_deref() == Some("23505")
                && constraint.map_or(true, |name| db.constraint() == Some(name))
        }
        _ => false,
    }
}

/// Map a unique-constraint violation to `DuplicateEntry`
pub fn map_unique_violation(e: sqlx::Error, field: &str) -> AppError {
    if is_unique_violation(&e, None) {
        AppError::DuplicateEntry(field.to_string())
    } else {
        AppError::DatabaseError(e)
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(AppError::NotFound("Barang".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::InvalidPaymentMethod("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::InvalidStateTransition("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::DuplicateEntry("kode_barang".into()).status(), StatusCode::CONFLICT);
        assert_eq!(
            AppError::PaymentGateway("down".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(AppError::InsufficientPermissions.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_stock_error_conversion() {
        let err: AppError = StockError::Insufficient {
            available: 1,
            requested: 2,
        }
        .into();
        assert!(matches!(err, AppError::InsufficientStock(_)));
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err: AppError = StockError::InvalidQuantity(0).into();
        assert!(matches!(err, AppError::Validation { .. }));
    }

    #[test]
    fn test_sale_plan_conversion() {
        let err: AppError = SalePlanError::NotACashier("chef1".into()).into();
        assert!(matches!(err, AppError::Validation { ref field, .. } if field == "kasir_username"));

        let err: AppError = SalePlanError::GatewayUnavailable.into();
        assert!(matches!(err, AppError::PaymentGateway(_)));

        let err: AppError = SalePlanError::InvalidCart("Cart is empty").into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_row_not_found_is_not_a_unique_violation() {
        assert!(!is_unique_violation(&sqlx::Error::RowNotFound, None));
        assert!(matches!(
            map_unique_violation(sqlx::Error::RowNotFound, "kode_barang"),
            AppError::DatabaseError(_)
        ));
    }

    #[test]
    fn test_sale_state_conversion() {
        let err: AppError = SaleStateError::StockAlreadyReturned.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
