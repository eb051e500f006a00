use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};

/// JSON error envelope returned for every failed request
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Not Found", "Bad Request")
    pub error: String,
    /// Human-readable error description
    pub message: String,
    /// Machine-readable error kind (e.g. "insufficient_stock")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::error::DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) | Self::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::ValidationError(_) | Self::InvalidOperation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
        }
    }

    /// Returns the message suitable for HTTP responses. Internal errors
    /// return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) | Self::Other(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            code: None,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

/// Checkout failure taxonomy. Every precondition violation is a
/// distinct, user-reportable kind so callers can render a specific
/// message; none are downgraded or retried automatically. Only
/// `Persistence` is retry-safe (no partial state survives an aborted
/// transaction).
#[derive(Debug, thiserror::Error)]
pub enum CheckoutError {
    #[error("You must be signed in to place an order")]
    Unauthorized,

    #[error("Missing shipping information: {0}")]
    InvalidAddress(String),

    #[error("Invalid cart payload: {0}")]
    InvalidCartPayload(String),

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Some items in your cart no longer exist")]
    ItemsNoLongerExist,

    #[error("All items in an order must belong to the same store")]
    MixedStoreCart,

    #[error("Insufficient stock for {0}")]
    InsufficientStock(String),

    #[error("Checkout could not be completed: {0}")]
    Persistence(#[from] DbErr),
}

impl CheckoutError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::InvalidAddress(_) | Self::InvalidCartPayload(_) | Self::EmptyCart => {
                StatusCode::BAD_REQUEST
            }
            Self::ItemsNoLongerExist => StatusCode::NOT_FOUND,
            Self::MixedStoreCart => StatusCode::CONFLICT,
            Self::InsufficientStock(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Stable machine-readable kind for client-side handling
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthorized => "unauthorized",
            Self::InvalidAddress(_) => "invalid_address",
            Self::InvalidCartPayload(_) => "invalid_cart_payload",
            Self::EmptyCart => "empty_cart",
            Self::ItemsNoLongerExist => "items_no_longer_exist",
            Self::MixedStoreCart => "mixed_store_cart",
            Self::InsufficientStock(_) => "insufficient_stock",
            Self::Persistence(_) => "persistence_failure",
        }
    }

    pub fn response_message(&self) -> String {
        match self {
            // Do not leak database details; the kind alone is actionable
            Self::Persistence(_) => "Checkout could not be completed".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for CheckoutError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            code: Some(self.code().to_string()),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

/// API error type for HTTP handlers
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Service error: {0}")]
    ServiceError(#[from] ServiceError),

    #[error("Checkout error: {0}")]
    CheckoutError(#[from] CheckoutError),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::ServiceError(err) => err.into_response(),
            Self::CheckoutError(err) => err.into_response(),
            Self::ValidationError(msg) => {
                let err = ErrorResponse {
                    error: "Bad Request".to_string(),
                    message: msg,
                    code: Some("validation_error".to_string()),
                    timestamp: chrono::Utc::now().to_rfc3339(),
                };
                (StatusCode::BAD_REQUEST, Json(err)).into_response()
            }
            Self::NotFound(msg) => {
                let err = ErrorResponse {
                    error: "Not Found".to_string(),
                    message: msg,
                    code: None,
                    timestamp: chrono::Utc::now().to_rfc3339(),
                };
                (StatusCode::NOT_FOUND, Json(err)).into_response()
            }
            Self::Unauthorized => {
                let err = ErrorResponse {
                    error: "Unauthorized".to_string(),
                    message: "Authentication required".to_string(),
                    code: Some("unauthorized".to_string()),
                    timestamp: chrono::Utc::now().to_rfc3339(),
                };
                (StatusCode::UNAUTHORIZED, Json(err)).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checkout_error_status_mapping() {
        assert_eq!(
            CheckoutError::Unauthorized.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            CheckoutError::EmptyCart.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            CheckoutError::ItemsNoLongerExist.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            CheckoutError::MixedStoreCart.status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            CheckoutError::InsufficientStock("SKU-1".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn persistence_failure_hides_details() {
        let err = CheckoutError::Persistence(DbErr::Custom("connection reset".into()));
        assert!(!err.response_message().contains("connection reset"));
    }
}
