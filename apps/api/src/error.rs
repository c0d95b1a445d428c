//! Error types for the order API.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CoreError (business rule)  ──┐                                         │
//! │                               ├──► ApiError { code, message }           │
//! │  DbError (storage)          ──┘          │                              │
//! │                                          ▼                              │
//! │                            IntoResponse: status + JSON body             │
//! │                                                                         │
//! │   validation        → 400      stock conflict → 400                     │
//! │   not found         → 404      duplicate      → 409                     │
//! │   database/internal → 500  (logged, generic message to the client)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use promoweb_core::{CoreError, ErrorKind, ValidationError};
use promoweb_db::DbError;
use serde::Serialize;
use tracing::error;

/// Machine-readable error category returned to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    InsufficientStock,
    Conflict,
    InternalError,
}

impl ErrorCode {
    pub fn http_status(&self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InsufficientStock => StatusCode::BAD_REQUEST,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// The single error type of services and handlers.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn internal() -> Self {
        Self::new(ErrorCode::InternalError, "Internal server error")
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match err.kind() {
            ErrorKind::Validation => ErrorCode::ValidationError,
            ErrorKind::NotFound => ErrorCode::NotFound,
            ErrorKind::StockConflict => ErrorCode::InsufficientStock,
            ErrorKind::Duplicate => ErrorCode::Conflict,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::not_found(err.to_string()),
            DbError::UniqueViolation { .. } => ApiError::new(ErrorCode::Conflict, err.to_string()),
            other => {
                error!(error = %other, "Database error");
                ApiError::internal()
            }
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        DbError::from(err).into()
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    code: ErrorCode,
    message: &'a str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.http_status();
        let body = ErrorBody {
            code: self.code,
            message: &self.message,
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_errors_map_to_status() {
        let stock: ApiError = CoreError::InsufficientStock {
            sku: "TV-1".to_string(),
            available: 1,
            requested: 2,
        }
        .into();
        assert_eq!(stock.code.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(stock.code, ErrorCode::InsufficientStock);

        let missing: ApiError = CoreError::OrderNotFound("x".to_string()).into();
        assert_eq!(missing.code.http_status(), StatusCode::NOT_FOUND);

        let transition: ApiError = CoreError::InvalidOrderTransition {
            from: "pending".to_string(),
            to: "shipped".to_string(),
        }
        .into();
        assert_eq!(transition.code.http_status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_db_errors_hide_internals() {
        let dup: ApiError = DbError::duplicate("sku", "TV-1").into();
        assert_eq!(dup.code.http_status(), StatusCode::CONFLICT);

        let internal: ApiError = DbError::QueryFailed("disk I/O error".to_string()).into();
        assert_eq!(internal.code, ErrorCode::InternalError);
        assert!(!internal.message.contains("disk"));
    }
}
