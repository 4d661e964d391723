//! Error taxonomy for the API
//!
//! Every business-rule failure maps to a fixed HTTP status and a
//! `{"error": message}` JSON body. Storage constraint violations are the
//! authoritative conflict signal; pre-checks only give friendlier messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidAddress(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Effective balance below threshold. Carries the numbers the caller
    /// needs to top up; the rejection itself demotes the agent.
    #[error("Insufficient $BOOK. On-chain balance: {balance}, Required: {required}")]
    InsufficientBalance {
        wallet: String,
        balance: i64,
        required: i64,
    },

    #[error("Agent status is '{0}'. Must be 'active' to vote.")]
    WrongStatus(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            ApiError::InsufficientBalance { .. } | ApiError::WrongStatus(_) => {
                StatusCode::FORBIDDEN
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            ApiError::InsufficientBalance {
                wallet,
                balance,
                required,
            } => json!({
                "error": self.to_string(),
                "wallet": wallet,
                "balance": balance,
                "required": required,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(e: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(err, _) = &e {
            if err.code == rusqlite::ErrorCode::ConstraintViolation {
                return ApiError::Conflict("Uniqueness constraint violated".to_string());
            }
        }
        ApiError::Database(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::InvalidAddress("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::WrongStatus("pending".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Database("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_insufficient_balance_message() {
        let e = ApiError::InsufficientBalance {
            wallet: "0xabc".into(),
            balance: 5000,
            required: 10000,
        };
        assert_eq!(e.status_code(), StatusCode::FORBIDDEN);
        assert!(e.to_string().contains("5000"));
        assert!(e.to_string().contains("10000"));
    }
}
