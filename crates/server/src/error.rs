use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to API clients. Every handler failure becomes exactly one
/// JSON error response; nothing propagates as an unhandled fault.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Duplicate(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("Internal error: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        // The database constraint is the authoritative duplicate check; any
        // pre-insert existence lookup is only a fast-path hint.
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                return AppError::Duplicate("Email already registered".to_string());
            }
        }
        AppError::Internal(err.to_string())
    }
}

impl From<shared::ParseFieldError> for AppError {
    fn from(err: shared::ParseFieldError) -> Self {
        // A stored value no handler could have written; report, don't panic.
        AppError::Internal(err.to_string())
    }
}

impl From<shared::codec::CsvError> for AppError {
    fn from(err: shared::codec::CsvError) -> Self {
        use shared::codec::CsvError;
        match err {
            CsvError::EmptyExport => AppError::BadRequest(err.to_string()),
            CsvError::Csv(_) => AppError::BadRequest(err.to_string()),
            CsvError::InvalidUtf8 => AppError::Internal(err.to_string()),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}
