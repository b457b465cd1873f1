use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to relay clients, each mapped to a stable HTTP status
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Missing credential")]
    MissingCredential,

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("Forbidden")]
    Forbidden,

    #[error("Video not found")]
    NotFound,

    #[error("Failed to fetch video from source.")]
    Upstream(StatusCode),

    #[error("Failed to reach video source.")]
    OriginUnreachable,

    #[error("Too many concurrent streams")]
    Saturated,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for RelayError {
    fn from(err: StoreError) -> Self {
        RelayError::Storage(err.to_string())
    }
}

impl From<askama::Error> for RelayError {
    fn from(err: askama::Error) -> Self {
        RelayError::Internal(err.to_string())
    }
}

impl RelayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            RelayError::MissingCredential | RelayError::InvalidCredential => {
                StatusCode::UNAUTHORIZED
            }
            RelayError::Forbidden => StatusCode::FORBIDDEN,
            RelayError::NotFound => StatusCode::NOT_FOUND,
            RelayError::Upstream(status) => *status,
            RelayError::OriginUnreachable => StatusCode::BAD_GATEWAY,
            RelayError::Saturated => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::Storage(_) | RelayError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            // Relay failures keep the plain-text shape video players expect.
            RelayError::Upstream(_) | RelayError::OriginUnreachable => {
                (status, self.to_string()).into_response()
            }
            _ => {
                let body = json!({
                    "error": self.to_string(),
                    "status": status.as_u16(),
                });
                (status, axum::Json(body)).into_response()
            }
        }
    }
}
