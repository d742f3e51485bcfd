use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use validator::ValidationErrors;

use crate::{models::ErrorResponse, repository::StoreError};

/// ServiceError
///
/// The single error type returned by entity services, the auth extractor and
/// every handler. Each variant maps to exactly one HTTP status; the mapping lives
/// in `status()` so tests can assert on it without building a response.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed body, unknown field, or a value outside its bounds.
    #[error("{0}")]
    InvalidInput(String),

    /// A path identifier that is not a valid UUID.
    #[error("Invalid {0} ID")]
    InvalidIdentifier(&'static str),

    /// Missing, malformed or expired bearer token, or bad login credentials.
    #[error("{0}")]
    Unauthenticated(String),

    /// Authenticated, but neither the owner nor an admin.
    #[error("{0}")]
    Forbidden(String),

    #[error("No fields to update")]
    NoFieldsToUpdate,

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness constraint rejected the write (duplicate email).
    #[error("{0}")]
    Conflict(String),

    #[error("store failure: {0}")]
    StoreFailure(StoreError),

    #[error("password hashing failed: {0}")]
    HashingFailure(String),

    #[error("token signing failed: {0}")]
    TokenSigning(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::InvalidIdentifier(_) | Self::NoFieldsToUpdate => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::StoreFailure(_) | Self::HashingFailure(_) | Self::TokenSigning(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => Self::Conflict(message),
            other => Self::StoreFailure(other),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(err: ValidationErrors) -> Self {
        Self::InvalidInput(err.to_string())
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Server-side failures are logged in full but reported generically.
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
