//! Error types for the Biblioteca server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Stable error codes reported in the JSON error body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Success = 0,
    Failure = 1,
    NotAuthorized = 2,
    DbFailure = 3,
    NoSuchData = 4,
    BadValue = 5,
    Duplicate = 6,
    BookUnavailable = 7,
    BookAlreadyAvailable = 8,
    SanctionActive = 9,
    DuplicateReservation = 10,
}

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// The user has an open overdue loan and cannot borrow.
    #[error("Active sanction: an overdue loan blocks new loans")]
    SanctionActive,

    /// The book is not in the available state.
    #[error("Book is not available for loan")]
    BookUnavailable,

    /// Reservations only queue for books that cannot be borrowed right now.
    #[error("Book is available, it can be borrowed directly")]
    BookAlreadyAvailable,

    /// The user already holds an active reservation on this book.
    #[error("An active reservation for this book already exists")]
    DuplicateReservation,

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub code: u32,
    pub error: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, ErrorCode::NotAuthorized, msg.clone())
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorCode::NoSuchData, msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorCode::BadValue, msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::DbFailure,
                    "Database error".to_string(),
                )
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, ErrorCode::Duplicate, msg.clone())
            }
            AppError::SanctionActive => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCode::SanctionActive,
                self.to_string(),
            ),
            AppError::BookUnavailable => (
                StatusCode::CONFLICT,
                ErrorCode::BookUnavailable,
                self.to_string(),
            ),
            AppError::BookAlreadyAvailable => (
                StatusCode::CONFLICT,
                ErrorCode::BookAlreadyAvailable,
                self.to_string(),
            ),
            AppError::DuplicateReservation => (
                StatusCode::CONFLICT,
                ErrorCode::DuplicateReservation,
                self.to_string(),
            ),
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorCode::Failure,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = Json(ErrorResponse {
            code: code as u32,
            error: format!("{:?}", code),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_map_to_client_errors() {
        assert_eq!(
            AppError::SanctionActive.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::BookUnavailable.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::DuplicateReservation.into_response().status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::NotFound("loan 7".into()).into_response().status(),
            StatusCode::NOT_FOUND
        );
    }
}
