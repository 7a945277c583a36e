//! Application error type mapping to HTTP status codes and envelope format.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use chorus_types::error::{SessionError, ValidationError};

use crate::http::response::ApiResponse;

/// Application-level error that maps to HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// Session errors: validation failures and unknown bots or history entries.
    Session(SessionError),
    /// Malformed request input caught before it reaches the session.
    BadRequest(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        AppError::Session(e)
    }
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        AppError::Session(SessionError::Validation(e))
    }
}

impl AppError {
    /// Machine-readable code carried in the envelope's `errors[0].code`.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Session(SessionError::Validation(_)) | AppError::BadRequest(_) => {
                "VALIDATION_ERROR"
            }
            AppError::Session(SessionError::BotNotFound) => "BOT_NOT_FOUND",
            AppError::Session(SessionError::HistoryNotFound(_)) => "HISTORY_NOT_FOUND",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Session(SessionError::Validation(_)) | AppError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Session(SessionError::BotNotFound | SessionError::HistoryNotFound(_)) => {
                StatusCode::NOT_FOUND
            }
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::Session(e) => e.to_string(),
            AppError::BadRequest(msg) => msg.clone(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        ApiResponse::error(
            self.status(),
            self.code(),
            self.message(),
            Uuid::now_v7().to_string(),
        )
        .into_response()
    }
}
