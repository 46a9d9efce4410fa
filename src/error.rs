//!
//! # Custom Error Handling
//!
//! This module defines `AppError`, the error type returned by every handler.
//! It implements `actix_web::error::ResponseError` so application errors turn
//! into HTTP responses with a JSON `{"error": ...}` body.
//!
//! `From` implementations exist for `AuthError`, `StoreError`, `sqlx::Error`
//! and `validator::ValidationErrors`, allowing handlers to use `?`.

use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use serde_json::json;
use thiserror::Error;
use validator::ValidationErrors;

use crate::auth::AuthError;
use crate::store::StoreError;

/// Represents all possible errors that can occur within the application.
#[derive(Debug, Error)]
pub enum AppError {
    /// HTTP 401. Authentication failed or is required but missing.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// HTTP 400.
    #[error("Bad Request: {0}")]
    BadRequest(String),
    /// HTTP 404.
    #[error("Not Found: {0}")]
    NotFound(String),
    /// HTTP 500.
    #[error("Internal Server Error: {0}")]
    InternalServerError(String),
    /// HTTP 500, originating from the storage layer.
    #[error("Database Error: {0}")]
    DatabaseError(String),
    /// HTTP 422. Wraps errors from the `validator` crate.
    #[error("Validation Error: {0}")]
    ValidationError(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            // Storage details stay in the logs.
            AppError::DatabaseError(_) => "Database error",
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::InternalServerError(msg)
            | AppError::ValidationError(msg) => msg.as_str(),
        };
        HttpResponse::build(self.status_code()).json(json!({ "error": message }))
    }
}

/// Maps the credential lifecycle taxonomy onto transport errors.
///
/// Server-side failures are logged here and answered with a generic message.
impl From<AuthError> for AppError {
    fn from(error: AuthError) -> AppError {
        match error {
            AuthError::InvalidCredentials => AppError::Unauthorized("Invalid credentials".into()),
            AuthError::InvalidToken(msg) => AppError::Unauthorized(format!("Invalid token: {}", msg)),
            AuthError::NotFound => AppError::NotFound("No password reset found".into()),
            AuthError::SamePassword => AppError::BadRequest(
                "New password cannot be the same as the current one".into(),
            ),
            AuthError::Upstream(e) => AppError::from(e),
            AuthError::Config(_)
            | AuthError::UnsupportedAlgorithm(_)
            | AuthError::KeyLoad { .. }
            | AuthError::Signing(_) => {
                log::error!("Token generation failed: {}", error);
                AppError::InternalServerError("Error during token generation".into())
            }
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        match error {
            StoreError::NotFound => AppError::NotFound("Record not found".into()),
            StoreError::Conflict(msg) => AppError::BadRequest(format!("Conflict: {}", msg)),
            StoreError::Database(msg) => {
                log::error!("Database error: {}", msg);
                AppError::DatabaseError(msg)
            }
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        AppError::from(StoreError::from(error))
    }
}

/// The detailed validation messages are preserved.
impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}
