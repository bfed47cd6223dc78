//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.
//!
//! Domain rejections of a card key (`INVALID_CARD`, `CARD_EXPIRED`) are not
//! errors; they are ordinary 200 responses built by the verify handler.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::{
    models::card_key::{FieldError, ResponseCode, VerifyResponse},
    store::StoreError,
};

/// Application-wide error type.
///
/// # Error Categories
///
/// - **Input Errors**: the request body or path did not validate
/// - **Authentication Errors**: invalid or missing admin API key
/// - **Resource Errors**: requested card key not found (admin only)
/// - **Infrastructure Errors**: the store failed
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Request payload failed validation. Carries per-field detail.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid input")]
    InvalidInput(Vec<FieldError>),

    /// Request was well-formed but asked for something out of range.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("{0}")]
    InvalidRequest(String),

    /// Admin API key is missing, invalid, or inactive.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Card key lookup on an admin endpoint found nothing.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Card key not found")]
    CardNotFound,

    /// Store operation failed (connection loss, query error, timeout).
    ///
    /// Returns HTTP 500. Details are logged, never sent to the client.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AppError {
    /// Shorthand for a single-field validation failure.
    pub fn invalid_field(field: &str, message: impl Into<String>) -> Self {
        AppError::InvalidInput(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }
}

/// Machine-readable codes for the non-verify error cases.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
enum AdminCode {
    InvalidRequest,
    Unauthorized,
    CardNotFound,
}

#[derive(Debug, Serialize)]
struct AdminErrorBody {
    valid: bool,
    code: AdminCode,
    message: String,
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// Every error uses the verify envelope:
/// ```json
/// { "valid": false, "code": "INVALID_INPUT", "message": "...", "errors": [...] }
/// ```
///
/// # Status Code Mapping
///
/// - `InvalidInput` → 400 `INVALID_INPUT`
/// - `InvalidRequest` → 400 `INVALID_REQUEST`
/// - `InvalidApiKey` → 401 `UNAUTHORIZED`
/// - `CardNotFound` → 404 `CARD_NOT_FOUND`
/// - `Store` → 500 `SERVER_ERROR` (hides details from client)
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::InvalidInput(ref errors) => {
                let message = errors
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                let body = VerifyResponse::rejected(ResponseCode::InvalidInput, message)
                    .with_errors(errors.clone());
                (StatusCode::BAD_REQUEST, Json(body)).into_response()
            }
            AppError::Store(ref err) => {
                tracing::error!(error = %err, "Store operation failed");
                let body = VerifyResponse::rejected(
                    ResponseCode::ServerError,
                    "An internal error occurred",
                );
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
            AppError::InvalidRequest(_) => {
                admin_error(StatusCode::BAD_REQUEST, AdminCode::InvalidRequest, &self)
            }
            AppError::InvalidApiKey => {
                admin_error(StatusCode::UNAUTHORIZED, AdminCode::Unauthorized, &self)
            }
            AppError::CardNotFound => {
                admin_error(StatusCode::NOT_FOUND, AdminCode::CardNotFound, &self)
            }
        }
    }
}

fn admin_error(status: StatusCode, code: AdminCode, err: &AppError) -> Response {
    let body = AdminErrorBody {
        valid: false,
        code,
        message: err.to_string(),
    };
    (status, Json(body)).into_response()
}
