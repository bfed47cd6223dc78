//! Card key verify handler.
//!
//! This module implements the public endpoint:
//! - POST /api/v1/card-keys/verify - Activate or renew a card key

use crate::{
    error::AppError,
    models::card_key::{CardCode, VerifyRequest, VerifyResponse},
    services::activation_service::{self, Outcome},
    state::AppState,
};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::header::SET_COOKIE,
    response::{AppendHeaders, IntoResponse, Response},
};

/// Verify a card key.
///
/// # Endpoint
///
/// `POST /api/v1/card-keys/verify`
///
/// # Request Body
///
/// ```json
/// { "cardKey": "AAAAA-BBBBB-CCCCC-DDDDD-EEEEE" }
/// ```
///
/// # Response
///
/// - **200, valid**: `ACTIVATION_SUCCESS` or `SESSION_RENEWED` with `expires_in`,
///   plus a `session` cookie whose `Max-Age` equals `expires_in`
/// - **200, not valid**: `INVALID_CARD` or `CARD_EXPIRED`
/// - **400**: `INVALID_INPUT` (malformed body or code format)
/// - **500**: `SERVER_ERROR`
///
/// ```json
/// { "valid": true, "code": "ACTIVATION_SUCCESS", "expires_in": 86400 }
/// ```
pub async fn verify_card_key(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(request) = payload.map_err(input_error)?;

    let code = CardCode::parse(&request.card_key)
        .map_err(|err| AppError::invalid_field("cardKey", err.to_string()))?;

    let outcome =
        activation_service::resolve(state.store.as_ref(), &code, state.window_secs).await?;

    Ok(render(outcome))
}

/// Map an outcome to its HTTP response. Domain rejections are still 200.
fn render(outcome: Outcome) -> Response {
    let code = outcome.response_code();
    match outcome {
        Outcome::ActivationSuccess(grant) | Outcome::SessionRenewed(grant) => (
            AppendHeaders([(SET_COOKIE, grant.cookie())]),
            Json(VerifyResponse::granted(code, grant.expires_in)),
        )
            .into_response(),
        Outcome::InvalidCard => {
            Json(VerifyResponse::rejected(code, "Card key is invalid")).into_response()
        }
        Outcome::CardExpired => {
            Json(VerifyResponse::rejected(code, "Card key has expired")).into_response()
        }
    }
}

/// Translate body extraction failures into field-level validation errors.
fn input_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(_) => {
            AppError::invalid_field("cardKey", "is required and must be a string")
        }
        JsonRejection::JsonSyntaxError(_) => AppError::invalid_field("body", "must be valid JSON"),
        JsonRejection::MissingJsonContentType(_) => {
            AppError::invalid_field("body", "Content-Type must be application/json")
        }
        other => AppError::invalid_field("body", other.body_text()),
    }
}
