//! Card key administration handlers.
//!
//! These endpoints sit behind the API key middleware:
//! - POST /api/v1/admin/card-keys - Provision a batch of unused card keys
//! - GET /api/v1/admin/card-keys/{code} - Inspect one card key

use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::card_key::{CardCode, CardKeyStatus, ProvisionRequest, ProvisionResponse},
    services::provisioning_service,
    state::AppState,
};

/// Provision new card keys.
///
/// # Request Body
///
/// ```json
/// { "count": 10 }
/// ```
///
/// # Response (201)
///
/// ```json
/// { "codes": ["K3J9Q-...", "..."] }
/// ```
///
/// Codes are only ever returned here; hand them out before discarding the response.
pub async fn provision_card_keys(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    payload: Result<Json<ProvisionRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(body_error)?;

    let codes =
        provisioning_service::provision_card_keys(state.store.as_ref(), request.count).await?;

    tracing::info!(
        api_key_id = %auth.api_key_id,
        label = %auth.label,
        count = codes.len(),
        "Card keys provisioned"
    );

    Ok((StatusCode::CREATED, Json(ProvisionResponse { codes })))
}

/// Body extraction failures share the `INVALID_REQUEST` envelope with range errors.
fn body_error(rejection: JsonRejection) -> AppError {
    match rejection {
        JsonRejection::JsonDataError(_) => {
            AppError::InvalidRequest("count is required and must be an integer".to_string())
        }
        JsonRejection::JsonSyntaxError(_) => {
            AppError::InvalidRequest("body must be valid JSON".to_string())
        }
        other => AppError::InvalidRequest(other.body_text()),
    }
}

/// Inspect a card key's lifecycle state.
///
/// Unlike the verify endpoint this reports expired codes as such, and
/// never writes.
///
/// # Response (200)
///
/// ```json
/// {
///   "code": "AAAAA-BBBBB-CCCCC-DDDDD-EEEEE",
///   "is_used": true,
///   "first_used_at": 1735689600,
///   "expires_at": 1735776000,
///   "state": "active"
/// }
/// ```
pub async fn get_card_key(
    State(state): State<AppState>,
    Path(raw_code): Path<String>,
) -> Result<Json<CardKeyStatus>, AppError> {
    let code = CardCode::parse(&raw_code)
        .map_err(|err| AppError::invalid_field("code", err.to_string()))?;

    let lookup = state.store.lookup_any(&code).await?;
    let record = lookup.record.ok_or(AppError::CardNotFound)?;

    Ok(Json(CardKeyStatus::new(record, lookup.now, state.window_secs)))
}
