//! API key authentication middleware for the admin endpoints.
//!
//! This middleware intercepts every admin request to:
//! 1. Extract the API key from the Authorization header
//! 2. Hash it and verify it exists in the store
//! 3. Inject authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401
//!
//! The public verify endpoint is not behind this middleware.

use crate::{error::AppError, state::AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// Inserted into the request's extension map; handlers extract it to log
/// who performed an admin action.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub api_key_id: Uuid,

    /// Label of the key making the request
    pub label: String,
}

/// SHA-256 hex digest of a raw API key, as stored in `api_keys.key_hash`.
pub fn hash_api_key(raw_key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// API key authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <key>` header from request
/// 2. Hash the `<key>` using SHA-256
/// 3. Look up an active key with that hash
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
///
/// # Returns
///
/// - `Ok(Response)` if authenticated successfully (calls next handler)
/// - `Err(AppError::InvalidApiKey)` if authentication fails (returns 401)
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let api_key = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidApiKey)?;

    let key_hash = hash_api_key(api_key);

    let api_key_record = state
        .store
        .find_active_api_key(&key_hash)
        .await?
        .ok_or_else(|| {
            tracing::warn!("Rejected admin request with unknown API key");
            AppError::InvalidApiKey
        })?;

    // Route handlers can now extract this using Extension<AuthContext>
    request.extensions_mut().insert(AuthContext {
        api_key_id: api_key_record.id,
        label: api_key_record.label,
    });

    Ok(next.run(request).await)
}
