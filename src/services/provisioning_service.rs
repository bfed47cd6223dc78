//! Provisioning service - minting new card keys.
//!
//! Codes are drawn uniformly from `A-Z0-9` in the canonical
//! `XXXXX-XXXXX-XXXXX-XXXXX-XXXXX` layout and stored unused.

use rand::Rng;

use crate::{
    error::AppError,
    models::card_key::CardCode,
    store::CardKeyStore,
};

/// Largest batch a single provisioning call may request.
pub const MAX_BATCH: i64 = 1000;

const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const GROUPS: usize = 5;
const GROUP_LEN: usize = 5;

/// Create `count` new unused card keys.
///
/// # Process
///
/// 1. Validate the batch size
/// 2. Generate random canonical codes
/// 3. Insert them, skipping any that collide with existing codes
///
/// # Returns
///
/// The codes actually stored. With 36^25 possible codes a collision is
/// practically impossible, but a colliding code is dropped rather than reused.
///
/// # Errors
///
/// - `InvalidRequest`: count is not between 1 and `MAX_BATCH`
/// - `Store`: the insert failed
pub async fn provision_card_keys(
    store: &dyn CardKeyStore,
    count: i64,
) -> Result<Vec<String>, AppError> {
    if !(1..=MAX_BATCH).contains(&count) {
        return Err(AppError::InvalidRequest(format!(
            "count must be between 1 and {MAX_BATCH}"
        )));
    }

    let codes: Vec<CardCode> = (0..count).map(|_| generate_code()).collect();
    let inserted = store.insert_unused(&codes).await?;

    tracing::info!(
        requested = count,
        inserted = inserted.len(),
        "Provisioned card keys"
    );

    Ok(inserted)
}

/// Generate one random canonical card code.
pub fn generate_code() -> CardCode {
    let mut rng = rand::rng();
    let raw = (0..GROUPS)
        .map(|_| {
            (0..GROUP_LEN)
                .map(|_| CHARSET[rng.random_range(0..CHARSET.len())] as char)
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("-");

    CardCode::parse(&raw).unwrap_or_else(|_| unreachable!("generated code {raw} is canonical"))
}
