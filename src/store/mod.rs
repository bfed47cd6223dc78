//! Card key persistence.
//!
//! Handlers and services never talk to the database directly; they go
//! through [`CardKeyStore`]. The store is also the single clock for a
//! request: every lookup returns the store's own `now`, and that value is
//! what the activation write stamps.

use async_trait::async_trait;

use crate::models::{
    api_key::ApiKey,
    card_key::{CardCode, CardKey},
};

#[cfg(test)]
pub mod memory;
pub mod postgres;

pub use postgres::PgCardKeyStore;

/// Failure talking to the backing store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Result of a lookup: the store clock at read time, and the matching record if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lookup {
    /// Store-side current time in epoch seconds.
    pub now: i64,
    pub record: Option<CardKey>,
}

#[async_trait]
pub trait CardKeyStore: Send + Sync {
    /// Fetch `code` only if it is still servable: never activated, or
    /// `first_used_at + window_secs > now`. Expired and unknown codes both
    /// come back as `record: None`.
    async fn lookup_live(&self, code: &CardCode, window_secs: i64) -> Result<Lookup, StoreError>;

    /// Fetch `code` regardless of expiry.
    async fn lookup_any(&self, code: &CardCode) -> Result<Lookup, StoreError>;

    /// Atomically flip `is_used` and stamp `first_used_at = now`, only if the
    /// code is still unused. Returns whether this call performed the activation.
    async fn mark_used(&self, code: &CardCode, now: i64) -> Result<bool, StoreError>;

    /// Insert unused records, skipping codes that already exist. Returns the
    /// codes that were actually inserted.
    async fn insert_unused(&self, codes: &[CardCode]) -> Result<Vec<String>, StoreError>;

    async fn find_active_api_key(&self, key_hash: &str) -> Result<Option<ApiKey>, StoreError>;

    /// Cheap connectivity check.
    async fn ping(&self) -> Result<(), StoreError>;
}
