//! In-memory card key store for tests.
//!
//! Mirrors the Postgres semantics: the store owns the clock, and
//! `mark_used` is a compare-and-swap under the lock.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicBool, AtomicI64, Ordering},
    },
};

use async_trait::async_trait;
use uuid::Uuid;

use super::{CardKeyStore, Lookup, StoreError};
use crate::{
    middleware::auth::hash_api_key,
    models::{
        api_key::ApiKey,
        card_key::{CardCode, CardKey},
    },
};

/// Stored api key: hash, active flag and the projected row.
type ApiKeyRow = (String, bool, ApiKey);

pub struct MemoryCardKeyStore {
    records: Mutex<HashMap<String, CardKey>>,
    api_keys: Mutex<Vec<ApiKeyRow>>,
    now: AtomicI64,
    unavailable: AtomicBool,
}

impl MemoryCardKeyStore {
    /// Empty store whose clock reads `now`.
    pub fn new(now: i64) -> Self {
        Self {
            records: Mutex::new(HashMap::new()),
            api_keys: Mutex::new(Vec::new()),
            now: AtomicI64::new(now),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Provision an unused code.
    pub fn with_code(self, code: &str) -> Self {
        let code = CardCode::parse(code).expect("test code must be canonical");
        self.records
            .lock()
            .unwrap()
            .insert(code.as_str().to_string(), CardKey::unused(&code));
        self
    }

    /// Register an admin API key by its raw value.
    pub fn with_api_key(self, raw_key: &str, is_active: bool) -> Self {
        self.api_keys.lock().unwrap().push((
            hash_api_key(raw_key),
            is_active,
            ApiKey {
                id: Uuid::new_v4(),
                label: "test".to_string(),
            },
        ));
        self
    }

    pub fn set_now(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Make every subsequent call fail like a dropped connection.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn record(&self, code: &str) -> Option<CardKey> {
        self.records.lock().unwrap().get(code).cloned()
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        Ok(())
    }

    fn clock(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CardKeyStore for MemoryCardKeyStore {
    async fn lookup_live(&self, code: &CardCode, window_secs: i64) -> Result<Lookup, StoreError> {
        self.check_available()?;
        let now = self.clock();
        let record = self
            .records
            .lock()
            .unwrap()
            .get(code.as_str())
            .filter(|r| r.first_used_at.is_none_or(|t| t.saturating_add(window_secs) > now))
            .cloned();

        Ok(Lookup { now, record })
    }

    async fn lookup_any(&self, code: &CardCode) -> Result<Lookup, StoreError> {
        self.check_available()?;
        let now = self.clock();
        let record = self.records.lock().unwrap().get(code.as_str()).cloned();

        Ok(Lookup { now, record })
    }

    async fn mark_used(&self, code: &CardCode, now: i64) -> Result<bool, StoreError> {
        self.check_available()?;
        let mut records = self.records.lock().unwrap();
        match records.get_mut(code.as_str()) {
            Some(record) if !record.is_used => {
                record.is_used = true;
                record.first_used_at = Some(now);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn insert_unused(&self, codes: &[CardCode]) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        let mut records = self.records.lock().unwrap();
        let mut inserted = Vec::new();
        for code in codes {
            if !records.contains_key(code.as_str()) {
                records.insert(code.as_str().to_string(), CardKey::unused(code));
                inserted.push(code.as_str().to_string());
            }
        }
        Ok(inserted)
    }

    async fn find_active_api_key(&self, key_hash: &str) -> Result<Option<ApiKey>, StoreError> {
        self.check_available()?;
        Ok(self
            .api_keys
            .lock()
            .unwrap()
            .iter()
            .find(|(hash, active, _)| hash == key_hash && *active)
            .map(|(_, _, key)| key.clone()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn only_active_keys_are_found_by_hash() {
        let store = MemoryCardKeyStore::new(0)
            .with_api_key("live-key", true)
            .with_api_key("revoked-key", false);

        let key = store
            .find_active_api_key(&hash_api_key("live-key"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(key.label, "test");

        for raw in ["revoked-key", "unknown-key"] {
            let found = store.find_active_api_key(&hash_api_key(raw)).await.unwrap();
            assert!(found.is_none(), "{raw}");
        }
    }
}
