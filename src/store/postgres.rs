//! PostgreSQL-backed card key store.
//!
//! Time comes from `NOW()` on the server, returned alongside the record in
//! the same statement, so the read filter and the activation stamp can never
//! disagree because of application clock skew.

use async_trait::async_trait;

use super::{CardKeyStore, Lookup, StoreError};
use crate::{
    db::DbPool,
    models::{
        api_key::ApiKey,
        card_key::{CardCode, CardKey},
    },
};

/// Lookup row: the clock is always present, the record columns only on a match.
#[derive(Debug, sqlx::FromRow)]
struct LookupRow {
    store_now: i64,
    code_key: Option<String>,
    is_used: Option<bool>,
    first_used_at: Option<i64>,
}

impl From<LookupRow> for Lookup {
    fn from(row: LookupRow) -> Self {
        let record = match (row.code_key, row.is_used) {
            (Some(code_key), Some(is_used)) => Some(CardKey {
                code_key,
                is_used,
                first_used_at: row.first_used_at,
            }),
            _ => None,
        };

        Lookup {
            now: row.store_now,
            record,
        }
    }
}

/// Pool exhaustion and shutdown mean the database is unreachable, not that a query was wrong.
fn store_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable("connection pool timed out".to_string())
        }
        sqlx::Error::PoolClosed => StoreError::Unavailable("connection pool closed".to_string()),
        other => StoreError::Database(other),
    }
}

#[derive(Debug, Clone)]
pub struct PgCardKeyStore {
    pool: DbPool,
}

impl PgCardKeyStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CardKeyStore for PgCardKeyStore {
    async fn lookup_live(&self, code: &CardCode, window_secs: i64) -> Result<Lookup, StoreError> {
        // LEFT JOIN against a one-row clock so a miss still reports the time
        let row = sqlx::query_as::<_, LookupRow>(
            r#"
            SELECT n.store_now, c.code_key, c.is_used, c.first_used_at
            FROM (SELECT EXTRACT(EPOCH FROM NOW())::BIGINT AS store_now) AS n
            LEFT JOIN card_keys AS c
              ON c.code_key = $1
             AND (c.first_used_at IS NULL OR c.first_used_at + $2 > n.store_now)
            "#,
        )
        .bind(code.as_str())
        .bind(window_secs)
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.into())
    }

    async fn lookup_any(&self, code: &CardCode) -> Result<Lookup, StoreError> {
        let row = sqlx::query_as::<_, LookupRow>(
            r#"
            SELECT n.store_now, c.code_key, c.is_used, c.first_used_at
            FROM (SELECT EXTRACT(EPOCH FROM NOW())::BIGINT AS store_now) AS n
            LEFT JOIN card_keys AS c ON c.code_key = $1
            "#,
        )
        .bind(code.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(row.into())
    }

    async fn mark_used(&self, code: &CardCode, now: i64) -> Result<bool, StoreError> {
        // Single conditional statement; a concurrent winner leaves rows_affected at 0
        let updated = sqlx::query(
            r#"
            UPDATE card_keys
            SET is_used = TRUE,
                first_used_at = $2
            WHERE code_key = $1 AND is_used = FALSE
            "#,
        )
        .bind(code.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(store_error)?
        .rows_affected();

        Ok(updated == 1)
    }

    async fn insert_unused(&self, codes: &[CardCode]) -> Result<Vec<String>, StoreError> {
        let raw: Vec<String> = codes.iter().map(|c| c.as_str().to_string()).collect();

        let inserted = sqlx::query_scalar::<_, String>(
            r#"
            INSERT INTO card_keys (code_key)
            SELECT * FROM UNNEST($1::TEXT[])
            ON CONFLICT (code_key) DO NOTHING
            RETURNING code_key
            "#,
        )
        .bind(&raw)
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(inserted)
    }

    async fn find_active_api_key(&self, key_hash: &str) -> Result<Option<ApiKey>, StoreError> {
        let key = sqlx::query_as::<_, ApiKey>(
            "SELECT id, label
             FROM api_keys
             WHERE key_hash = $1 AND is_active = true",
        )
        .bind(key_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        Ok(key)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(())
    }
}
