//! API Key model for admin authentication.
//!
//! Admin API keys guard the provisioning and inspection endpoints. They are stored in the database as SHA-256 hashes.

use uuid::Uuid;

/// The columns of an active `api_keys` row that authentication hands to handlers.
///
/// # Database Table
///
/// Maps to the `api_keys` table, which also holds `key_hash` (SHA-256 of the
/// raw key), `created_at` and `is_active`. The lookup filters on `key_hash`
/// and `is_active` without loading them.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ApiKey {
    pub id: Uuid,

    /// Who or what this key was issued to
    pub label: String,
}
