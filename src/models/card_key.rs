//! Card key data models and API request/response types.
//!
//! This module defines:
//! - `CardCode`: a validated, canonical card key string
//! - `CardKey`: database entity representing one issued code
//! - `VerifyRequest` / `VerifyResponse`: the verify endpoint's wire types
//! - Provisioning and inspection types for the admin endpoints

use std::{fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Canonical card key format: five groups of five uppercase alphanumerics.
static CARD_CODE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Z0-9]{5}-[A-Z0-9]{5}-[A-Z0-9]{5}-[A-Z0-9]{5}-[A-Z0-9]{5}$")
        .expect("card code pattern is a valid regex")
});

/// Human-readable description of the accepted format, used in validation errors.
pub const CARD_CODE_FORMAT: &str = "XXXXX-XXXXX-XXXXX-XXXXX-XXXXX (A-Z, 0-9)";

/// A card key that matched the canonical pattern.
///
/// The only way to obtain one is [`CardCode::parse`], so anything holding a
/// `CardCode` can skip re-validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CardCode(String);

/// Why a raw string was not accepted as a card code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardCodeError {
    #[error("is required")]
    Empty,

    #[error("must match {}", CARD_CODE_FORMAT)]
    Format,
}

impl CardCode {
    /// Validate a raw code. Surrounding whitespace is trimmed; case is not folded.
    pub fn parse(raw: &str) -> Result<Self, CardCodeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(CardCodeError::Empty);
        }
        if !CARD_CODE_PATTERN.is_match(trimmed) {
            return Err(CardCodeError::Format);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Log-safe rendering: only the first group is shown.
    pub fn masked(&self) -> String {
        let head = self.0.split('-').next().unwrap_or_default();
        format!("{head}-*****-*****-*****-*****")
    }
}

impl fmt::Display for CardCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Represents a card key record from the database.
///
/// # Database Table
///
/// Maps to the `card_keys` table:
/// - `code_key`: the canonical code, primary key
/// - `is_used`: false until first activation, then permanently true
/// - `first_used_at`: epoch seconds of the first activation, NULL until then
///
/// Expiry is never stored; see [`CardKey::expires_at`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardKey {
    pub code_key: String,

    pub is_used: bool,

    /// Set exactly once, together with `is_used`.
    pub first_used_at: Option<i64>,
}

impl CardKey {
    /// A freshly provisioned, never-activated record.
    pub fn unused(code: &CardCode) -> Self {
        Self {
            code_key: code.as_str().to_string(),
            is_used: false,
            first_used_at: None,
        }
    }

    /// `first_used_at + window`, or `None` for a record that was never activated.
    pub fn expires_at(&self, window_secs: i64) -> Option<i64> {
        self.first_used_at.map(|t| t.saturating_add(window_secs))
    }

    /// Lifecycle state of this record at `now`.
    pub fn state(&self, now: i64, window_secs: i64) -> CardKeyState {
        match self.expires_at(window_secs) {
            None => CardKeyState::Unused,
            Some(expires_at) if now < expires_at => CardKeyState::Active,
            Some(_) => CardKeyState::Expired,
        }
    }
}

/// Lifecycle of a card key: `Unused -> Active -> Expired`, with `Expired` terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardKeyState {
    Unused,
    Active,
    Expired,
}

/// Request body for the verify endpoint.
///
/// # JSON Example
///
/// ```json
/// { "cardKey": "AAAAA-BBBBB-CCCCC-DDDDD-EEEEE" }
/// ```
#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    #[serde(rename = "cardKey")]
    pub card_key: String,
}

/// Machine-readable outcome code carried by every verify response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseCode {
    InvalidInput,
    InvalidCard,
    CardExpired,
    SessionRenewed,
    ActivationSuccess,
    ServerError,
}

/// Per-field validation detail for `INVALID_INPUT` responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Response body for the verify endpoint.
///
/// # JSON Examples
///
/// ```json
/// { "valid": true, "code": "ACTIVATION_SUCCESS", "expires_in": 86400 }
/// { "valid": false, "code": "INVALID_CARD", "message": "Card key is invalid" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    pub valid: bool,

    pub code: ResponseCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Seconds until the session credential lapses. Only present when `valid`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<FieldError>,
}

impl VerifyResponse {
    pub fn granted(code: ResponseCode, expires_in: i64) -> Self {
        Self {
            valid: true,
            code,
            message: None,
            expires_in: Some(expires_in),
            errors: Vec::new(),
        }
    }

    pub fn rejected(code: ResponseCode, message: impl Into<String>) -> Self {
        Self {
            valid: false,
            code,
            message: Some(message.into()),
            expires_in: None,
            errors: Vec::new(),
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.errors = errors;
        self
    }
}

/// Request body for provisioning new card keys.
///
/// ```json
/// { "count": 10 }
/// ```
#[derive(Debug, Deserialize)]
pub struct ProvisionRequest {
    /// Signed so that negative values reach range validation instead of failing to parse.
    pub count: i64,
}

/// Codes created by a provisioning call.
#[derive(Debug, Serialize)]
pub struct ProvisionResponse {
    pub codes: Vec<String>,
}

/// Admin view of a single card key.
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
#[derive(Debug, Serialize)]
pub struct CardKeyStatus {
    pub code: String,
    pub is_used: bool,
    pub first_used_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub state: CardKeyState,
}

impl CardKeyStatus {
    pub fn new(record: CardKey, now: i64, window_secs: i64) -> Self {
        Self {
            state: record.state(now, window_secs),
            expires_at: record.expires_at(window_secs),
            code: record.code_key,
            is_used: record.is_used,
            first_used_at: record.first_used_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_code_is_accepted() {
        let code = CardCode::parse("AAAAA-BBBBB-CCCCC-DDDDD-EEEEE").unwrap();
        assert_eq!(code.as_str(), "AAAAA-BBBBB-CCCCC-DDDDD-EEEEE");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let code = CardCode::parse("  A1B2C-3D4E5-F6G7H-8I9J0-KLMNO\n").unwrap();
        assert_eq!(code.as_str(), "A1B2C-3D4E5-F6G7H-8I9J0-KLMNO");
    }

    #[test]
    fn malformed_codes_are_rejected() {
        for raw in [
            "bad-format",
            "aaaaa-bbbbb-ccccc-ddddd-eeeee",
            "AAAA-BBBBB-CCCCC-DDDDD-EEEEE",
            "AAAAABBBBBCCCCCDDDDDEEEEE",
            "AAAAABBBBBCCCCCD",
            "AAAAA-BBBBB-CCCCC-DDDDD-EEEEE-FFFFF",
            "AAAAA_BBBBB_CCCCC_DDDDD_EEEEE",
        ] {
            assert_eq!(CardCode::parse(raw), Err(CardCodeError::Format), "{raw}");
        }
    }

    #[test]
    fn blank_code_is_reported_as_missing() {
        assert_eq!(CardCode::parse("   "), Err(CardCodeError::Empty));
    }

    #[test]
    fn masked_code_only_reveals_first_group() {
        let code = CardCode::parse("AAAAA-BBBBB-CCCCC-DDDDD-EEEEE").unwrap();
        assert_eq!(code.masked(), "AAAAA-*****-*****-*****-*****");
    }

    #[test]
    fn state_follows_the_window() {
        let mut record = CardKey::unused(&CardCode::parse("AAAAA-BBBBB-CCCCC-DDDDD-EEEEE").unwrap());
        assert_eq!(record.state(1_000, 86_400), CardKeyState::Unused);
        assert_eq!(record.expires_at(86_400), None);

        record.is_used = true;
        record.first_used_at = Some(1_000);
        assert_eq!(record.expires_at(86_400), Some(87_400));
        assert_eq!(record.state(87_399, 86_400), CardKeyState::Active);
        assert_eq!(record.state(87_400, 86_400), CardKeyState::Expired);
    }

    #[test]
    fn granted_response_omits_message() {
        let body = serde_json::to_value(VerifyResponse::granted(
            ResponseCode::ActivationSuccess,
            86_400,
        ))
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({ "valid": true, "code": "ACTIVATION_SUCCESS", "expires_in": 86400 })
        );
    }

    #[test]
    fn rejected_response_omits_expiry() {
        let body = serde_json::to_value(VerifyResponse::rejected(
            ResponseCode::InvalidCard,
            "Card key is invalid",
        ))
        .unwrap();

        assert_eq!(
            body,
            serde_json::json!({ "valid": false, "code": "INVALID_CARD", "message": "Card key is invalid" })
        );
    }
}
