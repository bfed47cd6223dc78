//! Session credentials handed out after a successful verify.
//!
//! The token is opaque: 32 random bytes, hex encoded. Nothing about the card
//! key can be recovered from it.

/// Cookie carrying the session credential.
pub const SESSION_COOKIE: &str = "session";

/// A freshly issued session credential and its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionGrant {
    pub token: String,

    /// Seconds until the credential lapses; doubles as the cookie's `Max-Age`.
    pub expires_in: i64,
}

impl SessionGrant {
    pub fn issue(expires_in: i64) -> Self {
        Self {
            token: generate_session_token(),
            expires_in,
        }
    }

    /// `Set-Cookie` value for this grant.
    pub fn cookie(&self) -> String {
        format!(
            "{SESSION_COOKIE}={}; Max-Age={}; Path=/; HttpOnly; Secure; SameSite=Strict",
            self.token, self.expires_in
        )
    }
}

/// Generate an unguessable session identifier (32 bytes = 64 hex chars).
fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}
