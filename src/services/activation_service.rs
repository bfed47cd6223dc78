//! Activation service - the card key state machine.
//!
//! A card key moves `Unused -> Active -> Expired` and never back:
//! - the first accepted verify activates it and stamps `first_used_at`
//! - later verifies inside the window are renewals (read-only)
//! - once the window has passed, the code is dead forever
//!
//! # Atomicity Guarantees
//!
//! Activation is a single conditional write (`... WHERE is_used = FALSE`).
//! When two requests race on a fresh code, exactly one write lands; the
//! loser re-reads and is served as a renewal.
//!
//! # Time
//!
//! The store supplies `now` with each lookup. That one value drives the
//! expiry filter, the branch decision and the activation stamp.

use crate::{
    models::card_key::{CardCode, CardKey, ResponseCode},
    services::session::SessionGrant,
    store::{CardKeyStore, StoreError},
};

/// What the resolver decided for one verify request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Unknown code, or a code already filtered out as expired.
    InvalidCard,
    CardExpired,
    ActivationSuccess(SessionGrant),
    SessionRenewed(SessionGrant),
}

impl Outcome {
    pub fn response_code(&self) -> ResponseCode {
        match self {
            Outcome::InvalidCard => ResponseCode::InvalidCard,
            Outcome::CardExpired => ResponseCode::CardExpired,
            Outcome::ActivationSuccess(_) => ResponseCode::ActivationSuccess,
            Outcome::SessionRenewed(_) => ResponseCode::SessionRenewed,
        }
    }
}

/// Pure decision for a looked-up record at a given store time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    InvalidCard,
    Activate,
    Renew { remaining: i64 },
    Expired,
}

/// Decide what to do with `record` at `now`, without touching the store.
pub fn decide(record: Option<&CardKey>, now: i64, window_secs: i64) -> Decision {
    let Some(record) = record else {
        return Decision::InvalidCard;
    };

    if !record.is_used {
        return Decision::Activate;
    }

    // is_used without a stamp violates the table constraint; never serve it
    let Some(expires_at) = record.expires_at(window_secs) else {
        return Decision::Expired;
    };

    let remaining = expires_at - now;
    if remaining <= 0 {
        Decision::Expired
    } else {
        Decision::Renew { remaining }
    }
}

/// Resolve a verify request for `code`.
///
/// # Process
///
/// 1. Filtered lookup (unknown and expired codes are indistinguishable)
/// 2. Unused: conditional activation write, full window granted
/// 3. Used and live: renewal with the remaining window, no write
/// 4. Used and past expiry: rejected, no write
///
/// # Errors
///
/// Only store failures are errors; every domain rejection is an `Outcome`.
pub async fn resolve(
    store: &dyn CardKeyStore,
    code: &CardCode,
    window_secs: i64,
) -> Result<Outcome, StoreError> {
    let lookup = store.lookup_live(code, window_secs).await?;

    match decide(lookup.record.as_ref(), lookup.now, window_secs) {
        Decision::Activate => {
            if store.mark_used(code, lookup.now).await? {
                tracing::info!(
                    card = %code.masked(),
                    activated_at = lookup.now,
                    expires_in = window_secs,
                    "Card key activated"
                );
                return Ok(Outcome::ActivationSuccess(SessionGrant::issue(window_secs)));
            }

            // Another request activated it between our read and write
            tracing::debug!(card = %code.masked(), "Lost activation race, re-reading");
            let retry = store.lookup_live(code, window_secs).await?;
            Ok(settle(
                code,
                decide(retry.record.as_ref(), retry.now, window_secs),
            ))
        }
        decision => Ok(settle(code, decision)),
    }
}

/// Turn a non-activating decision into an outcome.
fn settle(code: &CardCode, decision: Decision) -> Outcome {
    match decision {
        Decision::Renew { remaining } => {
            tracing::debug!(card = %code.masked(), remaining, "Session renewed");
            Outcome::SessionRenewed(SessionGrant::issue(remaining))
        }
        Decision::Expired => {
            tracing::info!(card = %code.masked(), "Card key expired");
            Outcome::CardExpired
        }
        Decision::InvalidCard => {
            tracing::info!(card = %code.masked(), "Card key rejected");
            Outcome::InvalidCard
        }
        Decision::Activate => {
            // A failed conditional write means the row is used or gone
            tracing::warn!(
                card = %code.masked(),
                "Card key still unused after failed activation"
            );
            Outcome::InvalidCard
        }
    }
}
