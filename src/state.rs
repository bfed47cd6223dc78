//! Shared handler state.

use std::sync::Arc;

use crate::store::CardKeyStore;

/// Immutable per-process state, cloned into every request.
///
/// The store is the only shared mutable resource; everything else here is
/// fixed at startup.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CardKeyStore>,

    /// Activation window in seconds.
    pub window_secs: i64,
}

impl AppState {
    pub fn new(store: Arc<dyn CardKeyStore>, window_secs: i64) -> Self {
        Self { store, window_secs }
    }
}
