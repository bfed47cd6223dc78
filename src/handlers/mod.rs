//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Delegates to a service or the store
//! 3. Returns HTTP response (JSON, status code)

/// Card key provisioning and inspection endpoints
pub mod admin;
/// Public card key verify endpoint
pub mod card_keys;
/// Liveness and database connectivity
pub mod health;
