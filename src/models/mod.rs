//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request/response bodies built around them.

/// Admin API key model
pub mod api_key;
/// Card key record, code format and verify wire types
pub mod card_key;
