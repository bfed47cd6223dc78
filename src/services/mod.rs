//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They talk to the card key store and never build HTTP responses.

pub mod activation_service;
pub mod provisioning_service;
pub mod session;
