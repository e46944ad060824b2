//! Networking modules for the admin REST API.
//!
//! SYSTEM CONTEXT
//! ==============
//! `transport` moves bytes, `api` applies the backend contract (auth headers,
//! envelopes, error text), and `types` defines the wire schema.

pub mod api;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
