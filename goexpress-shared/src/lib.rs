//! # GoExpress Shared Library
//!
//! This crate contains the domain core used by the GoExpress API server and
//! its tooling: identity, authorization, the shipment lifecycle, and the
//! profile stores.
//!
//! ## Module Organization
//!
//! - `auth`: Tokens, password hashing, authorization policy, identity middleware
//! - `db`: Connection pool and embedded migrations
//! - `error`: Domain error taxonomy
//! - `models`: Database models and data structures
//! - `pricing`: Quote computation
//! - `tracking_number`: Tracking identifier generation and validation

pub mod auth;
pub mod db;
pub mod error;
pub mod models;
pub mod pricing;
pub mod tracking_number;

/// Current version of the GoExpress shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
