//! # GoExpress API Server Library
//!
//! HTTP surface of the GoExpress courier backend: accounts, zones, quotes,
//! shipments with tracking, and customer and driver profiles.
//!
//! ## Modules
//!
//! - `app`: Application state and router builder
//! - `config`: Configuration management
//! - `error`: Error handling and HTTP response mapping
//! - `extract`: Validating request extractors
//! - `middleware`: Identity resolution and security headers
//! - `routes`: API route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
