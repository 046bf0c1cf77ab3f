//! Atelier storefront library.
//!
//! The order lifecycle HTTP service: session cart, checkout, order creation
//! with notification emails, and the admin order endpoints. Exposed as a
//! library so the CLI and integration tests can reuse it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
