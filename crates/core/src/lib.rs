//! Atelier Core - Shared domain library for the gallery shop.
//!
//! This crate provides the types and pure logic used by all Atelier components:
//! - `storefront` - Public shop API plus the admin order endpoints
//! - `cli` - Command-line tools for migrations and order management
//!
//! # Architecture
//!
//! The core crate contains only types, traits and pure functions - no network,
//! no database access. Persistence of the cart goes through the
//! [`cart::CartStorage`] port so callers decide where snapshots live.
//!
//! # Modules
//!
//! - [`types`] - Money, statuses and the order data model
//! - [`order_id`] - Human-readable order identifier generation
//! - [`validation`] - Structural validation of checkout payloads
//! - [`cart`] - Shopping cart store with an injectable storage port
//! - [`query`] - Admin order list filtering and "load more" pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod order_id;
pub mod query;
pub mod types;
pub mod validation;

pub use types::*;
