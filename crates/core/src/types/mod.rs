//! Core types for Atelier.
//!
//! This module provides type-safe wrappers for the order domain.

pub mod order;
pub mod price;
pub mod status;

pub use order::{Address, Customer, NewOrder, Order, OrderId, OrderItem, StatusPatch};
pub use price::{CurrencyCode, Price};
pub use status::{OrderStatus, PaymentStatus, StatusParseError};
