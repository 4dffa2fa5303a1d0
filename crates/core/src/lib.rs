//! TiffinBuddy Core - Shared domain types and cart logic.
//!
//! This crate provides the types used by the storefront and its tests:
//! - [`types`] - Newtype IDs, prices, roles, order statuses, coordinates
//! - [`models`] - Wire models for users, food items, and orders
//! - [`cart`] - The visitor's cart and the minimum-order rule
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no session handling. This keeps the cart rules testable without
//! a runtime.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod models;
pub mod types;

pub use cart::{Cart, CartError, CartLine, MAX_LINE_QUANTITY, MIN_ORDER_ITEMS};
pub use models::*;
pub use types::*;
