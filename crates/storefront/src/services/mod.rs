//! Business logic for storefront.
//!
//! # Services
//!
//! - `ordering` - Checkout: minimum-item check, location, order submission
//! - `catalog` - Admin catalog management and dashboard loading

pub mod catalog;
pub mod ordering;
