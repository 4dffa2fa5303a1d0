//! Core types for TiffinBuddy.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod location;
pub mod price;
pub mod status;

pub use id::*;
pub use location::{Coordinates, CoordinatesError};
pub use price::{MAX_PRICE_RUPEES, Price, PriceError};
pub use status::*;
