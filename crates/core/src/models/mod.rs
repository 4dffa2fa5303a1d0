//! Wire models exchanged with the food API.
//!
//! Field names follow the API's JSON (`_id`, `userId`, `totalAmount`, ...);
//! Rust-side names are snake case.

pub mod food;
pub mod order;
pub mod user;

pub use food::{FoodItem, FoodItemPatch, NewFoodItem, available_only};
pub use order::{NewOrder, NewOrderLine, Order, OrderLine};
pub use user::User;
