//! The visitor's cart.
//!
//! A cart is an ordered list of lines, one per distinct food item. It lives
//! in the visitor's session and is only ever sent to the API as an order.
//!
//! # Invariants
//!
//! - At most one line per [`FoodId`].
//! - No line has quantity 0; setting a quantity to 0 removes the line.
//! - No line holds more than [`MAX_LINE_QUANTITY`] units.
//!
//! Totals are recomputed on every read.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{FoodItem, NewOrder, OrderLine};
use crate::types::{Coordinates, FoodId, Price};

/// Minimum number of item-units (summed across lines) for an order.
pub const MIN_ORDER_ITEMS: u32 = 2;

/// Most units of one dish a single cart line may hold.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// Errors raised by cart operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Adding zero units is meaningless.
    #[error("quantity must be at least 1")]
    ZeroQuantity,
    /// A line would exceed [`MAX_LINE_QUANTITY`].
    #[error("you can order at most {max} of one dish")]
    TooMany {
        /// Largest allowed line quantity.
        max: u32,
    },
    /// The cart is below the minimum order size.
    #[error("please select at least {required} items to place an order (you have {actual})")]
    BelowMinimum {
        /// Required item-units.
        required: u32,
        /// Item-units currently in the cart.
        actual: u32,
    },
}

/// A food snapshot plus a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub item: FoodItem,
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.item.price.times(self.quantity)
    }
}

/// Client-held selection of catalog items pending submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
    /// Key reused across retries of the same checkout; reset on any change.
    #[serde(default)]
    attempt_key: Option<Uuid>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` units of `item`, merging into an existing line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ZeroQuantity` if `quantity` is 0, or
    /// `CartError::TooMany` if the line would exceed [`MAX_LINE_QUANTITY`].
    /// The cart is unchanged on error.
    pub fn add(&mut self, item: &FoodItem, quantity: u32) -> Result<(), CartError> {
        if quantity == 0 {
            return Err(CartError::ZeroQuantity);
        }
        let total = self.quantity_of(&item.id).saturating_add(quantity);
        if total > MAX_LINE_QUANTITY {
            return Err(CartError::TooMany {
                max: MAX_LINE_QUANTITY,
            });
        }

        if let Some(line) = self.line_mut(&item.id) {
            line.quantity = total;
        } else {
            self.lines.push(CartLine {
                item: item.clone(),
                quantity,
            });
        }
        self.attempt_key = None;
        Ok(())
    }

    /// Set the quantity of an existing line. Zero removes it.
    ///
    /// Returns `Ok(false)` if there was no line for `food_id`.
    ///
    /// # Errors
    ///
    /// Returns `CartError::TooMany` if `quantity` exceeds
    /// [`MAX_LINE_QUANTITY`].
    pub fn set_quantity(&mut self, food_id: &FoodId, quantity: u32) -> Result<bool, CartError> {
        if quantity == 0 {
            return Ok(self.remove(food_id));
        }
        if quantity > MAX_LINE_QUANTITY {
            return Err(CartError::TooMany {
                max: MAX_LINE_QUANTITY,
            });
        }

        match self.line_mut(food_id) {
            Some(line) => {
                line.quantity = quantity;
                self.attempt_key = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remove the line for `food_id`, if any.
    ///
    /// Returns `true` if a line was removed.
    pub fn remove(&mut self, food_id: &FoodId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.item.id != food_id);
        let removed = self.lines.len() != before;
        if removed {
            self.attempt_key = None;
        }
        removed
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.attempt_key = None;
    }

    /// Current lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Units of `food_id` currently in the cart.
    #[must_use]
    pub fn quantity_of(&self, food_id: &FoodId) -> u32 {
        self.lines
            .iter()
            .find(|line| &line.item.id == food_id)
            .map_or(0, |line| line.quantity)
    }

    /// Sum of unit price times quantity.
    #[must_use]
    pub fn total_amount(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Sum of quantities, saturating at `u32::MAX`.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |total, line| total.saturating_add(line.quantity))
    }

    /// Whether the cart meets the minimum order size.
    #[must_use]
    pub fn meets_minimum(&self) -> bool {
        self.total_items() >= MIN_ORDER_ITEMS
    }

    /// Check the minimum order size.
    ///
    /// # Errors
    ///
    /// Returns `CartError::BelowMinimum` when fewer than
    /// [`MIN_ORDER_ITEMS`] units are in the cart.
    pub fn ensure_minimum(&self) -> Result<(), CartError> {
        let actual = self.total_items();
        if actual < MIN_ORDER_ITEMS {
            return Err(CartError::BelowMinimum {
                required: MIN_ORDER_ITEMS,
                actual,
            });
        }
        Ok(())
    }

    /// Build the `POST /orders` payload, capturing current unit prices.
    ///
    /// # Errors
    ///
    /// Returns `CartError::BelowMinimum` if the cart is too small.
    pub fn to_new_order(&self, user_location: Coordinates) -> Result<NewOrder, CartError> {
        self.ensure_minimum()?;

        Ok(NewOrder {
            items: self
                .lines
                .iter()
                .map(|line| OrderLine {
                    food_id: line.item.id.clone(),
                    quantity: line.quantity,
                    price: line.item.price,
                })
                .collect(),
            user_location,
        })
    }

    /// Key identifying this checkout attempt.
    ///
    /// Stable until the cart changes, so a retry after a lost response
    /// sends the same key.
    pub fn attempt_key(&mut self) -> Uuid {
        *self.attempt_key.get_or_insert_with(Uuid::new_v4)
    }

    fn line_mut(&mut self, food_id: &FoodId) -> Option<&mut CartLine> {
        self.lines.iter_mut().find(|line| &line.item.id == food_id)
    }
}
