//! Checkout.
//!
//! Placing an order runs four steps in order, stopping at the first
//! failure:
//!
//! 1. Check the minimum item count locally (no request is made).
//! 2. Acquire the delivery location.
//! 3. Submit the order.
//! 4. Clear the cart.
//!
//! A failure leaves the cart lines untouched.

use thiserror::Error;
use tiffin_buddy_core::{Cart, CartError, Order};
use tracing::{info, instrument, warn};

use crate::api::{ApiError, FoodApiClient};
use crate::location::{self, LocationError, LocationOptions, LocationProvider};
use crate::session::{Notice, SessionStore};

/// Why an order was not placed.
#[derive(Debug, Error)]
pub enum OrderFailure {
    #[error(transparent)]
    BelowMinimum(#[from] CartError),

    #[error(transparent)]
    Location(#[from] LocationError),

    #[error("delivery location out of range: {0}")]
    OutOfRange(String),

    #[error("order rejected: {0}")]
    Rejected(String),

    #[error("session expired")]
    SessionExpired,

    #[error(transparent)]
    Api(ApiError),
}

impl From<ApiError> for OrderFailure {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::OutOfRange { message } => Self::OutOfRange(message),
            ApiError::Validation { message } | ApiError::Forbidden { message } => {
                Self::Rejected(message)
            }
            ApiError::Unauthorized => Self::SessionExpired,
            other => Self::Api(other),
        }
    }
}

impl OrderFailure {
    /// Notice describing the failure.
    #[must_use]
    pub fn notice(&self, delivery_radius_km: u32) -> Notice {
        match self {
            Self::BelowMinimum(CartError::BelowMinimum { required, .. }) => Notice::error(
                "Minimum order requirement",
                format!("Please select at least {required} items to place an order."),
            ),
            Self::BelowMinimum(err) => Notice::error("Cannot place order", err.to_string()),
            Self::Location(err) => Notice::error("Location error", err.user_message()),
            Self::OutOfRange(_) => Notice::error(
                "Delivery not available",
                format!(
                    "Sorry, we only deliver within a {delivery_radius_km}km radius. \
                     Your location is outside our delivery area."
                ),
            ),
            Self::Rejected(message) => Notice::error("Order failed", message.clone()),
            Self::SessionExpired => Notice::error(
                "Session expired",
                "Please log in again to place your order.",
            ),
            Self::Api(err) => Notice::error("Order failed", err.user_message()),
        }
    }

    /// Whether the failure should reach error tracking.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        match self {
            Self::Api(err) => err.is_server_side(),
            _ => false,
        }
    }
}

/// Notice confirming a placed order.
#[must_use]
pub fn confirmation(order: &Order) -> Notice {
    Notice::success(
        "Order placed successfully!",
        format!(
            "Your order #{} of {} is being prepared.",
            order.id.short(),
            order.total_amount
        ),
    )
}

/// Place the visitor's cart as an order.
///
/// On success the cart is cleared. On failure its lines are unchanged; the
/// checkout attempt key is kept so a retry of the same cart reuses it.
///
/// # Errors
///
/// Returns the first failing step as an [`OrderFailure`].
#[instrument(skip_all, fields(items = cart.total_items()))]
pub async fn place_order<S, P>(
    api: &FoodApiClient,
    session: &S,
    cart: &mut Cart,
    location: &P,
    options: &LocationOptions,
) -> Result<Order, OrderFailure>
where
    S: SessionStore + ?Sized,
    P: LocationProvider + ?Sized,
{
    cart.ensure_minimum()?;

    let coordinates = location::acquire(location, options).await.inspect_err(|e| {
        warn!(error = %e, "Location unavailable for checkout");
    })?;

    let new_order = cart.to_new_order(coordinates)?;
    let attempt_key = cart.attempt_key();

    let order = api
        .create_order(session, &new_order, attempt_key)
        .await
        .map_err(OrderFailure::from)?;

    info!(order_id = %order.id, total = %order.total_amount, "Order placed");
    cart.clear();
    Ok(order)
}

#[cfg(test)]
mod tests {
    use tiffin_buddy_core::CartError;

    use super::*;

    #[test]
    fn test_api_errors_map_to_failures() {
        assert!(matches!(
            OrderFailure::from(ApiError::OutOfRange {
                message: "too far".to_string()
            }),
            OrderFailure::OutOfRange(_)
        ));
        assert!(matches!(
            OrderFailure::from(ApiError::Unauthorized),
            OrderFailure::SessionExpired
        ));
        assert!(matches!(
            OrderFailure::from(ApiError::Validation {
                message: "Minimum 2 items".to_string()
            }),
            OrderFailure::Rejected(_)
        ));
    }

    #[test]
    fn test_minimum_notice() {
        let failure = OrderFailure::BelowMinimum(CartError::BelowMinimum {
            required: 2,
            actual: 1,
        });
        let notice = failure.notice(10);
        assert_eq!(notice.title, "Minimum order requirement");
        assert!(notice.description.contains("at least 2 items"));
    }

    #[test]
    fn test_out_of_range_notice_uses_radius() {
        let notice = OrderFailure::OutOfRange(String::new()).notice(10);
        assert!(notice.description.contains("10km"));
    }

    #[test]
    fn test_location_notice_is_specific() {
        let notice = OrderFailure::Location(LocationError::PermissionDenied).notice(10);
        assert_eq!(notice.title, "Location error");
        assert!(notice.description.contains("allow location access"));
    }
}
