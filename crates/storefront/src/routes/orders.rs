//! Order placement and order display data.

use axum::{Form, extract::State, response::Redirect};
use tiffin_buddy_core::{Order, OrderLine, OrderStatus};
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::api::ApiError;
use crate::error::{AppError, add_breadcrumb};
use crate::location::SubmittedLocation;
use crate::middleware::RequireAuth;
use crate::services::ordering::{self, OrderFailure};
use crate::session::{load_cart, push_notice, save_cart};
use crate::state::AppState;

/// One order line for templates: `2 x Food Item (ID: a1b2c3)`.
#[derive(Clone)]
pub struct OrderLineView {
    pub quantity: u32,
    pub food_short_id: String,
    pub line_total: String,
}

impl From<&OrderLine> for OrderLineView {
    fn from(line: &OrderLine) -> Self {
        Self {
            quantity: line.quantity,
            food_short_id: line.food_id.short().to_string(),
            line_total: line.line_total().to_string(),
        }
    }
}

/// An order for templates.
#[derive(Clone)]
pub struct OrderView {
    pub short_id: String,
    pub placed_at: String,
    pub status: String,
    pub status_class: &'static str,
    pub customer_id: String,
    pub location: String,
    pub lines: Vec<OrderLineView>,
    pub total: String,
}

impl From<&Order> for OrderView {
    fn from(order: &Order) -> Self {
        Self {
            short_id: order.id.short().to_string(),
            placed_at: order.created_at.format("%d %b %Y, %H:%M UTC").to_string(),
            status: order.status.label().to_string(),
            status_class: status_class(order.status),
            customer_id: order.user_id.to_string(),
            location: order.user_location.to_string(),
            lines: order.items.iter().map(OrderLineView::from).collect(),
            total: order.total_amount.to_string(),
        }
    }
}

const fn status_class(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "status--pending",
        OrderStatus::Confirmed => "status--confirmed",
        OrderStatus::Preparing => "status--preparing",
        OrderStatus::Delivered => "status--delivered",
        OrderStatus::Cancelled => "status--cancelled",
    }
}

/// Place an order from the cart.
///
/// The checkout script posts the browser's location (or why it has none).
/// Success goes to the order list; any other outcome returns to the menu
/// with a notice and the cart as it was.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    session: Session,
    Form(location): Form<SubmittedLocation>,
) -> Result<Redirect, AppError> {
    let mut cart = load_cart(&session).await?;
    add_breadcrumb("order", "Checkout started", None);

    let result = ordering::place_order(
        state.api(),
        &session,
        &mut cart,
        &location,
        state.location_options(),
    )
    .await;
    save_cart(&session, &cart).await?;

    match result {
        Ok(order) => {
            add_breadcrumb("order", "Order placed", Some(&[("order_id", order.id.as_str())]));
            push_notice(&session, &ordering::confirmation(&order)).await?;
            Ok(Redirect::to("/account/orders"))
        }
        Err(OrderFailure::SessionExpired) => Err(ApiError::Unauthorized.into()),
        Err(failure) => {
            if failure.is_server_side() {
                let event_id = sentry::capture_error(&failure);
                tracing::error!(error = %failure, sentry_event_id = %event_id, "Order failed");
            } else {
                warn!(error = %failure, "Order not placed");
            }
            push_notice(&session, &failure.notice(state.config().delivery_radius_km)).await?;
            Ok(Redirect::to("/"))
        }
    }
}
