//! Cart route handlers.
//!
//! The cart lives in the session. Each handler re-reads it, applies one
//! change, writes it back and redirects to the menu.

use axum::{
    Form,
    extract::State,
    response::Redirect,
};
use serde::Deserialize;
use tiffin_buddy_core::{Cart, CartLine, FoodId, MAX_LINE_QUANTITY, MIN_ORDER_ITEMS};
use tower_sessions::Session;
use tracing::{instrument, warn};

use crate::api::ApiError;
use crate::error::{AppError, add_breadcrumb};
use crate::session::{Notice, load_cart, push_notice, save_cart};
use crate::state::AppState;

/// One cart line for templates.
#[derive(Clone)]
pub struct CartLineView {
    pub food_id: String,
    pub name: String,
    pub unit_price: String,
    pub quantity: u32,
    pub line_total: String,
    pub decrement: u32,
    pub increment: u32,
    pub can_increment: bool,
}

impl From<&CartLine> for CartLineView {
    fn from(line: &CartLine) -> Self {
        Self {
            food_id: line.item.id.to_string(),
            name: line.item.name.clone(),
            unit_price: line.item.price.to_string(),
            quantity: line.quantity,
            line_total: line.line_total().to_string(),
            decrement: line.quantity.saturating_sub(1),
            increment: line.quantity.saturating_add(1),
            can_increment: line.quantity < MAX_LINE_QUANTITY,
        }
    }
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub lines: Vec<CartLineView>,
    pub total: String,
    pub item_count: u32,
    pub meets_minimum: bool,
    pub items_needed: u32,
}

impl From<&Cart> for CartView {
    fn from(cart: &Cart) -> Self {
        let item_count = cart.total_items();
        Self {
            lines: cart.lines().iter().map(CartLineView::from).collect(),
            total: cart.total_amount().to_string(),
            item_count,
            meets_minimum: cart.meets_minimum(),
            items_needed: MIN_ORDER_ITEMS.saturating_sub(item_count),
        }
    }
}

impl CartView {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub food_id: FoodId,
    pub quantity: Option<u32>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct UpdateCartForm {
    pub food_id: FoodId,
    pub quantity: u32,
}

/// Remove line form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub food_id: FoodId,
}

/// Add an item to the cart.
///
/// The item is looked up in the current catalog so the cart holds the
/// server's name and price, never values from the form.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect, AppError> {
    let quantity = form.quantity.unwrap_or(1);

    let item = match state.api().list_foods(&session).await {
        Ok(foods) => foods
            .into_iter()
            .find(|food| food.id == form.food_id && food.available),
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        Err(e) => {
            warn!(error = %e, "Failed to load catalog for add to cart");
            push_notice(&session, &Notice::error("Could not add item", e.user_message())).await?;
            return Ok(Redirect::to("/"));
        }
    };

    let Some(item) = item else {
        push_notice(
            &session,
            &Notice::error("Item unavailable", "This item is no longer on the menu."),
        )
        .await?;
        return Ok(Redirect::to("/"));
    };

    let mut cart = load_cart(&session).await?;
    let notice = match cart.add(&item, quantity) {
        Ok(()) => {
            save_cart(&session, &cart).await?;
            add_breadcrumb(
                "cart",
                "Added item",
                Some(&[("food_id", item.id.as_str()), ("name", item.name.as_str())]),
            );
            Notice::success("Added to cart", format!("{} added to your cart.", item.name))
        }
        Err(e) => Notice::error("Could not add item", e.to_string()),
    };
    push_notice(&session, &notice).await?;

    Ok(Redirect::to("/"))
}

/// Set the quantity of a cart line. Zero removes it.
#[instrument(skip(session))]
pub async fn update(
    session: Session,
    Form(form): Form<UpdateCartForm>,
) -> Result<Redirect, AppError> {
    let mut cart = load_cart(&session).await?;
    match cart.set_quantity(&form.food_id, form.quantity) {
        Ok(true) => save_cart(&session, &cart).await?,
        Ok(false) => {}
        Err(e) => {
            push_notice(&session, &Notice::error("Could not update cart", e.to_string())).await?;
        }
    }
    Ok(Redirect::to("/"))
}

/// Remove a line from the cart.
#[instrument(skip(session))]
pub async fn remove(
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Result<Redirect, AppError> {
    let mut cart = load_cart(&session).await?;
    if cart.remove(&form.food_id) {
        save_cart(&session, &cart).await?;
        add_breadcrumb("cart", "Removed item", Some(&[("food_id", form.food_id.as_str())]));
    }
    Ok(Redirect::to("/"))
}
