//! Home page: the menu, the cart and checkout.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::State;
use tiffin_buddy_core::{FoodItem, MAX_LINE_QUANTITY, MIN_ORDER_ITEMS, available_only};
use tower_sessions::Session;
use tracing::{instrument, warn};

use super::PageContext;
use super::cart::CartView;
use crate::api::ApiError;
use crate::error::AppError;
use crate::filters;
use crate::location::LocationOptions;
use crate::session::{Notice, load_cart};
use crate::state::AppState;

/// A menu card.
#[derive(Clone)]
pub struct FoodCardView {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub image: Option<String>,
    pub in_cart: u32,
    /// Units that can still be added before the line is full.
    pub max_add: u32,
}

impl FoodCardView {
    fn new(item: &FoodItem, in_cart: u32) -> Self {
        Self {
            id: item.id.to_string(),
            name: item.name.clone(),
            description: item.description.clone(),
            category: item.category.clone(),
            price: item.price.to_string(),
            image: item.image.clone(),
            in_cart,
            max_add: MAX_LINE_QUANTITY.saturating_sub(in_cart),
        }
    }
}

/// Geolocation settings and rules rendered into the checkout form.
#[derive(Clone)]
pub struct CheckoutView {
    pub high_accuracy: bool,
    pub timeout_ms: u128,
    pub maximum_age_ms: u128,
    pub radius_km: u32,
    pub min_items: u32,
}

impl CheckoutView {
    fn new(options: &LocationOptions, radius_km: u32) -> Self {
        Self {
            high_accuracy: options.high_accuracy,
            timeout_ms: options.timeout_ms(),
            maximum_age_ms: options.maximum_age_ms(),
            radius_km,
            min_items: MIN_ORDER_ITEMS,
        }
    }
}

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub foods: Vec<FoodCardView>,
    pub cart: CartView,
    pub checkout: CheckoutView,
}

/// Display the menu.
///
/// Only available items are listed. A catalog failure shows a notice over
/// an empty menu. The catalog is fetched before the pending notice is
/// taken, so a 401 redirect leaves it for the login page.
#[instrument(skip(state, session))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
) -> Result<HomeTemplate, AppError> {
    let catalog = match state.api().list_foods(&session).await {
        Err(ApiError::Unauthorized) => return Err(ApiError::Unauthorized.into()),
        other => other,
    };

    let cart = load_cart(&session).await?;
    let mut page = PageContext::with_cart(&session, &cart).await?;

    let foods = match catalog {
        Ok(foods) => available_only(foods),
        Err(e) => {
            warn!(error = %e, "Failed to load catalog");
            page.notice_if_none(Notice::error(
                "Error loading foods",
                "Please try again later.",
            ));
            Vec::new()
        }
    };

    Ok(HomeTemplate {
        foods: foods
            .iter()
            .map(|item| FoodCardView::new(item, cart.quantity_of(&item.id)))
            .collect(),
        cart: CartView::from(&cart),
        checkout: CheckoutView::new(state.location_options(), state.config().delivery_radius_km),
        page,
    })
}
