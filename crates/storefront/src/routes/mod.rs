//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Menu with cart sidebar and checkout
//! GET  /health                    - Health check
//!
//! # Cart
//! POST /cart/add                  - Add item
//! POST /cart/update               - Set quantity (0 removes)
//! POST /cart/remove               - Remove line
//!
//! # Orders
//! POST /orders                    - Place order from cart (requires auth)
//! GET  /account/orders            - My orders (requires auth)
//!
//! # Auth
//! GET  /auth/login                - Login and register forms
//! POST /auth/login                - Login action
//! POST /auth/register             - Register action
//! POST /auth/logout               - Logout action
//!
//! # Admin (requires admin role)
//! GET  /admin                     - Foods and orders tabs
//! GET  /admin/foods/new           - New food form
//! POST /admin/foods               - Create food
//! GET  /admin/foods/{id}/edit     - Edit food form
//! POST /admin/foods/{id}          - Update food
//! GET  /admin/foods/{id}/delete   - Delete confirmation
//! POST /admin/foods/{id}/delete   - Delete food
//! ```

pub mod account;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod home;
pub mod orders;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tiffin_buddy_core::{Cart, User};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tower_sessions::Session;

use crate::error::AppError;
use crate::middleware;
use crate::session::{AuthState, Notice, load_cart, take_notice};
use crate::state::AppState;

/// Directory static assets are served from, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Data every page's layout needs.
pub struct PageContext {
    pub user: Option<User>,
    pub cart_count: u32,
    pub notice: Option<Notice>,
}

impl PageContext {
    /// Load the layout data, consuming any pending notice.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn load(session: &Session) -> Result<Self, AppError> {
        let cart = load_cart(session).await?;
        Self::with_cart(session, &cart).await
    }

    /// Like [`load`](Self::load), for a handler that already read the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn with_cart(session: &Session, cart: &Cart) -> Result<Self, AppError> {
        let auth = AuthState::load(session).await?;
        let notice = take_notice(session).await?;

        Ok(Self {
            user: auth.user().cloned(),
            cart_count: cart.total_items(),
            notice,
        })
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(User::is_admin)
    }

    /// Show `notice` unless one is already pending.
    pub fn notice_if_none(&mut self, notice: Notice) {
        self.notice.get_or_insert(notice);
    }
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(cart::add))
        .route("/update", post(cart::update))
        .route("/remove", post(cart::remove))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(admin::dashboard))
        .route("/foods", post(admin::create_food))
        .route("/foods/new", get(admin::new_food))
        .route("/foods/{id}", post(admin::update_food))
        .route("/foods/{id}/edit", get(admin::edit_food))
        .route(
            "/foods/{id}/delete",
            get(admin::confirm_delete).post(admin::delete_food),
        )
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .nest("/cart", cart_routes())
        .route("/orders", post(orders::place))
        .route("/account/orders", get(account::orders))
        .nest("/auth", auth_routes())
        .nest("/admin", admin_routes())
}

/// The full application: routes, static files and the middleware stack.
///
/// Sentry layers are added by the binary on top of this.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.config());

    Router::new()
        .merge(routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(session_layer)
        .layer(axum_middleware::from_fn(
            middleware::security_headers_middleware,
        ))
        .layer(axum_middleware::from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(middleware::make_request_span::<axum::body::Body>),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check the food API.
async fn health() -> &'static str {
    "ok"
}
