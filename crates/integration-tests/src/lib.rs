//! Integration test support for TiffinBuddy.
//!
//! - [`FakeFoodApi`] - an in-process food API with the real endpoint shapes
//!   and business rules (minimum order size, delivery radius, admin checks)
//! - [`TestStorefront`] - the storefront app wired to a fresh fake API
//! - [`Visitor`] - a browser-like client with its own cookie jar
//!
//! Everything binds `127.0.0.1:0`, so tests need no external services and
//! can run in parallel.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tiffin-buddy-integration-tests
//! ```

#![allow(clippy::missing_panics_doc)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};

use axum::extract::{Path, Request, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tiffin_buddy_core::{
    Coordinates, FoodId, FoodItem, FoodItemPatch, NewFoodItem, NewOrder, Order, OrderId,
    OrderStatus, Price, Role, User, UserId,
};
use tiffin_buddy_storefront::api::{IDEMPOTENCY_KEY_HEADER, OUT_OF_RANGE_CODE};
use tiffin_buddy_storefront::config::StorefrontConfig;
use tiffin_buddy_storefront::routes;
use tiffin_buddy_storefront::state::AppState;
use url::Url;
use uuid::Uuid;

/// Where the fake kitchen is (central Bengaluru).
pub const KITCHEN: Coordinates = Coordinates {
    lat: 12.9716,
    lng: 77.5946,
};

/// Delivery radius enforced by the fake API.
pub const DELIVERY_RADIUS_KM: f64 = 10.0;

/// A point about 3 km from [`KITCHEN`].
pub const NEARBY: Coordinates = Coordinates {
    lat: 12.9352,
    lng: 77.6245,
};

/// Mysore, well outside the radius.
pub const FAR_AWAY: Coordinates = Coordinates {
    lat: 12.2958,
    lng: 76.6394,
};

// =============================================================================
// Fake food API
// =============================================================================

/// One request as seen by the fake API.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub bearer: Option<String>,
    pub idempotency_key: Option<String>,
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
struct ApiState {
    accounts: Vec<Account>,
    tokens: HashMap<String, UserId>,
    foods: Vec<FoodItem>,
    orders: Vec<Order>,
    idempotency_keys: HashMap<String, OrderId>,
    requests: Vec<RecordedRequest>,
    catalog_down: bool,
}

type Shared = Arc<Mutex<ApiState>>;

fn lock(state: &Shared) -> MutexGuard<'_, ApiState> {
    state.lock().expect("fake API state poisoned")
}

fn document_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(24);
    id
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

impl ApiState {
    fn issue_token(&mut self, user_id: &UserId) -> String {
        let token = format!("tok_{}", Uuid::new_v4().simple());
        self.tokens.insert(token.clone(), user_id.clone());
        token
    }

    fn caller(&self, headers: &HeaderMap) -> Result<User, Response> {
        let unauthorized = || error(StatusCode::UNAUTHORIZED, "Not authorized, token failed");
        let token = bearer(headers).ok_or_else(unauthorized)?;
        let user_id = self.tokens.get(&token).ok_or_else(unauthorized)?;
        self.accounts
            .iter()
            .find(|account| &account.user.id == user_id)
            .map(|account| account.user.clone())
            .ok_or_else(unauthorized)
    }

    fn admin(&self, headers: &HeaderMap) -> Result<User, Response> {
        let user = self.caller(headers)?;
        if user.is_admin() {
            Ok(user)
        } else {
            Err(error(StatusCode::FORBIDDEN, "Admin access required"))
        }
    }
}

#[derive(Deserialize)]
struct LoginBody {
    email: String,
    password: String,
}

#[derive(Deserialize)]
struct RegisterBody {
    name: String,
    email: String,
    password: String,
    #[serde(default)]
    role: Role,
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let headers = request.headers();
    let entry = RecordedRequest {
        method: request.method().clone(),
        path: request.uri().path().to_string(),
        bearer: bearer(headers),
        idempotency_key: headers
            .get(IDEMPOTENCY_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string),
    };
    lock(&state).requests.push(entry);
    next.run(request).await
}

async fn login(State(state): State<Shared>, Json(body): Json<LoginBody>) -> Response {
    let mut api = lock(&state);
    let Some(user) = api
        .accounts
        .iter()
        .find(|account| account.user.email == body.email && account.password == body.password)
        .map(|account| account.user.clone())
    else {
        return error(StatusCode::UNAUTHORIZED, "Invalid credentials");
    };

    let token = api.issue_token(&user.id);
    Json(json!({ "token": token, "user": user })).into_response()
}

async fn register(State(state): State<Shared>, Json(body): Json<RegisterBody>) -> Response {
    let mut api = lock(&state);
    if api.accounts.iter().any(|account| account.user.email == body.email) {
        return error(StatusCode::BAD_REQUEST, "User already exists");
    }

    let user = User {
        id: UserId::new(document_id()),
        email: body.email,
        name: body.name,
        role: body.role,
    };
    api.accounts.push(Account {
        user: user.clone(),
        password: body.password,
    });
    let token = api.issue_token(&user.id);
    (
        StatusCode::CREATED,
        Json(json!({ "token": token, "user": user })),
    )
        .into_response()
}

/// Public, but a stale bearer token is still refused.
async fn list_foods(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let api = lock(&state);
    if api.catalog_down {
        return error(StatusCode::INTERNAL_SERVER_ERROR, "Database unavailable");
    }
    if bearer(&headers).is_some_and(|token| !api.tokens.contains_key(&token)) {
        return error(StatusCode::UNAUTHORIZED, "Not authorized, token failed");
    }
    Json(api.foods.clone()).into_response()
}

async fn create_food(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewFoodItem>,
) -> Response {
    let mut api = lock(&state);
    if let Err(rejection) = api.admin(&headers) {
        return rejection;
    }
    if body.name.trim().is_empty() {
        return error(StatusCode::BAD_REQUEST, "Name is required");
    }

    let item = FoodItem {
        id: FoodId::new(document_id()),
        name: body.name,
        description: body.description,
        price: body.price,
        image: body.image,
        category: body.category,
        available: body.available,
    };
    api.foods.push(item.clone());
    (StatusCode::CREATED, Json(item)).into_response()
}

async fn update_food(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(patch): Json<FoodItemPatch>,
) -> Response {
    let mut api = lock(&state);
    if let Err(rejection) = api.admin(&headers) {
        return rejection;
    }
    let Some(item) = api.foods.iter_mut().find(|item| item.id.as_str() == id) else {
        return error(StatusCode::NOT_FOUND, "Food item not found");
    };

    if let Some(name) = patch.name {
        item.name = name;
    }
    if let Some(description) = patch.description {
        item.description = description;
    }
    if let Some(price) = patch.price {
        item.price = price;
    }
    if let Some(category) = patch.category {
        item.category = category;
    }
    if let Some(image) = patch.image {
        item.image = (!image.is_empty()).then_some(image);
    }
    if let Some(available) = patch.available {
        item.available = available;
    }
    Json(item.clone()).into_response()
}

async fn delete_food(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    let mut api = lock(&state);
    if let Err(rejection) = api.admin(&headers) {
        return rejection;
    }
    let before = api.foods.len();
    api.foods.retain(|item| item.id.as_str() != id);
    if api.foods.len() == before {
        return error(StatusCode::NOT_FOUND, "Food item not found");
    }
    Json(json!({ "message": "Food item removed" })).into_response()
}

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<NewOrder>,
) -> Response {
    let mut api = lock(&state);
    let user = match api.caller(&headers) {
        Ok(user) => user,
        Err(rejection) => return rejection,
    };

    let key = headers
        .get(IDEMPOTENCY_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    if let Some(existing) = key
        .as_ref()
        .and_then(|key| api.idempotency_keys.get(key))
        .and_then(|id| api.orders.iter().find(|order| &order.id == id))
    {
        return Json(existing.clone()).into_response();
    }

    if body.item_count() < 2 {
        return error(StatusCode::BAD_REQUEST, "Minimum 2 items required");
    }
    if KITCHEN.distance_km(&body.user_location) > DELIVERY_RADIUS_KM {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "message": "Delivery location is outside our 10km delivery radius",
                "code": OUT_OF_RANGE_CODE,
            })),
        )
            .into_response();
    }

    let order = Order {
        id: OrderId::new(document_id()),
        user_id: user.id,
        total_amount: body.total_amount(),
        items: body.items,
        user_location: body.user_location,
        status: OrderStatus::Pending,
        created_at: Utc::now(),
    };
    if let Some(key) = key {
        api.idempotency_keys.insert(key, order.id.clone());
    }
    api.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

async fn list_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let api = lock(&state);
    match api.admin(&headers) {
        Ok(_) => Json(api.orders.clone()).into_response(),
        Err(rejection) => rejection,
    }
}

async fn my_orders(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let api = lock(&state);
    match api.caller(&headers) {
        Ok(user) => {
            let mine: Vec<Order> = api
                .orders
                .iter()
                .filter(|order| order.user_id == user.id)
                .cloned()
                .collect();
            Json(mine).into_response()
        }
        Err(rejection) => rejection,
    }
}

/// An in-process food API.
///
/// Mirrors the remote API's endpoints under `/api`, keeps everything in
/// memory, and records every request it receives.
#[derive(Clone)]
pub struct FakeFoodApi {
    addr: SocketAddr,
    state: Shared,
}

impl FakeFoodApi {
    /// Bind an ephemeral port and start serving.
    pub async fn start() -> Self {
        let state = Shared::default();

        let api = Router::new()
            .route("/auth/login", axum::routing::post(login))
            .route("/auth/register", axum::routing::post(register))
            .route("/food", get(list_foods).post(create_food))
            .route("/food/{id}", put(update_food).delete(delete_food))
            .route("/orders", get(list_orders).post(create_order))
            .route("/orders/user", get(my_orders));

        let app = Router::new()
            .nest("/api", api)
            .layer(middleware::from_fn_with_state(state.clone(), record))
            .with_state(state.clone());

        let addr = serve(app).await;
        Self { addr, state }
    }

    /// Root URL the storefront should be configured with.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/api", self.addr)).expect("valid fake API URL")
    }

    /// Put an available item on the menu.
    pub fn add_food(&self, name: &str, rupees: u32) -> FoodItem {
        self.insert_food(name, rupees, true)
    }

    /// Put an item in the catalog that customers must not see.
    pub fn add_unavailable_food(&self, name: &str, rupees: u32) -> FoodItem {
        self.insert_food(name, rupees, false)
    }

    fn insert_food(&self, name: &str, rupees: u32, available: bool) -> FoodItem {
        let item = FoodItem {
            id: FoodId::new(document_id()),
            name: name.to_string(),
            description: format!("Freshly made {name}"),
            price: Price::from_rupees(rupees),
            image: None,
            category: "Mains".to_string(),
            available,
        };
        lock(&self.state).foods.push(item.clone());
        item
    }

    /// Create an account that can log in with `password`.
    pub fn add_account(&self, name: &str, email: &str, password: &str, role: Role) -> User {
        let user = User {
            id: UserId::new(document_id()),
            email: email.to_string(),
            name: name.to_string(),
            role,
        };
        lock(&self.state).accounts.push(Account {
            user: user.clone(),
            password: password.to_string(),
        });
        user
    }

    /// Issue a token for `user` without going through login.
    pub fn token_for(&self, user: &User) -> String {
        lock(&self.state).issue_token(&user.id)
    }

    /// Revoke every issued token, so the next authenticated call gets a 401.
    pub fn expire_tokens(&self) {
        lock(&self.state).tokens.clear();
    }

    /// Make `GET /food` fail with a 500 from now on.
    pub fn fail_catalog(&self) {
        lock(&self.state).catalog_down = true;
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Requests received for `method` and `path` (e.g. `"/api/orders"`).
    #[must_use]
    pub fn count(&self, method: &Method, path: &str) -> usize {
        lock(&self.state)
            .requests
            .iter()
            .filter(|request| &request.method == method && request.path == path)
            .count()
    }

    #[must_use]
    pub fn orders(&self) -> Vec<Order> {
        lock(&self.state).orders.clone()
    }

    #[must_use]
    pub fn foods(&self) -> Vec<FoodItem> {
        lock(&self.state).foods.clone()
    }
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });
    addr
}

// =============================================================================
// Storefront
// =============================================================================

/// Configuration pointing at `api_base_url`, with Sentry disabled.
#[must_use]
pub fn test_config(api_base_url: Url) -> StorefrontConfig {
    StorefrontConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        base_url: "http://127.0.0.1".to_string(),
        api_base_url,
        delivery_radius_km: 10,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// The storefront app running against its own [`FakeFoodApi`].
pub struct TestStorefront {
    pub api: FakeFoodApi,
    addr: SocketAddr,
}

impl TestStorefront {
    pub async fn start() -> Self {
        let api = FakeFoodApi::start().await;
        let state = AppState::new(test_config(api.base_url()))
            .expect("Failed to initialize application state");
        let addr = serve(routes::app(state)).await;
        Self { api, addr }
    }

    /// A new browser with an empty cookie jar.
    #[must_use]
    pub fn visitor(&self) -> Visitor {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Visitor {
            base_url: format!("http://{}", self.addr),
            client,
        }
    }
}

/// A browser session against a [`TestStorefront`].
///
/// Redirects are not followed, so tests can assert on them.
pub struct Visitor {
    base_url: String,
    client: reqwest::Client,
}

impl Visitor {
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("GET failed")
    }

    pub async fn post(&self, path: &str, form: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(form)
            .send()
            .await
            .expect("POST failed")
    }

    /// GET a page that must render, returning its HTML.
    pub async fn page(&self, path: &str) -> String {
        let response = self.get(path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        response.text().await.expect("Failed to read body")
    }

    pub async fn login(&self, email: &str, password: &str) -> reqwest::Response {
        self.post("/auth/login", &[("email", email), ("password", password)])
            .await
    }

    pub async fn add_to_cart(&self, item: &FoodItem, quantity: u32) -> reqwest::Response {
        let quantity = quantity.to_string();
        self.post(
            "/cart/add",
            &[("food_id", item.id.as_str()), ("quantity", quantity.as_str())],
        )
        .await
    }

    /// Submit checkout as the page script does after a successful fix.
    pub async fn checkout_at(&self, at: Coordinates) -> reqwest::Response {
        self.checkout_with_clock(at, Utc::now()).await
    }

    /// Like [`checkout_at`](Self::checkout_at), from a browser whose clock
    /// reads `browser_now`.
    pub async fn checkout_with_clock(
        &self,
        at: Coordinates,
        browser_now: DateTime<Utc>,
    ) -> reqwest::Response {
        let lat = at.lat.to_string();
        let lng = at.lng.to_string();
        let captured_at = browser_now.timestamp_millis().to_string();
        self.post(
            "/orders",
            &[
                ("lat", lat.as_str()),
                ("lng", lng.as_str()),
                ("captured_at", captured_at.as_str()),
                ("submitted_at", captured_at.as_str()),
                ("location_error", ""),
            ],
        )
        .await
    }

    /// Submit checkout as the page script does after a failed fix.
    pub async fn checkout_without_location(&self, code: &str) -> reqwest::Response {
        self.post(
            "/orders",
            &[
                ("lat", ""),
                ("lng", ""),
                ("captured_at", ""),
                ("location_error", code),
            ],
        )
        .await
    }
}

/// The `Location` header of a redirect.
#[must_use]
pub fn location(response: &reqwest::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}
