//! Integration tests for the food API client.
//!
//! These run the client against an in-process fake API, with a
//! `MemorySessionStore` standing in for the visitor's session.

#![allow(clippy::unwrap_used)]

use axum::http::Method;
use secrecy::SecretString;
use tiffin_buddy_core::{Cart, FoodItemPatch, NewFoodItem, Price, Role, User};
use tiffin_buddy_integration_tests::{FAR_AWAY, FakeFoodApi, NEARBY};
use tiffin_buddy_storefront::api::{ApiError, FoodApiClient};
use tiffin_buddy_storefront::services::catalog;
use tiffin_buddy_storefront::session::{AuthState, AuthToken, MemorySessionStore, keys};
use uuid::Uuid;

fn password(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

async fn setup() -> (FakeFoodApi, FoodApiClient) {
    let api = FakeFoodApi::start().await;
    let client = FoodApiClient::new(api.base_url()).expect("Failed to build client");
    (api, client)
}

/// A session already logged in as `user`.
async fn session_for(api: &FakeFoodApi, user: &User) -> MemorySessionStore {
    let session = MemorySessionStore::new();
    AuthState::default()
        .login(&session, AuthToken::new(api.token_for(user)), user.clone())
        .await
        .expect("Failed to log in");
    session
}

fn dosa() -> NewFoodItem {
    NewFoodItem {
        name: "Masala Dosa".to_string(),
        description: "Crispy, with chutney".to_string(),
        price: Price::from_rupees(85),
        category: "Breakfast".to_string(),
        image: None,
        available: true,
    }
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_login_returns_token_and_user() {
    let (api, client) = setup().await;
    api.add_account("Asha", "asha@example.com", "secret123", Role::Customer);

    let response = client
        .login("asha@example.com", &password("secret123"))
        .await
        .expect("login should succeed");

    assert_eq!(response.user.name, "Asha");
    assert!(!response.user.is_admin());
    assert!(response.token.expose().starts_with("tok_"));
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let (api, client) = setup().await;
    api.add_account("Asha", "asha@example.com", "secret123", Role::Customer);

    let err = client
        .login("asha@example.com", &password("nope"))
        .await
        .unwrap_err();

    match err {
        ApiError::InvalidCredentials { message } => assert_eq!(message, "Invalid credentials"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_register_admin_and_duplicate_email() {
    let (_api, client) = setup().await;

    let created = client
        .register("Chef", "chef@example.com", &password("pw"), Role::Admin)
        .await
        .expect("register should succeed");
    assert!(created.user.is_admin());

    let err = client
        .register("Chef", "chef@example.com", &password("pw"), Role::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation { ref message } if message == "User already exists"));
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_list_foods_includes_unavailable_items() {
    let (api, client) = setup().await;
    api.add_food("Veg Thali", 120);
    api.add_unavailable_food("Paneer Tikka", 150);

    let foods = client
        .list_foods(&MemorySessionStore::new())
        .await
        .expect("catalog should load");

    assert_eq!(foods.len(), 2);
    assert!(foods.iter().any(|food| !food.available));
}

#[tokio::test]
async fn test_customer_cannot_create_food() {
    let (api, client) = setup().await;
    let customer = api.add_account("Asha", "asha@example.com", "pw", Role::Customer);
    let session = session_for(&api, &customer).await;

    let err = client.create_food(&session, &dosa()).await.unwrap_err();

    assert!(matches!(err, ApiError::Forbidden { .. }));
    assert!(api.foods().is_empty());
    // A 403 leaves the login alone
    assert!(session.contains(keys::AUTH_TOKEN));
}

#[tokio::test]
async fn test_admin_food_lifecycle() {
    let (api, client) = setup().await;
    let admin = api.add_account("Chef", "chef@example.com", "pw", Role::Admin);
    let session = session_for(&api, &admin).await;

    let created = client.create_food(&session, &dosa()).await.unwrap();
    assert_eq!(created.name, "Masala Dosa");

    let patch = FoodItemPatch {
        available: Some(false),
        price: Some(Price::from_rupees(90)),
        ..FoodItemPatch::default()
    };
    let updated = client.update_food(&session, &created.id, &patch).await.unwrap();
    assert!(!updated.available);
    assert_eq!(updated.price, Price::from_rupees(90));
    assert_eq!(updated.category, "Breakfast");

    client.delete_food(&session, &created.id).await.unwrap();
    assert!(api.foods().is_empty());

    let err = client.delete_food(&session, &created.id).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation { .. }));
}

#[tokio::test]
async fn test_dashboard_loads_both_lists() {
    let (api, client) = setup().await;
    let admin = api.add_account("Chef", "chef@example.com", "pw", Role::Admin);
    api.add_food("Veg Thali", 120);
    let session = session_for(&api, &admin).await;

    let dashboard = catalog::load_dashboard(&client, &session).await.unwrap();

    assert_eq!(dashboard.foods.len(), 1);
    assert!(dashboard.orders.is_empty());
    assert_eq!(api.count(&Method::GET, "/api/food"), 1);
    assert_eq!(api.count(&Method::GET, "/api/orders"), 1);
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
async fn test_order_total_and_attempt_key_header() {
    let (api, client) = setup().await;
    let customer = api.add_account("Asha", "asha@example.com", "pw", Role::Customer);
    let thali = api.add_food("Veg Thali", 50);
    let lassi = api.add_food("Lassi", 30);
    let session = session_for(&api, &customer).await;

    let mut cart = Cart::new();
    cart.add(&thali, 1).unwrap();
    cart.add(&lassi, 2).unwrap();
    let key = cart.attempt_key();

    let order = client
        .create_order(&session, &cart.to_new_order(NEARBY).unwrap(), key)
        .await
        .expect("order should be accepted");

    assert_eq!(order.total_amount, Price::from_rupees(110));
    assert_eq!(order.user_id, customer.id);

    let posted = api
        .requests()
        .into_iter()
        .find(|request| request.method == Method::POST && request.path == "/api/orders")
        .expect("order was posted");
    assert_eq!(posted.idempotency_key, Some(key.to_string()));
}

#[tokio::test]
async fn test_retried_attempt_key_creates_one_order() {
    let (api, client) = setup().await;
    let customer = api.add_account("Asha", "asha@example.com", "pw", Role::Customer);
    let thali = api.add_food("Veg Thali", 50);
    let session = session_for(&api, &customer).await;

    let mut cart = Cart::new();
    cart.add(&thali, 2).unwrap();
    let order = cart.to_new_order(NEARBY).unwrap();
    let key = Uuid::new_v4();

    let first = client.create_order(&session, &order, key).await.unwrap();
    let second = client.create_order(&session, &order, key).await.unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(api.orders().len(), 1);
}

#[tokio::test]
async fn test_out_of_range_is_recognised_by_code() {
    let (api, client) = setup().await;
    let customer = api.add_account("Asha", "asha@example.com", "pw", Role::Customer);
    let thali = api.add_food("Veg Thali", 50);
    let session = session_for(&api, &customer).await;

    let mut cart = Cart::new();
    cart.add(&thali, 2).unwrap();

    let err = client
        .create_order(&session, &cart.to_new_order(FAR_AWAY).unwrap(), Uuid::new_v4())
        .await
        .unwrap_err();

    assert!(matches!(err, ApiError::OutOfRange { .. }));
    assert!(api.orders().is_empty());
}

#[tokio::test]
async fn test_customer_sees_only_own_orders() {
    let (api, client) = setup().await;
    let asha = api.add_account("Asha", "asha@example.com", "pw", Role::Customer);
    let ravi = api.add_account("Ravi", "ravi@example.com", "pw", Role::Customer);
    let thali = api.add_food("Veg Thali", 50);

    let mut cart = Cart::new();
    cart.add(&thali, 2).unwrap();
    let order = cart.to_new_order(NEARBY).unwrap();

    let asha_session = session_for(&api, &asha).await;
    let ravi_session = session_for(&api, &ravi).await;
    client
        .create_order(&asha_session, &order, Uuid::new_v4())
        .await
        .unwrap();

    assert_eq!(client.list_my_orders(&asha_session).await.unwrap().len(), 1);
    assert!(client.list_my_orders(&ravi_session).await.unwrap().is_empty());

    let err = client.list_orders(&ravi_session).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden { .. }));
}

// =============================================================================
// Expired sessions
// =============================================================================

#[tokio::test]
async fn test_rejected_token_clears_session() {
    let (api, client) = setup().await;
    let customer = api.add_account("Asha", "asha@example.com", "pw", Role::Customer);
    let session = session_for(&api, &customer).await;
    api.expire_tokens();

    let err = client.list_my_orders(&session).await.unwrap_err();

    assert!(matches!(err, ApiError::Unauthorized));
    assert!(!session.contains(keys::AUTH_TOKEN));
    assert!(!session.contains(keys::CURRENT_USER));

    let auth = AuthState::load(&session).await.unwrap();
    assert!(!auth.is_authenticated());
}

#[tokio::test]
async fn test_rejected_token_keeps_cart() {
    let (api, client) = setup().await;
    let customer = api.add_account("Asha", "asha@example.com", "pw", Role::Customer);
    let thali = api.add_food("Veg Thali", 50);
    let session = session_for(&api, &customer).await;

    let mut cart = Cart::new();
    cart.add(&thali, 2).unwrap();
    tiffin_buddy_storefront::session::save_cart(&session, &cart)
        .await
        .unwrap();
    api.expire_tokens();

    let _ = client.list_my_orders(&session).await.unwrap_err();

    assert!(session.contains(keys::CART));
}
