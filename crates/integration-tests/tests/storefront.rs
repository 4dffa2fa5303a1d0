//! End-to-end tests for the storefront.
//!
//! Each test starts the storefront and a fake food API on ephemeral ports
//! and drives them with a cookie-keeping HTTP client, the way a browser
//! would. Redirects are asserted rather than followed.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use chrono::{Duration, Utc};
use tiffin_buddy_core::{MAX_LINE_QUANTITY, Role};
use tiffin_buddy_integration_tests::{FAR_AWAY, NEARBY, TestStorefront, Visitor, location};

const PASSWORD: &str = "secret123";

fn cart_badge(count: u32) -> String {
    format!(r#"<span class="cart-badge__count">{count}</span>"#)
}

async fn logged_in_customer(app: &TestStorefront) -> Visitor {
    app.api
        .add_account("Asha", "asha@example.com", PASSWORD, Role::Customer);
    let visitor = app.visitor();
    let response = visitor.login("asha@example.com", PASSWORD).await;
    assert_eq!(location(&response), "/");
    visitor
}

async fn logged_in_admin(app: &TestStorefront) -> Visitor {
    app.api
        .add_account("Chef", "chef@example.com", PASSWORD, Role::Admin);
    let visitor = app.visitor();
    let response = visitor.login("chef@example.com", PASSWORD).await;
    assert_eq!(location(&response), "/admin");
    visitor
}

// =============================================================================
// Menu
// =============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestStorefront::start().await;
    let response = app.visitor().get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), "ok");
}

#[tokio::test]
async fn test_menu_hides_unavailable_items() {
    let app = TestStorefront::start().await;
    app.api.add_food("Veg Thali", 120);
    app.api.add_unavailable_food("Paneer Tikka", 150);

    let html = app.visitor().page("/").await;

    assert!(html.contains("Veg Thali"));
    assert!(html.contains("₹120"));
    assert!(!html.contains("Paneer Tikka"));
}

#[tokio::test]
async fn test_security_headers_present() {
    let app = TestStorefront::start().await;
    let response = app.visitor().get("/").await;

    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert!(headers.contains_key("content-security-policy"));
    assert!(headers.contains_key("x-request-id"));
}

#[tokio::test]
async fn test_add_to_cart_uses_catalog_price() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 120);
    let visitor = app.visitor();

    let response = visitor.add_to_cart(&thali, 2).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let html = visitor.page("/").await;
    assert!(html.contains("Added to cart"));
    assert!(html.contains(&cart_badge(2)));
    assert!(html.contains("₹240"));
}

#[tokio::test]
async fn test_unavailable_item_cannot_be_added() {
    let app = TestStorefront::start().await;
    let hidden = app.api.add_unavailable_food("Paneer Tikka", 150);
    let visitor = app.visitor();

    visitor.add_to_cart(&hidden, 1).await;

    let html = visitor.page("/").await;
    assert!(html.contains("Item unavailable"));
    assert!(html.contains(&cart_badge(0)));
}

#[tokio::test]
async fn test_cart_quantity_zero_removes_line() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 120);
    let visitor = app.visitor();
    visitor.add_to_cart(&thali, 3).await;

    visitor
        .post(
            "/cart/update",
            &[("food_id", thali.id.as_str()), ("quantity", "0")],
        )
        .await;

    let html = visitor.page("/").await;
    assert!(html.contains(&cart_badge(0)));
}

#[tokio::test]
async fn test_oversized_quantity_is_refused() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 120);
    let lassi = app.api.add_food("Lassi", 30);
    let visitor = app.visitor();
    visitor.add_to_cart(&thali, MAX_LINE_QUANTITY).await;

    visitor.add_to_cart(&lassi, u32::MAX).await;
    let html = visitor.page("/").await;
    assert!(html.contains("Could not add item"));
    assert!(html.contains(&cart_badge(MAX_LINE_QUANTITY)));
    assert!(html.contains("Maximum in cart"));

    let too_many = u32::MAX.to_string();
    visitor
        .post(
            "/cart/update",
            &[("food_id", thali.id.as_str()), ("quantity", too_many.as_str())],
        )
        .await;
    let html = visitor.page("/").await;
    assert!(html.contains("Could not update cart"));
    assert!(html.contains(&cart_badge(MAX_LINE_QUANTITY)));
}

#[tokio::test]
async fn test_menu_card_offers_quantity() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 120);
    let visitor = app.visitor();
    visitor.add_to_cart(&thali, 4).await;

    let html = visitor.page("/").await;
    assert!(html.contains(r#"type="number" name="quantity""#));
    assert!(html.contains(&format!(r#"max="{}""#, MAX_LINE_QUANTITY - 4)));
}

#[tokio::test]
async fn test_notice_is_shown_once() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 120);
    let visitor = app.visitor();
    visitor.add_to_cart(&thali, 1).await;

    assert!(visitor.page("/").await.contains("Added to cart"));
    assert!(!visitor.page("/").await.contains("Added to cart"));
}

// =============================================================================
// Auth
// =============================================================================

#[tokio::test]
async fn test_register_logs_in() {
    let app = TestStorefront::start().await;
    let visitor = app.visitor();

    let response = visitor
        .post(
            "/auth/register",
            &[
                ("name", "Ravi"),
                ("email", "ravi@example.com"),
                ("password", PASSWORD),
                ("role", "user"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/");

    let html = visitor.page("/").await;
    assert!(html.contains("Account created!"));
    assert!(html.contains("Ravi"));
    assert!(html.contains("/auth/logout"));
}

#[tokio::test]
async fn test_register_duplicate_email_shows_error() {
    let app = TestStorefront::start().await;
    app.api
        .add_account("Asha", "asha@example.com", PASSWORD, Role::Customer);
    let visitor = app.visitor();

    let response = visitor
        .post(
            "/auth/register",
            &[
                ("name", "Asha"),
                ("email", "asha@example.com"),
                ("password", PASSWORD),
            ],
        )
        .await;
    assert_eq!(location(&response), "/auth/login?tab=register");

    let html = visitor.page("/auth/login?tab=register").await;
    assert!(html.contains("Registration failed"));
    assert!(html.contains("User already exists"));
}

#[tokio::test]
async fn test_login_failure_stays_logged_out() {
    let app = TestStorefront::start().await;
    app.api
        .add_account("Asha", "asha@example.com", PASSWORD, Role::Customer);
    let visitor = app.visitor();

    let response = visitor.login("asha@example.com", "wrong").await;
    assert_eq!(location(&response), "/auth/login");

    let html = visitor.page("/auth/login").await;
    assert!(html.contains("Login failed"));
    assert!(html.contains("Invalid credentials"));
    assert!(!html.contains("/auth/logout"));
}

#[tokio::test]
async fn test_logout_clears_cart() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 120);
    let visitor = logged_in_customer(&app).await;
    visitor.add_to_cart(&thali, 2).await;

    let response = visitor.post("/auth/logout", &[]).await;
    assert_eq!(location(&response), "/");

    let html = visitor.page("/").await;
    assert!(html.contains(&cart_badge(0)));
    assert!(!html.contains("/auth/logout"));
}

#[tokio::test]
async fn test_expired_token_redirects_to_login() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 120);
    let visitor = logged_in_customer(&app).await;
    visitor.add_to_cart(&thali, 2).await;
    app.api.expire_tokens();

    let response = visitor.get("/account/orders").await;
    assert_eq!(location(&response), "/auth/login?error=session_expired");

    let html = visitor.page("/auth/login?error=session_expired").await;
    assert!(html.contains("Your session has expired"));
    assert!(!html.contains("/auth/logout"));
    // The cart survives an expired login
    assert!(html.contains(&cart_badge(2)));
}

#[tokio::test]
async fn test_expired_token_on_menu_keeps_notice() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 120);
    let visitor = logged_in_customer(&app).await;
    visitor.add_to_cart(&thali, 2).await;
    app.api.expire_tokens();

    let response = visitor.get("/").await;
    assert_eq!(location(&response), "/auth/login?error=session_expired");

    let html = visitor.page("/auth/login?error=session_expired").await;
    assert!(html.contains("Added to cart"));
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_checkout_requires_login() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 50);
    let visitor = app.visitor();
    visitor.add_to_cart(&thali, 2).await;

    let response = visitor.checkout_at(NEARBY).await;

    assert_eq!(location(&response), "/auth/login");
    assert_eq!(app.api.count(&Method::POST, "/api/orders"), 0);
}

#[tokio::test]
async fn test_single_item_is_rejected_without_request() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 50);
    let visitor = logged_in_customer(&app).await;
    visitor.add_to_cart(&thali, 1).await;

    let response = visitor.checkout_at(NEARBY).await;
    assert_eq!(location(&response), "/");

    let html = visitor.page("/").await;
    assert!(html.contains("Minimum order requirement"));
    assert!(html.contains("Please select at least 2 items to place an order."));
    assert!(html.contains(&cart_badge(1)));
    assert_eq!(app.api.count(&Method::POST, "/api/orders"), 0);
}

#[tokio::test]
async fn test_order_placed_and_cart_cleared() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 50);
    let lassi = app.api.add_food("Lassi", 30);
    let visitor = logged_in_customer(&app).await;
    visitor.add_to_cart(&thali, 1).await;
    visitor.add_to_cart(&lassi, 2).await;

    let response = visitor.checkout_at(NEARBY).await;
    assert_eq!(location(&response), "/account/orders");

    let orders = app.api.orders();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].total_amount.to_string(), "₹110");
    assert_eq!(orders[0].items.len(), 2);

    let html = visitor.page("/account/orders").await;
    assert!(html.contains("Order placed successfully!"));
    assert!(html.contains("₹110"));
    assert!(html.contains("Pending"));
    assert!(html.contains(&cart_badge(0)));
}

#[tokio::test]
async fn test_slow_browser_clock_can_still_order() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 50);
    let visitor = logged_in_customer(&app).await;
    visitor.add_to_cart(&thali, 2).await;

    let response = visitor
        .checkout_with_clock(NEARBY, Utc::now() - Duration::minutes(3))
        .await;

    assert_eq!(location(&response), "/account/orders");
    assert_eq!(app.api.orders().len(), 1);
}

#[tokio::test]
async fn test_out_of_range_keeps_cart() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 50);
    let visitor = logged_in_customer(&app).await;
    visitor.add_to_cart(&thali, 2).await;

    let response = visitor.checkout_at(FAR_AWAY).await;
    assert_eq!(location(&response), "/");

    let html = visitor.page("/").await;
    assert!(html.contains("Delivery not available"));
    assert!(html.contains("10km radius"));
    assert!(html.contains(&cart_badge(2)));
    assert!(app.api.orders().is_empty());
}

#[tokio::test]
async fn test_denied_location_stops_checkout() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 50);
    let visitor = logged_in_customer(&app).await;
    visitor.add_to_cart(&thali, 2).await;

    let response = visitor.checkout_without_location("permission_denied").await;
    assert_eq!(location(&response), "/");

    let html = visitor.page("/").await;
    assert!(html.contains("Location error"));
    assert!(html.contains("Please allow location access"));
    assert!(html.contains(&cart_badge(2)));
    assert_eq!(app.api.count(&Method::POST, "/api/orders"), 0);
}

#[tokio::test]
async fn test_retry_after_failure_reuses_attempt_key() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 50);
    let visitor = logged_in_customer(&app).await;
    visitor.add_to_cart(&thali, 2).await;

    visitor.checkout_at(FAR_AWAY).await;
    visitor.checkout_at(NEARBY).await;

    let keys: Vec<Option<String>> = app
        .api
        .requests()
        .into_iter()
        .filter(|request| request.method == Method::POST && request.path == "/api/orders")
        .map(|request| request.idempotency_key)
        .collect();
    assert_eq!(keys.len(), 2);
    assert!(keys[0].is_some());
    assert_eq!(keys[0], keys[1]);
    assert_eq!(app.api.orders().len(), 1);
}

// =============================================================================
// Admin
// =============================================================================

#[tokio::test]
async fn test_admin_panel_gating() {
    let app = TestStorefront::start().await;

    let anonymous = app.visitor().get("/admin").await;
    assert_eq!(location(&anonymous), "/auth/login");

    let customer = logged_in_customer(&app).await;
    let response = customer.get("/admin").await;
    assert_eq!(location(&response), "/");
    assert_eq!(app.api.count(&Method::GET, "/api/orders"), 0);
}

#[tokio::test]
async fn test_admin_dashboard_lists_everything() {
    let app = TestStorefront::start().await;
    app.api.add_food("Veg Thali", 120);
    app.api.add_unavailable_food("Paneer Tikka", 150);
    let admin = logged_in_admin(&app).await;

    let html = admin.page("/admin").await;

    assert!(html.contains("Veg Thali"));
    assert!(html.contains("Paneer Tikka"));
    assert!(html.contains("Unavailable"));
}

#[tokio::test]
async fn test_admin_creates_food() {
    let app = TestStorefront::start().await;
    let admin = logged_in_admin(&app).await;

    let response = admin
        .post(
            "/admin/foods",
            &[
                ("name", "Masala Dosa"),
                ("description", "Crispy, with chutney"),
                ("price", "85.50"),
                ("category", "Breakfast"),
                ("image", ""),
                ("available", "on"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/admin");

    let foods = app.api.foods();
    assert_eq!(foods.len(), 1);
    assert_eq!(foods[0].name, "Masala Dosa");
    assert!(foods[0].available);
    assert!(foods[0].image.is_none());

    let html = admin.page("/admin").await;
    assert!(html.contains("Food item added"));
    assert!(html.contains("Masala Dosa"));
}

#[tokio::test]
async fn test_admin_invalid_price_redisplays_form() {
    let app = TestStorefront::start().await;
    let admin = logged_in_admin(&app).await;

    let response = admin
        .post(
            "/admin/foods",
            &[
                ("name", "Masala Dosa"),
                ("description", ""),
                ("price", "free"),
                ("category", "Breakfast"),
                ("image", ""),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let html = response.text().await.unwrap();
    assert!(html.contains("Price must be a non-negative number"));
    assert!(html.contains("Masala Dosa"));
    assert_eq!(app.api.count(&Method::POST, "/api/food"), 0);
}

#[tokio::test]
async fn test_admin_toggles_availability() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 120);
    let admin = logged_in_admin(&app).await;

    // An unchecked checkbox is simply absent from the form
    let response = admin
        .post(
            &format!("/admin/foods/{}", thali.id),
            &[
                ("name", "Veg Thali"),
                ("description", "Dal, sabzi, roti"),
                ("price", "120"),
                ("category", "Thali"),
                ("image", ""),
            ],
        )
        .await;
    assert_eq!(location(&response), "/admin");

    let foods = app.api.foods();
    assert!(!foods[0].available);
    assert_eq!(foods[0].category, "Thali");
    assert!(!app.visitor().page("/").await.contains("Veg Thali"));
}

#[tokio::test]
async fn test_admin_deletes_food() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 120);
    let admin = logged_in_admin(&app).await;

    let confirm = admin.page(&format!("/admin/foods/{}/delete", thali.id)).await;
    assert!(confirm.contains("Veg Thali"));

    let response = admin
        .post(&format!("/admin/foods/{}/delete", thali.id), &[])
        .await;
    assert_eq!(location(&response), "/admin");
    assert!(app.api.foods().is_empty());

    let html = admin.page("/admin").await;
    assert!(html.contains("Food item deleted"));
}

#[tokio::test]
async fn test_admin_food_pages_survive_api_failure() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 120);
    let admin = logged_in_admin(&app).await;
    app.api.fail_catalog();

    for path in [
        format!("/admin/foods/{}/edit", thali.id),
        format!("/admin/foods/{}/delete", thali.id),
    ] {
        let response = admin.get(&path).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{path}");
        assert_eq!(location(&response), "/admin");

        let html = admin.page("/admin").await;
        assert!(html.contains("Error loading food item"), "{path}");
        assert!(html.contains("Something went wrong on our side"));
    }
}

#[tokio::test]
async fn test_admin_edit_of_missing_food() {
    let app = TestStorefront::start().await;
    let admin = logged_in_admin(&app).await;

    let response = admin.get("/admin/foods/000000000000000000000000/edit").await;
    assert_eq!(location(&response), "/admin");
    assert!(admin.page("/admin").await.contains("Food item not found"));
}

#[tokio::test]
async fn test_admin_sees_all_orders() {
    let app = TestStorefront::start().await;
    let thali = app.api.add_food("Veg Thali", 50);
    let customer = logged_in_customer(&app).await;
    customer.add_to_cart(&thali, 2).await;
    customer.checkout_at(NEARBY).await;
    let admin = logged_in_admin(&app).await;

    let html = admin.page("/admin?tab=orders").await;

    let order = &app.api.orders()[0];
    assert!(html.contains(order.id.short()));
    assert!(html.contains("₹100"));
}
