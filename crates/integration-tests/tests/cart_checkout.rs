//! End-to-end tests for the session cart and checkout.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use atelier_integration_tests::{TestApp, customer};
use serde_json::{Value, json};

fn print(id: &str, title: &str, price: u32) -> Value {
    json!({"id": id, "title": title, "price": price, "image": format!("/images/{id}.jpg")})
}

async fn cart(app: &TestApp) -> Value {
    app.get("/cart").await.json().await.unwrap()
}

#[tokio::test]
async fn test_new_visitor_has_empty_closed_cart() {
    let app = TestApp::spawn().await;
    let body = cart(&app).await;
    assert_eq!(body["items"], json!([]));
    assert_eq!(body["totalItems"], 0);
    assert_eq!(body["totalPrice"].as_f64(), Some(0.0));
    assert_eq!(body["isOpen"], false);
}

#[tokio::test]
async fn test_adding_same_item_twice_increments_quantity() {
    let app = TestApp::spawn().await;

    app.post_json("/cart/items", &print("p1", "Morning Tide", 1000))
        .await;
    let response = app
        .post_json("/cart/items", &print("p1", "Renamed", 9999))
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.unwrap();
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["title"], "Morning Tide");
    assert_eq!(body["totalPrice"].as_f64(), Some(2000.0));
    assert_eq!(body["isOpen"], true);
}

#[tokio::test]
async fn test_cart_survives_between_requests() {
    let app = TestApp::spawn().await;
    app.post_json("/cart/items", &print("p1", "Morning Tide", 1000))
        .await;

    let body = cart(&app).await;
    assert_eq!(body["totalItems"], 1);
    assert_eq!(body["isOpen"], true);
}

#[tokio::test]
async fn test_carts_are_per_session() {
    let app = TestApp::spawn().await;
    app.post_json("/cart/items", &print("p1", "Morning Tide", 1000))
        .await;

    let stranger: Value = reqwest::get(app.url("/cart"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stranger["totalItems"], 0);
}

#[tokio::test]
async fn test_update_and_remove_lines() {
    let app = TestApp::spawn().await;
    app.post_json("/cart/items", &print("p1", "Morning Tide", 1000))
        .await;
    app.post_json("/cart/items", &print("p2", "Harbour Study", 500))
        .await;

    let body: Value = app
        .patch_json("/cart/items/p1", &json!({"quantity": 3}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["totalItems"], 4);
    assert_eq!(body["totalPrice"].as_f64(), Some(3500.0));

    let body: Value = app
        .patch_json("/cart/items/p2", &json!({"quantity": 0}))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(body["items"].as_array().unwrap().len(), 1);

    let body: Value = app.delete("/cart/items/missing").await.json().await.unwrap();
    assert_eq!(body["totalItems"], 3);

    let body: Value = app.delete("/cart/items/p1").await.json().await.unwrap();
    assert_eq!(body["items"], json!([]));
}

#[tokio::test]
async fn test_clear_cart() {
    let app = TestApp::spawn().await;
    app.post_json("/cart/items", &print("p1", "Morning Tide", 1000))
        .await;

    let response = app.delete("/cart").await;
    assert_eq!(response.status(), 200);
    assert_eq!(cart(&app).await["totalItems"], 0);
}

#[tokio::test]
async fn test_add_item_rejects_invalid_payload() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/cart/items", &json!({"id": "", "title": "Untitled", "price": 100}))
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"][0]["field"], "id");

    let response = app.post_json("/cart/items", &json!({"id": "p1"})).await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_out_of_range_values_leave_cart_usable() {
    let app = TestApp::spawn().await;
    app.post_json(
        "/cart/items",
        &json!({"id": "p1", "title": "Grand Canvas", "price": 9_999_999_999.99_f64}),
    )
    .await;

    let response = app
        .patch_json("/cart/items/p1", &json!({"quantity": 4_294_967_295_u64}))
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"][0]["field"], "quantity");

    let response = app
        .post_json("/cart/items", &json!({"id": "p2", "title": "Too Dear", "price": 1e20}))
        .await;
    assert_eq!(response.status(), 400);

    let response = app.get("/cart").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["totalItems"], 1);
    assert_eq!(body["items"][0]["id"], "p1");
}

#[tokio::test]
async fn test_variant_lines_are_separate() {
    let app = TestApp::spawn().await;
    app.post_json("/cart/items", &print("p1", "Morning Tide", 1000))
        .await;
    let mut framed = print("p1", "Morning Tide (framed)", 1500);
    framed["variant"] = json!("framed");
    app.post_json("/cart/items", &framed).await;

    let body = cart(&app).await;
    assert_eq!(body["items"][0]["id"], "p1");
    assert_eq!(body["items"][1]["id"], "p1-framed");
    assert_eq!(body["totalPrice"].as_f64(), Some(2500.0));
}

#[tokio::test]
async fn test_checkout_places_order_from_cart() {
    let app = TestApp::spawn().await;
    app.post_json("/cart/items", &print("p1", "Morning Tide", 1000))
        .await;
    app.post_json("/cart/items", &print("p1", "Morning Tide", 1000))
        .await;
    app.post_json("/cart/items", &print("p2", "Harbour Study", 500))
        .await;
    assert_eq!(cart(&app).await["totalPrice"].as_f64(), Some(2500.0));

    let response = app
        .post_json("/checkout", &json!({"customer": customer(), "shipping": 0}))
        .await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let order_id = body["orderId"].as_str().unwrap();

    let order: Value = app
        .admin_get(&format!("/orders/{order_id}"))
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(order["subtotal"].as_f64(), Some(2500.0));
    assert_eq!(order["total"].as_f64(), Some(2500.0));
    assert_eq!(order["items"][0]["productId"], "p1");
    assert_eq!(order["items"][0]["quantity"], 2);
    assert_eq!(order["items"][1]["productId"], "p2");
    assert_eq!(order["items"][1]["image"], "/images/p2.jpg");

    let after = cart(&app).await;
    assert_eq!(after["items"], json!([]));
    assert_eq!(after["isOpen"], false);
}

#[tokio::test]
async fn test_checkout_with_empty_cart_is_rejected() {
    let app = TestApp::spawn().await;

    let response = app
        .post_json("/checkout", &json!({"customer": customer()}))
        .await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"][0]["field"], "items");
    assert!(app.store.is_empty().await);
}

#[tokio::test]
async fn test_failed_checkout_keeps_cart() {
    let app = TestApp::spawn().await;
    app.post_json("/cart/items", &print("p1", "Morning Tide", 1000))
        .await;

    let mut incomplete = customer();
    incomplete["address"]
        .as_object_mut()
        .unwrap()
        .remove("postalCode");
    let response = app
        .post_json("/checkout", &json!({"customer": incomplete}))
        .await;
    assert_eq!(response.status(), 400);
    assert_eq!(cart(&app).await["totalItems"], 1);

    app.store.set_unavailable(true);
    let response = app
        .post_json("/checkout", &json!({"customer": customer()}))
        .await;
    assert_eq!(response.status(), 500);
    assert_eq!(cart(&app).await["totalItems"], 1);
}
