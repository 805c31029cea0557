use slice_core::models::Category;
use slice_core::TestApp;

#[tokio::test]
async fn test_cart_is_priced_against_catalog() {
    let app = TestApp::new().await;
    let pizza = app.create_product("Pepperoni Pizza", Category::Pizza, 1499, 45).await;
    let drink = app.create_product("Orange Juice", Category::Drink, 399, 80).await;

    let body = serde_json::json!({
        "items": [
            {"product_id": pizza.id, "quantity": 2},
            {"product_id": drink.id, "quantity": 3}
        ]
    });
    let res = app.client.post(&app.url("/api/cart"), &body.to_string()).await;

    assert_eq!(res.status, 200, "{}", res.body);
    let data = res.data();
    assert_eq!(data["total"], 41.95);
    assert_eq!(data["items"][0]["product_name"], "Pepperoni Pizza");
    assert_eq!(data["items"][0]["subtotal"], 29.98);
    assert_eq!(data["items"][1]["price"], 3.99);
    assert_eq!(data["items"][1]["subtotal"], 11.97);
}

#[tokio::test]
async fn test_cart_does_not_touch_stock() {
    let app = TestApp::new().await;
    let bread = app.create_product("Sourdough Bread", Category::Bread, 449, 5).await;

    let body = serde_json::json!({"items": [{"product_id": bread.id, "quantity": 5}]});
    let res = app.client.post(&app.url("/api/cart"), &body.to_string()).await;
    assert_eq!(res.status, 200);
    assert_eq!(app.stock_of(bread.id).await, 5);
}

#[tokio::test]
async fn test_empty_cart_totals_zero() {
    let app = TestApp::new().await;
    let res = app.client.post(&app.url("/api/cart"), r#"{"items":[]}"#).await;
    assert_eq!(res.status, 200);
    assert_eq!(res.data()["total"], 0.0);
}

#[tokio::test]
async fn test_cart_unknown_product() {
    let app = TestApp::new().await;
    let res = app
        .client
        .post(
            &app.url("/api/cart"),
            r#"{"items":[{"product_id":4242,"quantity":1}]}"#,
        )
        .await;
    assert_eq!(res.status, 400);
    assert_eq!(res.message(), "Product with ID 4242 not found");
}

#[tokio::test]
async fn test_cart_over_stock() {
    let app = TestApp::new().await;
    let tea = app.create_product("Iced Tea", Category::Drink, 249, 2).await;
    let body = serde_json::json!({"items": [{"product_id": tea.id, "quantity": 3}]});
    let res = app.client.post(&app.url("/api/cart"), &body.to_string()).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.message(), "Not enough stock for Iced Tea. Available: 2");
}

#[tokio::test]
async fn test_cart_repeated_product_counts_against_stock_together() {
    let app = TestApp::new().await;
    let tea = app.create_product("Iced Tea", Category::Drink, 249, 4).await;
    let body = serde_json::json!({"items": [
        {"product_id": tea.id, "quantity": 3},
        {"product_id": tea.id, "quantity": 2}
    ]});
    let res = app.client.post(&app.url("/api/cart"), &body.to_string()).await;
    assert_eq!(res.status, 400);
}

#[tokio::test]
async fn test_cart_rejects_zero_quantity() {
    let app = TestApp::new().await;
    let tea = app.create_product("Iced Tea", Category::Drink, 249, 4).await;
    let body = serde_json::json!({"items": [{"product_id": tea.id, "quantity": 0}]});
    let res = app.client.post(&app.url("/api/cart"), &body.to_string()).await;
    assert_eq!(res.status, 400);
    assert_eq!(res.error()["fields"][0]["field"], "items[0].quantity");
}

#[tokio::test]
async fn test_cart_requires_items_array() {
    let app = TestApp::new().await;
    let res = app
        .client
        .post(&app.url("/api/cart"), r#"{"items":"nope"}"#)
        .await;
    assert_eq!(res.status, 400);
}
