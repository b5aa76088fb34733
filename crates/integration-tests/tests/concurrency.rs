//! Read-modify-write behaviour of cart updates.
//!
//! Cart mutations load the cart, change it in memory and save it whole, with
//! no version check between the load and the save. These tests pin that
//! behaviour down so a change to it is deliberate.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use threadline_core::{NewCartLine, Quantity};
use threadline_integration_tests::{Auth, TestApp};
use threadline_storefront::db::Store;

#[tokio::test]
async fn test_concurrent_adds_can_lose_an_update() {
    let app = TestApp::new();
    app.register("ana", "ana@example.com").await;
    let tee = app.product("Tee", "15.00", &["S", "M"]).await;
    let user = app
        .store
        .user_with_password(&threadline_core::Email::parse("ana@example.com").unwrap())
        .await
        .unwrap()
        .unwrap()
        .0
        .id;

    let line = |size: &str| NewCartLine {
        product_id: tee.id,
        selected_size: size.to_owned(),
        selected_color: "black".to_owned(),
        quantity: Quantity::ONE,
    };

    // Two requests load the same snapshot before either saves.
    let mut first = app.store.load_cart(user).await.unwrap().unwrap();
    let mut second = app.store.load_cart(user).await.unwrap().unwrap();
    first.add(line("S")).unwrap();
    second.add(line("M")).unwrap();
    app.store.save_cart(user, &first).await.unwrap();
    app.store.save_cart(user, &second).await.unwrap();

    let stored = app.store.load_cart(user).await.unwrap().unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored.items()[0].selected_size, "M");
}

#[tokio::test]
async fn test_sequential_adds_through_the_api_are_additive() {
    let app = TestApp::new();
    let token = app.register("ana", "ana@example.com").await;
    let tee = app.product("Tee", "15.00", &["M"]).await;

    for _ in 0..5 {
        app.call(
            "POST",
            "/api/users/cart",
            Auth::Bearer(&token),
            Some(serde_json::json!({
                "productId": tee.id,
                "selectedSize": "M",
                "selectedColor": "black",
                "quantity": 2,
            })),
        )
        .await;
    }

    let cart = app.call("GET", "/api/users/cart", Auth::Bearer(&token), None).await;
    assert_eq!(cart.body[0]["quantity"], 10);
}
