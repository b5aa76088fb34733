//! Catalog listing and product write tests.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use serde_json::json;

use threadline_core::Role;
use threadline_integration_tests::{Auth, TestApp, multipart_body, multipart_request};

fn product_fields<'a>(name: &'a str, price: &'a str) -> Vec<(&'a str, &'a str)> {
    vec![
        ("name", name),
        ("price", price),
        ("brand", "Threadline"),
        ("category", "men"),
        ("subcategory", "shirts"),
        ("description", "Loose fit"),
        ("material", "linen"),
        ("color", "white"),
        ("sizes", r#"[{"size":"M","quantity":4}]"#),
    ]
}

#[tokio::test]
async fn test_listing_filters() {
    let app = TestApp::new();
    app.product("Cheap tee", "10.00", &["M"]).await;
    app.product("Dear tee", "80.00", &["M"]).await;

    let all = app
        .call("GET", "/api/products/products", Auth::None, None)
        .await;
    assert_eq!(all.status, StatusCode::OK);
    assert_eq!(all.body.as_array().unwrap().len(), 2);

    let cheap = app
        .call(
            "GET",
            "/api/products/products?category=WOMEN&minPrice=5&maxPrice=20",
            Auth::None,
            None,
        )
        .await;
    let names: Vec<_> = cheap.body.as_array().unwrap().iter().map(|p| p["name"].clone()).collect();
    assert_eq!(names, [json!("Cheap tee")]);

    let none = app
        .call("GET", "/api/products/products?material=silk,wool", Auth::None, None)
        .await;
    assert_eq!(none.body, json!([]));

    let bad = app
        .call("GET", "/api/products/products?minPrice=cheap", Auth::None, None)
        .await;
    assert_eq!(bad.status, StatusCode::BAD_REQUEST);
    assert_eq!(bad.body["errors"][0]["param"], "minPrice");
}

#[tokio::test]
async fn test_show_product() {
    let app = TestApp::new();
    let tee = app.product("Tee", "15.00", &["M"]).await;

    let found = app
        .call("GET", &format!("/api/products/{}", tee.id), Auth::None, None)
        .await;
    assert_eq!(found.status, StatusCode::OK);
    assert_eq!(found.body["name"], "Tee");
    assert_eq!(found.body["price"], 15.0);

    let missing = app.call("GET", "/api/products/999", Auth::None, None).await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
    assert_eq!(missing.msg(), "Product not found");

    let bad_id = app.call("GET", "/api/products/abc", Auth::None, None).await;
    assert_eq!(bad_id.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_customer_cannot_create() {
    let app = TestApp::new();
    let token = app.register("ana", "ana@example.com").await;

    let body = multipart_body(&product_fields("Shirt", "40"), None);
    let response = app
        .send(multipart_request("POST", "/api/products", &token, body))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_staff_create_with_image_and_update() {
    let app = TestApp::new();
    let token = app
        .register_staff("dana", "dana@example.com", Role::Distributor)
        .await;

    let body = multipart_body(
        &product_fields("Shirt", "40"),
        Some(("../shirt photo.jpg", b"\xff\xd8\xff\xe0fake-jpeg")),
    );
    let created = app
        .send(multipart_request("POST", "/api/products", &token, body))
        .await;
    assert_eq!(created.status, StatusCode::OK, "{}", created.body);
    assert_eq!(created.body["sizes"][0]["size"], "M");

    let image_url = created.body["imageUrl"].as_str().unwrap().to_owned();
    assert!(image_url.starts_with("/uploads/"));
    assert!(image_url.ends_with("shirt_photo.jpg"));
    let file_name = image_url.trim_start_matches("/uploads/");
    assert!(app.uploads_dir().join(file_name).exists());

    let served = app.call("GET", &image_url, Auth::None, None).await;
    assert_eq!(served.status, StatusCode::OK);

    let id = created.body["id"].as_i64().unwrap();
    let body = multipart_body(&product_fields("Shirt v2", "45.50"), None);
    let updated = app
        .send(multipart_request("PUT", &format!("/api/products/{id}"), &token, body))
        .await;
    assert_eq!(updated.status, StatusCode::OK);
    assert_eq!(updated.body["name"], "Shirt v2");
    assert_eq!(updated.body["imageUrl"], image_url.as_str());
}

#[tokio::test]
async fn test_invalid_form_reports_fields() {
    let app = TestApp::new();
    let token = app.register_staff("root", "root@example.com", Role::Admin).await;

    let mut fields = product_fields("", "free");
    fields.retain(|(name, _)| *name != "color");
    let response = app
        .send(multipart_request(
            "POST",
            "/api/products",
            &token,
            multipart_body(&fields, None),
        ))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    let params: Vec<_> = response.body["errors"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["param"].as_str().unwrap().to_owned())
        .collect();
    assert_eq!(params, ["color", "name", "price"]);
}

#[tokio::test]
async fn test_update_unknown_product() {
    let app = TestApp::new();
    let token = app.register_staff("root", "root@example.com", Role::Admin).await;

    let body = multipart_body(&product_fields("Shirt", "40"), None);
    let response = app
        .send(multipart_request("PUT", "/api/products/999", &token, body))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}
