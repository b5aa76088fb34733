//! Token issue, verification and transport tests.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::StatusCode;
use chrono::{Duration, Utc};
use serde_json::json;

use threadline_core::{Identity, Role, UserId};
use threadline_integration_tests::{Auth, TestApp};
use threadline_storefront::config::TokenTransport;

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::new();
    let live = app.call("GET", "/health", Auth::None, None).await;
    assert_eq!(live.status, StatusCode::OK);
    let ready = app.call("GET", "/health/ready", Auth::None, None).await;
    assert_eq!(ready.status, StatusCode::OK);
}

#[tokio::test]
async fn test_protected_route_without_token() {
    let app = TestApp::new();
    let response = app.call("GET", "/api/users/cart", Auth::None, None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.msg(), "No token, authorization denied");
}

#[tokio::test]
async fn test_register_check_auth_and_login() {
    let app = TestApp::new();
    let token = app.register("ana", "Ana@Example.com").await;

    let check = app
        .call("GET", "/api/users/check-auth", Auth::Bearer(&token), None)
        .await;
    assert_eq!(check.status, StatusCode::OK);
    assert_eq!(check.body["user"]["role"], "customer");
    assert!(check.body["user"].get("name").is_none());

    let login = app
        .call(
            "POST",
            "/api/users/login",
            Auth::None,
            Some(json!({ "email": "ana@example.com", "password": "correct-horse" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);
    assert_eq!(login.body["user"]["name"], "ana");
    assert!(login.token_cookie().is_some());
}

#[tokio::test]
async fn test_register_ignores_requested_role() {
    let app = TestApp::new();
    let response = app
        .call(
            "POST",
            "/api/users/register",
            Auth::None,
            Some(json!({
                "username": "mallory",
                "email": "mallory@example.com",
                "password": "secret-pass",
                "role": "admin",
            })),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["user"]["role"], "customer");
}

#[tokio::test]
async fn test_register_validation_and_duplicates() {
    let app = TestApp::new();
    let invalid = app
        .call(
            "POST",
            "/api/users/register",
            Auth::None,
            Some(json!({ "username": "", "email": "nope", "password": "123" })),
        )
        .await;
    assert_eq!(invalid.status, StatusCode::BAD_REQUEST);
    assert_eq!(invalid.body["errors"].as_array().unwrap().len(), 3);

    app.register("ana", "ana@example.com").await;
    let duplicate = app
        .call(
            "POST",
            "/api/users/register",
            Auth::None,
            Some(json!({ "username": "ana2", "email": "ANA@example.com", "password": "another-pass" })),
        )
        .await;
    assert_eq!(duplicate.status, StatusCode::BAD_REQUEST);
    assert_eq!(duplicate.msg(), "User already exists");
}

#[tokio::test]
async fn test_bad_credentials() {
    let app = TestApp::new();
    app.register("ana", "ana@example.com").await;

    for (email, password) in [
        ("ana@example.com", "wrong-password"),
        ("nobody@example.com", "correct-horse"),
    ] {
        let response = app
            .call(
                "POST",
                "/api/users/login",
                Auth::None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(response.status, StatusCode::BAD_REQUEST);
        assert_eq!(response.msg(), "Invalid credentials");
    }
}

#[tokio::test]
async fn test_expired_token_rejected() {
    let app = TestApp::new();
    let identity = Identity::new(UserId::new(1), Role::Customer);
    let issued = app
        .tokens
        .issue_at(&identity, Utc::now() - Duration::days(6))
        .unwrap();

    let response = app
        .call("GET", "/api/users/check-auth", Auth::Bearer(&issued.token), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.msg(), "Token is not valid");
}

#[tokio::test]
async fn test_tampered_token_rejected() {
    let app = TestApp::new();
    let token = app.register("ana", "ana@example.com").await;

    let mut tampered = token.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == 'A' { 'B' } else { 'A' });

    let response = app
        .call("GET", "/api/users/check-auth", Auth::Bearer(&tampered), None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.msg(), "Token is not valid");
}

#[tokio::test]
async fn test_cookie_transport() {
    let app = TestApp::with_transport(TokenTransport::Cookie);
    let register = app
        .call(
            "POST",
            "/api/users/register",
            Auth::None,
            Some(json!({ "username": "ana", "email": "ana@example.com", "password": "correct-horse" })),
        )
        .await;
    assert_eq!(register.status, StatusCode::OK);
    assert!(register.body.get("token").is_none());
    let cookie = register.token_cookie().unwrap();
    let token = cookie.trim_start_matches("token=").to_owned();

    let via_cookie = app
        .call("GET", "/api/users/check-auth", Auth::Cookie(&cookie), None)
        .await;
    assert_eq!(via_cookie.status, StatusCode::OK);

    let via_header = app
        .call("GET", "/api/users/check-auth", Auth::Bearer(&token), None)
        .await;
    assert_eq!(via_header.status, StatusCode::UNAUTHORIZED);
    assert_eq!(via_header.msg(), "No token, authorization denied");

    let logout = app
        .call("POST", "/api/users/logout", Auth::Cookie(&cookie), None)
        .await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.msg(), "Logout successful");
    assert_eq!(logout.token_cookie().as_deref(), Some("token="));
}

#[tokio::test]
async fn test_header_transport_ignores_cookie() {
    let app = TestApp::with_transport(TokenTransport::Header);
    let token = app.register("ana", "ana@example.com").await;

    let via_cookie = app
        .call(
            "GET",
            "/api/users/check-auth",
            Auth::Cookie(&format!("token={token}")),
            None,
        )
        .await;
    assert_eq!(via_cookie.status, StatusCode::UNAUTHORIZED);

    let via_header = app
        .call("GET", "/api/users/check-auth", Auth::Bearer(&token), None)
        .await;
    assert_eq!(via_header.status, StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_echoed() {
    let app = TestApp::new();
    let response = app.call("GET", "/health", Auth::None, None).await;
    assert!(response.headers.contains_key("x-request-id"));
}
