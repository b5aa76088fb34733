//! Integration tests for Threadline.
//!
//! Tests drive the full storefront router in-process with
//! `tower::ServiceExt::oneshot`, backed by the memory store and a temporary
//! uploads directory. No server or database is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p threadline-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `auth` - Token issue, verification and transports
//! - `cart` - Cart lines and merging
//! - `favourites` - Favourite toggles and lists
//! - `catalog` - Product listing and multipart writes
//! - `orders` - Placement and role-scoped listing
//! - `concurrency` - Documented read-modify-write races

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use threadline_core::{Email, Identity, Price, Role};
use threadline_storefront::{
    app,
    config::{StorefrontConfig, TokenTransport},
    db::{MemoryStore, Store},
    models::{Product, ProductDraft, SizeStock},
    services::TokenService,
    state::AppState,
};

/// Signing secret shared by every test app.
pub const TEST_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Multipart boundary used by [`multipart_body`].
pub const BOUNDARY: &str = "threadline-test-boundary";

/// A router over a fresh memory store.
pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub config: StorefrontConfig,
    pub tokens: TokenService,
    uploads: TempDir,
}

/// Status, headers and JSON body of a response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The `msg` field of an error body.
    #[must_use]
    pub fn msg(&self) -> &str {
        self.body["msg"].as_str().unwrap_or_default()
    }

    /// The `token=...` pair from `Set-Cookie`, ready for a `Cookie` header.
    #[must_use]
    pub fn token_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("token="))
            .and_then(|v| v.split(';').next())
            .map(ToOwned::to_owned)
    }
}

/// How a request presents its token.
#[derive(Clone, Copy)]
pub enum Auth<'a> {
    None,
    Bearer(&'a str),
    Cookie(&'a str),
}

impl TestApp {
    /// App accepting tokens from both the header and the cookie.
    #[must_use]
    pub fn new() -> Self {
        Self::with_transport(TokenTransport::Both)
    }

    /// App with a specific token transport.
    #[must_use]
    pub fn with_transport(transport: TokenTransport) -> Self {
        let uploads = tempfile::tempdir().unwrap();
        let mut config = StorefrontConfig::in_memory(
            SecretString::from(TEST_SECRET),
            uploads.path().to_path_buf(),
        );
        config.token_transport = transport;

        let store = Arc::new(MemoryStore::new());
        let tokens = TokenService::new(&config.jwt_secret);
        let state = AppState::new(config.clone(), store.clone());

        Self {
            router: app(state),
            store,
            config,
            tokens,
            uploads,
        }
    }

    /// Directory product images are written to.
    #[must_use]
    pub fn uploads_dir(&self) -> &std::path::Path {
        self.uploads.path()
    }

    /// Send a request through the full router.
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a request with an optional JSON body.
    pub async fn call(
        &self,
        method: &str,
        uri: &str,
        auth: Auth<'_>,
        json: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        builder = match auth {
            Auth::None => builder,
            Auth::Bearer(token) => builder.header(header::AUTHORIZATION, format!("Bearer {token}")),
            Auth::Cookie(pair) => builder.header(header::COOKIE, pair),
        };
        let body = match json {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    /// Register an account and return its bearer token.
    pub async fn register(&self, username: &str, email: &str) -> String {
        let response = self
            .call(
                "POST",
                "/api/users/register",
                Auth::None,
                Some(serde_json::json!({
                    "username": username,
                    "email": email,
                    "password": "correct-horse",
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.body["token"].as_str().unwrap().to_owned()
    }

    /// Register an account with a staff role and return a token carrying it.
    pub async fn register_staff(&self, username: &str, email: &str, role: Role) -> String {
        self.register(username, email).await;
        let user = self
            .store
            .set_user_role(&Email::parse(email).unwrap(), role)
            .await
            .unwrap();
        self.token_for(&user.named_identity())
    }

    /// Sign a token for `identity` with the app's secret.
    #[must_use]
    pub fn token_for(&self, identity: &Identity) -> String {
        self.tokens.issue(identity).unwrap().token
    }

    /// Insert a product straight into the store.
    pub async fn product(&self, name: &str, price: &str, sizes: &[&str]) -> Product {
        self.store
            .create_product(ProductDraft {
                name: name.to_owned(),
                price: price.parse::<Price>().unwrap(),
                brand: "Threadline".to_owned(),
                category: "women".to_owned(),
                subcategory: "tops".to_owned(),
                description: format!("{name} description"),
                material: "cotton".to_owned(),
                color: "black".to_owned(),
                sizes: sizes
                    .iter()
                    .map(|s| SizeStock {
                        size: Some((*s).to_owned()),
                        quantity: 5,
                    })
                    .collect(),
                image_url: None,
            })
            .await
            .unwrap()
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Encode text fields and an optional file as `multipart/form-data`.
#[must_use]
pub fn multipart_body(fields: &[(&str, &str)], file: Option<(&str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((file_name, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{file_name}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}

/// A multipart request to `uri` with a bearer token.
#[must_use]
pub fn multipart_request(method: &str, uri: &str, token: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}
