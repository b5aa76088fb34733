//! Threadline storefront library.
//!
//! This crate provides the storefront API as a library, allowing it to be
//! tested in-process and reused by tooling. [`app`] builds the complete
//! router with every layer the server binary runs.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::State,
    http::{HeaderValue, Method, StatusCode, header},
    middleware::from_fn,
    routing::get,
};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::config::StorefrontConfig;
use crate::services::uploads::UPLOADS_PATH;
use crate::state::AppState;

/// Build the full application router.
///
/// Layers, outermost first: Sentry, tracing, request id, CORS. Auth and rate
/// limiting are attached per route in [`routes`].
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(state.config());
    let uploads = ServeDir::new(state.images().dir());

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes(&state))
        .nest_service(UPLOADS_PATH, uploads)
        .layer(cors)
        .layer(from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(middleware::make_request_span))
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

/// CORS for the configured frontend origin, with credentials so the token
/// cookie is sent. Without a configured origin any origin may call the API
/// but cookies are not shared.
fn cors_layer(config: &StorefrontConfig) -> CorsLayer {
    let Some(origin) = config.cors_origin.as_deref() else {
        return CorsLayer::permissive();
    };

    match HeaderValue::from_str(origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(e) => {
            tracing::warn!(error = %e, "invalid CORS origin, allowing same-origin requests only");
            CorsLayer::new()
        }
    }
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies the store is reachable before returning OK.
/// Returns 503 Service Unavailable otherwise.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
