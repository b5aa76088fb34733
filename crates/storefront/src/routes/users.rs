//! Account route handlers: register, login, session check and logout.
//!
//! Register and login answer with the caller's identity. Depending on the
//! configured [`TokenTransport`](crate::config::TokenTransport) the signed
//! token travels in the JSON body, in an `HttpOnly` cookie, or both.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::header,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use validator::Validate;

use threadline_core::{Email, Identity};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_token_cookie, token_cookie};
use crate::services::AuthService;
use crate::state::AppState;

// =============================================================================
// Request / Response Types
// =============================================================================

/// Registration body. A `role` field, if sent, is ignored: new accounts are
/// always customers.
#[derive(Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Username is required"))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 6, message = "Password must be 6 or more characters"))]
    pub password: String,
}

/// Login body.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(email(message = "Please include a valid email"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Register/login response.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    /// Present only when the header transport is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    pub user: Identity,
}

/// Session check response.
#[derive(Debug, Serialize)]
pub struct CheckAuthResponse {
    pub user: Identity,
}

fn parse_email(raw: &str) -> Result<Email> {
    Email::parse(raw).map_err(|_| AppError::invalid("email", "Please include a valid email"))
}

// =============================================================================
// Handlers
// =============================================================================

/// Create a customer account and sign it in.
#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    body: std::result::Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = body?;
    body.validate()?;
    let email = parse_email(&body.email)?;

    let user = AuthService::new(state.store())
        .register(body.username.trim(), email, &body.password)
        .await?;

    signed_in(&state, user.identity())
}

/// Exchange email and password for a token.
#[instrument(skip(state, body))]
pub async fn login(
    State(state): State<AppState>,
    body: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(body) = body?;
    body.validate()?;
    let email = parse_email(&body.email)?;

    let user = AuthService::new(state.store())
        .login(&email, &body.password)
        .await?;

    signed_in(&state, user.named_identity())
}

/// Issue a token for `identity` and deliver it over the enabled transports.
fn signed_in(state: &AppState, identity: Identity) -> Result<Response> {
    let issued = state.tokens().issue(&identity)?;
    let transport = state.config().token_transport;
    set_sentry_user(&identity.id, identity.name.as_deref());

    let cookie = if transport.uses_cookie() {
        Some(token_cookie(state.config(), &issued)?)
    } else {
        None
    };
    let body = AuthResponse {
        token: transport.uses_header().then(|| issued.token.clone()),
        user: identity,
    };

    let mut response = Json(body).into_response();
    if let Some(cookie) = cookie {
        response.headers_mut().append(header::SET_COOKIE, cookie);
    }
    Ok(response)
}

/// Return the identity carried by the caller's token.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn check_auth(RequireAuth(identity): RequireAuth) -> Json<CheckAuthResponse> {
    Json(CheckAuthResponse { user: identity })
}

/// Clear the token cookie. Header tokens stay valid until they expire.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn logout(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Response> {
    clear_sentry_user();
    let mut response = Json(serde_json::json!({ "msg": "Logout successful" })).into_response();
    if state.config().token_transport.uses_cookie() {
        response
            .headers_mut()
            .append(header::SET_COOKIE, clear_token_cookie(state.config())?);
    }
    tracing::info!("user logged out");
    Ok(response)
}
