//! Authentication middleware and extractors.
//!
//! [`require_auth`] reads the token from the locations enabled by
//! [`TokenTransport`], verifies it and stores the caller's [`Identity`] in the
//! request extensions. Handlers read it back with [`RequireAuth`].

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, HeaderValue, header, request::Parts},
    middleware::Next,
    response::Response,
};
use cookie::{Cookie, SameSite};

use threadline_core::Identity;

use crate::config::{StorefrontConfig, TokenTransport};
use crate::error::{AppError, set_sentry_user};
use crate::services::auth::{AuthError, IssuedToken, TOKEN_COOKIE, TOKEN_TTL_SECS};
use crate::state::AppState;

/// Middleware that rejects requests without a valid token.
///
/// # Errors
///
/// Returns `AuthError::MissingToken` when no enabled location carries a token
/// and `AuthError::InvalidToken` when verification fails.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(token) = extract_token(request.headers(), state.config().token_transport) else {
        tracing::debug!(path = %request.uri().path(), "no token presented");
        return Err(AuthError::MissingToken.into());
    };

    let identity = state
        .tokens()
        .verify(&token)
        .inspect_err(|err| tracing::debug!(reason = %err, "token rejected"))?;

    tracing::debug!(user_id = %identity.id, role = %identity.role, "token accepted");
    set_sentry_user(&identity.id, identity.name.as_deref());

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

/// Find the raw token in the enabled locations. The `Authorization` header
/// wins over the cookie when both are enabled and present.
fn extract_token(headers: &HeaderMap, transport: TokenTransport) -> Option<String> {
    if transport.uses_header()
        && let Some(token) = token_from_header(headers)
    {
        return Some(token);
    }
    if transport.uses_cookie() {
        return token_from_cookie(headers);
    }
    None
}

fn token_from_header(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    if value.is_empty() {
        return None;
    }
    let token = value
        .strip_prefix("Bearer ")
        .map_or(value, str::trim_start);
    Some(token.to_owned())
}

fn token_from_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == TOKEN_COOKIE && !cookie.value().is_empty())
        .map(|cookie| cookie.value().to_owned())
}

/// Extractor for the caller verified by [`require_auth`].
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(RequireAuth(identity): RequireAuth) -> impl IntoResponse {
///     format!("Hello, {}!", identity.id)
/// }
/// ```
pub struct RequireAuth(pub Identity);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(Self)
            .ok_or_else(|| AuthError::MissingToken.into())
    }
}

/// `Set-Cookie` value delivering a freshly issued token.
///
/// # Errors
///
/// Returns `AppError::Internal` if the cookie is not a valid header value.
pub fn token_cookie(config: &StorefrontConfig, issued: &IssuedToken) -> Result<HeaderValue, AppError> {
    let cookie = Cookie::build((TOKEN_COOKIE, issued.token.clone()))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.secure_cookies())
        .path("/")
        .max_age(cookie::time::Duration::seconds(TOKEN_TTL_SECS))
        .build();
    header_value(&cookie)
}

/// `Set-Cookie` value that clears the token cookie.
///
/// # Errors
///
/// Returns `AppError::Internal` if the cookie is not a valid header value.
pub fn clear_token_cookie(config: &StorefrontConfig) -> Result<HeaderValue, AppError> {
    let mut cookie = Cookie::build((TOKEN_COOKIE, ""))
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.secure_cookies())
        .path("/")
        .build();
    cookie.make_removal();
    header_value(&cookie)
}

fn header_value(cookie: &Cookie<'_>) -> Result<HeaderValue, AppError> {
    HeaderValue::from_str(&cookie.to_string())
        .map_err(|e| AppError::Internal(format!("invalid cookie header: {e}")))
}
