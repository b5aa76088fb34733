//! HTTP middleware stack for the storefront.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction)
//! 2. `TraceLayer` (request span from [`make_request_span`])
//! 3. Request ID (recorded into the span and Sentry scope)
//! 4. CORS
//! 5. Rate limiting on register/login (governor)
//! 6. [`require_auth`] on protected routes

pub mod auth;
pub mod rate_limit;
pub mod request_id;

pub use auth::{RequireAuth, clear_token_cookie, require_auth, token_cookie};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{make_request_span, request_id_middleware};
