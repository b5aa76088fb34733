//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! # Users
//! POST   /api/users/register                  - Create account (rate limited)
//! POST   /api/users/login                     - Sign in (rate limited)
//! GET    /api/users/check-auth                - Identity from token (auth)
//! POST   /api/users/logout                    - Clear token cookie (auth)
//! GET    /api/users/cart                      - Cart lines (auth)
//! POST   /api/users/cart                      - Add or merge a line (auth)
//! DELETE /api/users/cart/{itemId}             - Remove a line (auth)
//! POST   /api/users/favourites/{productId}    - Toggle a favourite (auth)
//!
//! # Products
//! GET    /api/products/products               - Filtered listing
//! GET    /api/products/{id}                   - Product detail
//! POST   /api/products                        - Create, multipart (auth, staff)
//! PUT    /api/products/{id}                   - Update, multipart (auth, staff)
//! GET    /api/products/favourites             - Favourite products (auth)
//! POST   /api/products/favourites/add/{id}    - Add a favourite (auth)
//! POST   /api/products/favourites/remove/{id} - Remove a favourite (auth)
//!
//! # Orders
//! GET    /api/orders                          - Visible orders (auth)
//! POST   /api/orders                          - Place an order (auth)
//! ```

pub mod cart;
pub mod favourites;
pub mod orders;
pub mod products;
pub mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
};

use crate::middleware::{auth_rate_limiter, require_auth};
use crate::state::AppState;

/// Create the account, cart and favourite-toggle router.
pub fn user_routes(state: &AppState) -> Router<AppState> {
    let mut credentials = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(users::login));
    if state.config().rate_limit {
        credentials = credentials.route_layer(auth_rate_limiter());
    }

    let protected = Router::new()
        .route("/check-auth", get(users::check_auth))
        .route("/logout", post(users::logout))
        .route("/cart", get(cart::show).post(cart::add))
        .route("/cart/{item_id}", delete(cart::remove))
        .route("/favourites/{product_id}", post(favourites::toggle))
        .route_layer(from_fn_with_state(state.clone(), require_auth));

    credentials.merge(protected)
}

/// Create the catalog router. Reads are public, writes and favourites are not.
pub fn product_routes(state: &AppState) -> Router<AppState> {
    let auth = from_fn_with_state(state.clone(), require_auth);

    Router::new()
        .route("/products", get(products::index))
        .route("/", post(products::create).route_layer(auth.clone()))
        .route(
            "/{id}",
            get(products::show).merge(put(products::update).route_layer(auth.clone())),
        )
        .route("/favourites", get(favourites::list).route_layer(auth.clone()))
        .route(
            "/favourites/add/{id}",
            post(favourites::add).route_layer(auth.clone()),
        )
        .route(
            "/favourites/remove/{id}",
            post(favourites::remove).route_layer(auth),
        )
        .layer(DefaultBodyLimit::max(products::MAX_PRODUCT_FORM_BYTES))
}

/// Create the order router.
pub fn order_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(orders::index).post(orders::place))
        .route_layer(from_fn_with_state(state.clone(), require_auth))
}

/// Create all API routes for the storefront.
pub fn routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .nest("/api/users", user_routes(state))
        .nest("/api/products", product_routes(state))
        .nest("/api/orders", order_routes(state))
}
