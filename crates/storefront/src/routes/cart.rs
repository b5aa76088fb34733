//! Cart route handlers.
//!
//! All handlers sit behind [`require_auth`](crate::middleware::require_auth)
//! and act on the caller's own cart. Each mutation answers with the whole
//! cart so clients never have to merge lines themselves.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use threadline_core::{Cart, CartLineId, NewCartLine, ProductId, Quantity};

use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAuth;
use crate::services::CartService;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Add-to-cart body.
#[derive(Debug, Deserialize, Validate)]
pub struct AddToCartRequest {
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    #[serde(rename = "selectedSize", default)]
    #[validate(length(min = 1, message = "Size is required"))]
    pub selected_size: String,
    #[serde(rename = "selectedColor", default)]
    #[validate(length(min = 1, message = "Color is required"))]
    pub selected_color: String,
    #[serde(default = "default_quantity")]
    #[validate(range(min = 1, max = 1000, message = "Quantity must be between 1 and 1000"))]
    pub quantity: i64,
}

const fn default_quantity() -> i64 {
    1
}

impl AddToCartRequest {
    fn into_line(self) -> Result<NewCartLine> {
        let quantity = Quantity::try_from(self.quantity)
            .map_err(|_| AppError::invalid("quantity", "Quantity must be between 1 and 1000"))?;
        Ok(NewCartLine {
            product_id: self.product_id,
            selected_size: self.selected_size.trim().to_owned(),
            selected_color: self.selected_color.trim().to_owned(),
            quantity,
        })
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// The caller's cart.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<Cart>> {
    let cart = CartService::new(state.store()).list(identity.id).await?;
    Ok(Json(cart))
}

/// Add a line, merging with a matching product, size and colour.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    body: std::result::Result<Json<AddToCartRequest>, JsonRejection>,
) -> Result<Json<Cart>> {
    let Json(body) = body?;
    body.validate()?;
    let line = body.into_line()?;
    let product_id = line.product_id.to_string();

    let cart = CartService::new(state.store()).add(identity.id, line).await?;

    add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
    Ok(Json(cart))
}

/// Remove a line by id. Unknown ids leave the cart as it is.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    item: std::result::Result<Path<CartLineId>, PathRejection>,
) -> Result<Json<Cart>> {
    let Path(item) = item?;
    let cart = CartService::new(state.store())
        .remove(identity.id, item)
        .await?;
    Ok(Json(cart))
}
