//! Order route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use threadline_core::{Price, ProductId};

use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::{Order, OrderDetail};
use crate::services::OrderService;
use crate::state::AppState;

/// Order placement body. The total is taken as sent.
#[derive(Debug, Deserialize, Validate)]
pub struct PlaceOrderRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "At least one product is required"))]
    pub products: Vec<ProductId>,
    pub total: Decimal,
    #[serde(default)]
    #[validate(length(min = 1, message = "Address is required"))]
    pub address: String,
}

/// Place an order for the caller.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn place(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    body: std::result::Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<Json<Order>> {
    let Json(body) = body?;
    body.validate()?;
    let total = Price::new(body.total)
        .map_err(|_| AppError::invalid("total", "Total must be zero or more"))?;

    let order = OrderService::new(state.store())
        .place(&identity, body.products, total, body.address.trim().to_owned())
        .await?;
    Ok(Json(order))
}

/// Orders visible to the caller.
#[instrument(skip_all, fields(user_id = %identity.id, role = %identity.role))]
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<Vec<OrderDetail>>> {
    let orders = OrderService::new(state.store()).list(&identity).await?;
    Ok(Json(orders))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn test_products_and_address_required() {
        let body: PlaceOrderRequest =
            serde_json::from_value(serde_json::json!({ "total": 12.5 })).unwrap();
        let AppError::Validation(errors) = AppError::from(body.validate().unwrap_err()) else {
            panic!("expected validation error");
        };
        let params: Vec<_> = errors.iter().map(|e| e.param.as_str()).collect();
        assert_eq!(params, ["address", "products"]);
    }

    #[test]
    fn test_total_accepts_numbers_and_strings() {
        let body: PlaceOrderRequest = serde_json::from_value(serde_json::json!({
            "products": [1, 2],
            "total": "30.00",
            "address": "1 High Street"
        }))
        .unwrap();
        assert!(body.validate().is_ok());
        assert_eq!(body.total, Decimal::new(3000, 2));
        assert_eq!(body.products[1], ProductId::new(2));
    }
}
