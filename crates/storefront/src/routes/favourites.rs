//! Favourite route handlers.
//!
//! The toggle lives under `/api/users`, the list and the explicit add/remove
//! under `/api/products`. Both keep the user and product sides in step.

use axum::{
    Json,
    extract::{Path, State, rejection::PathRejection},
};
use serde::Serialize;
use tracing::instrument;

use threadline_core::ProductId;

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Product;
use crate::services::FavouriteService;
use crate::state::AppState;

/// Plain acknowledgement body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub msg: &'static str,
}

/// Flip the product in or out of the caller's favourites. Answers with the
/// favourite ids afterwards.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn toggle(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    product: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Vec<ProductId>>> {
    let Path(product) = product?;
    let ids = FavouriteService::new(state.store())
        .toggle(identity.id, product)
        .await?;
    Ok(Json(ids))
}

/// The caller's favourite products.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
) -> Result<Json<Vec<Product>>> {
    let products = FavouriteService::new(state.store())
        .list(identity.id)
        .await?;
    Ok(Json(products))
}

/// Add a favourite. Adding twice is a no-op.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    product: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Message>> {
    let Path(product) = product?;
    FavouriteService::new(state.store())
        .add(identity.id, product)
        .await?;
    Ok(Json(Message {
        msg: "Product added to favourites",
    }))
}

/// Remove a favourite. Removing an absent one is a no-op.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    product: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Message>> {
    let Path(product) = product?;
    FavouriteService::new(state.store())
        .remove(identity.id, product)
        .await?;
    Ok(Json(Message {
        msg: "Product removed from favourites",
    }))
}
