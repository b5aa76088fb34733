//! Product route handlers.
//!
//! Listing and detail are public. Create and update take a
//! `multipart/form-data` body: plain text fields, `sizes` as a JSON array of
//! `{size, quantity}`, and an optional `image` file.

use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, Path, Query, State,
        multipart::MultipartRejection,
        rejection::{PathRejection, QueryRejection},
    },
};
use serde::Deserialize;
use tracing::instrument;
use validator::Validate;

use threadline_core::{Price, ProductId};

use crate::error::{AppError, FieldError, Result, field_errors};
use crate::middleware::RequireAuth;
use crate::models::{Product, ProductDraft, ProductFilter, SizeStock};
use crate::services::CatalogService;
use crate::services::catalog::ensure_manager;
use crate::state::AppState;

/// Upper bound on a product form body, image included.
pub const MAX_PRODUCT_FORM_BYTES: usize = 8 * 1024 * 1024;

// =============================================================================
// Query and Form Types
// =============================================================================

/// Listing filters. `subcategory` and `material` take comma-separated lists.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub material: Option<String>,
    pub min_price: Option<String>,
    pub max_price: Option<String>,
}

impl ProductQuery {
    /// Turn the raw query into a store filter.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` if a price bound is not a non-negative
    /// number.
    pub fn into_filter(self) -> Result<ProductFilter> {
        let mut errors = Vec::new();
        let min_price = price_bound(self.min_price, "minPrice", &mut errors);
        let max_price = price_bound(self.max_price, "maxPrice", &mut errors);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }

        Ok(ProductFilter {
            category: self
                .category
                .map(|c| c.trim().to_owned())
                .filter(|c| !c.is_empty()),
            subcategories: comma_list(self.subcategory.as_deref()),
            materials: comma_list(self.material.as_deref()),
            min_price,
            max_price,
        })
    }
}

fn comma_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|s| {
        s.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToOwned::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

fn price_bound(raw: Option<String>, param: &str, errors: &mut Vec<FieldError>) -> Option<Price> {
    let raw = raw.filter(|s| !s.trim().is_empty())?;
    raw.parse::<Price>()
        .inspect_err(|_| {
            errors.push(FieldError::new(param, "Price filter must be a non-negative number"));
        })
        .ok()
}

/// An uploaded image held in memory until the form is valid.
struct ImageUpload {
    file_name: String,
    bytes: Bytes,
}

/// Product fields as read from the multipart body.
#[derive(Default, Validate)]
struct ProductForm {
    #[validate(length(min = 1, message = "Name is required"))]
    name: String,
    price: String,
    #[validate(length(min = 1, message = "Brand is required"))]
    brand: String,
    #[validate(length(min = 1, message = "Category is required"))]
    category: String,
    #[validate(length(min = 1, message = "Subcategory is required"))]
    subcategory: String,
    #[validate(length(min = 1, message = "Description is required"))]
    description: String,
    #[validate(length(min = 1, message = "Material is required"))]
    material: String,
    #[validate(length(min = 1, message = "Color is required"))]
    color: String,
    sizes: String,
    image: Option<ImageUpload>,
}

impl ProductForm {
    async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart.next_field().await? {
            let Some(name) = field.name().map(ToOwned::to_owned) else {
                continue;
            };

            if name == "image" {
                let file_name = field.file_name().unwrap_or_default().to_owned();
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    form.image = Some(ImageUpload { file_name, bytes });
                }
                continue;
            }

            let value = field.text().await?.trim().to_owned();
            match name.as_str() {
                "name" => form.name = value,
                "price" => form.price = value,
                "brand" => form.brand = value,
                "category" => form.category = value,
                "subcategory" => form.subcategory = value,
                "description" => form.description = value,
                "material" => form.material = value,
                "color" => form.color = value,
                "sizes" => form.sizes = value,
                other => tracing::debug!(field = %other, "ignoring unknown form field"),
            }
        }

        Ok(form)
    }

    /// Check every field and split off the image. All problems are reported
    /// together.
    fn into_draft(self) -> Result<(ProductDraft, Option<ImageUpload>)> {
        let mut errors = self
            .validate()
            .err()
            .map(|e| field_errors(&e))
            .unwrap_or_default();

        let price = self
            .price
            .parse::<Price>()
            .inspect_err(|_| errors.push(FieldError::new("price", "Price is required")))
            .ok();
        let sizes = parse_sizes(&self.sizes)
            .inspect_err(|_| errors.push(FieldError::new("sizes", "Sizes quantity is required")))
            .ok();

        match (price, sizes) {
            (Some(price), Some(sizes)) if errors.is_empty() => Ok((
                ProductDraft {
                    name: self.name,
                    price,
                    brand: self.brand,
                    category: self.category,
                    subcategory: self.subcategory,
                    description: self.description,
                    material: self.material,
                    color: self.color,
                    sizes,
                    image_url: None,
                },
                self.image,
            )),
            _ => {
                errors.sort_by(|a, b| a.param.cmp(&b.param));
                Err(AppError::Validation(errors))
            }
        }
    }
}

fn parse_sizes(raw: &str) -> std::result::Result<Vec<SizeStock>, serde_json::Error> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(raw)
}

async fn store_image(state: &AppState, image: Option<ImageUpload>) -> Result<Option<String>> {
    let Some(image) = image else {
        return Ok(None);
    };
    let path = state.images().save(&image.file_name, &image.bytes).await?;
    Ok(Some(path))
}

// =============================================================================
// Handlers
// =============================================================================

/// Products matching the query filters.
#[instrument(skip(state))]
pub async fn index(
    State(state): State<AppState>,
    query: std::result::Result<Query<ProductQuery>, QueryRejection>,
) -> Result<Json<Vec<Product>>> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    let products = CatalogService::new(state.store()).list(&filter).await?;
    tracing::debug!(count = products.len(), "products listed");
    Ok(Json(products))
}

/// One product.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    id: std::result::Result<Path<ProductId>, PathRejection>,
) -> Result<Json<Product>> {
    let Path(id) = id?;
    let product = CatalogService::new(state.store()).get(id).await?;
    Ok(Json(product))
}

/// Create a product.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Product>> {
    ensure_manager(&identity)?;
    let multipart = multipart?;
    let (mut draft, image) = ProductForm::read(multipart).await?.into_draft()?;
    draft.image_url = store_image(&state, image).await?;

    let product = CatalogService::new(state.store())
        .create(&identity, draft)
        .await?;
    Ok(Json(product))
}

/// Overwrite a product. Without a new image the current one is kept.
#[instrument(skip_all, fields(user_id = %identity.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAuth(identity): RequireAuth,
    id: std::result::Result<Path<ProductId>, PathRejection>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<Json<Product>> {
    let Path(id) = id?;
    ensure_manager(&identity)?;
    let multipart = multipart?;
    let catalog = CatalogService::new(state.store());
    catalog.get(id).await?;

    let (mut draft, image) = ProductForm::read(multipart).await?.into_draft()?;
    draft.image_url = store_image(&state, image).await?;

    let product = catalog.update(&identity, id, draft).await?;
    Ok(Json(product))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn form() -> ProductForm {
        ProductForm {
            name: "Linen shirt".to_owned(),
            price: "49.90".to_owned(),
            brand: "Threadline".to_owned(),
            category: "men".to_owned(),
            subcategory: "shirts".to_owned(),
            description: "Loose fit".to_owned(),
            material: "linen".to_owned(),
            color: "white".to_owned(),
            sizes: r#"[{"size":"M","quantity":4},{"size":"L","quantity":0}]"#.to_owned(),
            image: None,
        }
    }

    #[test]
    fn test_valid_form_becomes_draft() {
        let (draft, image) = form().into_draft().unwrap();
        assert_eq!(draft.price, "49.90".parse::<Price>().unwrap());
        assert_eq!(draft.sizes.len(), 2);
        assert_eq!(draft.sizes[0].size.as_deref(), Some("M"));
        assert!(draft.image_url.is_none());
        assert!(image.is_none());
    }

    #[test]
    fn test_all_problems_reported_together() {
        let mut bad = form();
        bad.name = String::new();
        bad.price = "-3".to_owned();
        bad.sizes = r#"[{"size":"M","quantity":"many"}]"#.to_owned();

        let Err(AppError::Validation(errors)) = bad.into_draft() else {
            panic!("expected validation error");
        };
        let params: Vec<_> = errors.iter().map(|e| e.param.as_str()).collect();
        assert_eq!(params, ["name", "price", "sizes"]);
        assert_eq!(errors[1].msg, "Price is required");
    }

    #[test]
    fn test_empty_sizes_means_one_size() {
        let mut one_size = form();
        one_size.sizes = String::new();
        let (draft, _) = one_size.into_draft().unwrap();
        assert!(draft.sizes.is_empty());
    }

    #[test]
    fn test_query_into_filter() {
        let query = ProductQuery {
            category: Some(" women ".to_owned()),
            subcategory: Some("dresses, skirts,".to_owned()),
            material: None,
            min_price: Some("10".to_owned()),
            max_price: Some(String::new()),
        };
        let filter = query.into_filter().unwrap();
        assert_eq!(filter.category.as_deref(), Some("women"));
        assert_eq!(filter.subcategories, ["dresses", "skirts"]);
        assert!(filter.materials.is_empty());
        assert_eq!(filter.min_price, Some("10".parse().unwrap()));
        assert_eq!(filter.max_price, None);
    }

    #[test]
    fn test_bad_price_bounds_rejected() {
        let query = ProductQuery {
            min_price: Some("cheap".to_owned()),
            max_price: Some("-1".to_owned()),
            ..ProductQuery::default()
        };
        let Err(AppError::Validation(errors)) = query.into_filter() else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].param, "minPrice");
    }
}
