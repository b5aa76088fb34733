//! Catalog reads and writes.
//!
//! Listing and lookup are public. Creating and editing products is limited
//! to roles that manage the catalog.

use tracing::instrument;

use threadline_core::{Identity, ProductId};

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::{Product, ProductDraft, ProductFilter};

/// Catalog service.
pub struct CatalogService<'a> {
    store: &'a dyn Store,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if the caller may not manage the catalog.
    #[instrument(skip(self, draft), fields(user_id = %caller.id, name = %draft.name))]
    pub async fn create(&self, caller: &Identity, draft: ProductDraft) -> Result<Product> {
        ensure_manager(caller)?;
        let product = self.store.create_product(draft).await?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Overwrite a product's fields.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Forbidden` if the caller may not manage the catalog.
    /// Returns `AppError::NotFound` if the product does not exist.
    #[instrument(skip(self, draft), fields(user_id = %caller.id))]
    pub async fn update(
        &self,
        caller: &Identity,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Product> {
        ensure_manager(caller)?;
        let product = self
            .store
            .update_product(id, draft)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;
        tracing::info!(product_id = %product.id, "product updated");
        Ok(product)
    }

    /// Look up one product.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product does not exist.
    pub async fn get(&self, id: ProductId) -> Result<Product> {
        self.store
            .product_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))
    }

    /// Products matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>> {
        Ok(self.store.list_products(filter).await?)
    }
}

/// Reject callers whose role may not create or edit products.
///
/// # Errors
///
/// Returns `AppError::Forbidden` for customers.
pub fn ensure_manager(caller: &Identity) -> Result<()> {
    if caller.role.manages_catalog() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "Not authorized to manage products".to_owned(),
        ))
    }
}
