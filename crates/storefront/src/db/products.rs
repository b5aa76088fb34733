//! Product repository for database operations.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};

use threadline_core::{Price, ProductId, UserId};

use super::RepositoryError;
use crate::models::{Product, ProductDraft, ProductFilter, SizeStock};

/// Columns selected for a product, with `favourited_by` read from the
/// favourites table. Expects the products table aliased as `p`.
pub(crate) const PRODUCT_COLUMNS: &str = "p.id, p.name, p.price, p.brand, p.category, \
     p.subcategory, p.description, p.material, p.color, p.image_url, p.sizes, p.created_at, \
     ARRAY(SELECT f.user_id FROM storefront.favourites f \
           WHERE f.product_id = p.id ORDER BY f.created_at, f.user_id) AS favourited_by";

#[derive(sqlx::FromRow)]
pub(crate) struct ProductRow {
    id: ProductId,
    name: String,
    price: Price,
    brand: String,
    category: String,
    subcategory: String,
    description: String,
    material: String,
    color: String,
    image_url: String,
    sizes: Json<Vec<SizeStock>>,
    favourited_by: Vec<UserId>,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            price: row.price,
            brand: row.brand,
            category: row.category,
            subcategory: row.subcategory,
            description: row.description,
            material: row.material,
            color: row.color,
            image_url: row.image_url,
            sizes: row.sizes.0,
            favourited_by: row.favourited_by,
            created_at: row.created_at,
        }
    }
}

/// Repository for catalog database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("SELECT {PRODUCT_COLUMNS} FROM storefront.products p WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Insert a product. A missing image is stored as an empty path.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let id: ProductId = sqlx::query_scalar(
            "INSERT INTO storefront.products
                (name, price, brand, category, subcategory, description, material, color, image_url, sizes)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING id",
        )
        .bind(&draft.name)
        .bind(draft.price)
        .bind(&draft.brand)
        .bind(&draft.category)
        .bind(&draft.subcategory)
        .bind(&draft.description)
        .bind(&draft.material)
        .bind(&draft.color)
        .bind(draft.image_url.as_deref().unwrap_or_default())
        .bind(Json(&draft.sizes))
        .fetch_one(self.pool)
        .await?;

        self.get_by_id(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Overwrite a product's fields. The image is kept unless the draft carries one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(
        &self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Option<Product>, RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.products
             SET name = $2, price = $3, brand = $4, category = $5, subcategory = $6,
                 description = $7, material = $8, color = $9, sizes = $10,
                 image_url = COALESCE($11, image_url)
             WHERE id = $1",
        )
        .bind(id)
        .bind(&draft.name)
        .bind(draft.price)
        .bind(&draft.brand)
        .bind(&draft.category)
        .bind(&draft.subcategory)
        .bind(&draft.description)
        .bind(&draft.material)
        .bind(&draft.color)
        .bind(Json(&draft.sizes))
        .bind(draft.image_url.as_deref())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_by_id(id).await
    }

    /// List products matching a filter, in id order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.products p WHERE TRUE"
        ));

        if let Some(category) = &filter.category {
            query
                .push(" AND lower(p.category) = lower(")
                .push_bind(category.as_str())
                .push(")");
        }
        if !filter.subcategories.is_empty() {
            query
                .push(" AND p.subcategory = ANY(")
                .push_bind(filter.subcategories.as_slice())
                .push(")");
        }
        if !filter.materials.is_empty() {
            query
                .push(" AND p.material = ANY(")
                .push_bind(filter.materials.as_slice())
                .push(")");
        }
        if let Some(min) = filter.min_price {
            query.push(" AND p.price >= ").push_bind(min);
        }
        if let Some(max) = filter.max_price {
            query.push(" AND p.price <= ").push_bind(max);
        }
        query.push(" ORDER BY p.id");

        let rows = query
            .build_query_as::<ProductRow>()
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Get several products by id, in id order. Unknown ids are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_many(&self, ids: &[ProductId]) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM storefront.products p WHERE p.id = ANY($1) ORDER BY p.id"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(ids)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Return the ids in `ids` that have no product, each once, in input order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn missing(&self, ids: &[ProductId]) -> Result<Vec<ProductId>, RepositoryError> {
        let found: Vec<ProductId> =
            sqlx::query_scalar("SELECT id FROM storefront.products WHERE id = ANY($1)")
                .bind(ids)
                .fetch_all(self.pool)
                .await?;

        let found: HashSet<ProductId> = found.into_iter().collect();
        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .copied()
            .filter(|id| !found.contains(id) && seen.insert(*id))
            .collect())
    }
}
