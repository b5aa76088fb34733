//! Cart and favourites repositories.
//!
//! A cart is stored as one row per line with a `position` column; saving a
//! cart rewrites every row for the user inside one transaction. Favourite
//! edges are single rows in `storefront.favourites`, so a user's favourites
//! and a product's `favourited_by` are two reads of the same data.

use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use threadline_core::{Cart, CartItem, CartLineId, ProductId, Quantity, UserId};

use super::products::{PRODUCT_COLUMNS, ProductRow};
use super::users::UserRepository;
use super::{RepositoryError, map_constraint};
use crate::models::Product;

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: Uuid,
    product_id: ProductId,
    selected_size: String,
    selected_color: String,
    quantity: i32,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let quantity = Quantity::try_from(row.quantity).map_err(|e| {
            RepositoryError::DataCorruption(format!("cart line {}: {e}", row.id))
        })?;

        Ok(Self {
            id: CartLineId::from_uuid(row.id),
            product_id: row.product_id,
            selected_size: row.selected_size,
            selected_color: row.selected_color,
            quantity,
        })
    }
}

/// Repository for cart lines.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load a user's cart in insertion order.
    ///
    /// Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if a stored quantity is not positive.
    pub async fn load(&self, user: UserId) -> Result<Option<Cart>, RepositoryError> {
        if !UserRepository::new(self.pool).exists(user).await? {
            return Ok(None);
        }

        let rows = sqlx::query_as::<_, CartItemRow>(
            "SELECT id, product_id, selected_size, selected_color, quantity
             FROM storefront.cart_items
             WHERE user_id = $1
             ORDER BY position",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        let items = rows
            .into_iter()
            .map(CartItem::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(Cart::from_items(items)))
    }

    /// Replace a user's cart.
    ///
    /// The user row is locked for the duration of the write so two saves for
    /// the same user apply one after the other; the later save wins.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user (or a referenced product) does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn save(&self, user: UserId, cart: &Cart) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let locked: Option<UserId> =
            sqlx::query_scalar("SELECT id FROM storefront.users WHERE id = $1 FOR UPDATE")
                .bind(user)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(RepositoryError::NotFound);
        }

        sqlx::query("DELETE FROM storefront.cart_items WHERE user_id = $1")
            .bind(user)
            .execute(&mut *tx)
            .await?;

        if !cart.is_empty() {
            let mut insert = QueryBuilder::<Postgres>::new(
                "INSERT INTO storefront.cart_items
                    (id, user_id, product_id, selected_size, selected_color, quantity, position) ",
            );
            insert.push_values(
                cart.items().iter().zip(0_i32..),
                |mut row, (item, position)| {
                    row.push_bind(item.id.as_uuid())
                        .push_bind(user)
                        .push_bind(item.product_id)
                        .push_bind(item.selected_size.as_str())
                        .push_bind(item.selected_color.as_str())
                        .push_bind(i32::from(item.quantity))
                        .push_bind(position);
                },
            );
            insert
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| map_constraint(e, "duplicate cart line"))?;
        }

        tx.commit().await?;
        Ok(())
    }
}

/// Repository for favourite edges.
pub struct FavouriteRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> FavouriteRepository<'a> {
    /// Create a new favourites repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Product ids a user has favourited, oldest first.
    ///
    /// Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn product_ids(
        &self,
        user: UserId,
    ) -> Result<Option<Vec<ProductId>>, RepositoryError> {
        if !UserRepository::new(self.pool).exists(user).await? {
            return Ok(None);
        }

        let ids = sqlx::query_scalar(
            "SELECT product_id FROM storefront.favourites
             WHERE user_id = $1
             ORDER BY created_at, product_id",
        )
        .bind(user)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(ids))
    }

    /// Products a user has favourited, oldest first.
    ///
    /// Returns `None` if the user does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn products(&self, user: UserId) -> Result<Option<Vec<Product>>, RepositoryError> {
        if !UserRepository::new(self.pool).exists(user).await? {
            return Ok(None);
        }

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS}
             FROM storefront.favourites fav
             JOIN storefront.products p ON p.id = fav.product_id
             WHERE fav.user_id = $1
             ORDER BY fav.created_at, p.id"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(user)
            .fetch_all(self.pool)
            .await?;

        Ok(Some(rows.into_iter().map(Product::from).collect()))
    }

    /// Add the edge. Adding an existing edge is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or product does not exist.
    pub async fn insert(&self, user: UserId, product: ProductId) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO storefront.favourites (user_id, product_id)
             VALUES ($1, $2)
             ON CONFLICT (user_id, product_id) DO NOTHING",
        )
        .bind(user)
        .bind(product)
        .execute(self.pool)
        .await
        .map_err(|e| map_constraint(e, "favourite already exists"))?;

        Ok(())
    }

    /// Remove the edge. Removing a missing edge is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, user: UserId, product: ProductId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM storefront.favourites WHERE user_id = $1 AND product_id = $2")
            .bind(user)
            .bind(product)
            .execute(self.pool)
            .await?;

        Ok(())
    }
}
