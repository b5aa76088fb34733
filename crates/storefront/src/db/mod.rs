//! Persistence for the storefront.
//!
//! Handlers and services talk to a [`Store`]. Two implementations exist:
//!
//! - [`PgStore`] - `PostgreSQL` through the repositories in this module
//! - [`MemoryStore`] - process-local maps, used by tests and
//!   `STOREFRONT_STORAGE=memory`
//!
//! # Tables (schema `storefront`)
//!
//! - `users` - Accounts with Argon2 password hashes and roles
//! - `products` - Catalog; `sizes` is a JSONB array
//! - `cart_items` - Cart lines, ordered by `position`
//! - `favourites` - One row per user/product favourite edge
//! - `orders`, `order_products` - Placed orders and their product references
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p threadline-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod orders;
pub mod products;
pub mod users;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use threadline_core::{Cart, Email, ProductId, Role, UserId};

use crate::models::{
    NewOrder, NewUser, Order, OrderDetail, OrderScope, Product, ProductDraft, ProductFilter, User,
};

pub use carts::{CartRepository, FavouriteRepository};
pub use memory::MemoryStore;
pub use orders::OrderRepository;
pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage operations used by the storefront.
///
/// Methods that take a user id return `Ok(None)` (or `NotFound` for writes)
/// when the user does not exist, so callers can tell a missing account from
/// an empty collection.
#[async_trait]
pub trait Store: Send + Sync {
    /// Check that the backing storage is reachable.
    async fn ping(&self) -> Result<(), RepositoryError>;

    // ---- users ----

    /// Insert a new account with role `customer`.
    ///
    /// Returns `Conflict` when the username or email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError>;

    /// Look up an account by id.
    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError>;

    /// Look up an account and its password hash by email.
    async fn user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError>;

    /// Change an account's role. Returns `NotFound` for an unknown email.
    async fn set_user_role(&self, email: &Email, role: Role) -> Result<User, RepositoryError>;

    // ---- cart ----

    /// Read a user's cart.
    async fn load_cart(&self, user: UserId) -> Result<Option<Cart>, RepositoryError>;

    /// Replace a user's cart. Either every line is written or none is.
    async fn save_cart(&self, user: UserId, cart: &Cart) -> Result<(), RepositoryError>;

    // ---- favourites ----

    /// Product ids in a user's favourites, oldest first.
    async fn favourite_ids(&self, user: UserId) -> Result<Option<Vec<ProductId>>, RepositoryError>;

    /// Add or remove the favourite edge between a user and a product.
    ///
    /// Both directions of the edge change together. Setting an edge to its
    /// current state is a no-op.
    async fn set_favourite(
        &self,
        user: UserId,
        product: ProductId,
        present: bool,
    ) -> Result<(), RepositoryError>;

    /// The products in a user's favourites, oldest first.
    async fn favourite_products(
        &self,
        user: UserId,
    ) -> Result<Option<Vec<Product>>, RepositoryError>;

    // ---- catalog ----

    /// Insert a product.
    async fn create_product(&self, draft: ProductDraft) -> Result<Product, RepositoryError>;

    /// Overwrite a product's fields. Returns `None` for an unknown id.
    async fn update_product(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Look up a product by id.
    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Products matching `filter`, in id order.
    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError>;

    /// Which of `ids` do not exist. Duplicates in `ids` are reported once.
    async fn missing_products(&self, ids: &[ProductId]) -> Result<Vec<ProductId>, RepositoryError>;

    // ---- orders ----

    /// Insert an order.
    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError>;

    /// Orders in `scope` with owner and products resolved, oldest first.
    async fn list_orders(&self, scope: OrderScope) -> Result<Vec<OrderDetail>, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Map a unique violation to `Conflict` and a foreign key violation to
/// `NotFound`; everything else stays a database error.
pub(crate) fn map_constraint(err: sqlx::Error, conflict: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict(conflict.to_owned());
        }
        if db_err.is_foreign_key_violation() {
            return RepositoryError::NotFound;
        }
    }
    RepositoryError::Database(err)
}

/// [`Store`] backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).create(&user).await
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_id(id).await
    }

    async fn user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        UserRepository::new(&self.pool).get_password_hash(email).await
    }

    async fn set_user_role(&self, email: &Email, role: Role) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).set_role(email, role).await
    }

    async fn load_cart(&self, user: UserId) -> Result<Option<Cart>, RepositoryError> {
        CartRepository::new(&self.pool).load(user).await
    }

    async fn save_cart(&self, user: UserId, cart: &Cart) -> Result<(), RepositoryError> {
        CartRepository::new(&self.pool).save(user, cart).await
    }

    async fn favourite_ids(&self, user: UserId) -> Result<Option<Vec<ProductId>>, RepositoryError> {
        FavouriteRepository::new(&self.pool).product_ids(user).await
    }

    async fn set_favourite(
        &self,
        user: UserId,
        product: ProductId,
        present: bool,
    ) -> Result<(), RepositoryError> {
        let favourites = FavouriteRepository::new(&self.pool);
        if present {
            favourites.insert(user, product).await
        } else {
            favourites.delete(user, product).await
        }
    }

    async fn favourite_products(
        &self,
        user: UserId,
    ) -> Result<Option<Vec<Product>>, RepositoryError> {
        FavouriteRepository::new(&self.pool).products(user).await
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product, RepositoryError> {
        ProductRepository::new(&self.pool).create(&draft).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).update(id, &draft).await
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).get_by_id(id).await
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        ProductRepository::new(&self.pool).list(filter).await
    }

    async fn missing_products(&self, ids: &[ProductId]) -> Result<Vec<ProductId>, RepositoryError> {
        ProductRepository::new(&self.pool).missing(ids).await
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool).create(&order).await
    }

    async fn list_orders(&self, scope: OrderScope) -> Result<Vec<OrderDetail>, RepositoryError> {
        OrderRepository::new(&self.pool).list(scope).await
    }
}
