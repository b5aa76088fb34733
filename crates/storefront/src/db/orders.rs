//! Order repository for database operations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use threadline_core::{Email, OrderId, Price, ProductId, Role, UserId};

use super::products::ProductRepository;
use super::{RepositoryError, map_constraint};
use crate::models::{NewOrder, Order, OrderDetail, OrderScope, UserSummary};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total: Price,
    address: String,
    created_at: DateTime<Utc>,
    username: String,
    email: String,
    role: Role,
}

#[derive(sqlx::FromRow)]
struct OrderLineRow {
    order_id: OrderId,
    product_id: ProductId,
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and its product references in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user or a product does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, order: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let (id, date): (OrderId, DateTime<Utc>) = sqlx::query_as(
            "INSERT INTO storefront.orders (user_id, total, address)
             VALUES ($1, $2, $3)
             RETURNING id, created_at",
        )
        .bind(order.user)
        .bind(order.total)
        .bind(&order.address)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_constraint(e, "order already exists"))?;

        if !order.products.is_empty() {
            let mut insert = QueryBuilder::<Postgres>::new(
                "INSERT INTO storefront.order_products (order_id, position, product_id) ",
            );
            insert.push_values(
                order.products.iter().zip(0_i32..),
                |mut row, (product, position)| {
                    row.push_bind(id).push_bind(position).push_bind(*product);
                },
            );
            insert
                .build()
                .execute(&mut *tx)
                .await
                .map_err(|e| map_constraint(e, "duplicate order line"))?;
        }

        tx.commit().await?;

        Ok(Order {
            id,
            user: order.user,
            products: order.products.clone(),
            total: order.total,
            address: order.address.clone(),
            date,
        })
    }

    /// List orders in scope, oldest first, with owner and products resolved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if stored data is invalid.
    pub async fn list(&self, scope: OrderScope) -> Result<Vec<OrderDetail>, RepositoryError> {
        let mut query = QueryBuilder::<Postgres>::new(
            "SELECT o.id, o.user_id, o.total, o.address, o.created_at,
                    u.username, u.email, u.role
             FROM storefront.orders o
             JOIN storefront.users u ON u.id = o.user_id",
        );
        if let OrderScope::PlacedBy(user) = scope {
            query.push(" WHERE o.user_id = ").push_bind(user);
        }
        query.push(" ORDER BY o.created_at, o.id");

        let orders = query
            .build_query_as::<OrderRow>()
            .fetch_all(self.pool)
            .await?;
        if orders.is_empty() {
            return Ok(Vec::new());
        }

        let order_ids: Vec<OrderId> = orders.iter().map(|o| o.id).collect();
        let lines = sqlx::query_as::<_, OrderLineRow>(
            "SELECT order_id, product_id FROM storefront.order_products
             WHERE order_id = ANY($1)
             ORDER BY order_id, position",
        )
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?;

        let mut product_ids: Vec<ProductId> = lines.iter().map(|l| l.product_id).collect();
        product_ids.sort_unstable();
        product_ids.dedup();
        let products: HashMap<_, _> = ProductRepository::new(self.pool)
            .get_many(&product_ids)
            .await?
            .into_iter()
            .map(|p| (p.id, p))
            .collect();

        let mut lines_by_order: HashMap<OrderId, Vec<ProductId>> = HashMap::new();
        for line in lines {
            lines_by_order
                .entry(line.order_id)
                .or_default()
                .push(line.product_id);
        }

        orders
            .into_iter()
            .map(|row| {
                let email = Email::parse(&row.email).map_err(|e| {
                    RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
                })?;
                let resolved = lines_by_order
                    .remove(&row.id)
                    .unwrap_or_default()
                    .into_iter()
                    .filter_map(|id| products.get(&id).cloned())
                    .collect();

                Ok(OrderDetail {
                    id: row.id,
                    user: UserSummary {
                        id: row.user_id,
                        username: row.username,
                        email,
                        role: row.role,
                    },
                    products: resolved,
                    total: row.total,
                    address: row.address,
                    date: row.created_at,
                })
            })
            .collect()
    }
}
