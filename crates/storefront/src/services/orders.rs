//! Order placement and listing.
//!
//! Orders record product ids and the client-supplied total as given. Stock
//! is not decremented and prices are not recomputed.

use tracing::instrument;

use threadline_core::{Identity, Price, ProductId};

use crate::db::Store;
use crate::error::{AppError, FieldError, Result};
use crate::models::{NewOrder, Order, OrderDetail, OrderScope};

/// Order service.
pub struct OrderService<'a> {
    store: &'a dyn Store,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Persist an order for the caller.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing every product id that does not exist.
    #[instrument(skip(self, products, address), fields(user_id = %caller.id, lines = products.len()))]
    pub async fn place(
        &self,
        caller: &Identity,
        products: Vec<ProductId>,
        total: Price,
        address: String,
    ) -> Result<Order> {
        let missing = self.store.missing_products(&products).await?;
        if !missing.is_empty() {
            return Err(AppError::Validation(
                missing
                    .into_iter()
                    .map(|id| FieldError::new("products", format!("Product {id} not found")))
                    .collect(),
            ));
        }

        let order = self
            .store
            .create_order(NewOrder {
                user: caller.id,
                products,
                total,
                address,
            })
            .await?;

        tracing::info!(order_id = %order.id, total = %order.total, "order placed");
        Ok(order)
    }

    /// Orders visible to the caller: every order for admins and
    /// distributors, otherwise only the caller's own.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the store fails.
    pub async fn list(&self, caller: &Identity) -> Result<Vec<OrderDetail>> {
        Ok(self
            .store
            .list_orders(OrderScope::for_identity(caller))
            .await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use threadline_core::{Email, Role, UserId};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewUser, ProductDraft};

    async fn customer(store: &MemoryStore, name: &str) -> Identity {
        store
            .create_user(NewUser {
                username: name.to_owned(),
                email: Email::parse(&format!("{name}@example.com")).unwrap(),
                password_hash: "hash".to_owned(),
            })
            .await
            .unwrap()
            .identity()
    }

    async fn product(store: &MemoryStore) -> ProductId {
        store
            .create_product(ProductDraft {
                name: "Jacket".to_owned(),
                price: "89.90".parse().unwrap(),
                brand: "Threadline".to_owned(),
                category: "men".to_owned(),
                subcategory: "jackets".to_owned(),
                description: "Denim jacket".to_owned(),
                material: "denim".to_owned(),
                color: "blue".to_owned(),
                sizes: Vec::new(),
                image_url: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_place_rejects_unknown_products() {
        let store = MemoryStore::new();
        let ana = customer(&store, "ana").await;
        let jacket = product(&store).await;
        let orders = OrderService::new(&store);

        let result = orders
            .place(
                &ana,
                vec![jacket, ProductId::new(77)],
                Price::ZERO,
                "1 Main St".to_owned(),
            )
            .await;
        let Err(AppError::Validation(errors)) = result else {
            panic!("expected validation error");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].param, "products");
        assert!(orders.list(&ana).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_customers_see_own_orders_staff_see_all() {
        let store = MemoryStore::new();
        let ana = customer(&store, "ana").await;
        let bo = customer(&store, "bo").await;
        let jacket = product(&store).await;
        let orders = OrderService::new(&store);

        for caller in [&ana, &bo] {
            orders
                .place(caller, vec![jacket], "89.90".parse().unwrap(), "Somewhere".to_owned())
                .await
                .unwrap();
        }

        let own = orders.list(&ana).await.unwrap();
        assert_eq!(own.len(), 1);
        assert_eq!(own[0].user.id, ana.id);
        assert_eq!(own[0].products[0].id, jacket);

        let admin = Identity::new(UserId::new(999), Role::Admin);
        assert_eq!(orders.list(&admin).await.unwrap().len(), 2);
    }
}
