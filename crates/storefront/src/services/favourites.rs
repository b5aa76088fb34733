//! Favourites for an authenticated user.
//!
//! Toggle, add and remove all go through [`FavouriteService::apply`], which
//! writes the user side and the product side of the edge in one store call.

use tracing::instrument;

use threadline_core::{FavouriteChange, ProductId, UserId};

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::Product;

/// Favourites service.
pub struct FavouriteService<'a> {
    store: &'a dyn Store,
}

impl<'a> FavouriteService<'a> {
    /// Create a new favourites service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Apply `change` to the edge between `user` and `product`. Returns
    /// whether the product is a favourite afterwards.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product or user does not exist.
    #[instrument(skip(self))]
    pub async fn apply(
        &self,
        user: UserId,
        product: ProductId,
        change: FavouriteChange,
    ) -> Result<bool> {
        if self.store.product_by_id(product).await?.is_none() {
            return Err(AppError::NotFound("Product not found".to_owned()));
        }

        let current = self.ids(user).await?;
        let currently = current.contains(&product);
        let target = change.target(currently);
        if target != currently {
            self.store.set_favourite(user, product, target).await?;
        }

        tracing::debug!(favourite = target, "favourite updated");
        Ok(target)
    }

    /// Flip membership and return the user's favourite ids afterwards.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product or user does not exist.
    pub async fn toggle(&self, user: UserId, product: ProductId) -> Result<Vec<ProductId>> {
        self.apply(user, product, FavouriteChange::Toggle).await?;
        self.ids(user).await
    }

    /// Ensure `product` is a favourite.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product or user does not exist.
    pub async fn add(&self, user: UserId, product: ProductId) -> Result<()> {
        self.apply(user, product, FavouriteChange::Add).await.map(drop)
    }

    /// Ensure `product` is not a favourite.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product or user does not exist.
    pub async fn remove(&self, user: UserId, product: ProductId) -> Result<()> {
        self.apply(user, product, FavouriteChange::Remove)
            .await
            .map(drop)
    }

    /// The user's favourite products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user does not exist.
    pub async fn list(&self, user: UserId) -> Result<Vec<Product>> {
        self.store
            .favourite_products(user)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_owned()))
    }

    async fn ids(&self, user: UserId) -> Result<Vec<ProductId>> {
        self.store
            .favourite_ids(user)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;
    use threadline_core::{Email, Price};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewUser, ProductDraft};

    async fn setup() -> (MemoryStore, UserId, ProductId) {
        let store = MemoryStore::new();
        let user = store
            .create_user(NewUser {
                username: "ana".to_owned(),
                email: Email::parse("ana@example.com").unwrap(),
                password_hash: "hash".to_owned(),
            })
            .await
            .unwrap();
        let product = store
            .create_product(ProductDraft {
                name: "Scarf".to_owned(),
                price: Price::ZERO,
                brand: "Threadline".to_owned(),
                category: "men".to_owned(),
                subcategory: "accessories".to_owned(),
                description: "Wool scarf".to_owned(),
                material: "wool".to_owned(),
                color: "grey".to_owned(),
                sizes: Vec::new(),
                image_url: None,
            })
            .await
            .unwrap();
        (store, user.id, product.id)
    }

    async fn edges(store: &MemoryStore, user: UserId, product: ProductId) -> (bool, bool) {
        let forward = store
            .favourite_ids(user)
            .await
            .unwrap()
            .unwrap()
            .contains(&product);
        let inverse = store
            .product_by_id(product)
            .await
            .unwrap()
            .unwrap()
            .favourited_by
            .contains(&user);
        (forward, inverse)
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_state() {
        let (store, user, scarf) = setup().await;
        let favourites = FavouriteService::new(&store);

        let ids = favourites.toggle(user, scarf).await.unwrap();
        assert_eq!(ids, vec![scarf]);
        assert_eq!(edges(&store, user, scarf).await, (true, true));

        let ids = favourites.toggle(user, scarf).await.unwrap();
        assert!(ids.is_empty());
        assert_eq!(edges(&store, user, scarf).await, (false, false));
    }

    #[tokio::test]
    async fn test_add_and_remove_are_idempotent() {
        let (store, user, scarf) = setup().await;
        let favourites = FavouriteService::new(&store);

        favourites.add(user, scarf).await.unwrap();
        favourites.add(user, scarf).await.unwrap();
        assert_eq!(favourites.list(user).await.unwrap().len(), 1);

        favourites.remove(user, scarf).await.unwrap();
        favourites.remove(user, scarf).await.unwrap();
        assert!(favourites.list(user).await.unwrap().is_empty());
        assert_eq!(edges(&store, user, scarf).await, (false, false));
    }

    #[tokio::test]
    async fn test_missing_product_and_user() {
        let (store, user, scarf) = setup().await;
        let favourites = FavouriteService::new(&store);

        let missing_product = favourites.toggle(user, ProductId::new(404)).await;
        assert!(matches!(missing_product, Err(AppError::NotFound(msg)) if msg == "Product not found"));

        let missing_user = favourites.toggle(UserId::new(404), scarf).await;
        assert!(matches!(missing_user, Err(AppError::NotFound(msg)) if msg == "User not found"));
    }

    fn change() -> impl Strategy<Value = FavouriteChange> {
        prop_oneof![
            Just(FavouriteChange::Add),
            Just(FavouriteChange::Remove),
            Just(FavouriteChange::Toggle),
        ]
    }

    proptest! {
        #[test]
        fn prop_edges_never_diverge(changes in prop::collection::vec(change(), 1..12)) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let (store, user, scarf) = setup().await;
                let favourites = FavouriteService::new(&store);
                let mut expected = false;

                for change in changes {
                    let now = favourites.apply(user, scarf, change).await.unwrap();
                    expected = change.target(expected);
                    assert_eq!(now, expected);
                    assert_eq!(edges(&store, user, scarf).await, (expected, expected));
                }
            });
        }
    }
}
