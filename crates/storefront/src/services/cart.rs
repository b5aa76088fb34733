//! Cart operations for an authenticated user.
//!
//! Every mutation loads the stored cart, applies the change in memory and
//! writes the whole cart back. The load and the save are separate store calls,
//! so two concurrent mutations for the same user can lose one update.

use tracing::instrument;

use threadline_core::{Cart, CartError, CartLineId, NewCartLine, UserId};

use crate::db::Store;
use crate::error::{AppError, Result};

/// Cart service.
pub struct CartService<'a> {
    store: &'a dyn Store,
}

impl<'a> CartService<'a> {
    /// Create a new cart service.
    #[must_use]
    pub const fn new(store: &'a dyn Store) -> Self {
        Self { store }
    }

    /// Add a line to the cart, merging with a line for the same product, size
    /// and colour. Returns the updated cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the product or user does not exist.
    /// Returns `AppError::Validation` if the size is not offered or the merged
    /// quantity is too large.
    #[instrument(skip(self, line), fields(product_id = %line.product_id))]
    pub async fn add(&self, user: UserId, mut line: NewCartLine) -> Result<Cart> {
        let product = self
            .store
            .product_by_id(line.product_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Product not found".to_owned()))?;
        // Stored lines carry the catalog's label so the merge key is exact.
        line.selected_size = product.size_label(&line.selected_size).ok_or_else(|| {
            AppError::invalid(
                "selectedSize",
                "Selected size is not available for this product",
            )
        })?;

        let mut cart = self.load(user).await?;
        cart.add(line).map_err(|CartError::QuantityOverflow { .. }| {
            AppError::invalid("quantity", "Quantity in cart is too large")
        })?;
        self.store.save_cart(user, &cart).await?;

        tracing::debug!(lines = cart.len(), "cart updated");
        Ok(cart)
    }

    /// Remove a line by id and return the remaining cart. Removing an id that
    /// is not in the cart changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user does not exist.
    #[instrument(skip(self))]
    pub async fn remove(&self, user: UserId, line: CartLineId) -> Result<Cart> {
        let mut cart = self.load(user).await?;
        if cart.remove(line) {
            self.store.save_cart(user, &cart).await?;
        }
        Ok(cart)
    }

    /// The user's cart.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the user does not exist.
    pub async fn list(&self, user: UserId) -> Result<Cart> {
        self.load(user).await
    }

    async fn load(&self, user: UserId) -> Result<Cart> {
        self.store
            .load_cart(user)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use threadline_core::{Email, Price, ProductId, Quantity};

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewUser, ProductDraft, SizeStock};

    async fn setup(sizes: &[&str]) -> (MemoryStore, UserId, ProductId) {
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
                name: "Tee".to_owned(),
                price: Price::ZERO,
                brand: "Threadline".to_owned(),
                category: "women".to_owned(),
                subcategory: "tees".to_owned(),
                description: "Tee".to_owned(),
                material: "cotton".to_owned(),
                color: "red".to_owned(),
                sizes: sizes
                    .iter()
                    .map(|s| SizeStock {
                        size: Some((*s).to_owned()),
                        quantity: 3,
                    })
                    .collect(),
                image_url: None,
            })
            .await
            .unwrap();
        (store, user.id, product.id)
    }

    fn line(product: ProductId, size: &str, quantity: u32) -> NewCartLine {
        NewCartLine {
            product_id: product,
            selected_size: size.to_owned(),
            selected_color: "red".to_owned(),
            quantity: Quantity::new(quantity).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_add_merges_same_variant() {
        let (store, user, tee) = setup(&["M", "L"]).await;
        let carts = CartService::new(&store);

        carts.add(user, line(tee, "M", 2)).await.unwrap();
        let cart = carts.add(user, line(tee, "M", 3)).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity.get(), 5);

        let cart = carts.add(user, line(tee, "L", 1)).await.unwrap();
        assert_eq!(cart.len(), 2);
        assert_eq!(carts.list(user).await.unwrap(), cart);
    }

    #[tokio::test]
    async fn test_size_case_merges_into_catalog_label() {
        let (store, user, tee) = setup(&["M"]).await;
        let carts = CartService::new(&store);

        carts.add(user, line(tee, "M", 1)).await.unwrap();
        let cart = carts.add(user, line(tee, "m", 1)).await.unwrap();
        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].selected_size, "M");
        assert_eq!(cart.items()[0].quantity.get(), 2);
    }

    #[tokio::test]
    async fn test_add_rejects_unknown_product_and_size() {
        let (store, user, tee) = setup(&["M"]).await;
        let carts = CartService::new(&store);

        let missing = carts.add(user, line(ProductId::new(99), "M", 1)).await;
        assert!(matches!(missing, Err(AppError::NotFound(msg)) if msg == "Product not found"));

        let bad_size = carts.add(user, line(tee, "XXL", 1)).await;
        assert!(matches!(bad_size, Err(AppError::Validation(errors)) if errors[0].param == "selectedSize"));
        assert!(carts.list(user).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsized_product_accepts_any_size() {
        let (store, user, tee) = setup(&[]).await;
        let cart = CartService::new(&store)
            .add(user, line(tee, "one-size", 1))
            .await
            .unwrap();
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (store, _, tee) = setup(&["M"]).await;
        let result = CartService::new(&store)
            .add(UserId::new(404), line(tee, "M", 1))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(msg)) if msg == "User not found"));
    }

    #[tokio::test]
    async fn test_overflow_leaves_cart_unchanged() {
        let (store, user, tee) = setup(&["M"]).await;
        let carts = CartService::new(&store);
        carts.add(user, line(tee, "M", Quantity::MAX)).await.unwrap();

        let result = carts.add(user, line(tee, "M", 1)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        let cart = carts.list(user).await.unwrap();
        assert_eq!(cart.items()[0].quantity.get(), Quantity::MAX);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let (store, user, tee) = setup(&["M", "L"]).await;
        let carts = CartService::new(&store);
        carts.add(user, line(tee, "M", 1)).await.unwrap();
        let cart = carts.add(user, line(tee, "L", 1)).await.unwrap();
        let first = cart.items()[0].id;

        let once = carts.remove(user, first).await.unwrap();
        let twice = carts.remove(user, first).await.unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
        assert_eq!(once.items()[0].selected_size, "L");
    }
}
