//! In-memory [`Store`].
//!
//! All state sits behind one async mutex, so every store call is atomic on
//! its own. Read-modify-write sequences spanning several calls (load a cart,
//! change it, save it) are not.

use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use threadline_core::{Cart, Email, OrderId, ProductId, Role, UserId};

use super::{RepositoryError, Store};
use crate::models::{
    NewOrder, NewUser, Order, OrderDetail, OrderScope, Product, ProductDraft, ProductFilter, User,
};

struct Account {
    user: User,
    password_hash: String,
    cart: Cart,
    /// Favourited products, oldest first.
    favourites: Vec<ProductId>,
}

#[derive(Default)]
struct Inner {
    users: BTreeMap<UserId, Account>,
    products: BTreeMap<ProductId, Product>,
    orders: Vec<Order>,
    next_user: i32,
    next_product: i32,
    next_order: i32,
}

impl Inner {
    fn next_id(counter: &mut i32) -> i32 {
        *counter += 1;
        *counter
    }
}

/// [`Store`] that keeps everything in process memory.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let taken = inner
            .users
            .values()
            .any(|a| a.user.username == user.username || a.user.email == user.email);
        if taken {
            return Err(RepositoryError::Conflict(
                "username or email already exists".to_owned(),
            ));
        }

        let id = UserId::new(Inner::next_id(&mut inner.next_user));
        let created = User {
            id,
            username: user.username,
            email: user.email,
            role: Role::Customer,
            created_at: Utc::now(),
        };
        inner.users.insert(
            id,
            Account {
                user: created.clone(),
                password_hash: user.password_hash,
                cart: Cart::new(),
                favourites: Vec::new(),
            },
        );
        Ok(created)
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&id).map(|a| a.user.clone()))
    }

    async fn user_with_password(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .users
            .values()
            .find(|a| &a.user.email == email)
            .map(|a| (a.user.clone(), a.password_hash.clone())))
    }

    async fn set_user_role(&self, email: &Email, role: Role) -> Result<User, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let account = inner
            .users
            .values_mut()
            .find(|a| &a.user.email == email)
            .ok_or(RepositoryError::NotFound)?;
        account.user.role = role;
        Ok(account.user.clone())
    }

    async fn load_cart(&self, user: UserId) -> Result<Option<Cart>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&user).map(|a| a.cart.clone()))
    }

    async fn save_cart(&self, user: UserId, cart: &Cart) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        if let Some(missing) = cart
            .items()
            .iter()
            .find(|item| !inner.products.contains_key(&item.product_id))
        {
            tracing::debug!(product_id = %missing.product_id, "cart references unknown product");
            return Err(RepositoryError::NotFound);
        }
        let account = inner.users.get_mut(&user).ok_or(RepositoryError::NotFound)?;
        account.cart = cart.clone();
        Ok(())
    }

    async fn favourite_ids(&self, user: UserId) -> Result<Option<Vec<ProductId>>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&user).map(|a| a.favourites.clone()))
    }

    async fn set_favourite(
        &self,
        user: UserId,
        product: ProductId,
        present: bool,
    ) -> Result<(), RepositoryError> {
        let mut inner = self.inner.lock().await;
        let Inner {
            users, products, ..
        } = &mut *inner;
        let account = users.get_mut(&user).ok_or(RepositoryError::NotFound)?;
        let item = products.get_mut(&product).ok_or(RepositoryError::NotFound)?;

        if present {
            if !account.favourites.contains(&product) {
                account.favourites.push(product);
            }
            if !item.favourited_by.contains(&user) {
                item.favourited_by.push(user);
            }
        } else {
            account.favourites.retain(|p| *p != product);
            item.favourited_by.retain(|u| *u != user);
        }
        Ok(())
    }

    async fn favourite_products(
        &self,
        user: UserId,
    ) -> Result<Option<Vec<Product>>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.get(&user).map(|a| {
            a.favourites
                .iter()
                .filter_map(|id| inner.products.get(id).cloned())
                .collect()
        }))
    }

    async fn create_product(&self, draft: ProductDraft) -> Result<Product, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let id = ProductId::new(Inner::next_id(&mut inner.next_product));
        let product = Product {
            id,
            name: draft.name,
            price: draft.price,
            brand: draft.brand,
            category: draft.category,
            subcategory: draft.subcategory,
            description: draft.description,
            material: draft.material,
            color: draft.color,
            image_url: draft.image_url.unwrap_or_default(),
            sizes: draft.sizes,
            favourited_by: Vec::new(),
            created_at: Utc::now(),
        };
        inner.products.insert(id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        draft: ProductDraft,
    ) -> Result<Option<Product>, RepositoryError> {
        let mut inner = self.inner.lock().await;
        let Some(product) = inner.products.get_mut(&id) else {
            return Ok(None);
        };

        product.name = draft.name;
        product.price = draft.price;
        product.brand = draft.brand;
        product.category = draft.category;
        product.subcategory = draft.subcategory;
        product.description = draft.description;
        product.material = draft.material;
        product.color = draft.color;
        product.sizes = draft.sizes;
        if let Some(image_url) = draft.image_url {
            product.image_url = image_url;
        }
        Ok(Some(product.clone()))
    }

    async fn product_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner.products.get(&id).cloned())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .products
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect())
    }

    async fn missing_products(&self, ids: &[ProductId]) -> Result<Vec<ProductId>, RepositoryError> {
        let inner = self.inner.lock().await;
        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .copied()
            .filter(|id| !inner.products.contains_key(id) && seen.insert(*id))
            .collect())
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut inner = self.inner.lock().await;
        if !inner.users.contains_key(&order.user)
            || order.products.iter().any(|p| !inner.products.contains_key(p))
        {
            return Err(RepositoryError::NotFound);
        }

        let created = Order {
            id: OrderId::new(Inner::next_id(&mut inner.next_order)),
            user: order.user,
            products: order.products,
            total: order.total,
            address: order.address,
            date: Utc::now(),
        };
        inner.orders.push(created.clone());
        Ok(created)
    }

    async fn list_orders(&self, scope: OrderScope) -> Result<Vec<OrderDetail>, RepositoryError> {
        let inner = self.inner.lock().await;
        inner
            .orders
            .iter()
            .filter(|o| scope.includes(o.user))
            .map(|order| {
                let owner = inner
                    .users
                    .get(&order.user)
                    .ok_or_else(|| {
                        RepositoryError::DataCorruption(format!(
                            "order {} references missing user {}",
                            order.id, order.user
                        ))
                    })?
                    .user
                    .summary();
                let products = order
                    .products
                    .iter()
                    .filter_map(|id| inner.products.get(id).cloned())
                    .collect();

                Ok(OrderDetail {
                    id: order.id,
                    user: owner,
                    products,
                    total: order.total,
                    address: order.address.clone(),
                    date: order.date,
                })
            })
            .collect()
    }
}
