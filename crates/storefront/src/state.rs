//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::Store;
use crate::services::{ImageStore, TokenService};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and is read-only after
/// startup: configuration, token keys, the store handle and the image
/// directory.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn Store>,
    tokens: TokenService,
    images: ImageStore,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Persistence backend
    #[must_use]
    pub fn new(config: StorefrontConfig, store: Arc<dyn Store>) -> Self {
        let tokens = TokenService::new(&config.jwt_secret);
        let images = ImageStore::new(config.uploads_dir.clone());

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                tokens,
                images,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.inner.store.as_ref()
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the image store.
    #[must_use]
    pub fn images(&self) -> &ImageStore {
        &self.inner.images
    }
}
