//! Application state shared across handlers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::StorefrontConfig;
use crate::services::{CartStore, OrderSubmitter};
use crate::storage::FileStore;
use crate::telegram::TelegramClient;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// cart, the order submitter, and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    cart: Mutex<CartStore<FileStore>>,
    orders: OrderSubmitter<TelegramClient>,
}

impl AppState {
    /// Create a new application state.
    ///
    /// Loads the cart from `config.data_dir`; a missing or unreadable cart
    /// starts empty.
    #[must_use]
    pub fn new(config: StorefrontConfig) -> Self {
        let cart = CartStore::load(FileStore::new(&config.data_dir));
        let orders = OrderSubmitter::new(TelegramClient::new(&config.telegram));

        Self {
            inner: Arc::new(AppStateInner {
                config,
                cart: Mutex::new(cart),
                orders,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Lock the cart.
    ///
    /// The guard must not be held across an `.await`.
    #[must_use]
    pub fn cart(&self) -> MutexGuard<'_, CartStore<FileStore>> {
        self.inner
            .cart
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Get a reference to the order submitter.
    #[must_use]
    pub fn orders(&self) -> &OrderSubmitter<TelegramClient> {
        &self.inner.orders
    }
}
