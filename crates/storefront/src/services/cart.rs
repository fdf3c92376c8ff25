//! Cart state container backed by a persistence slot.
//!
//! [`CartStore`] owns the authoritative in-memory [`Cart`] and mirrors it into
//! a [`KeyValueStore`] under [`CART_KEY`]. Every command handler mutates the
//! cart and then writes the whole cart back before returning; there is no
//! diffing and no batching.
//!
//! Reads never fail: an absent, unreadable or malformed slot loads as an empty
//! cart. A stored cart over [`Cart::MAX_SUBTOTAL`] counts as malformed.
//! Changes that would cross that limit are refused with [`CartError::Limit`]
//! before anything is written. Writes can fail. In that case the in-memory change is kept, the
//! failure is logged, and [`CartError`] is returned so the caller can show a
//! non-fatal warning.
//!
//! Quantities only move by one through [`CartStore::increment`] and
//! [`CartStore::decrement`]; there is no set-quantity command.

use mustafo_core::{Cart, CartItem, CartLimitError, ProductId};
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, instrument, warn};

use crate::storage::{KeyValueStore, StorageError};

/// Slot name the cart is stored under.
pub const CART_KEY: &str = "carts";

/// Errors from changing or persisting the cart.
#[derive(Debug, Error)]
pub enum CartError {
    /// Change refused; the cart is unchanged.
    #[error(transparent)]
    Limit(#[from] CartLimitError),

    /// Cart could not be serialized.
    #[error("failed to encode cart: {0}")]
    Encode(#[from] serde_json::Error),

    /// Slot write failed.
    #[error("failed to persist cart: {0}")]
    Persist(#[from] StorageError),
}

/// The shopping cart plus its persisted mirror.
#[derive(Debug)]
pub struct CartStore<S> {
    store: S,
    cart: Cart,
}

impl<S: KeyValueStore> CartStore<S> {
    /// Load the cart from `store`, falling back to an empty cart.
    #[instrument(skip(store))]
    pub fn load(store: S) -> Self {
        let cart = read_cart(&store);
        debug!(lines = cart.len(), "Cart loaded");
        Self { store, cart }
    }

    /// Current cart contents.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        self.cart.items()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cart.is_empty()
    }

    /// Total number of units in the cart.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.cart.item_count()
    }

    /// Sum of `price * quantity` over the current items.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.cart.subtotal()
    }

    /// The underlying persistence slot.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Add `item`, merging with an existing entry of the same product.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Limit`] if the subtotal would grow past the
    /// limit, or another [`CartError`] if the updated cart could not be
    /// persisted.
    #[instrument(skip(self, item), fields(id = %item.id, quantity = item.quantity.get()))]
    pub fn add(&mut self, item: CartItem) -> Result<(), CartError> {
        self.cart.add(item).inspect_err(|e| warn!(error = %e, "Add refused"))?;
        self.commit("add")
    }

    /// Remove the item with `id`. Absent IDs are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the cart could not be persisted.
    #[instrument(skip(self))]
    pub fn remove(&mut self, id: ProductId) -> Result<(), CartError> {
        if !self.cart.remove(id) {
            debug!("Remove for product not in cart");
        }
        self.commit("remove")
    }

    /// Add one unit of `id`. Absent IDs are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Limit`] if the subtotal would grow past the
    /// limit, or another [`CartError`] if the cart could not be persisted.
    #[instrument(skip(self))]
    pub fn increment(&mut self, id: ProductId) -> Result<(), CartError> {
        let found = self
            .cart
            .increment(id)
            .inspect_err(|e| warn!(error = %e, "Increment refused"))?;
        if !found {
            debug!("Increment for product not in cart");
        }
        self.commit("increment")
    }

    /// Take away one unit of `id`, removing the item when it was the last.
    /// Absent IDs are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`CartError`] if the cart could not be persisted.
    #[instrument(skip(self))]
    pub fn decrement(&mut self, id: ProductId) -> Result<(), CartError> {
        if !self.cart.decrement(id) {
            debug!("Decrement for product not in cart");
        }
        self.commit("decrement")
    }

    fn commit(&mut self, operation: &'static str) -> Result<(), CartError> {
        self.persist().inspect_err(|e| {
            warn!(
                operation,
                error = %e,
                "Cart change applied in memory but not persisted"
            );
        })
    }

    fn persist(&mut self) -> Result<(), CartError> {
        let json = serde_json::to_string(&self.cart)?;
        self.store.set(CART_KEY, &json)?;
        Ok(())
    }
}

/// Read the persisted cart, treating every failure as "no cart".
fn read_cart(store: &impl KeyValueStore) -> Cart {
    let raw = match store.get(CART_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Cart::new(),
        Err(e) => {
            warn!(error = %e, "Failed to read stored cart, starting empty");
            return Cart::new();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(error = %e, "Stored cart is malformed, starting empty");
        Cart::new()
    })
}
