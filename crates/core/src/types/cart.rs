//! Cart items and the in-memory cart.
//!
//! [`Cart`] is an ordered list of [`CartItem`]s keyed by product ID. All
//! mutations here are pure; persisting the cart after each change is the
//! storefront's `CartStore` job.
//!
//! ## Invariants
//!
//! - Every item has `quantity >= 1` (`NonZeroU32` makes zero unrepresentable;
//!   an item that would reach zero is removed).
//! - Product IDs are unique. Adding an ID that is already present increases
//!   that item's quantity instead of appending a second entry.
//! - The subtotal never exceeds [`Cart::MAX_SUBTOTAL`]. A change that would
//!   break this is refused with [`CartLimitError`] and leaves the cart as it
//!   was, and a stored cart over the limit fails to deserialize.

use std::num::NonZeroU32;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::ProductId;
use super::money::format_usd;
use super::price::Price;

/// A change that would push the cart past [`Cart::MAX_SUBTOTAL`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cart subtotal cannot exceed {}", format_usd(Cart::MAX_SUBTOTAL))]
pub struct CartLimitError;

/// Aggregate review score for a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rating {
    /// Average score.
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    /// Number of reviews.
    pub count: u32,
}

/// One product entry plus its quantity within the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Product image URL.
    #[serde(default)]
    pub image: String,
    pub price: Price,
    #[serde(default = "one")]
    pub quantity: NonZeroU32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<Rating>,
}

const fn one() -> NonZeroU32 {
    NonZeroU32::MIN
}

impl CartItem {
    /// Create an item with quantity 1 and no description, image, or rating.
    #[must_use]
    pub fn new(id: ProductId, title: impl Into<String>, price: Price) -> Self {
        Self {
            id,
            title: title.into(),
            description: String::new(),
            image: String::new(),
            price,
            quantity: one(),
            category: None,
            rating: None,
        }
    }

    /// Set the quantity.
    #[must_use]
    pub const fn with_quantity(mut self, quantity: NonZeroU32) -> Self {
        self.quantity = quantity;
        self
    }

    /// Set the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Set the image URL.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Set the rating.
    #[must_use]
    pub fn with_rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Unit price times quantity, or `None` if it overflows.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        self.price.times(self.quantity)
    }
}

/// The user's selected items, in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// The highest allowed subtotal, $1,000,000,000,000.
    pub const MAX_SUBTOTAL: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a cart from a list of items, merging duplicate IDs.
    ///
    /// The first occurrence of an ID keeps its position; later duplicates add
    /// their quantity to it.
    ///
    /// # Errors
    ///
    /// Returns [`CartLimitError`] if the items add up to more than
    /// [`Cart::MAX_SUBTOTAL`].
    pub fn try_from_items(
        items: impl IntoIterator<Item = CartItem>,
    ) -> Result<Self, CartLimitError> {
        let mut cart = Self::new();
        for item in items {
            cart.add(item)?;
        }
        Ok(cart)
    }

    /// Items in display order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Look up an item by product ID.
    #[must_use]
    pub fn get(&self, id: ProductId) -> Option<&CartItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total number of units across all items.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.quantity.get()))
            .sum()
    }

    /// Sum of `price * quantity` over all items.
    ///
    /// Only `None` if the sum overflows, which the subtotal limit rules out
    /// for any cart built through this type.
    #[must_use]
    pub fn subtotal(&self) -> Option<Decimal> {
        self.items
            .iter()
            .try_fold(Decimal::ZERO, |sum, item| sum.checked_add(item.line_total()?))
    }

    /// Totals for display, with a flat shipping fee.
    ///
    /// An empty cart is charged no shipping. `None` if a total overflows.
    #[must_use]
    pub fn summary(&self, shipping_fee: Price) -> Option<CartSummary> {
        let subtotal = self.subtotal()?;
        let shipping = if self.is_empty() {
            Decimal::ZERO
        } else {
            shipping_fee.amount()
        };

        Some(CartSummary {
            item_count: self.item_count(),
            subtotal,
            shipping,
            total: subtotal.checked_add(shipping)?,
        })
    }

    /// Add an item, or increase the quantity of the item with the same ID.
    ///
    /// When merging, the existing entry's title, price and other details are
    /// kept; only the quantity changes (saturating at `u32::MAX`).
    ///
    /// # Errors
    ///
    /// Returns [`CartLimitError`], leaving the cart unchanged, if the
    /// subtotal would exceed [`Cart::MAX_SUBTOTAL`].
    pub fn add(&mut self, item: CartItem) -> Result<(), CartLimitError> {
        let subtotal = self.subtotal().ok_or(CartLimitError)?;
        match self.items.iter_mut().find(|existing| existing.id == item.id) {
            Some(existing) => {
                let quantity = existing.quantity.saturating_add(item.quantity.get());
                requantified(subtotal, existing, quantity).ok_or(CartLimitError)?;
                existing.quantity = quantity;
            }
            None => {
                item.line_total()
                    .and_then(|line| within_limit(subtotal.checked_add(line)?))
                    .ok_or(CartLimitError)?;
                self.items.push(item);
            }
        }
        Ok(())
    }

    /// Remove the item with `id`. Returns `false` if it was not in the cart.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        self.items.len() != before
    }

    /// Increase the quantity of `id` by one. Returns `Ok(false)` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`CartLimitError`], leaving the cart unchanged, if the
    /// subtotal would exceed [`Cart::MAX_SUBTOTAL`].
    pub fn increment(&mut self, id: ProductId) -> Result<bool, CartLimitError> {
        let subtotal = self.subtotal().ok_or(CartLimitError)?;
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return Ok(false);
        };

        let quantity = item.quantity.saturating_add(1);
        requantified(subtotal, item, quantity).ok_or(CartLimitError)?;
        item.quantity = quantity;
        Ok(true)
    }

    /// Decrease the quantity of `id` by one, removing it at quantity 1.
    /// Returns `false` if absent.
    pub fn decrement(&mut self, id: ProductId) -> bool {
        let Some(index) = self.items.iter().position(|item| item.id == id) else {
            return false;
        };
        let Some(item) = self.items.get_mut(index) else {
            return false;
        };

        match NonZeroU32::new(item.quantity.get() - 1) {
            Some(quantity) => item.quantity = quantity,
            None => {
                self.items.remove(index);
            }
        }
        true
    }

    /// Consume the cart, returning its items.
    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }
}

/// Cart totals. `total` is `subtotal + shipping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartSummary {
    pub item_count: u64,
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

/// `subtotal` with `item` set to `quantity`, if that stays within the limit.
fn requantified(subtotal: Decimal, item: &CartItem, quantity: NonZeroU32) -> Option<Decimal> {
    let without = subtotal.checked_sub(item.line_total()?)?;
    within_limit(without.checked_add(item.price.times(quantity)?)?)
}

fn within_limit(subtotal: Decimal) -> Option<Decimal> {
    (subtotal <= Cart::MAX_SUBTOTAL).then_some(subtotal)
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let items = Vec::<CartItem>::deserialize(deserializer)?;
        Self::try_from_items(items).map_err(serde::de::Error::custom)
    }
}
