//! Core types for Mustafo Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod money;
pub mod price;

pub use cart::{Cart, CartItem, CartLimitError, CartSummary, Rating};
pub use id::*;
pub use money::{format_amount, format_usd};
pub use price::{Price, PriceError};
