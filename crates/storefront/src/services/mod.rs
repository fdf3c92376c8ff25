//! Business logic services for storefront.
//!
//! # Services
//!
//! - `cart` - Cart state container over the persistence slot
//! - `order` - Order message formatting and one-at-a-time submission

pub mod cart;
pub mod order;

pub use cart::{CART_KEY, CartError, CartStore};
pub use order::{
    OrderChannel, OrderMessage, OrderReceipt, OrderSubmitter, SubmissionError, SubmissionState,
};
