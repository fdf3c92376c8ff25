//! Mustafo Shop Core - Shared types library.
//!
//! This crate provides the types shared by the storefront and its tests:
//! - Product identifiers and prices
//! - Cart items and the in-memory cart with its pure mutations
//! - USD money formatting for display and order messages
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no persistence,
//! no HTTP clients. Persisting the cart and submitting orders live in the
//! storefront crate.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs and prices, cart types, money formatting

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
