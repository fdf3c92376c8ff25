//! Mustafo storefront library.
//!
//! The cart, its persistence slot, the Telegram order channel and the HTTP
//! surface over them. The binary in `main.rs` wires these together; the
//! integration tests drive the same router.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod telegram;
