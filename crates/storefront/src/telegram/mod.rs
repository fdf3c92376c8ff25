//! Telegram Bot API integration for order notifications.
//!
//! This module provides:
//! - [`TelegramClient`] for posting messages to the shop owner's chat
//! - Request/response types for `sendMessage`
//!
//! The bot token is part of the request path
//! (`{api_base}/bot{token}/sendMessage`), so it is kept in a
//! [`secrecy::SecretString`] and stripped from any error that carries a URL.

mod client;
mod error;
mod types;

pub use client::TelegramClient;
pub use error::TelegramError;
pub use types::{ApiResponse, SendMessage};
