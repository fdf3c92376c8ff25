//! Telegram-related errors.

use thiserror::Error;

/// Errors that can occur when talking to the Bot API.
#[derive(Debug, Error)]
pub enum TelegramError {
    /// HTTP request failed before a response arrived.
    #[error("Telegram request failed: {0}")]
    Request(String),

    /// Response body could not be parsed.
    #[error("Telegram response error (HTTP {status}): {message}")]
    Response { status: u16, message: String },

    /// Bot API returned `ok: false`.
    #[error("Telegram API error {code}: {description}")]
    Api { code: u16, description: String },
}
