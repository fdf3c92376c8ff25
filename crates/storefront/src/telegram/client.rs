//! Telegram Bot API client.

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, error, instrument};

use super::error::TelegramError;
use super::types::{ApiResponse, SendMessage};
use crate::config::TelegramConfig;
use crate::services::OrderChannel;

/// Bot API client bound to a single recipient chat.
#[derive(Clone)]
pub struct TelegramClient {
    /// HTTP client.
    client: Client,
    /// API root, normally `https://api.telegram.org`.
    api_base: String,
    /// Bot token for authentication.
    bot_token: SecretString,
    /// Chat that receives order messages.
    chat_id: String,
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish_non_exhaustive()
    }
}

impl TelegramClient {
    /// Create a new client from configuration.
    #[must_use]
    pub fn new(config: &TelegramConfig) -> Self {
        Self {
            client: Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    /// The recipient chat ID.
    #[must_use]
    pub fn chat_id(&self) -> &str {
        &self.chat_id
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base,
            self.bot_token.expose_secret()
        )
    }

    /// Send a plain-text message to the configured chat.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the response cannot be parsed, or
    /// the Bot API reports `ok: false`.
    #[instrument(skip(self, text), fields(chat_id = %self.chat_id, len = text.len()))]
    pub async fn send_message(&self, text: &str) -> Result<(), TelegramError> {
        let body = SendMessage {
            chat_id: &self.chat_id,
            text,
        };

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            // The URL contains the bot token.
            .map_err(|e| TelegramError::Request(e.without_url().to_string()))?;

        let status = response.status();
        let result: ApiResponse =
            response
                .json()
                .await
                .map_err(|e| TelegramError::Response {
                    status: status.as_u16(),
                    message: e.without_url().to_string(),
                })?;

        if !status.is_success() || !result.ok {
            error!(
                status = status.as_u16(),
                description = ?result.description,
                "Telegram API error sending message"
            );
            return Err(TelegramError::Api {
                code: result.error_code.unwrap_or_else(|| status.as_u16()),
                description: result
                    .description
                    .unwrap_or_else(|| "Unknown error".to_string()),
            });
        }

        debug!("Message sent to Telegram");
        Ok(())
    }
}

impl OrderChannel for TelegramClient {
    type Error = TelegramError;

    async fn send(&self, text: &str) -> Result<(), Self::Error> {
        self.send_message(text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(api_base: &str) -> TelegramConfig {
        TelegramConfig {
            api_base: api_base.to_string(),
            bot_token: SecretString::from("123456:AAH-test-token"),
            chat_id: "42".to_string(),
        }
    }

    #[test]
    fn test_method_url() {
        let client = TelegramClient::new(&config("https://api.telegram.org/"));
        assert_eq!(
            client.method_url("sendMessage"),
            "https://api.telegram.org/bot123456:AAH-test-token/sendMessage"
        );
    }

    #[test]
    fn test_debug_redacts_token() {
        let client = TelegramClient::new(&config("https://api.telegram.org"));
        let debug = format!("{client:?}");
        assert!(!debug.contains("AAH-test-token"));
        assert!(debug.contains("[REDACTED]"));
    }
}
