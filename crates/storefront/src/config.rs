//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `TELEGRAM_BOT_TOKEN` - Bot API token used to deliver order messages
//! - `TELEGRAM_CHAT_ID` - Chat that receives order messages
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STOREFRONT_DATA_DIR` - Directory holding the cart slot (default: data)
//! - `STOREFRONT_SHIPPING_FEE` - Flat shipping fee in USD (default: 10)
//! - `TELEGRAM_API_BASE` - Bot API root (default: <https://api.telegram.org>)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use mustafo_core::Price;
use rust_decimal::Decimal;
use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";
const MIN_TOKEN_SECRET_LEN: usize = 30;
const MIN_TOKEN_DISTINCT_CHARS: usize = 10;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory backing the cart persistence slot
    pub data_dir: PathBuf,
    /// Flat shipping fee added to the displayed total
    pub shipping_fee: Price,
    /// Telegram Bot API configuration
    pub telegram: TelegramConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name (e.g. "production")
    pub sentry_environment: Option<String>,
}

/// Telegram Bot API configuration.
///
/// Implements `Debug` manually to redact the bot token.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot API root URL
    pub api_base: String,
    /// Bot token (part of every request path)
    pub bot_token: SecretString,
    /// Chat ID that receives order messages
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("api_base", &self.api_base)
            .field("bot_token", &"[REDACTED]")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the bot token fails validation (placeholder or malformed token).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = get_env_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let data_dir = PathBuf::from(get_env_or_default("STOREFRONT_DATA_DIR", "data"));
        let shipping_fee = parse_price(
            "STOREFRONT_SHIPPING_FEE",
            &get_env_or_default("STOREFRONT_SHIPPING_FEE", "10"),
        )?;

        let telegram = TelegramConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            host,
            port,
            data_dir,
            shipping_fee,
            telegram,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl TelegramConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: get_env_or_default("TELEGRAM_API_BASE", DEFAULT_TELEGRAM_API_BASE),
            bot_token: get_bot_token("TELEGRAM_BOT_TOKEN")?,
            chat_id: get_required_env("TELEGRAM_CHAT_ID")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a non-negative dollar amount.
fn parse_price(var_name: &str, value: &str) -> Result<Price, ConfigError> {
    let amount = Decimal::from_str(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;
    Price::new(amount).map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))
}

/// Check that a bot token has the `<bot id>:<secret>` shape issued by
/// `@BotFather` and is not a placeholder.
fn validate_bot_token(token: &str, var_name: &str) -> Result<(), ConfigError> {
    let insecure = |reason: String| Err(ConfigError::InsecureSecret(var_name.to_string(), reason));

    let lower = token.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return insecure(format!("appears to be a placeholder (contains '{pattern}')"));
    }

    let Some((bot_id, secret)) = token.split_once(':') else {
        return insecure("expected '<bot id>:<secret>'".to_string());
    };
    if bot_id.is_empty() || !bot_id.bytes().all(|b| b.is_ascii_digit()) {
        return insecure("bot id must be numeric".to_string());
    }
    if secret.len() < MIN_TOKEN_SECRET_LEN
        || !secret
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return insecure(format!(
            "secret part must be at least {MIN_TOKEN_SECRET_LEN} characters of [A-Za-z0-9_-]"
        ));
    }

    let distinct = secret.bytes().collect::<HashSet<_>>().len();
    if distinct < MIN_TOKEN_DISTINCT_CHARS {
        return insecure(format!(
            "secret part is too repetitive ({distinct} distinct characters)"
        ));
    }

    Ok(())
}

/// Load and validate the bot token from environment.
fn get_bot_token(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_bot_token(value.trim(), key)?;
    Ok(SecretString::from(value.trim().to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn telegram() -> TelegramConfig {
        TelegramConfig {
            api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            bot_token: SecretString::from("7000000001:AAFq9Zk2LmX8pR4tV6wY1bN3cD5eG7hJ0sQ"),
            chat_id: "100200300".to_string(),
        }
    }

    #[test]
    fn test_bot_token_placeholder() {
        let result = validate_bot_token("your-bot-token-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_bot_token_shape() {
        for bad in [
            "AAFq9Zk2LmX8pR4tV6wY1bN3cD5eG7hJ0sQ",
            "bot:AAFq9Zk2LmX8pR4tV6wY1bN3cD5eG7hJ0sQ",
            "7000000001:short",
            "7000000001:AAFq9Zk2LmX8pR4tV6wY1bN3cD5eG7hJ0s!",
        ] {
            assert!(
                matches!(
                    validate_bot_token(bad, "TEST_VAR"),
                    Err(ConfigError::InsecureSecret(_, _))
                ),
                "{bad} was accepted"
            );
        }
    }

    #[test]
    fn test_bot_token_repetitive_secret() {
        let result = validate_bot_token("1111111111:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_bot_token_valid() {
        let result =
            validate_bot_token("7000000001:AAFq9Zk2LmX8pR4tV6wY1bN3cD5eG7hJ0sQ", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(
            parse_price("FEE", "10").unwrap(),
            Price::from_cents(1000)
        );
        assert_eq!(
            parse_price("FEE", " 4.99 ").unwrap(),
            Price::from_cents(499)
        );
        assert!(matches!(
            parse_price("FEE", "-1"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
        assert!(matches!(
            parse_price("FEE", "ten"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_socket_addr() {
        let config = StorefrontConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            data_dir: PathBuf::from("data"),
            shipping_fee: Price::from_cents(1000),
            telegram: telegram(),
            sentry_dsn: None,
            sentry_environment: None,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_telegram_config_debug_redacts_token() {
        let debug_output = format!("{:?}", telegram());

        assert!(debug_output.contains("100200300"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AAFq9Zk2LmX8pR4tV6wY1bN3cD5eG7hJ0sQ"));
    }
}
