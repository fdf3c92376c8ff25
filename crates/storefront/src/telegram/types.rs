//! Bot API request and response types.

use serde::{Deserialize, Serialize};

/// Body of a `sendMessage` call.
#[derive(Debug, Clone, Serialize)]
pub struct SendMessage<'a> {
    /// Target chat ID or `@channelusername`.
    pub chat_id: &'a str,
    /// Message text.
    pub text: &'a str,
}

/// Envelope returned by every Bot API method.
///
/// Only the success flag and error details are consumed; the sent message in
/// `result` is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub error_code: Option<u16>,
    #[serde(default)]
    pub description: Option<String>,
}
