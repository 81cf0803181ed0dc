//! Telegram Bot API client

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::fmt;

use crate::error::{ClientError, Result};
use crate::{MessageSender, excerpt};

/// Production base URL of the Telegram Bot API
pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Minimal Telegram Bot API client
///
/// Only `sendMessage` is needed: the bot never reads updates.
#[derive(Clone)]
pub struct TelegramClient {
    /// Base URL of the Bot API (e.g., "https://api.telegram.org")
    api_base: String,
    /// Bot token, part of every request path
    token: String,
    /// HTTP client instance
    client: Client,
}

impl TelegramClient {
    /// Create a new Telegram client with a default HTTP client
    pub fn new(api_base: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(api_base, token, Client::new())
    }

    /// Create a new Telegram client with a custom HTTP client
    pub fn with_client(
        api_base: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        let api_base = api_base.into();
        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            token: token.into(),
            client,
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.token, method)
    }

    /// Send a plain text message to a chat
    pub async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        let body = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&body)
            .send()
            .await
            .map_err(ClientError::transport)?;

        Self::handle_response(response).await
    }

    // =============================================================================
    // Response Handlers
    // =============================================================================

    /// Checks the HTTP status and the `ok` flag of a Bot API answer
    async fn handle_response(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        let body_text = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<Value>(&body_text).ok();

        if !status.is_success() {
            let message = parsed
                .as_ref()
                .and_then(description)
                .map(str::to_string)
                .unwrap_or_else(|| excerpt(&body_text));
            return Err(ClientError::api_error(status.as_u16(), message));
        }

        let Some(data) = parsed else {
            return Err(ClientError::ParseError(format!(
                "Failed to parse Telegram response: {}",
                excerpt(&body_text)
            )));
        };

        let ok = data.get("ok").and_then(Value::as_bool).unwrap_or(true);
        if !ok {
            return Err(ClientError::Rejected {
                error_code: data.get("error_code").and_then(Value::as_i64),
                description: description(&data).unwrap_or("no description").to_string(),
            });
        }

        Ok(())
    }
}

fn description(data: &Value) -> Option<&str> {
    data.get("description")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_base", &self.api_base)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl MessageSender for TelegramClient {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()> {
        TelegramClient::send_message(self, chat_id, text).await
    }
}
