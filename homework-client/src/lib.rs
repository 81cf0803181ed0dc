//! Homework HTTP Clients
//!
//! Thin, typed HTTP clients for the two remote services the bot talks to:
//! - [`ReviewClient`]: the homework review API (`homework_statuses`)
//! - [`TelegramClient`]: the Telegram Bot API (`sendMessage`)
//!
//! Each client is also exposed through a narrow capability trait
//! ([`HomeworkSource`], [`MessageSender`]) so the polling loop can be driven
//! by fakes in tests.
//!
//! # Example
//!
//! ```no_run
//! use homework_client::{ReviewClient, TelegramClient};
//!
//! #[tokio::main]
//! async fn main() -> homework_client::Result<()> {
//!     let review = ReviewClient::new(homework_client::DEFAULT_REVIEW_ENDPOINT, "practicum-token");
//!     let payload = review.homework_statuses(0).await?;
//!
//!     let bot = TelegramClient::new(homework_client::DEFAULT_TELEGRAM_API_BASE, "bot-token");
//!     bot.send_message("123456", &payload.to_string()).await?;
//!     Ok(())
//! }
//! ```

pub mod error;
mod review;
mod telegram;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use review::{DEFAULT_REVIEW_ENDPOINT, ReviewClient};
pub use telegram::{DEFAULT_TELEGRAM_API_BASE, TelegramClient};

use async_trait::async_trait;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const ERROR_BODY_LIMIT: usize = 512;

/// Source of homework review state
#[async_trait]
pub trait HomeworkSource: Send + Sync {
    /// Fetches every status change after `from_date` (seconds since epoch)
    ///
    /// Returns the decoded JSON body untouched; shape checks belong to the
    /// caller.
    async fn fetch(&self, from_date: i64) -> Result<serde_json::Value>;
}

/// Capability to deliver a text message to a chat
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, chat_id: &str, text: &str) -> Result<()>;
}

/// Builds an HTTP client with a connect timeout and a per-request timeout
///
/// Falls back to a default client if the builder fails.
pub fn build_http_client(request_timeout: Duration) -> reqwest::Client {
    match reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
    {
        Ok(client) => client,
        Err(e) => {
            tracing::warn!(
                "Failed to build HTTP client with timeouts, falling back to defaults: {}",
                e
            );
            reqwest::Client::new()
        }
    }
}

/// Shortens an error body so a misbehaving server cannot flood the logs
fn excerpt(body: &str) -> String {
    let body = body.trim();
    if body.chars().count() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let mut short: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    short.push_str("...");
    short
}
