//! Homework review API client

use async_trait::async_trait;
use reqwest::{Client, StatusCode, header::AUTHORIZATION};
use serde_json::Value;
use std::fmt;

use crate::error::{ClientError, Result};
use crate::{HomeworkSource, excerpt};

/// Production endpoint of the review API
pub const DEFAULT_REVIEW_ENDPOINT: &str =
    "https://practicum.yandex.ru/api/user_api/homework_statuses/";

/// HTTP client for the homework review API
///
/// Authenticates with an `OAuth` token and asks for every status change
/// after a given timestamp.
#[derive(Clone)]
pub struct ReviewClient {
    /// Full URL of the `homework_statuses` endpoint
    endpoint: String,
    /// OAuth token sent in the `Authorization` header
    token: String,
    /// HTTP client instance
    client: Client,
}

impl ReviewClient {
    /// Create a new review API client with a default HTTP client
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(endpoint, token, Client::new())
    }

    /// Create a new review API client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    pub fn with_client(
        endpoint: impl Into<String>,
        token: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            client,
        }
    }

    /// Fetch homework statuses changed after `from_date`
    ///
    /// Only an HTTP 200 with a JSON body counts as success. The body is
    /// returned as-is.
    pub async fn homework_statuses(&self, from_date: i64) -> Result<Value> {
        tracing::debug!("Requesting homework statuses from_date={}", from_date);

        let response = self
            .client
            .get(&self.endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.token))
            .query(&[("from_date", from_date)])
            .send()
            .await
            .map_err(ClientError::transport)?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), excerpt(&error_text)));
        }

        let body = response.text().await.map_err(ClientError::transport)?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
    }
}

impl fmt::Debug for ReviewClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewClient")
            .field("endpoint", &self.endpoint)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl HomeworkSource for ReviewClient {
    async fn fetch(&self, from_date: i64) -> Result<Value> {
        self.homework_statuses(from_date).await
    }
}
