//! Bot configuration
//!
//! Secrets, endpoints and timing for the poll loop. Built once at startup
//! from the process environment and passed by reference from there on.

use homework_client::{DEFAULT_REVIEW_ENDPOINT, DEFAULT_TELEGRAM_API_BASE};
use homework_core::ValidationPolicy;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// One or more required variables are unset or empty
    #[error("missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),

    /// A variable is set but unusable
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Bot configuration
#[derive(Clone)]
pub struct Config {
    /// OAuth token for the review API
    pub practicum_token: String,

    /// Telegram bot token
    pub telegram_token: String,

    /// Chat that receives every notification
    pub chat_id: String,

    /// Review API `homework_statuses` URL
    pub review_endpoint: String,

    /// Telegram Bot API base URL
    pub telegram_api_base: String,

    /// Fixed delay between poll cycles
    pub poll_interval: Duration,

    /// Per-request timeout for both HTTP clients
    pub request_timeout: Duration,

    /// Initial cursor; `None` means "now"
    pub from_date: Option<i64>,

    /// How strictly to treat malformed payloads and unknown statuses
    pub validation: ValidationPolicy,
}

impl Config {
    /// Creates a new configuration with defaults for everything but the secrets
    pub fn new(
        practicum_token: impl Into<String>,
        telegram_token: impl Into<String>,
        chat_id: impl Into<String>,
    ) -> Self {
        Self {
            practicum_token: practicum_token.into(),
            telegram_token: telegram_token.into(),
            chat_id: chat_id.into(),
            review_endpoint: DEFAULT_REVIEW_ENDPOINT.to_string(),
            telegram_api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            poll_interval: Duration::from_secs(600), // 10 minutes
            request_timeout: Duration::from_secs(30),
            from_date: None,
            validation: ValidationPolicy::Strict,
        }
    }

    /// Creates configuration from a variable lookup
    ///
    /// `std::env::var` in production, a map in tests. Expected variables:
    /// - PRACTICUM_TOKEN (required)
    /// - TELEGRAM_TOKEN (required)
    /// - TELEGRAM_CHAT_ID or CHAT_ID (required)
    /// - PRACTICUM_ENDPOINT (optional, default: production review API)
    /// - TELEGRAM_API_BASE (optional, default: https://api.telegram.org)
    /// - RETRY_TIME (optional, seconds, default: 600)
    /// - REQUEST_TIMEOUT (optional, seconds, default: 30)
    /// - FROM_DATE (optional, unix timestamp, default: now)
    /// - HOMEWORK_VALIDATION (optional, `strict` or `lenient`, default: strict)
    ///
    /// Every missing secret is reported at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let practicum_token = get("PRACTICUM_TOKEN");
        let telegram_token = get("TELEGRAM_TOKEN");
        let chat_id = get("TELEGRAM_CHAT_ID").or_else(|| get("CHAT_ID"));

        let mut missing = Vec::new();
        if practicum_token.is_none() {
            missing.push("PRACTICUM_TOKEN");
        }
        if telegram_token.is_none() {
            missing.push("TELEGRAM_TOKEN");
        }
        if chat_id.is_none() {
            missing.push("TELEGRAM_CHAT_ID");
        }

        let (Some(practicum_token), Some(telegram_token), Some(chat_id)) =
            (practicum_token, telegram_token, chat_id)
        else {
            return Err(ConfigError::Missing(missing));
        };

        let mut config = Self::new(practicum_token, telegram_token, chat_id.trim());

        if let Some(endpoint) = get("PRACTICUM_ENDPOINT") {
            config.review_endpoint = endpoint;
        }
        if let Some(api_base) = get("TELEGRAM_API_BASE") {
            config.telegram_api_base = api_base;
        }
        if let Some(secs) = parse_number::<u64>("RETRY_TIME", get("RETRY_TIME"))? {
            config.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_number::<u64>("REQUEST_TIMEOUT", get("REQUEST_TIMEOUT"))? {
            config.request_timeout = Duration::from_secs(secs);
        }
        config.from_date = parse_number::<i64>("FROM_DATE", get("FROM_DATE"))?;
        if let Some(policy) = get("HOMEWORK_VALIDATION") {
            config.validation =
                ValidationPolicy::parse(&policy).ok_or_else(|| ConfigError::Invalid {
                    key: "HOMEWORK_VALIDATION",
                    reason: format!("expected `strict` or `lenient`, got {:?}", policy),
                })?;
        }

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("PRACTICUM_ENDPOINT", &self.review_endpoint)?;
        check_url("TELEGRAM_API_BASE", &self.telegram_api_base)?;

        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid {
                key: "RETRY_TIME",
                reason: "must be greater than 0".to_string(),
            });
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                key: "REQUEST_TIMEOUT",
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(
    key: &'static str,
    value: Option<String>,
) -> Result<Option<T>, ConfigError> {
    value
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
                key,
                reason: format!("expected an integer, got {:?}", raw),
            })
        })
        .transpose()
}

fn check_url(key: &'static str, url: &str) -> Result<(), ConfigError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            key,
            reason: "must start with http:// or https://".to_string(),
        })
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("practicum_token", &"<redacted>")
            .field("telegram_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .field("review_endpoint", &self.review_endpoint)
            .field("telegram_api_base", &self.telegram_api_base)
            .field("poll_interval", &self.poll_interval)
            .field("request_timeout", &self.request_timeout)
            .field("from_date", &self.from_date)
            .field("validation", &self.validation)
            .finish()
    }
}
