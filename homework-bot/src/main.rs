//! Homework Bot
//!
//! A long-running worker that watches homework review statuses and reports
//! every change to a Telegram chat.
//!
//! Architecture:
//! - Configuration: secrets and timing loaded once from the environment
//! - Clients: review API and Telegram Bot API (`homework-client`)
//! - Services: notification delivery policy
//! - Scheduler: the poll loop and its pacing
//!
//! The bot asks the review API for changes since its cursor every
//! `RETRY_TIME` seconds, sends one message per changed homework, and
//! reports failed cycles to the same chat without stopping.

mod config;
mod scheduler;
mod service;
mod startup;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::scheduler::{IntervalScheduler, Scheduler};
use crate::service::{ChatNotifier, Notifier};
use homework_client::{HomeworkSource, ReviewClient, TelegramClient, build_http_client};

const DEFAULT_LOG_FILTER: &str = "homework_bot=info,homework_client=info,homework_core=info";

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let env = |key: &str| std::env::var(key).ok();

    // Initialize logging
    init_tracing(startup::log_file_path(env))?;

    info!("Starting Homework Bot");

    let mut scheduler = IntervalScheduler;
    let Ok(mut poller) = startup::bootstrap(env, connect, scheduler.now()) else {
        return Ok(ExitCode::FAILURE);
    };

    // Start polling loop
    poller.run(&mut scheduler).await;

    Ok(ExitCode::SUCCESS)
}

/// Builds the review and Telegram clients over one shared HTTP client
fn connect(config: &Config) -> (Arc<dyn HomeworkSource>, Arc<dyn Notifier>) {
    let http = build_http_client(config.request_timeout);
    let review: Arc<dyn HomeworkSource> = Arc::new(ReviewClient::with_client(
        config.review_endpoint.clone(),
        config.practicum_token.clone(),
        http.clone(),
    ));
    let telegram = Arc::new(TelegramClient::with_client(
        config.telegram_api_base.clone(),
        config.telegram_token.clone(),
        http,
    ));
    let notifier: Arc<dyn Notifier> =
        Arc::new(ChatNotifier::new(telegram, config.chat_id.clone()));

    (review, notifier)
}

/// Sets up the tracing subscriber
///
/// Events go to stderr and, unless `log_file` is `None`, are also appended
/// to that file without ANSI colours.
fn init_tracing(log_file: Option<PathBuf>) -> Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}
