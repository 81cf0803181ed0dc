//! Startup wiring
//!
//! Turns the process environment into a ready poll loop. Nothing here talks
//! to the network: clients are built by the caller-supplied `connect` only
//! after the configuration has been accepted.

use homework_client::HomeworkSource;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use crate::config::{Config, ConfigError};
use crate::scheduler::PollLoop;
use crate::service::Notifier;

/// Log file used when `HOMEWORK_LOG_FILE` is unset
pub const DEFAULT_LOG_FILE: &str = "main.log";

/// Where the append-mode log file lives
///
/// Unset means [`DEFAULT_LOG_FILE`] in the working directory. An empty value
/// turns file logging off and leaves stderr as the only sink.
pub fn log_file_path<F>(lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup("HOMEWORK_LOG_FILE") {
        None => Some(PathBuf::from(DEFAULT_LOG_FILE)),
        Some(path) if path.trim().is_empty() => None,
        Some(path) => Some(PathBuf::from(path)),
    }
}

/// Loads and validates configuration
pub fn load_config<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let config = Config::from_lookup(lookup)?;
    config.validate()?;
    Ok(config)
}

/// Builds the poll loop, or refuses to start
///
/// On unusable configuration a single critical event is logged, `connect` is
/// never called and no fetch can happen.
pub fn bootstrap<F, C>(lookup: F, connect: C, now: i64) -> Result<PollLoop, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    C: FnOnce(&Config) -> (Arc<dyn HomeworkSource>, Arc<dyn Notifier>),
{
    let config = load_config(lookup).inspect_err(|e| {
        error!(critical = true, "Startup aborted, configuration is unusable: {}", e);
    })?;
    info!(
        "Loaded configuration: chat_id={}, endpoint={}, interval={:?}, validation={:?}",
        config.chat_id, config.review_endpoint, config.poll_interval, config.validation
    );

    let (source, notifier) = connect(&config);
    info!("Clients initialized");

    Ok(PollLoop::new(&config, source, notifier, now))
}
