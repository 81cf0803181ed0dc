//! Time source and sleep between poll cycles
//!
//! Kept behind a trait so tests can run cycles back to back without real
//! delays and with a controlled clock.

use async_trait::async_trait;
use std::time::Duration;
use tracing::info;

/// Clock and pacing for the poll loop
#[async_trait]
pub trait Scheduler: Send {
    /// Current time in seconds since the epoch
    fn now(&self) -> i64;

    /// Waits `period` before the next cycle
    ///
    /// Returns `false` when the loop should stop instead.
    async fn wait(&mut self, period: Duration) -> bool;
}

/// Wall-clock scheduler that sleeps on the Tokio timer
///
/// Stops the loop on Ctrl+C received while sleeping.
#[derive(Debug, Default)]
pub struct IntervalScheduler;

#[async_trait]
impl Scheduler for IntervalScheduler {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }

    async fn wait(&mut self, period: Duration) -> bool {
        tokio::select! {
            _ = tokio::time::sleep(period) => true,
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, stopping poll loop");
                false
            }
        }
    }
}
