//! Homework status poller
//!
//! Polls the review API for status changes and relays each one to the chat.
//! One cycle runs at a time: fetch, validate, format every record, notify in
//! API order, then sleep a fixed interval whatever the outcome.

use homework_client::{ClientError, HomeworkSource};
use homework_core::{HomeworkRecord, ResponseValidator, StatusFormatter, ValidationError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::scheduler::ticker::Scheduler;
use crate::service::Notifier;

/// Error that turns a cycle into a failure
#[derive(Debug, Error)]
pub enum CycleError {
    /// Review API unreachable, non-200, or body not JSON
    #[error("review API request failed: {0}")]
    Transport(#[from] ClientError),

    /// Payload or record not usable
    #[error("{0}")]
    Validation(#[from] ValidationError),
}

/// Counters for one successful cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Records returned by the API
    pub records: usize,
    /// Notifications accepted by the messaging API
    pub delivered: usize,
    /// Notifications that failed to send
    pub failed: usize,
    /// Records dropped by the lenient policy
    pub skipped: usize,
}

/// Result of one poll cycle
#[derive(Debug)]
pub enum CycleOutcome {
    Success(CycleReport),
    Failure(CycleError),
}

/// Totals over every cycle of one [`PollLoop::run`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub cycles: usize,
    pub failed_cycles: usize,
    pub delivered: usize,
    pub undelivered: usize,
}

/// Poll loop that owns the cursor and drives every cycle
pub struct PollLoop {
    source: Arc<dyn HomeworkSource>,
    notifier: Arc<dyn Notifier>,
    validator: ResponseValidator,
    formatter: StatusFormatter,
    interval: Duration,
    /// Lower bound (seconds since epoch) of the next fetch window
    cursor: i64,
}

impl PollLoop {
    /// Creates a new poll loop
    ///
    /// The cursor starts at `config.from_date`, or at `now` when unset.
    pub fn new(
        config: &Config,
        source: Arc<dyn HomeworkSource>,
        notifier: Arc<dyn Notifier>,
        now: i64,
    ) -> Self {
        Self {
            source,
            notifier,
            validator: ResponseValidator::new(config.validation),
            formatter: StatusFormatter::default(),
            interval: config.poll_interval,
            cursor: config.from_date.unwrap_or(now),
        }
    }

    /// Current cursor value
    pub fn cursor(&self) -> i64 {
        self.cursor
    }

    /// Runs cycles until the scheduler says stop
    ///
    /// With [`IntervalScheduler`](crate::scheduler::IntervalScheduler) that
    /// only happens on Ctrl+C; a failed cycle never ends the loop.
    pub async fn run(&mut self, scheduler: &mut dyn Scheduler) -> RunSummary {
        info!(
            "Starting homework poller (interval: {:?}, cursor: {})",
            self.interval, self.cursor
        );

        let mut summary = RunSummary::default();
        let mut consecutive_failures = 0u32;

        loop {
            let started_at = scheduler.now();
            summary.cycles += 1;
            match self.run_cycle(started_at).await {
                CycleOutcome::Success(report) => {
                    consecutive_failures = 0;
                    summary.delivered += report.delivered;
                    summary.undelivered += report.failed;
                }
                CycleOutcome::Failure(e) => {
                    consecutive_failures += 1;
                    summary.failed_cycles += 1;
                    if consecutive_failures > 1 {
                        warn!(
                            "{} consecutive poll cycles failed, last error: {}",
                            consecutive_failures, e
                        );
                    }
                }
            }

            debug!("Sleeping for {:?}", self.interval);
            if !scheduler.wait(self.interval).await {
                break;
            }
        }

        info!(
            "Homework poller stopped after {} cycle(s), {} failed, {} message(s) delivered, {} undelivered (cursor: {})",
            summary.cycles,
            summary.failed_cycles,
            summary.delivered,
            summary.undelivered,
            self.cursor
        );
        summary
    }

    /// Performs a single poll cycle
    ///
    /// On success the cursor moves to the server's `current_date`, or to
    /// `started_at` when the payload has none. On failure it stays put and
    /// a best-effort alert goes to the chat.
    pub async fn run_cycle(&mut self, started_at: i64) -> CycleOutcome {
        match self.poll_once().await {
            Ok((report, current_date)) => {
                self.cursor = current_date.unwrap_or(started_at);
                info!(
                    "Poll cycle succeeded: {} homework(s), {} delivered, {} failed, {} skipped, next cursor {}",
                    report.records, report.delivered, report.failed, report.skipped, self.cursor
                );
                CycleOutcome::Success(report)
            }
            Err(e) => {
                error!("Poll cycle failed (cursor {}): {}", self.cursor, e);
                // Delivery errors are already logged by the notifier
                let _ = self
                    .notifier
                    .notify(&format!("Something went wrong: {}", e))
                    .await;
                CycleOutcome::Failure(e)
            }
        }
    }

    async fn poll_once(&self) -> Result<(CycleReport, Option<i64>), CycleError> {
        debug!("Fetching homework statuses from_date={}", self.cursor);
        let payload = self.source.fetch(self.cursor).await?;

        let records = self.validator.validate(&payload)?;
        let mut report = CycleReport {
            records: records.len(),
            ..Default::default()
        };

        if records.is_empty() {
            debug!("No status changes");
        }

        let messages = self.format_all(&records, &mut report)?;

        for message in &messages {
            match self.notifier.notify(message).await {
                Ok(()) => report.delivered += 1,
                Err(_) => report.failed += 1,
            }
        }

        Ok((report, self.validator.current_date(&payload)))
    }

    /// Formats every record before anything is sent
    ///
    /// Under the strict policy one bad record fails the cycle with nothing
    /// delivered.
    fn format_all(
        &self,
        records: &[HomeworkRecord],
        report: &mut CycleReport,
    ) -> Result<Vec<String>, ValidationError> {
        let mut messages = Vec::with_capacity(records.len());

        for record in records {
            match self.formatter.format(record) {
                Ok(message) => messages.push(message),
                Err(e) if self.validator.policy().is_strict() => return Err(e),
                Err(e) => {
                    warn!("Skipping homework {:?}: {}", record.name, e);
                    report.skipped += 1;
                }
            }
        }

        Ok(messages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::ChatNotifier;
    use crate::testing::{FlakySender, ScriptedSource};
    use async_trait::async_trait;
    use homework_core::{HomeworkStatus, ValidationPolicy};
    use serde_json::json;

    const START: i64 = 1_700_000_000;

    struct StepScheduler {
        now: i64,
        step: i64,
        waits: Vec<Duration>,
        max_waits: usize,
    }

    impl StepScheduler {
        fn new(now: i64, step: i64, max_waits: usize) -> Self {
            Self {
                now,
                step,
                waits: Vec::new(),
                max_waits,
            }
        }
    }

    #[async_trait]
    impl Scheduler for StepScheduler {
        fn now(&self) -> i64 {
            self.now
        }

        async fn wait(&mut self, period: Duration) -> bool {
            self.waits.push(period);
            self.now += self.step;
            self.waits.len() < self.max_waits
        }
    }

    fn poll_loop(
        policy: ValidationPolicy,
        source: Arc<ScriptedSource>,
        sender: Arc<FlakySender>,
    ) -> PollLoop {
        let mut config = Config::new("p-token", "t-token", "42");
        config.validation = policy;
        let notifier = Arc::new(ChatNotifier::new(sender, config.chat_id.clone()));
        PollLoop::new(&config, source, notifier, START)
    }

    fn status_message(name: &str, status: HomeworkStatus) -> String {
        format!(
            "Status of review for \"{}\" changed. {}",
            name,
            status.verdict()
        )
    }

    #[tokio::test]
    async fn test_single_approved_homework_is_notified() {
        let source = ScriptedSource::new(vec![Ok(json!({
            "homeworks": [{ "homework_name": "hw1", "status": "approved" }],
            "current_date": START + 300
        }))]);
        let sender = Arc::new(FlakySender::default());
        let mut poller = poll_loop(ValidationPolicy::Strict, source.clone(), sender.clone());

        let outcome = poller.run_cycle(START + 310).await;

        match outcome {
            CycleOutcome::Success(report) => {
                assert_eq!(report.records, 1);
                assert_eq!(report.delivered, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(sender.sent(), vec![status_message("hw1", HomeworkStatus::Approved)]);
        assert_eq!(source.from_dates(), vec![START]);
        assert_eq!(poller.cursor(), START + 300);
    }

    #[tokio::test]
    async fn test_empty_cycle_sends_nothing_and_advances_cursor() {
        let source = ScriptedSource::new(vec![Ok(json!({ "homeworks": [] }))]);
        let sender = Arc::new(FlakySender::default());
        let mut poller = poll_loop(ValidationPolicy::Strict, source, sender.clone());

        let outcome = poller.run_cycle(START + 600).await;

        assert!(matches!(
            outcome,
            CycleOutcome::Success(report) if report.records == 0
        ));
        assert!(sender.sent().is_empty());
        assert_eq!(poller.cursor(), START + 600);
    }

    #[tokio::test]
    async fn test_server_error_alerts_and_holds_cursor() {
        let source = ScriptedSource::new(vec![Err(ClientError::api_error(500, "boom"))]);
        let sender = Arc::new(FlakySender::default());
        let mut poller = poll_loop(ValidationPolicy::Strict, source, sender.clone());

        let outcome = poller.run_cycle(START + 600).await;

        assert!(matches!(
            outcome,
            CycleOutcome::Failure(CycleError::Transport(_))
        ));
        assert_eq!(
            sender.sent(),
            vec!["Something went wrong: review API request failed: API error (status 500): boom"
                .to_string()]
        );
        assert_eq!(poller.cursor(), START);
    }

    #[tokio::test]
    async fn test_failed_cycle_retries_with_same_cursor_after_sleep() {
        let source = ScriptedSource::new(vec![
            Err(ClientError::api_error(500, "boom")),
            Err(ClientError::api_error(500, "boom")),
        ]);
        let sender = Arc::new(FlakySender::default());
        let mut poller = poll_loop(ValidationPolicy::Strict, source.clone(), sender.clone());
        let mut scheduler = StepScheduler::new(START + 5, 600, 2);

        let summary = poller.run(&mut scheduler).await;

        assert_eq!(source.from_dates(), vec![START, START]);
        assert_eq!(summary.cycles, 2);
        assert_eq!(summary.failed_cycles, 2);
        assert_eq!(
            scheduler.waits,
            vec![Duration::from_secs(600), Duration::from_secs(600)]
        );
        assert_eq!(sender.sent().len(), 2);
        assert_eq!(poller.cursor(), START);
    }

    #[tokio::test]
    async fn test_cursor_feeds_next_fetch() {
        let source = ScriptedSource::new(vec![
            Ok(json!({ "homeworks": [], "current_date": START + 590 })),
            Ok(json!({ "homeworks": [] })),
        ]);
        let sender = Arc::new(FlakySender::default());
        let mut poller = poll_loop(ValidationPolicy::Strict, source.clone(), sender);
        let mut scheduler = StepScheduler::new(START + 600, 600, 2);

        poller.run(&mut scheduler).await;

        assert_eq!(source.from_dates(), vec![START, START + 590]);
        assert_eq!(poller.cursor(), START + 1200);
    }

    #[tokio::test]
    async fn test_delivery_failure_does_not_stop_later_records() {
        let source = ScriptedSource::new(vec![Ok(json!({
            "homeworks": [
                { "homework_name": "hw1", "status": "approved" },
                { "homework_name": "hw2", "status": "reviewing" },
                { "homework_name": "hw3", "status": "rejected" }
            ]
        }))]);
        let sender = Arc::new(FlakySender {
            fail_on: vec![0],
            ..Default::default()
        });
        let mut poller = poll_loop(ValidationPolicy::Strict, source, sender.clone());

        let outcome = poller.run_cycle(START + 600).await;

        match outcome {
            CycleOutcome::Success(report) => {
                assert_eq!(report.delivered, 2);
                assert_eq!(report.failed, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(
            sender.sent(),
            vec![
                status_message("hw1", HomeworkStatus::Approved),
                status_message("hw2", HomeworkStatus::Reviewing),
                status_message("hw3", HomeworkStatus::Rejected),
            ]
        );
        assert_eq!(poller.cursor(), START + 600);
    }

    #[tokio::test]
    async fn test_unknown_status_fails_cycle_without_partial_notifications() {
        let source = ScriptedSource::new(vec![Ok(json!({
            "homeworks": [
                { "homework_name": "hw1", "status": "approved" },
                { "homework_name": "hw2", "status": "on_hold" }
            ]
        }))]);
        let sender = Arc::new(FlakySender::default());
        let mut poller = poll_loop(ValidationPolicy::Strict, source, sender.clone());

        let outcome = poller.run_cycle(START + 600).await;

        assert!(matches!(
            outcome,
            CycleOutcome::Failure(CycleError::Validation(ValidationError::UnknownStatus(_)))
        ));
        assert_eq!(
            sender.sent(),
            vec!["Something went wrong: unknown homework status: \"on_hold\"".to_string()]
        );
        assert_eq!(poller.cursor(), START);
    }

    #[tokio::test]
    async fn test_unknown_status_is_skipped_when_lenient() {
        let source = ScriptedSource::new(vec![Ok(json!({
            "homeworks": [
                { "homework_name": "hw1", "status": "on_hold" },
                { "homework_name": "hw2", "status": "approved" }
            ]
        }))]);
        let sender = Arc::new(FlakySender::default());
        let mut poller = poll_loop(ValidationPolicy::Lenient, source, sender.clone());

        let outcome = poller.run_cycle(START + 600).await;

        match outcome {
            CycleOutcome::Success(report) => {
                assert_eq!(report.records, 2);
                assert_eq!(report.skipped, 1);
                assert_eq!(report.delivered, 1);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(sender.sent(), vec![status_message("hw2", HomeworkStatus::Approved)]);
    }

    #[tokio::test]
    async fn test_malformed_payload_fails_cycle() {
        let source = ScriptedSource::new(vec![Ok(json!({ "homeworks": "x" })), Ok(json!({}))]);
        let sender = Arc::new(FlakySender::default());
        let mut poller = poll_loop(ValidationPolicy::Strict, source, sender.clone());

        assert!(matches!(
            poller.run_cycle(START + 600).await,
            CycleOutcome::Failure(CycleError::Validation(
                ValidationError::HomeworksNotAList(_)
            ))
        ));
        assert!(matches!(
            poller.run_cycle(START + 1200).await,
            CycleOutcome::Failure(CycleError::Validation(ValidationError::MissingHomeworks))
        ));
        assert_eq!(sender.sent().len(), 2);
        assert_eq!(poller.cursor(), START);
    }

    #[tokio::test]
    async fn test_failed_alert_is_swallowed() {
        let source = ScriptedSource::new(vec![Err(ClientError::ParseError("bad".to_string()))]);
        let sender = Arc::new(FlakySender {
            fail_all: true,
            ..Default::default()
        });
        let mut poller = poll_loop(ValidationPolicy::Strict, source, sender.clone());

        let outcome = poller.run_cycle(START + 600).await;

        assert!(matches!(
            outcome,
            CycleOutcome::Failure(CycleError::Transport(_))
        ));
        assert_eq!(sender.sent().len(), 1);
    }

    #[tokio::test]
    async fn test_run_summary_totals_cycle_reports() {
        let source = ScriptedSource::new(vec![
            Ok(json!({
                "homeworks": [
                    { "homework_name": "hw1", "status": "approved" },
                    { "homework_name": "hw2", "status": "rejected" }
                ]
            })),
            Err(ClientError::api_error(503, "unavailable")),
            Ok(json!({
                "homeworks": [{ "homework_name": "hw3", "status": "reviewing" }]
            })),
        ]);
        // Sends: hw1, hw2, failure alert, hw3; the second message fails
        let sender = Arc::new(FlakySender {
            fail_on: vec![1],
            ..Default::default()
        });
        let mut poller = poll_loop(ValidationPolicy::Strict, source, sender.clone());
        let mut scheduler = StepScheduler::new(START + 600, 600, 3);

        let summary = poller.run(&mut scheduler).await;

        assert_eq!(
            summary,
            RunSummary {
                cycles: 3,
                failed_cycles: 1,
                delivered: 2,
                undelivered: 1,
            }
        );
        assert_eq!(sender.sent().len(), 4);
    }

    #[test]
    fn test_initial_cursor_from_config() {
        let mut config = Config::new("p", "t", "1");
        config.from_date = Some(42);
        let notifier = Arc::new(ChatNotifier::new(Arc::new(FlakySender::default()), "1"));
        let poller = PollLoop::new(&config, ScriptedSource::new(vec![]), notifier, START);
        assert_eq!(poller.cursor(), 42);
    }
}
