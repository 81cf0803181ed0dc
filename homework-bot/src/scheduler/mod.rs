//! Scheduler layer for the bot
//!
//! This layer owns the poll loop: it drives one fetch, validate, format and
//! notify cycle at a time and sleeps a fixed interval between cycles.

pub mod poller;
pub mod ticker;

pub use poller::PollLoop;
pub use ticker::{IntervalScheduler, Scheduler};
