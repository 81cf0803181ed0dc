//! Homework Core
//!
//! Core types and pure logic for the homework review status bot.
//!
//! This crate contains:
//! - Domain types: homework records and the catalog of review statuses
//! - Validation: shape checks for review API payloads
//! - Formatting: turning a record into a notification message
//!
//! Nothing in here performs I/O; HTTP lives in `homework-client` and the
//! polling loop lives in `homework-bot`.

pub mod domain;
pub mod format;
pub mod validation;

pub use domain::homework::HomeworkRecord;
pub use domain::status::{HomeworkStatus, StatusCatalog};
pub use format::StatusFormatter;
pub use validation::{ResponseValidator, ValidationError, ValidationPolicy};
