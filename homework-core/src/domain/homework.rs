//! Homework domain types

use serde::Deserialize;

/// One submitted assignment as reported by the review API
///
/// Received fresh every poll cycle and never persisted. Both fields are
/// optional on the wire; a missing status is rejected when formatting,
/// a missing name is only a data-quality warning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct HomeworkRecord {
    #[serde(rename = "homework_name", default)]
    pub name: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

impl HomeworkRecord {
    /// Creates a record with both fields present
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            status: Some(status.into()),
        }
    }
}
