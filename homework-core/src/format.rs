//! Notification formatting

use tracing::{info, warn};

use crate::domain::homework::HomeworkRecord;
use crate::domain::status::StatusCatalog;
use crate::validation::ValidationError;

/// Placeholder used when the API omits a homework name
pub const UNNAMED_HOMEWORK: &str = "<unnamed>";

/// Builds status-change messages from homework records
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusFormatter {
    catalog: StatusCatalog,
}

impl StatusFormatter {
    /// Formats the notification for one record
    ///
    /// Fails when the status is missing or not in the catalog. A missing
    /// name is rendered as [`UNNAMED_HOMEWORK`] and only logged.
    pub fn format(&self, record: &HomeworkRecord) -> Result<String, ValidationError> {
        let code = record
            .status
            .as_deref()
            .ok_or(ValidationError::MissingStatus)?;
        let verdict = self.catalog.lookup(code)?;

        let name = match record.name.as_deref() {
            Some(name) => name,
            None => {
                warn!("Homework name is missing (status: {})", code);
                UNNAMED_HOMEWORK
            }
        };

        info!("Status of {} changed to {}", name, code);

        Ok(format!(
            "Status of review for \"{}\" changed. {}",
            name, verdict
        ))
    }
}
