//! Review status domain types

use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

use crate::validation::ValidationError;

/// Review status of a homework submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomeworkStatus {
    Approved,
    Reviewing,
    Rejected,
}

impl HomeworkStatus {
    /// All statuses known to the catalog
    pub const ALL: [HomeworkStatus; 3] = [Self::Approved, Self::Reviewing, Self::Rejected];

    /// Wire code used by the review API
    pub fn code(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Reviewing => "reviewing",
            Self::Rejected => "rejected",
        }
    }

    /// Human-readable outcome of the review
    pub fn verdict(self) -> &'static str {
        match self {
            Self::Approved => "The work has been reviewed: the reviewer liked everything. Hooray!",
            Self::Reviewing => "The work has been taken for review by the reviewer.",
            Self::Rejected => "The work has been reviewed: the reviewer found some errors.",
        }
    }
}

impl fmt::Display for HomeworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for HomeworkStatus {
    type Err = ValidationError;

    fn from_str(code: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.code() == code)
            .ok_or_else(|| ValidationError::UnknownStatus(code.to_string()))
    }
}

/// Static mapping from status codes to verdict text
///
/// An unknown code means the API contract changed underneath us, so lookups
/// fail instead of falling back to a default.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusCatalog;

impl StatusCatalog {
    /// Returns the verdict text for a status code
    pub fn lookup(&self, code: &str) -> Result<&'static str, ValidationError> {
        code.parse::<HomeworkStatus>().map(HomeworkStatus::verdict)
    }
}
