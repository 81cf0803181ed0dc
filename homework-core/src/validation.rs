//! Review API payload validation
//!
//! The client hands back whatever JSON the API returned; this module decides
//! whether it is something the bot can act on and extracts the homework
//! records in the order the API reported them.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::warn;

use crate::domain::homework::HomeworkRecord;

/// Errors raised while validating a payload or a single record
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Top-level payload is not a JSON object
    #[error("malformed response: expected a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// `homeworks` entry is absent or null
    #[error("malformed response: `homeworks` entry is missing")]
    MissingHomeworks,

    /// `homeworks` entry is present but not a list
    #[error("malformed response: `homeworks` must be a list, got {0}")]
    HomeworksNotAList(&'static str),

    /// An element of `homeworks` cannot be read as a record
    #[error("malformed homework at index {index}: {reason}")]
    MalformedRecord { index: usize, reason: String },

    /// Record carries no status code
    #[error("homework has no status")]
    MissingStatus,

    /// Status code is not in the catalog
    #[error("unknown homework status: {0:?}")]
    UnknownStatus(String),
}

/// How strictly to treat payloads that deviate from the expected contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    /// Any deviation fails the whole cycle
    #[default]
    Strict,
    /// Missing `homeworks` reads as an empty list; bad records are skipped
    Lenient,
}

impl ValidationPolicy {
    /// Parses a policy name (`strict` or `lenient`, case-insensitive)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "lenient" => Some(Self::Lenient),
            _ => None,
        }
    }

    pub fn is_strict(self) -> bool {
        self == Self::Strict
    }
}

/// Validates review API payloads
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseValidator {
    policy: ValidationPolicy,
}

impl ResponseValidator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// Extracts the homework records from a payload
    ///
    /// An empty `homeworks` list is the normal "nothing changed" answer and
    /// yields an empty vector.
    pub fn validate(&self, payload: &Value) -> Result<Vec<HomeworkRecord>, ValidationError> {
        let object = payload
            .as_object()
            .ok_or(ValidationError::NotAnObject(json_kind(payload)))?;

        let items = match object.get("homeworks") {
            None | Some(Value::Null) => {
                if self.policy.is_strict() {
                    return Err(ValidationError::MissingHomeworks);
                }
                warn!("Response has no `homeworks` entry, treating it as empty");
                return Ok(Vec::new());
            }
            Some(Value::Array(items)) => items,
            Some(other) => return Err(ValidationError::HomeworksNotAList(json_kind(other))),
        };

        let mut records = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            match parse_record(index, item) {
                Ok(record) => records.push(record),
                Err(e) if self.policy.is_strict() => return Err(e),
                Err(e) => warn!("Skipping homework: {}", e),
            }
        }

        Ok(records)
    }

    /// Server-reported timestamp of the answer, if the payload carries one
    pub fn current_date(&self, payload: &Value) -> Option<i64> {
        payload.get("current_date").and_then(Value::as_i64)
    }
}

fn parse_record(index: usize, item: &Value) -> Result<HomeworkRecord, ValidationError> {
    if !item.is_object() {
        return Err(ValidationError::MalformedRecord {
            index,
            reason: format!("expected an object, got {}", json_kind(item)),
        });
    }

    HomeworkRecord::deserialize(item).map_err(|e| ValidationError::MalformedRecord {
        index,
        reason: e.to_string(),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
