//! Errors raised by catalog workflows.

use vinotheca_kernel::{InvalidRuleError, RuleSetError};

use crate::jsonl::JsonlError;

/// Failures of a catalog read or mutation.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The catalog file could not be read or written.
    #[error(transparent)]
    Jsonl(#[from] JsonlError),

    /// A grape rule failed field validation.
    #[error(transparent)]
    InvalidRule(#[from] InvalidRuleError),

    /// A grape rule was refused by the duplicate policy.
    #[error(transparent)]
    RuleSet(#[from] RuleSetError),

    /// The addressed row does not exist.
    #[error("{table} not found: {id}")]
    NotFound { table: &'static str, id: String },

    /// A caller-supplied id is already taken.
    #[error("{table} already exists: {id}")]
    AlreadyExists { table: &'static str, id: String },

    /// A foreign key points at a row that does not exist.
    #[error("{field} references missing {table} row: {id}")]
    MissingReference {
        field: &'static str,
        table: &'static str,
        id: String,
    },

    /// A name was empty or whitespace.
    #[error("{table} name must not be empty")]
    EmptyName { table: &'static str },

    /// An explicit version lower than the stored one.
    #[error("version of wine definition {id} cannot move from {current} back to {requested}")]
    VersionRegression {
        id: String,
        current: i64,
        requested: i64,
    },

    /// Versions start at 1.
    #[error("version of wine definition {id} must be at least 1, got {version}")]
    VersionOutOfRange { id: String, version: i64 },

    /// The stored version is already the largest representable counter.
    #[error("version of wine definition {id} cannot be incremented past {current}")]
    VersionExhausted { id: String, current: i64 },
}

impl CatalogError {
    pub(crate) fn not_found(table: &'static str, id: &str) -> Self {
        Self::NotFound {
            table,
            id: id.to_string(),
        }
    }

    pub(crate) fn missing_reference(field: &'static str, table: &'static str, id: &str) -> Self {
        Self::MissingReference {
            field,
            table,
            id: id.to_string(),
        }
    }
}
