//! Error types for tradedoc.
//!
//! Every variant here is structural: it aborts a pipeline run before any
//! output is produced. Per-cell problems are reported as
//! [`Warning`](crate::Warning)s instead.

use thiserror::Error;
use tradedoc_sheet::SheetError;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors that can occur while validating, processing or binding a table.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An insertion rule references something that does not exist, or uses
    /// an unsupported pattern.
    #[error("Invalid insertion rule for column '{column}': {reason}")]
    InvalidInsertionRule { column: String, reason: String },

    /// A header entry is malformed (duplicate name, bad group key, ...).
    #[error("Invalid header configuration for column '{column}': {reason}")]
    InvalidHeaderConfig { column: String, reason: String },

    /// A kept header names a column the uploaded table does not have.
    #[error("Header '{column}' refers to a column that is not in the table")]
    UnknownColumn { column: String },

    /// A required field of the selected document type is not an output column.
    #[error("Missing required field: {0}")]
    MissingRequiredField(String),

    /// No document type is registered under this id.
    #[error("Unknown document type: {0}")]
    UnknownDocumentType(String),

    /// The document type exists but is switched off.
    #[error("Document type is inactive: {0}")]
    InactiveDocumentType(String),

    /// A document type with this id is already registered.
    #[error("Document type already exists: {0}")]
    DuplicateDocumentType(String),

    /// Configuration could not be read or parsed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The persistence collaborator rejected a document.
    #[error("Persistence error: {0}")]
    Persist(String),

    /// Table construction or I/O failed.
    #[error("Sheet error: {0}")]
    Sheet(#[from] SheetError),
}

impl EngineError {
    /// Create an invalid insertion rule error.
    pub fn invalid_rule(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInsertionRule {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid header configuration error.
    pub fn invalid_header(column: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHeaderConfig {
            column: column.into(),
            reason: reason.into(),
        }
    }
}
