//! Error types for the cheque intake workflow.
//!
//! - [`FileRejected`] - local validation failure of a candidate file
//! - [`DocumentError`] - rejection or I/O while admitting a document
//! - [`MalformedExtraction`] - extraction body that cannot be applied
//! - [`ServiceError`] - transport or server failure talking to the service
//! - [`WorkflowError`] - operation not allowed in the current stage
//! - [`IntakeError`] - top-level error used by the CLI
//!
//! Conversion is automatic via `From`, so `?` works across layers.

use thiserror::Error;

use crate::models::FieldName;
use crate::validation::FieldIssue;
use crate::workflow::WorkflowStage;

// =============================================================================
// Document Errors
// =============================================================================

/// Why a candidate file was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectionReason {
    /// Media type outside the accepted set.
    #[error("unsupported file type")]
    UnsupportedType,

    /// File larger than the size limit.
    #[error("file too large")]
    TooLarge,
}

/// A candidate file failed local validation. Never reaches the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("File rejected ({reason}): {detail}")]
pub struct FileRejected {
    pub reason: RejectionReason,
    pub detail: String,
}

impl FileRejected {
    pub fn unsupported_type(media_type: &str) -> Self {
        Self {
            reason: RejectionReason::UnsupportedType,
            detail: format!("'{}' is not one of JPEG, PNG or PDF", media_type),
        }
    }

    pub fn too_large(size: u64, limit: u64) -> Self {
        Self {
            reason: RejectionReason::TooLarge,
            detail: format!("{} bytes exceeds the {} byte limit", size, limit),
        }
    }
}

/// Errors while reading or admitting a document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// The validator refused the file.
    #[error(transparent)]
    Rejected(#[from] FileRejected),

    /// Reading the candidate or writing its preview failed.
    #[error("Document I/O error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Extraction Errors
// =============================================================================

/// An extraction response that cannot be applied to the record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MalformedExtraction {
    /// The body is not a JSON object.
    #[error("extraction result is not an object")]
    NotAnObject,

    /// A field value is neither a string nor null.
    #[error("value of '{0}' is not a string")]
    InvalidValue(FieldName),

    /// The `confidence` member is neither an object nor null.
    #[error("confidence is not an object")]
    InvalidConfidenceMap,

    /// A confidence entry is not an integer between 0 and 100.
    #[error("confidence of '{field}' is out of range: {raw}")]
    InvalidConfidence { field: FieldName, raw: String },
}

// =============================================================================
// Service Errors
// =============================================================================

/// Failures talking to the extraction/persistence service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request could not be sent or the response not read.
    #[error("HTTP request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The service answered with a non-success status.
    #[error("{endpoint} answered HTTP {status}: {body}")]
    Status {
        endpoint: String,
        status: u16,
        body: String,
    },

    /// The response body could not be decoded.
    #[error("Invalid response from {endpoint}: {message}")]
    InvalidResponse { endpoint: String, message: String },

    /// The service processed the request but refused it.
    #[error("Service refused the request: {0}")]
    Refused(String),

    /// The extraction body could not be applied.
    #[error("Malformed extraction result: {0}")]
    Malformed(#[from] MalformedExtraction),
}

// =============================================================================
// Workflow Errors
// =============================================================================

/// An operator action that the workflow does not allow right now.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    /// The action needs a document and none is loaded.
    #[error("No document loaded")]
    NoDocument,

    /// The action is not valid in the current stage.
    #[error("Cannot {operation} while in the {stage} stage")]
    InvalidStage {
        operation: &'static str,
        stage: WorkflowStage,
    },

    /// No field carries this name.
    #[error("Unknown field: {0}")]
    UnknownField(String),

    /// The record does not pass submit-time validation.
    #[error("Record incomplete: {}", format_issues(.0))]
    Incomplete(Vec<FieldIssue>),
}

fn format_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// =============================================================================
// Top-level
// =============================================================================

/// Top-level error for the command line front end.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error(transparent)]
    Document(#[from] DocumentError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    /// The operation finished without the expected outcome.
    #[error("{0}")]
    Failed(String),
}

impl From<FileRejected> for IntakeError {
    fn from(err: FileRejected) -> Self {
        IntakeError::Document(DocumentError::Rejected(err))
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for workflow operations.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

/// Result type for service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Result type for the CLI.
pub type IntakeResult<T> = Result<T, IntakeError>;
