//! Error types for the cheque backend.
//!
//! - [`UploadError`] - the uploaded document is missing or unacceptable
//! - [`ExtractionError`] - the extraction engine did not answer
//! - [`StoreError`] - cheque store errors
//! - [`ServerError`] - top-level server errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// Upload Errors
// =============================================================================

/// Problems with the document sent for extraction.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    /// No `cheque` field in the form.
    #[error("No cheque file provided")]
    Missing,

    /// Empty file.
    #[error("Cheque file is empty")]
    Empty,

    /// Larger than the upload limit.
    #[error("File too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    /// Content is not JPEG, PNG or PDF.
    #[error("Unsupported file content, expected JPEG, PNG or PDF")]
    UnsupportedType,
}

// =============================================================================
// Extraction Errors
// =============================================================================

/// Errors from the extraction engine.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The engine did not answer in time.
    #[error("Extraction timed out")]
    Timeout,
}

// =============================================================================
// Store Errors
// =============================================================================

/// Errors from the cheque store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Cheque not found.
    #[error("Cheque not found: {0}")]
    NotFound(u64),

    /// A required value is blank.
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// IO error.
    #[error("Store IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Store JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Upload rejected.
    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    /// Extraction error.
    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// Store error.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Could not encode an answer.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Could not bind or serve.
    #[error("Server IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for extraction.
pub type ExtractionResult<T> = Result<T, ExtractionError>;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let upload = UploadError::TooLarge { size: 11, limit: 10 };
        let server: ServerError = upload.into();
        assert!(server.to_string().contains("11 bytes"));

        let store = StoreError::MissingField("chequeNumber");
        let server: ServerError = store.into();
        assert!(server.to_string().contains("chequeNumber"));

        let server: ServerError = ExtractionError::Timeout.into();
        assert_eq!(server.to_string(), "Extraction error: Extraction timed out");
    }
}
