//! Upload checks for documents sent for extraction.
//!
//! The declared content type of a multipart part is not trusted; the format
//! is identified from the leading magic bytes instead.
//!
//! # Example
//!
//! ```rust,ignore
//! use cheque_backend::validation::{validate_upload, DocumentFormat};
//!
//! let format = validate_upload(b"%PDF-1.7 ...", 10 * 1024 * 1024).unwrap();
//! assert_eq!(format, DocumentFormat::Pdf);
//! ```

use std::fmt;

use crate::error::UploadError;

/// Accepted document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Jpeg,
    Png,
    Pdf,
}

impl DocumentFormat {
    pub fn as_mime(&self) -> &'static str {
        match self {
            DocumentFormat::Jpeg => "image/jpeg",
            DocumentFormat::Png => "image/png",
            DocumentFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

/// Identify a document from its first bytes.
pub fn detect_format(bytes: &[u8]) -> Option<DocumentFormat> {
    if bytes.starts_with(b"%PDF") {
        Some(DocumentFormat::Pdf)
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some(DocumentFormat::Jpeg)
    } else if bytes.starts_with(&[0x89, b'P', b'N', b'G']) {
        Some(DocumentFormat::Png)
    } else {
        None
    }
}

/// Check an uploaded document.
///
/// # Returns
/// * `Ok(format)` if the document can be processed
/// * `Err(UploadError)` naming the first problem found
pub fn validate_upload(bytes: &[u8], limit: usize) -> Result<DocumentFormat, UploadError> {
    if bytes.is_empty() {
        return Err(UploadError::Empty);
    }
    if bytes.len() > limit {
        return Err(UploadError::TooLarge {
            size: bytes.len(),
            limit,
        });
    }
    detect_format(bytes).ok_or(UploadError::UnsupportedType)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_format() {
        assert_eq!(detect_format(b"%PDF-1.4"), Some(DocumentFormat::Pdf));
        assert_eq!(detect_format(&[0xFF, 0xD8, 0xFF, 0xDB]), Some(DocumentFormat::Jpeg));
        assert_eq!(detect_format(b"\x89PNG\r\n\x1a\n"), Some(DocumentFormat::Png));
        assert_eq!(detect_format(b"GIF89a"), None);
        assert_eq!(detect_format(b"%P"), None);
    }

    #[test]
    fn test_validate_upload() {
        assert_eq!(validate_upload(b"", 10), Err(UploadError::Empty));
        assert_eq!(
            validate_upload(b"%PDF-1.4 too long", 10),
            Err(UploadError::TooLarge { size: 17, limit: 10 })
        );
        assert_eq!(validate_upload(b"hello", 10), Err(UploadError::UnsupportedType));
        assert_eq!(validate_upload(b"%PDF-1.4", 8), Ok(DocumentFormat::Pdf));
    }
}
