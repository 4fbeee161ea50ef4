//! Document intake: candidate files, validation, and the admitted document.
//!
//! A [`Candidate`] is whatever the operator picked. The
//! [`DocumentValidator`] checks its declared media type and size and, when it
//! passes, turns it into a [`Document`] that owns a preview file. Replacing a
//! document releases the old preview before the new one is written.

pub mod preview;

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::MAX_FILE_SIZE;
use crate::error::{DocumentError, FileRejected};

pub use preview::{PreviewHandle, PreviewStore};

// =============================================================================
// Media Types
// =============================================================================

/// Accepted document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Jpeg,
    Png,
    Pdf,
}

impl MediaType {
    /// Parse a declared MIME type. Case and parameters are ignored.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" => Some(MediaType::Jpeg),
            "image/png" => Some(MediaType::Png),
            "application/pdf" => Some(MediaType::Pdf),
            _ => None,
        }
    }

    pub fn as_mime(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Pdf => "application/pdf",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "jpg",
            MediaType::Png => "png",
            MediaType::Pdf => "pdf",
        }
    }

    /// Identify content from its magic bytes.
    pub fn sniff(content: &[u8]) -> Option<Self> {
        match content {
            [0x25, 0x50, 0x44, 0x46, ..] => Some(MediaType::Pdf),
            [0xFF, 0xD8, 0xFF, ..] => Some(MediaType::Jpeg),
            [0x89, 0x50, 0x4E, 0x47, ..] => Some(MediaType::Png),
            _ => None,
        }
    }
}

/// Sniff the first bytes of a file.
fn sniff_file(path: &Path) -> std::io::Result<Option<MediaType>> {
    let mut head = Vec::with_capacity(8);
    File::open(path)?.take(8).read_to_end(&mut head)?;
    Ok(MediaType::sniff(&head))
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

// =============================================================================
// Candidate
// =============================================================================

/// A file the operator selected, not yet validated.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub file_name: String,
    /// Declared media type, as reported by the file picker.
    pub media_type: String,
    pub content: Vec<u8>,
}

impl Candidate {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            content,
        }
    }

    /// Read a file from disk.
    ///
    /// The declared type is guessed from the extension; when the extension
    /// tells nothing, the leading magic bytes are used instead. Type and size
    /// are checked against the file metadata first, so a file the validator
    /// would refuse is never loaded.
    pub fn from_path(path: &Path) -> Result<Self, DocumentError> {
        let size = std::fs::metadata(path)?.len();
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document".to_string());

        let media_type = match mime_guess::from_path(path).first() {
            Some(mime) => mime.essence_str().to_string(),
            None => sniff_file(path)?
                .map(|m| m.as_mime().to_string())
                .unwrap_or_else(|| "application/octet-stream".to_string()),
        };

        if MediaType::from_mime(&media_type).is_none() {
            warn!(file = %file_name, media_type = %media_type, "File rejected before reading");
            return Err(FileRejected::unsupported_type(&media_type).into());
        }
        if size > MAX_FILE_SIZE {
            warn!(file = %file_name, size, "File rejected before reading");
            return Err(FileRejected::too_large(size, MAX_FILE_SIZE).into());
        }

        let content = std::fs::read(path)?;
        debug!(file = %file_name, media_type = %media_type, size = content.len(), "Candidate read");
        Ok(Self::new(file_name, media_type, content))
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

// =============================================================================
// Document
// =============================================================================

/// A validated document. Owns its preview; dropping the document releases it.
#[derive(Debug)]
pub struct Document {
    id: Uuid,
    file_name: String,
    media_type: MediaType,
    content: Arc<[u8]>,
    preview: PreviewHandle,
}

impl Document {
    /// Identity of this acceptance. A new id is issued every time, even for
    /// the same bytes.
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn media_type(&self) -> MediaType {
        self.media_type
    }

    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }

    /// Shared handle on the bytes, cheap to hand to a request task.
    pub fn content(&self) -> Arc<[u8]> {
        Arc::clone(&self.content)
    }

    pub fn preview(&self) -> &PreviewHandle {
        &self.preview
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Enforces the type and size constraints and manages preview lifecycle.
#[derive(Debug, Clone)]
pub struct DocumentValidator {
    max_size: u64,
    previews: PreviewStore,
}

impl DocumentValidator {
    pub fn new(previews: PreviewStore) -> Self {
        Self {
            max_size: MAX_FILE_SIZE,
            previews,
        }
    }

    pub fn previews(&self) -> &PreviewStore {
        &self.previews
    }

    /// Check a candidate without admitting it. Type is checked before size.
    pub fn check(&self, candidate: &Candidate) -> Result<MediaType, FileRejected> {
        let media_type = MediaType::from_mime(&candidate.media_type)
            .ok_or_else(|| FileRejected::unsupported_type(&candidate.media_type))?;

        if candidate.size() > self.max_size {
            return Err(FileRejected::too_large(candidate.size(), self.max_size));
        }

        Ok(media_type)
    }

    /// Admit a candidate in place of `current`.
    ///
    /// On rejection nothing changes and no preview is created. On success
    /// the previous document (and its preview) is dropped before the new
    /// preview is written, so two previews are never live together. If the
    /// new preview cannot be written, `current` is left empty.
    pub fn accept<'a>(
        &self,
        candidate: Candidate,
        current: &'a mut Option<Document>,
    ) -> Result<&'a Document, DocumentError> {
        let media_type = self.check(&candidate).map_err(|rejected| {
            warn!(file = %candidate.file_name, reason = %rejected.reason, "File rejected");
            rejected
        })?;

        if let Some(previous) = current.take() {
            debug!(document_id = %previous.id(), "Releasing previous document");
            drop(previous);
        }

        let id = Uuid::new_v4();
        let preview = self.previews.create(id, media_type, &candidate.content)?;

        info!(
            document_id = %id,
            file = %candidate.file_name,
            media_type = %media_type,
            size = candidate.content.len(),
            "Document accepted"
        );

        Ok(&*current.insert(Document {
            id,
            file_name: candidate.file_name,
            media_type,
            content: Arc::from(candidate.content),
            preview,
        }))
    }
}
