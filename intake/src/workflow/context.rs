//! The workflow context: one document, one record, one stage.
//!
//! Network calls are split in two. `begin_*` checks the guards, tags the
//! request with the current document and hands back a ticket; the caller runs
//! the ticket wherever it likes and feeds the outcome to `complete_*`. A
//! completion whose tag is no longer the pending one is dropped as
//! [`Completion::Stale`] without touching anything.

use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::extraction::{ExtractionOutcome, ExtractionTicket};
use super::stage::{next_stage, Transition, WorkflowStage};
use super::submission::{SaveOutcome, SaveTicket};
use crate::config::SUCCESS_NOTICE_TTL;
use crate::document::{Candidate, Document, DocumentValidator, PreviewStore};
use crate::error::{DocumentError, IntakeResult, WorkflowError, WorkflowResult};
use crate::models::{ChequeRecord, FieldName};
use crate::services::DocumentUpload;
use crate::validation::validate_record;

/// Shown when extraction fails for any reason.
pub const EXTRACTION_FAILED_MESSAGE: &str = "OCR processing failed. Please try again.";

/// Shown when a save fails for any reason.
pub const SAVE_FAILED_MESSAGE: &str = "Saving the cheque failed.";

/// Shown for a few seconds after a successful save.
pub const SAVED_MESSAGE: &str = "Cheque saved successfully!";

// =============================================================================
// Notices
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// Operator-facing message. Success notices expire; error notices stay until
/// the operator retries, replaces the document or resets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
    posted_at: Instant,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
            posted_at: Instant::now(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
            posted_at: Instant::now(),
        }
    }

    /// When the notice stops being shown, if ever.
    pub fn expires_at(&self) -> Option<Instant> {
        match self.level {
            NoticeLevel::Success => Some(self.posted_at + SUCCESS_NOTICE_TTL),
            NoticeLevel::Error => None,
        }
    }

    pub fn is_visible_at(&self, now: Instant) -> bool {
        self.expires_at().map_or(true, |expiry| now < expiry)
    }
}

// =============================================================================
// Requests
// =============================================================================

/// Identity stamped on a dispatched request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTag {
    pub request_id: Uuid,
    pub document_id: Uuid,
}

impl RequestTag {
    fn for_document(document_id: Uuid) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            document_id,
        }
    }
}

/// Result of asking for a new request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch<T> {
    /// A request was issued; run it.
    Started(T),
    /// The same request is already in flight for this document.
    AlreadyPending,
}

impl<T> Dispatch<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Dispatch<U> {
        match self {
            Dispatch::Started(inner) => Dispatch::Started(f(inner)),
            Dispatch::AlreadyPending => Dispatch::AlreadyPending,
        }
    }
}

/// What applying a request outcome did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Fields applied, now in review.
    Extracted { reliable_fields: usize },
    /// Extraction failed; still in preview.
    ExtractionFailed,
    /// Record stored.
    Saved,
    /// Save failed; back in review.
    SaveFailed,
    /// The request was superseded; nothing changed.
    Stale,
}

// =============================================================================
// Workflow
// =============================================================================

/// Single-writer state for one intake session.
///
/// Dropping the workflow drops the document and so releases its preview.
#[derive(Debug)]
pub struct Workflow {
    stage: WorkflowStage,
    document: Option<Document>,
    record: ChequeRecord,
    validator: DocumentValidator,
    pending_extraction: Option<RequestTag>,
    pending_save: Option<RequestTag>,
    notice: Option<Notice>,
}

impl Workflow {
    pub fn new(previews: PreviewStore) -> Self {
        Self {
            stage: WorkflowStage::Upload,
            document: None,
            record: ChequeRecord::new(),
            validator: DocumentValidator::new(previews),
            pending_extraction: None,
            pending_save: None,
            notice: None,
        }
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn record(&self) -> &ChequeRecord {
        &self.record
    }

    pub fn previews(&self) -> &PreviewStore {
        self.validator.previews()
    }

    pub fn is_extracting(&self) -> bool {
        self.pending_extraction.is_some()
    }

    pub fn is_submitting(&self) -> bool {
        self.pending_save.is_some()
    }

    /// The notice still visible at `now`.
    pub fn notice_at(&self, now: Instant) -> Option<&Notice> {
        self.notice.as_ref().filter(|notice| notice.is_visible_at(now))
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice_at(Instant::now())
    }

    /// Drop the stored notice once it has expired.
    pub fn expire_notice(&mut self, now: Instant) {
        if self.notice.as_ref().is_some_and(|notice| !notice.is_visible_at(now)) {
            debug!("Notice expired");
            self.notice = None;
        }
    }

    /// Admit a new document, replacing any current one.
    ///
    /// On success the stage is forced to `Preview`, the record is emptied,
    /// in-flight requests are superseded and the notice is cleared. A rejected
    /// file changes nothing except posting an error notice.
    pub fn accept(&mut self, candidate: Candidate) -> IntakeResult<&Document> {
        let accepted = next_stage(self.stage, Transition::Accept)?;
        let emptied = next_stage(self.stage, Transition::Reset)?;

        match self.validator.accept(candidate, &mut self.document) {
            Ok(_) => {
                self.stage = accepted;
                self.record.clear();
                self.pending_extraction = None;
                self.pending_save = None;
                self.notice = None;
            }
            Err(DocumentError::Rejected(rejected)) => {
                self.notice = Some(Notice::error(rejected.to_string()));
                return Err(DocumentError::Rejected(rejected).into());
            }
            Err(DocumentError::Io(err)) => {
                // The previous document is already gone.
                warn!(error = %err, "Preview could not be written");
                self.stage = emptied;
                self.record.clear();
                self.pending_extraction = None;
                self.pending_save = None;
                self.notice = Some(Notice::error(format!("Could not prepare a preview: {}", err)));
                return Err(DocumentError::Io(err).into());
            }
        }

        self.document.as_ref().ok_or_else(|| WorkflowError::NoDocument.into())
    }

    /// Start an extraction of the current document.
    pub fn begin_extraction(&mut self) -> WorkflowResult<Dispatch<ExtractionTicket>> {
        next_stage(self.stage, Transition::Extract)?;
        let document = self.document.as_ref().ok_or(WorkflowError::NoDocument)?;

        if let Some(pending) = self.pending_extraction {
            if pending.document_id == document.id() {
                debug!(request_id = %pending.request_id, "Extraction already pending");
                return Ok(Dispatch::AlreadyPending);
            }
        }

        let tag = RequestTag::for_document(document.id());
        let upload = DocumentUpload {
            file_name: document.file_name().to_string(),
            media_type: document.media_type(),
            content: document.content(),
        };
        self.pending_extraction = Some(tag);
        self.notice = None;

        info!(
            request_id = %tag.request_id,
            document_id = %tag.document_id,
            "Extraction dispatched"
        );
        Ok(Dispatch::Started(ExtractionTicket::new(tag, upload)))
    }

    /// Apply the outcome of an extraction request.
    pub fn complete_extraction(&mut self, outcome: ExtractionOutcome) -> Completion {
        let ExtractionOutcome { tag, result } = outcome;

        if !self.is_current(self.pending_extraction, tag) {
            debug!(request_id = %tag.request_id, document_id = %tag.document_id, "Dropping stale extraction");
            return Completion::Stale;
        }

        let transition = match result {
            Ok(_) => Transition::Extracted,
            Err(_) => Transition::ExtractionFailed,
        };
        let next = match next_stage(self.stage, transition) {
            Ok(next) => next,
            Err(err) => {
                warn!(request_id = %tag.request_id, error = %err, "Dropping extraction");
                return Completion::Stale;
            }
        };
        self.pending_extraction = None;
        self.stage = next;

        match result {
            Ok(extraction) => {
                self.record.apply_extraction(extraction);
                self.notice = None;
                let reliable_fields = self.record.reliable_field_count();
                info!(request_id = %tag.request_id, reliable_fields, "Extraction applied");
                Completion::Extracted { reliable_fields }
            }
            Err(err) => {
                warn!(request_id = %tag.request_id, error = %err, "Extraction failed");
                self.notice = Some(Notice::error(EXTRACTION_FAILED_MESSAGE));
                Completion::ExtractionFailed
            }
        }
    }

    /// Open the review form without extracting. Supersedes a pending
    /// extraction.
    pub fn enter_review(&mut self) -> WorkflowResult<()> {
        let next = next_stage(self.stage, Transition::EnterReview)?;
        if self.document.is_none() {
            return Err(WorkflowError::NoDocument);
        }

        if let Some(pending) = self.pending_extraction.take() {
            debug!(request_id = %pending.request_id, "Pending extraction superseded by manual entry");
        }
        self.stage = next;
        Ok(())
    }

    /// Operator correction of one field.
    pub fn edit(&mut self, field: FieldName, value: impl Into<String>) -> WorkflowResult<()> {
        next_stage(self.stage, Transition::Edit)?;
        self.record.edit(field, value);
        debug!(field = %field, "Field edited");
        Ok(())
    }

    /// Check the record and start a save.
    pub fn begin_submit(&mut self) -> WorkflowResult<SaveTicket> {
        let next = next_stage(self.stage, Transition::Submit)?;
        let document_id = self.document.as_ref().ok_or(WorkflowError::NoDocument)?.id();

        validate_record(&self.record).map_err(WorkflowError::Incomplete)?;

        let tag = RequestTag::for_document(document_id);
        self.pending_save = Some(tag);
        self.stage = next;
        self.notice = None;

        info!(request_id = %tag.request_id, document_id = %document_id, "Save dispatched");
        Ok(SaveTicket::new(tag, self.record.to_payload()))
    }

    /// Apply the outcome of a save request.
    pub fn complete_submit(&mut self, outcome: SaveOutcome) -> Completion {
        let SaveOutcome { tag, result } = outcome;

        if !self.is_current(self.pending_save, tag) {
            debug!(request_id = %tag.request_id, document_id = %tag.document_id, "Dropping stale save");
            return Completion::Stale;
        }

        let transition = match result {
            Ok(_) => Transition::Saved,
            Err(_) => Transition::SaveFailed,
        };
        let next = match next_stage(self.stage, transition) {
            Ok(next) => next,
            Err(err) => {
                warn!(request_id = %tag.request_id, error = %err, "Dropping save");
                return Completion::Stale;
            }
        };
        self.pending_save = None;
        self.stage = next;

        match result {
            Ok(ack) => {
                info!(request_id = %tag.request_id, message = %ack.message, "Cheque saved");
                self.notice = Some(Notice::success(SAVED_MESSAGE));
                Completion::Saved
            }
            Err(err) => {
                warn!(request_id = %tag.request_id, error = %err, "Save failed");
                self.notice = Some(Notice::error(SAVE_FAILED_MESSAGE));
                Completion::SaveFailed
            }
        }
    }

    /// Back to an empty workflow. Releases the preview.
    pub fn reset(&mut self) -> WorkflowResult<()> {
        let next = next_stage(self.stage, Transition::Reset)?;
        if let Some(document) = self.document.take() {
            debug!(document_id = %document.id(), "Releasing document on reset");
        }
        self.record.clear();
        self.pending_extraction = None;
        self.pending_save = None;
        self.notice = None;
        self.stage = next;
        info!("Workflow reset");
        Ok(())
    }

    fn is_current(&self, pending: Option<RequestTag>, tag: RequestTag) -> bool {
        pending == Some(tag) && self.document.as_ref().map(Document::id) == Some(tag.document_id)
    }
}
