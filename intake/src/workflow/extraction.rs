//! Extraction orchestrator: runs a dispatched extraction against the service.

use tracing::debug;

use super::context::RequestTag;
use crate::error::{ServiceError, ServiceResult};
use crate::models::ExtractionResult;
use crate::services::{ChequeService, DocumentUpload};

/// A dispatched extraction, ready to run.
#[derive(Debug, Clone)]
pub struct ExtractionTicket {
    tag: RequestTag,
    upload: DocumentUpload,
}

impl ExtractionTicket {
    pub(crate) fn new(tag: RequestTag, upload: DocumentUpload) -> Self {
        Self { tag, upload }
    }

    pub fn tag(&self) -> RequestTag {
        self.tag
    }

    pub fn upload(&self) -> &DocumentUpload {
        &self.upload
    }

    /// Pair a result with this ticket's tag.
    pub fn resolve(self, result: ServiceResult<ExtractionResult>) -> ExtractionOutcome {
        ExtractionOutcome {
            tag: self.tag,
            result,
        }
    }
}

/// A finished extraction, to be fed back to the workflow.
#[derive(Debug)]
pub struct ExtractionOutcome {
    pub tag: RequestTag,
    pub result: ServiceResult<ExtractionResult>,
}

/// Send the document and parse the answer.
///
/// A body that does not parse fails the extraction as a whole; the record is
/// only ever touched with a complete result.
pub async fn run<S>(service: &S, ticket: ExtractionTicket) -> ExtractionOutcome
where
    S: ChequeService + ?Sized,
{
    let ExtractionTicket { tag, upload } = ticket;
    debug!(request_id = %tag.request_id, file = %upload.file_name, "Running extraction");

    let result = service
        .process(upload)
        .await
        .and_then(|body| ExtractionResult::from_json(&body).map_err(ServiceError::from));

    ExtractionOutcome { tag, result }
}
