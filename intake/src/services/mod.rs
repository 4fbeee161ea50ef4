//! The extraction/persistence service seam.
//!
//! [`ChequeService`] is what the workflow talks to. [`HttpChequeService`]
//! speaks the HTTP contract; [`MockChequeService`] answers in-process with a
//! sample cheque and is used offline and in tests.

pub mod client;
pub mod mock;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::document::MediaType;
use crate::error::ServiceResult;
use crate::models::{ChequeSummary, SaveAck, SavePayload};

pub use client::HttpChequeService;
pub use mock::{sample_extraction, MockChequeService};

/// The document as sent for extraction.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub media_type: MediaType,
    pub content: Arc<[u8]>,
}

/// Remote extraction and persistence.
#[async_trait]
pub trait ChequeService: Send + Sync {
    /// `POST /cheques/process`. Returns the raw body; parsing belongs to the
    /// caller so that a malformed answer is handled in one place.
    async fn process(&self, upload: DocumentUpload) -> ServiceResult<Value>;

    /// `POST /cheques/save`.
    async fn save(&self, payload: &SavePayload) -> ServiceResult<SaveAck>;

    /// `GET /cheques`.
    async fn list(&self) -> ServiceResult<Vec<ChequeSummary>>;
}
