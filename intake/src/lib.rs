//! # Cheque intake - extraction and reconciliation workflow
//!
//! Guides one cheque scan (JPEG, PNG or PDF) through machine extraction and
//! operator correction before the record is stored.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────┐   ┌────────────┐   ┌──────────┐   ┌──────────┐
//! │  Upload  │──▶│ Preview  │──▶│ Extraction │──▶│  Review  │──▶│  Saved   │
//! │ (checks) │   │ (temp)   │   │  (service) │   │ (edits)  │   │ (notice) │
//! └──────────┘   └──────────┘   └────────────┘   └──────────┘   └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use cheque_intake::{Candidate, MockChequeService, PreviewStore, Session};
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut session = Session::new(Arc::new(MockChequeService::new()), PreviewStore::default());
//!     session.accept(Candidate::from_path("cheque.jpg".as_ref()).unwrap()).unwrap();
//!     session.extract().unwrap();
//!     println!("{:?}", session.settle().await);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`config`] - Constants and environment configuration
//! - [`models`] - Fields, confidences and the cheque record
//! - [`validation`] - Submit-time record checks
//! - [`document`] - File validation and preview lifecycle
//! - [`workflow`] - Stages, orchestration and the async session
//! - [`services`] - HTTP and in-process cheque services
//! - [`logging`] - Tracing subscriber setup

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Validation
pub mod validation;

// Documents
pub mod document;

// Workflow
pub mod workflow;

// Services
pub mod services;

pub mod logging;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    DocumentError, FileRejected, IntakeError, IntakeResult, MalformedExtraction, RejectionReason,
    ServiceError, ServiceResult, WorkflowError, WorkflowResult,
};

// =============================================================================
// Re-exports - Configuration
// =============================================================================

pub use config::{IntakeConfig, MAX_FILE_SIZE, SUCCESS_NOTICE_TTL};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ChequeRecord, ChequeStatus, ChequeSummary, ConfidenceLevel, ExtractionResult, Field, FieldName,
    SaveAck, SavePayload,
};

pub use validation::{is_valid, validate_record, FieldIssue, IssueKind};

// =============================================================================
// Re-exports - Documents
// =============================================================================

pub use document::{Candidate, Document, DocumentValidator, MediaType, PreviewHandle, PreviewStore};

// =============================================================================
// Re-exports - Workflow
// =============================================================================

pub use workflow::{Completion, Dispatch, Notice, NoticeLevel, RequestTag, Session, Workflow, WorkflowStage};

// =============================================================================
// Re-exports - Services
// =============================================================================

pub use services::{ChequeService, DocumentUpload, HttpChequeService, MockChequeService};
