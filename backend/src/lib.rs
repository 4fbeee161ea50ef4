//! # Cheque backend - extraction and persistence service
//!
//! Reference service for the cheque intake client: accepts a scanned cheque,
//! answers the extracted fields with confidence scores, and stores reviewed
//! cheques.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Multipart  │────▶│  Validation │────▶│  Extractor  │──▶ fields + confidence
//! │   upload    │     │ (magic/size)│     │ (black box) │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!
//! ┌─────────────┐     ┌─────────────┐
//! │  JSON save  │────▶│ ChequeStore │──▶ <data_dir>/<id>.json
//! └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cheque_backend::{start_server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     start_server(&ServerConfig::from_env()).await.unwrap();
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`config`] - Server configuration
//! - [`models`] - Cheque fields, confidence, stored cheques
//! - [`validation`] - Upload checks
//! - [`extraction`] - Extraction engine seam
//! - [`store`] - JSON-file cheque store
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Validation
pub mod validation;

// Extraction
pub mod extraction;

// Storage
pub mod store;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ExtractionError, ExtractionResult, ServerError, ServerResult, StoreError, StoreResult,
    UploadError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    ChequeConfidence, ChequeFields, ChequeStatus, ChequeSummary, ExtractedCheque, StoredCheque,
};

// =============================================================================
// Re-exports - Components
// =============================================================================

pub use config::ServerConfig;
pub use extraction::{extract_within, sample_cheque, Extractor, SampleExtractor, Upload};
pub use store::ChequeStore;
pub use validation::{detect_format, validate_upload, DocumentFormat};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, SaveResponse};
pub use api::{build_router, serve, start_server, AppState};
