//! REST API types for the intake client.
//!
//! Extraction answers are [`ExtractedCheque`](crate::models::ExtractedCheque)
//! as is; list entries are [`ChequeSummary`](crate::models::ChequeSummary).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Answer of `POST /api/cheques/save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
    /// Id of the stored cheque.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
}

impl SaveResponse {
    pub fn saved(id: u64) -> Self {
        Self {
            success: true,
            message: format!("Cheque {} saved", id),
            id: Some(id),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            id: None,
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "success": false,
        "error": error,
    })
}
