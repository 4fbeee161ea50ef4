//! Domain models for the cheque backend.
//!
//! - [`ChequeFields`] - the ten cheque values, as saved
//! - [`ChequeConfidence`] - per-field extraction confidence
//! - [`ExtractedCheque`] - extraction answer: values plus confidence
//! - [`StoredCheque`] - a persisted cheque with id and status
//! - [`ChequeStatus`] - processing status of a stored cheque
//! - [`ChequeSummary`] - list entry

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Cheque Values
// =============================================================================

/// The ten cheque fields. Missing members deserialize as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChequeFields {
    pub cheque_number: String,
    pub amount: String,
    pub amount_words: String,
    pub issue_date: String,
    pub due_date: String,
    pub drawer_name: String,
    pub beneficiary_name: String,
    pub bank_name: String,
    pub rib: String,
    pub iban: String,
}

impl ChequeFields {
    /// Values a stored cheque cannot do without.
    pub fn check_required(&self) -> Result<(), &'static str> {
        if self.cheque_number.trim().is_empty() {
            return Err("chequeNumber");
        }
        if self.amount.trim().is_empty() {
            return Err("amount");
        }
        Ok(())
    }
}

/// Confidence 0-100 per field; absent entries are omitted from JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChequeConfidence {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cheque_number: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_words: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_date: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawer_name: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub beneficiary_name: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rib: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iban: Option<u8>,
}

/// Body of a successful `POST /api/cheques/process`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedCheque {
    #[serde(flatten)]
    pub fields: ChequeFields,
    pub confidence: ChequeConfidence,
}

// =============================================================================
// Stored Cheques
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChequeStatus {
    Validated,
    Pending,
    Rejected,
}

impl fmt::Display for ChequeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChequeStatus::Validated => f.write_str("validated"),
            ChequeStatus::Pending => f.write_str("pending"),
            ChequeStatus::Rejected => f.write_str("rejected"),
        }
    }
}

/// A cheque on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCheque {
    pub id: u64,
    #[serde(flatten)]
    pub fields: ChequeFields,
    pub status: ChequeStatus,
    /// RFC 3339 creation time.
    pub created_at: String,
}

/// Entry of `GET /api/cheques`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChequeSummary {
    pub id: u64,
    pub cheque_number: String,
    pub amount: String,
    pub status: ChequeStatus,
}

impl From<&StoredCheque> for ChequeSummary {
    fn from(cheque: &StoredCheque) -> Self {
        Self {
            id: cheque.id,
            cheque_number: cheque.fields.cheque_number.clone(),
            amount: cheque.fields.amount.clone(),
            status: cheque.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extracted_cheque_wire_shape() {
        let cheque = ExtractedCheque {
            fields: ChequeFields {
                cheque_number: "42".into(),
                ..Default::default()
            },
            confidence: ChequeConfidence {
                cheque_number: Some(95),
                ..Default::default()
            },
        };

        let value = serde_json::to_value(&cheque).unwrap();
        assert_eq!(value["chequeNumber"], "42");
        assert_eq!(value["iban"], "");
        assert_eq!(value["confidence"], json!({ "chequeNumber": 95 }));
    }

    #[test]
    fn test_fields_tolerate_missing_members() {
        let fields: ChequeFields = serde_json::from_value(json!({ "chequeNumber": "1", "amount": "2" })).unwrap();
        assert_eq!(fields.rib, "");
        assert!(fields.check_required().is_ok());
        assert_eq!(ChequeFields::default().check_required(), Err("chequeNumber"));
    }
}
