//! Field reconciliation model.
//!
//! - [`FieldName`] - the ten cheque fields, in record order
//! - [`Field`] - a value plus an optional machine confidence
//! - [`ConfidenceLevel`] - derived high/medium/low classification
//! - [`ChequeRecord`] - the fixed set of ten fields
//! - [`ExtractionResult`] - a fully parsed extraction, ready to apply
//! - [`SavePayload`] - the values sent to the store
//!
//! The record never gains or loses fields. Extraction replaces all ten at
//! once; an operator edit replaces one value and drops its confidence.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::config::{HIGH_CONFIDENCE, RELIABLE_CONFIDENCE};
use crate::error::{MalformedExtraction, WorkflowError};

// =============================================================================
// Field Names
// =============================================================================

/// Number of fields on a cheque record.
pub const FIELD_COUNT: usize = 10;

/// One named piece of cheque information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldName {
    ChequeNumber,
    Amount,
    AmountWords,
    IssueDate,
    DueDate,
    DrawerName,
    BeneficiaryName,
    BankName,
    Rib,
    Iban,
}

impl FieldName {
    /// All fields in record order.
    pub const ALL: [FieldName; FIELD_COUNT] = [
        FieldName::ChequeNumber,
        FieldName::Amount,
        FieldName::AmountWords,
        FieldName::IssueDate,
        FieldName::DueDate,
        FieldName::DrawerName,
        FieldName::BeneficiaryName,
        FieldName::BankName,
        FieldName::Rib,
        FieldName::Iban,
    ];

    /// Wire name (camelCase).
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldName::ChequeNumber => "chequeNumber",
            FieldName::Amount => "amount",
            FieldName::AmountWords => "amountWords",
            FieldName::IssueDate => "issueDate",
            FieldName::DueDate => "dueDate",
            FieldName::DrawerName => "drawerName",
            FieldName::BeneficiaryName => "beneficiaryName",
            FieldName::BankName => "bankName",
            FieldName::Rib => "rib",
            FieldName::Iban => "iban",
        }
    }

    /// Label shown to the operator.
    pub fn label(&self) -> &'static str {
        match self {
            FieldName::ChequeNumber => "Cheque number",
            FieldName::Amount => "Amount (TND)",
            FieldName::AmountWords => "Amount in words",
            FieldName::IssueDate => "Issue date",
            FieldName::DueDate => "Due date",
            FieldName::DrawerName => "Drawer",
            FieldName::BeneficiaryName => "Beneficiary",
            FieldName::BankName => "Issuing bank",
            FieldName::Rib => "RIB",
            FieldName::Iban => "IBAN",
        }
    }

    /// Whether the record may be saved with this field empty.
    pub fn is_required(&self) -> bool {
        !matches!(self, FieldName::DueDate | FieldName::Rib | FieldName::Iban)
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldName {
    type Err = WorkflowError;

    /// Accepts the wire name, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FieldName::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| WorkflowError::UnknownField(wanted.to_string()))
    }
}

// =============================================================================
// Confidence
// =============================================================================

/// Trust level derived from a confidence score. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceLevel {
    High,
    Medium,
    Low,
}

impl ConfidenceLevel {
    /// `High` at 90 and above, `Medium` from 70 to 89, `Low` otherwise
    /// (including no score at all).
    pub fn classify(score: Option<u8>) -> Self {
        match score {
            Some(s) if s >= HIGH_CONFIDENCE => ConfidenceLevel::High,
            Some(s) if s >= RELIABLE_CONFIDENCE => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::High => "high",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Field
// =============================================================================

/// A field value with the extraction engine's confidence, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Field {
    pub value: String,
    pub confidence: Option<u8>,
}

impl Field {
    pub fn new(value: impl Into<String>, confidence: Option<u8>) -> Self {
        Self {
            value: value.into(),
            confidence,
        }
    }

    /// Confidence of 70 or more.
    pub fn is_reliable(&self) -> bool {
        self.confidence.is_some_and(|c| c >= RELIABLE_CONFIDENCE)
    }

    pub fn level(&self) -> ConfidenceLevel {
        ConfidenceLevel::classify(self.confidence)
    }
}

// =============================================================================
// Extraction Result
// =============================================================================

/// A complete extraction, parsed and checked before it touches a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractionResult {
    fields: [Field; FIELD_COUNT],
}

impl ExtractionResult {
    /// Parse an extraction response body.
    ///
    /// The body holds the ten field names as strings plus a `confidence`
    /// object mapping the same names to integers 0-100. Missing or null
    /// entries become an empty value and no confidence; unknown keys are
    /// ignored. Anything else of the wrong shape rejects the whole result.
    pub fn from_json(body: &Value) -> Result<Self, MalformedExtraction> {
        let object = body.as_object().ok_or(MalformedExtraction::NotAnObject)?;

        let confidence = match object.get("confidence") {
            None | Some(Value::Null) => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => return Err(MalformedExtraction::InvalidConfidenceMap),
        };

        let mut result = ExtractionResult::default();
        for name in FieldName::ALL {
            let value = match object.get(name.as_str()) {
                None | Some(Value::Null) => String::new(),
                Some(Value::String(s)) => s.clone(),
                Some(_) => return Err(MalformedExtraction::InvalidValue(name)),
            };

            let score = match confidence.and_then(|map| map.get(name.as_str())) {
                None | Some(Value::Null) => None,
                Some(raw) => Some(parse_score(name, raw)?),
            };

            result.fields[name.index()] = Field::new(value, score);
        }

        Ok(result)
    }

    /// Build a result from explicit values, mainly for tests and mocks.
    pub fn from_fields(entries: impl IntoIterator<Item = (FieldName, Field)>) -> Self {
        let mut result = ExtractionResult::default();
        for (name, field) in entries {
            result.fields[name.index()] = field;
        }
        result
    }

    pub fn get(&self, name: FieldName) -> &Field {
        &self.fields[name.index()]
    }
}

fn parse_score(field: FieldName, raw: &Value) -> Result<u8, MalformedExtraction> {
    raw.as_u64()
        .filter(|score| *score <= 100)
        .map(|score| score as u8)
        .ok_or_else(|| MalformedExtraction::InvalidConfidence {
            field,
            raw: raw.to_string(),
        })
}

// =============================================================================
// Cheque Record
// =============================================================================

/// The ten cheque fields. The set of names is fixed; only values and
/// confidences change.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChequeRecord {
    fields: [Field; FIELD_COUNT],
}

impl ChequeRecord {
    /// An empty record: every value blank, no confidence.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: FieldName) -> &Field {
        &self.fields[name.index()]
    }

    /// Fields in record order.
    pub fn iter(&self) -> impl Iterator<Item = (FieldName, &Field)> + '_ {
        FieldName::ALL.into_iter().zip(self.fields.iter())
    }

    /// Replace all ten fields with an extraction. All or nothing: the result
    /// was fully checked when it was parsed.
    pub fn apply_extraction(&mut self, result: ExtractionResult) {
        self.fields = result.fields;
    }

    /// Parse and apply a raw extraction body. On error the record is left
    /// exactly as it was.
    pub fn apply_extraction_json(&mut self, body: &Value) -> Result<(), MalformedExtraction> {
        let result = ExtractionResult::from_json(body)?;
        self.apply_extraction(result);
        Ok(())
    }

    /// Operator edit. A manual value carries no machine confidence.
    pub fn edit(&mut self, name: FieldName, value: impl Into<String>) {
        let field = &mut self.fields[name.index()];
        field.value = value.into();
        field.confidence = None;
    }

    /// Number of fields with confidence of 70 or more.
    pub fn reliable_field_count(&self) -> usize {
        self.fields.iter().filter(|field| field.is_reliable()).count()
    }

    /// Back to the empty state.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn is_empty(&self) -> bool {
        self.fields.iter().all(|field| field.value.is_empty())
    }

    /// Values only; confidences are not persisted.
    pub fn to_payload(&self) -> SavePayload {
        let value = |name: FieldName| self.get(name).value.clone();
        SavePayload {
            cheque_number: value(FieldName::ChequeNumber),
            amount: value(FieldName::Amount),
            amount_words: value(FieldName::AmountWords),
            issue_date: value(FieldName::IssueDate),
            due_date: value(FieldName::DueDate),
            drawer_name: value(FieldName::DrawerName),
            beneficiary_name: value(FieldName::BeneficiaryName),
            bank_name: value(FieldName::BankName),
            rib: value(FieldName::Rib),
            iban: value(FieldName::Iban),
        }
    }
}

// =============================================================================
// Wire Types
// =============================================================================

/// Body of `POST /cheques/save`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
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

/// Answer of `POST /cheques/save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveAck {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Processing status of a stored cheque.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChequeStatus {
    Validated,
    Pending,
    Rejected,
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for ChequeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChequeStatus::Validated => f.write_str("validated"),
            ChequeStatus::Pending => f.write_str("pending"),
            ChequeStatus::Rejected => f.write_str("rejected"),
            ChequeStatus::Other(s) => f.write_str(s),
        }
    }
}

/// One entry of `GET /cheques`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChequeSummary {
    pub id: u64,
    pub cheque_number: String,
    pub amount: String,
    pub status: ChequeStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_body() -> Value {
        json!({
            "chequeNumber": "123456789",
            "amount": "1500.500",
            "amountWords": "Mille cinq cents dinars et cinq cents millimes",
            "issueDate": "2024-01-15",
            "dueDate": "2024-02-15",
            "drawerName": "Mohamed Ali",
            "beneficiaryName": "Société Tunisienne",
            "bankName": "BIAT",
            "rib": "12345678901234567890",
            "iban": "TN59 1234 5678 9012 3456 7890",
            "confidence": {
                "chequeNumber": 95,
                "amount": 98,
                "amountWords": 85,
                "issueDate": 92,
                "dueDate": 88,
                "drawerName": 75,
                "beneficiaryName": 70,
                "bankName": 96,
                "rib": 45,
                "iban": 40
            }
        })
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(ConfidenceLevel::classify(Some(90)), ConfidenceLevel::High);
        assert_eq!(ConfidenceLevel::classify(Some(89)), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::classify(Some(70)), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::classify(Some(69)), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::classify(None), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::classify(Some(100)), ConfidenceLevel::High);
    }

    #[test]
    fn test_new_record_is_empty() {
        let record = ChequeRecord::new();
        assert_eq!(record.iter().count(), FIELD_COUNT);
        assert!(record.is_empty());
        assert!(record.iter().all(|(_, f)| f.value.is_empty() && f.confidence.is_none()));
        assert_eq!(record.reliable_field_count(), 0);
    }

    #[test]
    fn test_apply_sample_extraction() {
        let mut record = ChequeRecord::new();
        record.apply_extraction_json(&sample_body()).unwrap();

        assert_eq!(record.get(FieldName::BankName).value, "BIAT");
        assert_eq!(record.get(FieldName::Rib).confidence, Some(45));
        // 95, 98, 85, 92, 88, 75, 70, 96 are reliable; 45 and 40 are not.
        assert_eq!(record.reliable_field_count(), 8);
    }

    #[test]
    fn test_missing_fields_default_to_empty() {
        let mut record = ChequeRecord::new();
        record
            .apply_extraction_json(&json!({ "amount": "12.000", "confidence": { "amount": 91 } }))
            .unwrap();

        assert_eq!(record.get(FieldName::Amount), &Field::new("12.000", Some(91)));
        assert_eq!(record.get(FieldName::Iban), &Field::default());
        assert_eq!(record.reliable_field_count(), 1);
    }

    #[test]
    fn test_missing_confidence_map_means_absent() {
        let mut body = sample_body();
        body.as_object_mut().unwrap().remove("confidence");

        let mut record = ChequeRecord::new();
        record.apply_extraction_json(&body).unwrap();
        assert_eq!(record.get(FieldName::ChequeNumber).value, "123456789");
        assert!(record.iter().all(|(_, f)| f.confidence.is_none()));
    }

    #[test]
    fn test_malformed_extraction_leaves_record_untouched() {
        let mut record = ChequeRecord::new();
        record.apply_extraction_json(&sample_body()).unwrap();
        record.edit(FieldName::DrawerName, "Operator Value");
        let before = record.clone();

        let mut bad_value = sample_body();
        bad_value["iban"] = json!(42);
        let mut bad_score = sample_body();
        bad_score["confidence"]["iban"] = json!(140);
        let mut bad_map = sample_body();
        bad_map["confidence"] = json!([1, 2, 3]);

        assert_eq!(
            record.apply_extraction_json(&bad_value),
            Err(MalformedExtraction::InvalidValue(FieldName::Iban))
        );
        assert!(matches!(
            record.apply_extraction_json(&bad_score),
            Err(MalformedExtraction::InvalidConfidence { field: FieldName::Iban, .. })
        ));
        assert_eq!(
            record.apply_extraction_json(&bad_map),
            Err(MalformedExtraction::InvalidConfidenceMap)
        );
        assert_eq!(
            record.apply_extraction_json(&json!("not an object")),
            Err(MalformedExtraction::NotAnObject)
        );
        assert_eq!(record, before);
    }

    #[test]
    fn test_edit_clears_confidence() {
        let mut record = ChequeRecord::new();
        record.apply_extraction_json(&sample_body()).unwrap();

        for name in FieldName::ALL {
            record.edit(name, "changed");
            assert_eq!(record.get(name).confidence, None);
            assert_eq!(record.get(name).value, "changed");
        }
        assert_eq!(record.reliable_field_count(), 0);
    }

    #[test]
    fn test_edit_on_empty_field_has_no_confidence() {
        let mut record = ChequeRecord::new();
        record.edit(FieldName::Rib, "0987");
        assert_eq!(record.get(FieldName::Rib).level(), ConfidenceLevel::Low);
    }

    #[test]
    fn test_field_name_parsing() {
        assert_eq!("rib".parse::<FieldName>().unwrap(), FieldName::Rib);
        assert_eq!("ChequeNumber".parse::<FieldName>().unwrap(), FieldName::ChequeNumber);
        assert_eq!(
            "signature".parse::<FieldName>(),
            Err(WorkflowError::UnknownField("signature".into()))
        );
    }

    #[test]
    fn test_payload_has_values_only() {
        let mut record = ChequeRecord::new();
        record.apply_extraction_json(&sample_body()).unwrap();

        let json = serde_json::to_value(record.to_payload()).unwrap();
        let object = json.as_object().unwrap();
        assert_eq!(object.len(), FIELD_COUNT);
        assert!(object.get("confidence").is_none());
        assert_eq!(json["beneficiaryName"], "Société Tunisienne");
    }

    #[test]
    fn test_summary_status_tolerates_unknown() {
        let list: Vec<ChequeSummary> = serde_json::from_value(json!([
            { "id": 1, "chequeNumber": "123456", "amount": "1500", "status": "validated" },
            { "id": 2, "chequeNumber": "789012", "amount": "3200", "status": "archived" }
        ]))
        .unwrap();

        assert_eq!(list[0].status, ChequeStatus::Validated);
        assert_eq!(list[1].status, ChequeStatus::Other("archived".into()));
    }
}
