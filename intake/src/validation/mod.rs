//! Submit-time checks on a cheque record.
//!
//! These mirror what the entry form enforces before a save is attempted:
//!
//! - required fields must not be blank (`dueDate`, `rib` and `iban` are optional)
//! - `amount` is a number as a browser number input reads it (optional
//!   minus sign, optional leading point, optional exponent) on a step of
//!   0.001 (dinars and millimes)
//! - `issueDate` and `dueDate`, when present, are `YYYY-MM-DD`
//!
//! No stricter rule is applied; in particular RIB and IBAN formats are not
//! checked.
//!
//! # Example
//!
//! ```rust,ignore
//! use cheque_intake::{validate_record, ChequeRecord};
//!
//! let record = ChequeRecord::new();
//! let issues = validate_record(&record).unwrap_err();
//! assert_eq!(issues.len(), 7);
//! ```

use chrono::NaiveDate;
use std::fmt;

use crate::models::{ChequeRecord, FieldName};

/// Date format used by the issue and due date fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Amounts are whole multiples of 10^-AMOUNT_SCALE.
const AMOUNT_SCALE: i32 = 3;

/// What is wrong with a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// Required and blank.
    Missing,
    /// Not a decimal amount.
    InvalidAmount,
    /// Not a calendar date.
    InvalidDate,
}

/// A single validation problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: FieldName,
    pub kind: IssueKind,
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            IssueKind::Missing => write!(f, "{} is required", self.field),
            IssueKind::InvalidAmount => write!(f, "{} must be a decimal amount", self.field),
            IssueKind::InvalidDate => write!(f, "{} must be a YYYY-MM-DD date", self.field),
        }
    }
}

/// Check a record before it is sent to the store.
///
/// # Returns
/// * `Ok(())` if the record can be saved
/// * `Err(issues)` listing every problem, in field order
pub fn validate_record(record: &ChequeRecord) -> Result<(), Vec<FieldIssue>> {
    let mut issues = Vec::new();

    for (name, field) in record.iter() {
        let value = field.value.trim();

        if value.is_empty() {
            if name.is_required() {
                issues.push(FieldIssue { field: name, kind: IssueKind::Missing });
            }
            continue;
        }

        let kind = match name {
            FieldName::Amount if !is_valid_amount(value) => Some(IssueKind::InvalidAmount),
            FieldName::IssueDate | FieldName::DueDate if !is_valid_date(value) => {
                Some(IssueKind::InvalidDate)
            }
            _ => None,
        };

        if let Some(kind) = kind {
            issues.push(FieldIssue { field: name, kind });
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

/// Quick check, `true` when [`validate_record`] passes.
pub fn is_valid(record: &ChequeRecord) -> bool {
    validate_record(record).is_ok()
}

fn is_valid_amount(value: &str) -> bool {
    if !is_number_literal(value) {
        return false;
    }

    match value.parse::<f64>() {
        Ok(amount) if amount.is_finite() => {
            let scaled = amount * 10f64.powi(AMOUNT_SCALE);
            (scaled - scaled.round()).abs() < 1e-6
        }
        _ => false,
    }
}

/// `-? (digits | digits? '.' digits) ([eE] [+-]? digits)?`
fn is_number_literal(value: &str) -> bool {
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());

    let unsigned = value.strip_prefix('-').unwrap_or(value);
    let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
        Some(at) => (&unsigned[..at], Some(&unsigned[at + 1..])),
        None => (unsigned, None),
    };

    let mantissa_ok = match mantissa.split_once('.') {
        Some((whole, fraction)) => (whole.is_empty() || digits(whole)) && digits(fraction),
        None => digits(mantissa),
    };
    let exponent_ok = exponent.map_or(true, |e| digits(e.strip_prefix(['+', '-']).unwrap_or(e)));

    mantissa_ok && exponent_ok
}

fn is_valid_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_record() -> ChequeRecord {
        let mut record = ChequeRecord::new();
        record.edit(FieldName::ChequeNumber, "123456789");
        record.edit(FieldName::Amount, "1500.500");
        record.edit(FieldName::AmountWords, "Mille cinq cents dinars");
        record.edit(FieldName::IssueDate, "2024-01-15");
        record.edit(FieldName::DrawerName, "Mohamed Ali");
        record.edit(FieldName::BeneficiaryName, "Société Tunisienne");
        record.edit(FieldName::BankName, "BIAT");
        record
    }

    #[test]
    fn test_optional_fields_may_be_blank() {
        let record = complete_record();
        assert!(record.get(FieldName::Rib).value.is_empty());
        assert!(record.get(FieldName::Iban).value.is_empty());
        assert!(is_valid(&record));
    }

    #[test]
    fn test_empty_record_lists_required_fields() {
        let issues = validate_record(&ChequeRecord::new()).unwrap_err();
        let missing: Vec<FieldName> = issues.iter().map(|i| i.field).collect();
        assert_eq!(
            missing,
            vec![
                FieldName::ChequeNumber,
                FieldName::Amount,
                FieldName::AmountWords,
                FieldName::IssueDate,
                FieldName::DrawerName,
                FieldName::BeneficiaryName,
                FieldName::BankName,
            ]
        );
        assert!(issues.iter().all(|i| i.kind == IssueKind::Missing));
    }

    #[test]
    fn test_amount_format() {
        for good in ["1500", "1500.5", "1500.500", "0.001", "-3", ".5", "1e3", "2.5E+1", "1500.5000"] {
            assert!(is_valid_amount(good), "{good}");
        }
        for bad in ["1500.5001", "0.0005", "12,5", "abc", "5.", "1e", "+3", "--3", "inf", "NaN"] {
            assert!(!is_valid_amount(bad), "{bad}");
        }
    }

    #[test]
    fn test_dates_are_checked_when_present() {
        let mut record = complete_record();
        record.edit(FieldName::DueDate, "15/02/2024");
        record.edit(FieldName::IssueDate, "2024-02-30");

        let issues = validate_record(&record).unwrap_err();
        assert_eq!(
            issues,
            vec![
                FieldIssue { field: FieldName::IssueDate, kind: IssueKind::InvalidDate },
                FieldIssue { field: FieldName::DueDate, kind: IssueKind::InvalidDate },
            ]
        );
        assert_eq!(issues[1].to_string(), "dueDate must be a YYYY-MM-DD date");
    }
}
