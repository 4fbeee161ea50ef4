//! Extraction engine seam.
//!
//! The recognition itself is a black box behind [`Extractor`]. The bundled
//! [`SampleExtractor`] answers every document with the same sample cheque
//! after a configurable delay, which is enough to drive the intake workflow
//! end to end.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cheque_backend::extraction::{Extractor, SampleExtractor, Upload};
//!
//! let extractor = SampleExtractor::new(std::time::Duration::from_millis(500));
//! let cheque = extractor.extract(&upload).await?;
//! ```

use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{ExtractionError, ExtractionResult};
use crate::models::{ChequeConfidence, ChequeFields, ExtractedCheque};
use crate::validation::DocumentFormat;

/// A validated document handed to the engine.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub format: DocumentFormat,
    pub bytes: Vec<u8>,
}

/// Reads cheque fields off a document.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(&self, upload: &Upload) -> ExtractionResult<ExtractedCheque>;

    /// Name shown in logs and on `/health`.
    fn name(&self) -> &'static str;
}

/// Run `extractor` on `upload`, giving up after `limit`.
pub async fn extract_within(
    extractor: &dyn Extractor,
    upload: &Upload,
    limit: Duration,
) -> ExtractionResult<ExtractedCheque> {
    match tokio::time::timeout(limit, extractor.extract(upload)).await {
        Ok(result) => result,
        Err(_) => {
            warn!(
                file = %upload.file_name,
                extractor = extractor.name(),
                limit_ms = limit.as_millis() as u64,
                "Extraction timed out"
            );
            Err(ExtractionError::Timeout)
        }
    }
}

/// Canned extractor returning the sample cheque.
#[derive(Debug, Clone)]
pub struct SampleExtractor {
    delay: Duration,
}

impl SampleExtractor {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for SampleExtractor {
    fn default() -> Self {
        Self::new(Duration::ZERO)
    }
}

#[async_trait]
impl Extractor for SampleExtractor {
    async fn extract(&self, upload: &Upload) -> ExtractionResult<ExtractedCheque> {
        debug!(
            file = %upload.file_name,
            format = %upload.format,
            size = upload.bytes.len(),
            delay_ms = self.delay.as_millis() as u64,
            "Sample extraction"
        );

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let cheque = sample_cheque();
        info!(file = %upload.file_name, cheque_number = %cheque.fields.cheque_number, "Extraction done");
        Ok(cheque)
    }

    fn name(&self) -> &'static str {
        "sample"
    }
}

/// The sample cheque and its confidence scores.
pub fn sample_cheque() -> ExtractedCheque {
    ExtractedCheque {
        fields: ChequeFields {
            cheque_number: "123456789".into(),
            amount: "1500.500".into(),
            amount_words: "Mille cinq cents dinars et cinq cents millimes".into(),
            issue_date: "2024-01-15".into(),
            due_date: "2024-02-15".into(),
            drawer_name: "Mohamed Ali".into(),
            beneficiary_name: "Société Tunisienne".into(),
            bank_name: "BIAT".into(),
            rib: "12345678901234567890".into(),
            iban: "TN59 1234 5678 9012 3456 7890".into(),
        },
        confidence: ChequeConfidence {
            cheque_number: Some(95),
            amount: Some(98),
            amount_words: Some(85),
            issue_date: Some(92),
            due_date: Some(88),
            drawer_name: Some(75),
            beneficiary_name: Some(70),
            bank_name: Some(96),
            rib: Some(45),
            iban: Some(40),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sample_extractor_answers_sample() {
        let upload = Upload {
            file_name: "cheque.png".into(),
            format: DocumentFormat::Png,
            bytes: b"\x89PNG".to_vec(),
        };

        let cheque = SampleExtractor::default().extract(&upload).await.unwrap();
        assert_eq!(cheque, sample_cheque());
        assert_eq!(cheque.confidence.rib, Some(45));
    }

    #[tokio::test]
    async fn test_slow_extraction_times_out() {
        let upload = Upload {
            file_name: "cheque.pdf".into(),
            format: DocumentFormat::Pdf,
            bytes: b"%PDF-1.7".to_vec(),
        };
        let slow = SampleExtractor::new(Duration::from_secs(60));

        let result = extract_within(&slow, &upload, Duration::from_millis(20)).await;
        assert!(matches!(result, Err(ExtractionError::Timeout)));

        let fast = SampleExtractor::default();
        assert!(extract_within(&fast, &upload, Duration::from_millis(20)).await.is_ok());
    }
}
