//! In-process service with canned answers.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use super::{ChequeService, DocumentUpload};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{ChequeStatus, ChequeSummary, SaveAck, SavePayload};

const MOCK_ENDPOINT: &str = "mock://cheques";

/// Extraction body for the sample cheque.
pub fn sample_extraction() -> Value {
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

/// Service double. Every call waits `latency` on the tokio clock, so paused
/// tests control ordering precisely.
#[derive(Debug)]
pub struct MockChequeService {
    latency: Duration,
    body: Value,
    fail_process: AtomicBool,
    fail_save: AtomicBool,
    refuse_save: AtomicBool,
    process_calls: AtomicUsize,
    saved: Mutex<Vec<SavePayload>>,
}

impl Default for MockChequeService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChequeService {
    pub fn new() -> Self {
        Self {
            latency: Duration::ZERO,
            body: sample_extraction(),
            fail_process: AtomicBool::new(false),
            fail_save: AtomicBool::new(false),
            refuse_save: AtomicBool::new(false),
            process_calls: AtomicUsize::new(0),
            saved: Mutex::new(Vec::new()),
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Answer extractions with `body` instead of the sample cheque.
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = body;
        self
    }

    /// Make extraction calls fail at the transport level.
    pub fn fail_extraction(&self, fail: bool) {
        self.fail_process.store(fail, Ordering::SeqCst);
    }

    /// Make save calls fail at the transport level.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_save.store(fail, Ordering::SeqCst);
    }

    /// Make save calls answer `success: false`.
    pub fn refuse_saves(&self, refuse: bool) {
        self.refuse_save.store(refuse, Ordering::SeqCst);
    }

    pub fn process_calls(&self) -> usize {
        self.process_calls.load(Ordering::SeqCst)
    }

    /// Payloads stored so far.
    pub fn saved(&self) -> Vec<SavePayload> {
        self.saved.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    async fn wait(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    fn unavailable(operation: &str) -> ServiceError {
        ServiceError::Transport {
            endpoint: format!("{}/{}", MOCK_ENDPOINT, operation),
            message: "service unavailable".to_string(),
        }
    }
}

#[async_trait]
impl ChequeService for MockChequeService {
    async fn process(&self, upload: DocumentUpload) -> ServiceResult<Value> {
        self.process_calls.fetch_add(1, Ordering::SeqCst);
        debug!(file = %upload.file_name, size = upload.content.len(), "Mock extraction");
        self.wait().await;

        if self.fail_process.load(Ordering::SeqCst) {
            return Err(Self::unavailable("process"));
        }
        Ok(self.body.clone())
    }

    async fn save(&self, payload: &SavePayload) -> ServiceResult<SaveAck> {
        self.wait().await;

        if self.fail_save.load(Ordering::SeqCst) {
            return Err(Self::unavailable("save"));
        }
        if self.refuse_save.load(Ordering::SeqCst) {
            return Ok(SaveAck {
                success: false,
                message: "Cheque refused".to_string(),
            });
        }

        self.saved
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(payload.clone());
        Ok(SaveAck {
            success: true,
            message: "Cheque saved".to_string(),
        })
    }

    async fn list(&self) -> ServiceResult<Vec<ChequeSummary>> {
        self.wait().await;

        let saved = self.saved.lock().unwrap_or_else(|e| e.into_inner());
        Ok(saved
            .iter()
            .zip(1u64..)
            .map(|(payload, id)| ChequeSummary {
                id,
                cheque_number: payload.cheque_number.clone(),
                amount: payload.amount.clone(),
                status: ChequeStatus::Pending,
            })
            .collect())
    }
}
