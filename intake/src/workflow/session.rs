//! Async driver around a [`Workflow`].
//!
//! Service calls run as spawned tasks and report back over a channel. Only
//! the session applies them, one at a time in arrival order, so the workflow
//! keeps a single writer while the operator goes on working.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::debug;

use super::context::{Completion, Dispatch, Notice, RequestTag, Workflow};
use super::extraction::{self, ExtractionOutcome};
use super::submission::{self, SaveOutcome};
use crate::document::{Candidate, Document, PreviewStore};
use crate::error::{IntakeResult, WorkflowResult};
use crate::models::FieldName;
use crate::services::ChequeService;

enum Message {
    Extraction(ExtractionOutcome),
    Save(SaveOutcome),
}

/// One operator session against a [`ChequeService`].
pub struct Session<S: ChequeService + 'static> {
    workflow: Workflow,
    service: Arc<S>,
    tx: mpsc::UnboundedSender<Message>,
    rx: mpsc::UnboundedReceiver<Message>,
    in_flight: usize,
}

impl<S: ChequeService + 'static> Session<S> {
    pub fn new(service: Arc<S>, previews: PreviewStore) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            workflow: Workflow::new(previews),
            service,
            tx,
            rx,
            in_flight: 0,
        }
    }

    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    pub fn service(&self) -> &Arc<S> {
        &self.service
    }

    /// Requests spawned and not yet settled, stale ones included.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn accept(&mut self, candidate: Candidate) -> IntakeResult<&Document> {
        self.workflow.accept(candidate)
    }

    /// Dispatch an extraction and return at once.
    pub fn extract(&mut self) -> WorkflowResult<Dispatch<RequestTag>> {
        let dispatch = self.workflow.begin_extraction()?;

        Ok(dispatch.map(|ticket| {
            let tag = ticket.tag();
            let service = Arc::clone(&self.service);
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let outcome = extraction::run(service.as_ref(), ticket).await;
                if tx.send(Message::Extraction(outcome)).is_err() {
                    debug!("Session gone before extraction finished");
                }
            });
            self.in_flight += 1;
            tag
        }))
    }

    pub fn enter_review(&mut self) -> WorkflowResult<()> {
        self.workflow.enter_review()
    }

    pub fn edit(&mut self, field: FieldName, value: impl Into<String>) -> WorkflowResult<()> {
        self.workflow.edit(field, value)
    }

    /// Dispatch a save and return at once.
    pub fn submit(&mut self) -> WorkflowResult<RequestTag> {
        let ticket = self.workflow.begin_submit()?;
        let tag = ticket.tag();

        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let outcome = submission::run(service.as_ref(), ticket).await;
            if tx.send(Message::Save(outcome)).is_err() {
                debug!("Session gone before save finished");
            }
        });
        self.in_flight += 1;

        Ok(tag)
    }

    pub fn reset(&mut self) -> WorkflowResult<()> {
        self.workflow.reset()
    }

    /// Wait for the next request to finish and apply it.
    ///
    /// Returns `None` straight away when nothing is in flight. Cancel safe:
    /// dropping the future loses no completion.
    pub async fn settle(&mut self) -> Option<Completion> {
        if self.in_flight == 0 {
            return None;
        }

        let message = self.rx.recv().await?;
        self.in_flight -= 1;

        let completion = match message {
            Message::Extraction(outcome) => self.workflow.complete_extraction(outcome),
            Message::Save(outcome) => self.workflow.complete_submit(outcome),
        };
        Some(completion)
    }

    /// Settle until nothing is in flight.
    pub async fn settle_all(&mut self) -> Vec<Completion> {
        let mut completions = Vec::new();
        while let Some(completion) = self.settle().await {
            completions.push(completion);
        }
        completions
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.workflow.notice()
    }

    /// When the visible notice goes away, if it does.
    pub fn notice_expiry(&self) -> Option<Instant> {
        self.workflow.notice().and_then(Notice::expires_at)
    }

    /// Clear the notice if its display window is over.
    pub fn expire_notice(&mut self) {
        self.workflow.expire_notice(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::config::SUCCESS_NOTICE_TTL;
    use crate::services::MockChequeService;
    use crate::workflow::context::{EXTRACTION_FAILED_MESSAGE, SAVED_MESSAGE};
    use crate::workflow::{NoticeLevel, WorkflowStage};

    const LATENCY: Duration = Duration::from_millis(500);

    fn session(service: MockChequeService) -> Session<MockChequeService> {
        Session::new(Arc::new(service), PreviewStore::new(None))
    }

    fn jpeg(size: usize) -> Candidate {
        let mut content = vec![0u8; size];
        content[..3].copy_from_slice(&[0xFF, 0xD8, 0xFF]);
        Candidate::new("cheque.jpg", "image/jpeg", content)
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_flow_with_notice_expiry() {
        let mut s = session(MockChequeService::new().with_latency(LATENCY));

        s.accept(jpeg(2 * 1024 * 1024)).unwrap();
        assert_eq!(s.workflow().stage(), WorkflowStage::Preview);

        assert!(matches!(s.extract().unwrap(), Dispatch::Started(_)));
        assert_eq!(s.extract().unwrap(), Dispatch::AlreadyPending);

        // Let the spawned request reach the service.
        tokio::task::yield_now().await;
        assert_eq!(s.service().process_calls(), 1);

        assert_eq!(s.settle().await, Some(Completion::Extracted { reliable_fields: 8 }));
        assert_eq!(s.workflow().stage(), WorkflowStage::Review);

        s.edit(FieldName::Rib, "09876543210987654321").unwrap();
        assert_eq!(s.workflow().record().get(FieldName::Rib).confidence, None);

        s.submit().unwrap();
        assert_eq!(s.workflow().stage(), WorkflowStage::Submitting);
        assert_eq!(s.settle().await, Some(Completion::Saved));
        assert_eq!(s.workflow().stage(), WorkflowStage::Saved);
        assert_eq!(s.service().saved()[0].rib, "09876543210987654321");

        let notice = s.notice().unwrap();
        assert_eq!(notice.level, NoticeLevel::Success);
        assert_eq!(notice.message, SAVED_MESSAGE);

        tokio::time::advance(SUCCESS_NOTICE_TTL - Duration::from_millis(1)).await;
        assert!(s.notice().is_some());
        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(s.notice().is_none());

        // The stage does not move on by itself.
        s.expire_notice();
        assert_eq!(s.workflow().stage(), WorkflowStage::Saved);
        assert!(s.settle().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_replacement_while_extracting_drops_stale_result() {
        let mut s = session(MockChequeService::new().with_latency(LATENCY));

        let first = s.accept(jpeg(1024)).unwrap().id();
        s.extract().unwrap();
        tokio::task::yield_now().await;
        tokio::time::advance(LATENCY / 2).await;

        let second = s.accept(jpeg(2048)).unwrap().id();
        assert_ne!(first, second);
        assert_eq!(s.workflow().previews().live_count(), 1);

        // The first answer arrives while the second document is loaded.
        assert_eq!(s.settle().await, Some(Completion::Stale));
        assert_eq!(s.workflow().stage(), WorkflowStage::Preview);
        assert!(s.workflow().record().is_empty());
        assert!(s.notice().is_none());

        s.extract().unwrap();
        assert_eq!(s.settle().await, Some(Completion::Extracted { reliable_fields: 8 }));
        assert_eq!(s.workflow().document().map(Document::id), Some(second));
        assert_eq!(s.workflow().previews().live_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_operator_stays_responsive_while_pending() {
        let mut s = session(MockChequeService::new().with_latency(LATENCY));
        s.accept(jpeg(1024)).unwrap();
        s.extract().unwrap();

        // Nothing arrives before the latency has passed.
        let early = tokio::time::timeout(LATENCY / 2, s.settle()).await;
        assert!(early.is_err());

        s.reset().unwrap();
        assert_eq!(s.workflow().stage(), WorkflowStage::Upload);
        assert_eq!(s.settle().await, Some(Completion::Stale));
        assert_eq!(s.workflow().stage(), WorkflowStage::Upload);
        assert!(s.notice().is_none());
    }

    #[tokio::test]
    async fn test_failures_surface_one_notice() {
        let service = MockChequeService::new();
        service.fail_extraction(true);
        let mut s = session(service);

        s.accept(jpeg(1024)).unwrap();
        s.extract().unwrap();
        assert_eq!(s.settle().await, Some(Completion::ExtractionFailed));
        assert_eq!(s.notice().map(|n| n.message.as_str()), Some(EXTRACTION_FAILED_MESSAGE));
        assert_eq!(s.workflow().stage(), WorkflowStage::Preview);

        s.service().fail_extraction(false);
        s.extract().unwrap();
        assert_eq!(s.settle_all().await, vec![Completion::Extracted { reliable_fields: 8 }]);

        s.service().refuse_saves(true);
        s.submit().unwrap();
        assert_eq!(s.settle().await, Some(Completion::SaveFailed));
        assert_eq!(s.workflow().stage(), WorkflowStage::Review);
        assert_eq!(s.notice().map(|n| n.level), Some(NoticeLevel::Error));
        assert!(s.service().saved().is_empty());

        s.service().refuse_saves(false);
        s.submit().unwrap();
        assert_eq!(s.settle().await, Some(Completion::Saved));
    }

    #[tokio::test]
    async fn test_malformed_body_fails_extraction() {
        let body = serde_json::json!({ "chequeNumber": 42 });
        let mut s = session(MockChequeService::new().with_body(body));

        s.accept(jpeg(1024)).unwrap();
        s.extract().unwrap();
        assert_eq!(s.settle().await, Some(Completion::ExtractionFailed));
        assert!(s.workflow().record().is_empty());
    }
}
