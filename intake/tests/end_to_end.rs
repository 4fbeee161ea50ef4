//! Intake session against a live backend over HTTP.

use std::sync::Arc;

use cheque_backend::{AppState, ChequeStore, SampleExtractor};
use cheque_intake::{
    Candidate, ChequeService, ChequeStatus, Completion, FieldName, HttpChequeService, IntakeConfig,
    NoticeLevel, PreviewStore, Session, WorkflowStage,
};
use tokio::net::TcpListener;

async fn spawn_backend(data_dir: &std::path::Path) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let state = AppState::new(
        ChequeStore::with_dir(data_dir),
        SampleExtractor::default(),
        cheque_backend::config::MAX_UPLOAD_SIZE,
    );
    tokio::spawn(cheque_backend::serve(listener, state));
    format!("http://{addr}/api")
}

fn jpeg(size: usize) -> Vec<u8> {
    let mut bytes = vec![0u8; size];
    bytes[..4].copy_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
    bytes
}

fn session_for(url: String, preview_dir: &std::path::Path) -> Session<HttpChequeService> {
    let config = IntakeConfig::default().with_service_url(url);
    let service = HttpChequeService::new(config).unwrap();
    Session::new(Arc::new(service), PreviewStore::new(Some(preview_dir.to_path_buf())))
}

#[tokio::test]
async fn test_scan_review_and_save_against_backend() {
    let data = tempfile::tempdir().unwrap();
    let previews = tempfile::tempdir().unwrap();
    let url = spawn_backend(data.path()).await;
    let mut session = session_for(url, previews.path());

    session
        .accept(Candidate::new("cheque.jpg", "image/jpeg", jpeg(2 * 1024 * 1024)))
        .unwrap();
    assert_eq!(session.workflow().stage(), WorkflowStage::Preview);

    session.extract().unwrap();
    assert!(session.workflow().is_extracting());
    assert_eq!(session.settle().await, Some(Completion::Extracted { reliable_fields: 8 }));
    assert_eq!(session.workflow().stage(), WorkflowStage::Review);

    let record = session.workflow().record();
    assert_eq!(record.get(FieldName::ChequeNumber).value, "123456789");
    assert_eq!(record.get(FieldName::Rib).confidence, Some(45));

    session.edit(FieldName::Rib, "98765432109876543210").unwrap();
    assert_eq!(session.workflow().record().get(FieldName::Rib).confidence, None);

    session.submit().unwrap();
    assert_eq!(session.settle().await, Some(Completion::Saved));
    assert_eq!(session.workflow().stage(), WorkflowStage::Saved);

    let notice = session.notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Success);
    assert_eq!(notice.message, "Cheque saved successfully!");

    let stored = session.service().list().await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].cheque_number, "123456789");
    assert_eq!(stored[0].status, ChequeStatus::Pending);
}

#[tokio::test]
async fn test_rejected_file_never_reaches_backend() {
    let data = tempfile::tempdir().unwrap();
    let previews = tempfile::tempdir().unwrap();
    let url = spawn_backend(data.path()).await;
    let mut session = session_for(url, previews.path());

    let result = session.accept(Candidate::new("notes.txt", "text/plain", b"hello".to_vec()));
    assert!(result.is_err());
    assert_eq!(session.workflow().stage(), WorkflowStage::Upload);
    assert!(session.extract().is_err());

    assert!(session.service().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_blank_amount_is_caught_before_save() {
    let data = tempfile::tempdir().unwrap();
    let previews = tempfile::tempdir().unwrap();
    let url = spawn_backend(data.path()).await;
    let mut session = session_for(url, previews.path());

    session
        .accept(Candidate::new("cheque.jpg", "image/jpeg", jpeg(4096)))
        .unwrap();
    session.extract().unwrap();
    session.settle().await;

    session.edit(FieldName::Amount, " ").unwrap();
    assert!(session.submit().is_err());
    assert_eq!(session.workflow().stage(), WorkflowStage::Review);
    assert_eq!(session.in_flight(), 0);

    assert!(session.service().list().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_backend_keeps_preview() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let previews = tempfile::tempdir().unwrap();
    let mut session = session_for(format!("http://{addr}/api"), previews.path());

    session
        .accept(Candidate::new("cheque.png", "image/png", b"\x89PNG\r\n\x1a\n".to_vec()))
        .unwrap();
    session.extract().unwrap();

    assert_eq!(session.settle().await, Some(Completion::ExtractionFailed));
    assert_eq!(session.workflow().stage(), WorkflowStage::Preview);
    assert!(!session.workflow().is_extracting());

    let notice = session.notice().unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "OCR processing failed. Please try again.");
}
