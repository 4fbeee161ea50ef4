//! HTTP server for the cheque backend.
//!
//! # API Endpoints
//!
//! | Method | Path                    | Description                          |
//! |--------|-------------------------|--------------------------------------|
//! | GET    | `/health`               | Health check                         |
//! | POST   | `/api/cheques/process`  | Extract fields from a cheque scan    |
//! | POST   | `/api/cheques/save`     | Store a reviewed cheque              |
//! | GET    | `/api/cheques`          | Stored cheque summaries              |

use axum::{
    extract::{multipart::MultipartError, rejection::JsonRejection, DefaultBodyLimit, Multipart, State},
    http::{header, Method, StatusCode},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;
use tracing::{error, info, warn};

use super::types::{error_response, SaveResponse};
use crate::config::{ServerConfig, DEFAULT_EXTRACTION_TIMEOUT, UPLOAD_FIELD};
use crate::error::{ExtractionError, ServerResult, StoreError, UploadError};
use crate::extraction::{extract_within, Extractor, SampleExtractor, Upload};
use crate::models::{ChequeFields, ChequeSummary, ExtractedCheque};
use crate::store::ChequeStore;
use crate::validation::validate_upload;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

type ApiError = (StatusCode, Json<Value>);

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Mutex<ChequeStore>>,
    pub extractor: Arc<dyn Extractor>,
    pub extraction_timeout: Duration,
    pub max_upload_size: usize,
}

impl AppState {
    pub fn new(store: ChequeStore, extractor: impl Extractor + 'static, max_upload_size: usize) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            extractor: Arc::new(extractor),
            extraction_timeout: DEFAULT_EXTRACTION_TIMEOUT,
            max_upload_size,
        }
    }

    pub fn with_extraction_timeout(mut self, timeout: Duration) -> Self {
        self.extraction_timeout = timeout;
        self
    }

    /// State for a config: store in `data_dir`, sample extractor.
    pub fn from_config(config: &ServerConfig) -> Self {
        Self::new(
            ChequeStore::with_dir(&config.data_dir),
            SampleExtractor::new(config.extraction_delay),
            config.max_upload_size,
        )
        .with_extraction_timeout(config.extraction_timeout)
    }
}

/// All routes, with CORS and the upload body limit.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let body_limit = state.max_upload_size + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/cheques", get(list_cheques))
        .route("/api/cheques/process", post(process_cheque))
        .route("/api/cheques/save", post(save_cheque))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .with_state(state)
}

/// Serve on an already bound listener.
pub async fn serve(listener: TcpListener, state: AppState) -> ServerResult<()> {
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

/// Start the HTTP server
pub async fn start_server(config: &ServerConfig) -> ServerResult<()> {
    let state = AppState::from_config(config);
    let stored = state.store.lock().await.len();

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await?;

    info!(
        port = config.port,
        data_dir = %config.data_dir.display(),
        stored,
        extractor = state.extractor.name(),
        "Cheque backend listening"
    );
    println!("🚀 Cheque backend running on http://localhost:{}", config.port);
    println!("   POST /api/cheques/process - Extract fields from a scan");
    println!("   POST /api/cheques/save    - Store a cheque");
    println!("   GET  /api/cheques         - List stored cheques");
    println!("   GET  /health              - Health check");

    serve(listener, state).await
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "cheque-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "extractor": state.extractor.name(),
        "endpoints": {
            "process": "POST /api/cheques/process",
            "save": "POST /api/cheques/save",
            "list": "GET /api/cheques"
        }
    }))
}

/// Extract fields from the uploaded `cheque` part
async fn process_cheque(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ExtractedCheque>, ApiError> {
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(UPLOAD_FIELD) {
            let file_name = field.file_name().unwrap_or("cheque").to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            upload = Some((file_name, bytes.to_vec()));
        }
    }

    let (file_name, bytes) = upload.ok_or_else(|| upload_error(UploadError::Missing))?;
    let format = validate_upload(&bytes, state.max_upload_size).map_err(|e| {
        warn!(file = %file_name, size = bytes.len(), error = %e, "Upload rejected");
        upload_error(e)
    })?;

    info!(file = %file_name, format = %format, size = bytes.len(), "Processing cheque");

    let upload = Upload {
        file_name,
        format,
        bytes,
    };
    let cheque = extract_within(state.extractor.as_ref(), &upload, state.extraction_timeout)
        .await
        .map_err(|e| {
            error!(file = %upload.file_name, error = %e, "Extraction failed");
            let status = match e {
                ExtractionError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            };
            (status, Json(error_response(&e.to_string())))
        })?;

    Ok(Json(cheque))
}

/// Store a reviewed cheque
async fn save_cheque(
    State(state): State<AppState>,
    payload: Result<Json<ChequeFields>, JsonRejection>,
) -> (StatusCode, Json<SaveResponse>) {
    let Json(fields) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "Save body rejected");
            return (
                StatusCode::BAD_REQUEST,
                Json(SaveResponse::failed(rejection.body_text())),
            );
        }
    };

    let mut store = state.store.lock().await;
    match store.save(fields) {
        Ok(cheque) => (StatusCode::OK, Json(SaveResponse::saved(cheque.id))),
        Err(e @ StoreError::MissingField(_)) => {
            (StatusCode::BAD_REQUEST, Json(SaveResponse::failed(e.to_string())))
        }
        Err(e) => {
            error!(error = %e, "Cheque could not be stored");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SaveResponse::failed(e.to_string())),
            )
        }
    }
}

/// Stored cheque summaries in id order
async fn list_cheques(State(state): State<AppState>) -> Json<Vec<ChequeSummary>> {
    Json(state.store.lock().await.list())
}

fn multipart_error(e: MultipartError) -> ApiError {
    (
        e.status(),
        Json(error_response(&format!("Multipart error: {}", e.body_text()))),
    )
}

fn upload_error(e: UploadError) -> ApiError {
    let status = match e {
        UploadError::Missing | UploadError::Empty => StatusCode::BAD_REQUEST,
        UploadError::TooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        UploadError::UnsupportedType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
    };
    (status, Json(error_response(&e.to_string())))
}
