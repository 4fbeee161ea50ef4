//! Server configuration from `.env`, the environment and the command line.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default listening port; the intake client expects `localhost:5000`.
pub const DEFAULT_PORT: u16 = 5000;

/// Default directory for stored cheques (relative to current dir).
pub const DEFAULT_DATA_DIR: &str = ".cheques";

/// Largest accepted upload in bytes (10 MiB).
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

/// Multipart field carrying the document.
pub const UPLOAD_FIELD: &str = "cheque";

const DEFAULT_EXTRACTION_DELAY_MS: u64 = 1500;

/// How long an extraction may run before the request answers 504.
pub const DEFAULT_EXTRACTION_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    /// Simulated processing time of the sample extractor.
    pub extraction_delay: Duration,
    pub extraction_timeout: Duration,
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            extraction_delay: Duration::from_millis(DEFAULT_EXTRACTION_DELAY_MS),
            extraction_timeout: DEFAULT_EXTRACTION_TIMEOUT,
            max_upload_size: MAX_UPLOAD_SIZE,
        }
    }
}

impl ServerConfig {
    /// Read `CHEQUE_BACKEND_PORT`, `CHEQUE_DATA_DIR`,
    /// `CHEQUE_EXTRACTION_DELAY_MS` and `CHEQUE_EXTRACTION_TIMEOUT_SECS`.
    /// Unparseable values fall back to defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let default = Self::default();
        Self {
            port: env::var("CHEQUE_BACKEND_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(default.port),
            data_dir: env::var("CHEQUE_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(default.data_dir),
            extraction_delay: env::var("CHEQUE_EXTRACTION_DELAY_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(default.extraction_delay),
            extraction_timeout: env::var("CHEQUE_EXTRACTION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.extraction_timeout),
            max_upload_size: default.max_upload_size,
        }
    }
}
