//! Intake configuration.
//!
//! The file constraints and notice timing are fixed by the workflow and live
//! here as constants. Service location and timeouts come from the
//! environment (a `.env` file is honoured) and can be overridden on the
//! command line.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Default base URL of the extraction/persistence service.
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5000/api";

/// Maximum accepted document size in bytes (10 MiB).
pub const MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Multipart field name carrying the document.
pub const UPLOAD_FIELD: &str = "cheque";

/// How long a success notice stays visible.
pub const SUCCESS_NOTICE_TTL: Duration = Duration::from_millis(3000);

/// Confidence at or above which a field counts as reliable.
pub const RELIABLE_CONFIDENCE: u8 = 70;

/// Confidence at or above which a field is classified as high.
pub const HIGH_CONFIDENCE: u8 = 90;

/// Default request timeout for service calls, in seconds.
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Runtime configuration for the intake client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    /// Base URL of the cheque service (without trailing slash).
    pub service_url: String,
    /// Timeout applied to each service request.
    pub request_timeout: Duration,
    /// Directory for preview files; the system temp dir when `None`.
    pub preview_dir: Option<PathBuf>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            service_url: DEFAULT_SERVICE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            preview_dir: None,
        }
    }
}

impl IntakeConfig {
    /// Build the configuration from `.env` and the process environment.
    ///
    /// Recognised variables: `CHEQUE_SERVICE_URL`,
    /// `CHEQUE_REQUEST_TIMEOUT_SECS`, `CHEQUE_PREVIEW_DIR`. Unparseable values
    /// fall back to the defaults.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        let default = Self::default();
        Self {
            service_url: env::var("CHEQUE_SERVICE_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or(default.service_url),
            request_timeout: env::var("CHEQUE_REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(default.request_timeout),
            preview_dir: env::var("CHEQUE_PREVIEW_DIR").ok().map(PathBuf::from),
        }
    }

    /// Override the service URL.
    pub fn with_service_url(mut self, url: impl Into<String>) -> Self {
        self.service_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Full URL for an endpoint path such as `/cheques/process`.
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.service_url, path)
    }
}
