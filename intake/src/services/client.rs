//! HTTP client for the cheque service.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use super::{ChequeService, DocumentUpload};
use crate::config::{IntakeConfig, UPLOAD_FIELD};
use crate::error::{ServiceError, ServiceResult};
use crate::models::{ChequeSummary, SaveAck, SavePayload};

/// [`ChequeService`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpChequeService {
    client: Client,
    config: IntakeConfig,
}

impl HttpChequeService {
    pub fn new(config: IntakeConfig) -> ServiceResult<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ServiceError::Transport {
                endpoint: config.service_url.clone(),
                message: e.to_string(),
            })?;

        info!(service_url = %config.service_url, "HTTP cheque service ready");
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Read the body and decode it, mapping a non-success status to an error
    /// that keeps the body for diagnosis.
    async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> ServiceResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| transport(endpoint, e))?;

        debug!(endpoint, status = status.as_u16(), bytes = body.len(), "Response received");

        if !status.is_success() {
            return Err(ServiceError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        serde_json::from_str(&body).map_err(|e| ServiceError::InvalidResponse {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }
}

fn transport(endpoint: &str, err: reqwest::Error) -> ServiceError {
    ServiceError::Transport {
        endpoint: endpoint.to_string(),
        message: err.to_string(),
    }
}

#[async_trait]
impl ChequeService for HttpChequeService {
    async fn process(&self, upload: DocumentUpload) -> ServiceResult<Value> {
        let endpoint = self.config.endpoint("/cheques/process");

        let part = Part::bytes(upload.content.to_vec())
            .file_name(upload.file_name)
            .mime_str(upload.media_type.as_mime())
            .map_err(|e| transport(&endpoint, e))?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let response = self
            .client
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport(&endpoint, e))?;

        Self::decode(&endpoint, response).await
    }

    async fn save(&self, payload: &SavePayload) -> ServiceResult<SaveAck> {
        let endpoint = self.config.endpoint("/cheques/save");

        let response = self
            .client
            .post(&endpoint)
            .json(payload)
            .send()
            .await
            .map_err(|e| transport(&endpoint, e))?;

        Self::decode(&endpoint, response).await
    }

    async fn list(&self) -> ServiceResult<Vec<ChequeSummary>> {
        let endpoint = self.config.endpoint("/cheques");

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .map_err(|e| transport(&endpoint, e))?;

        Self::decode(&endpoint, response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut config = IntakeConfig::default().with_service_url(format!("http://127.0.0.1:{}/api", port));
        config.request_timeout = Duration::from_secs(2);
        let service = HttpChequeService::new(config).unwrap();

        let err = service.list().await.unwrap_err();
        match err {
            ServiceError::Transport { endpoint, .. } => {
                assert_eq!(endpoint, format!("http://127.0.0.1:{}/api/cheques", port));
            }
            other => panic!("expected transport error, got {other}"),
        }
    }
}
