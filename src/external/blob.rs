use crate::config::BlobConfig;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `bytes` under `path` and returns the public URL.
    async fn put(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<String>;
}

#[derive(Debug, Deserialize)]
struct PutResponse {
    url: String,
}

/// Blob storage reached through an HTTP `PUT` with a bearer token.
#[derive(Clone)]
pub struct HttpBlobStore {
    http: Client,
    cfg: BlobConfig,
}

impl HttpBlobStore {
    pub fn new(cfg: BlobConfig) -> Self {
        let http = Client::builder()
            .user_agent("backoffice-backend/blob")
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, cfg }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<String> {
        if self.cfg.base_url.is_empty() {
            return Err(AppError::ExternalApiError(
                "Blob storage is not configured".to_string(),
            ));
        }
        let url = format!(
            "{}/{}",
            self.cfg.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        let resp = self
            .http
            .put(&url)
            .bearer_auth(&self.cfg.token)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::ExternalApiError(format!(
                "Blob upload failed: HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }
        // some stores answer with an empty body, fall back to the PUT target
        match resp.json::<PutResponse>().await {
            Ok(body) => Ok(body.url),
            Err(_) => Ok(url),
        }
    }
}
