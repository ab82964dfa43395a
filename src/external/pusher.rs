//! Realtime pub/sub over the Pusher Channels REST API.
//!
//! Publishing is best-effort: callers log failures and carry on, the
//! durable write has already happened by the time an event is sent.

use crate::config::PusherConfig;
use crate::error::{AppError, AppResult};
use crate::utils::{hmac_sha256_hex, md5_hex};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::time::Duration;

#[async_trait]
pub trait RealtimePublisher: Send + Sync {
    async fn trigger(&self, channel: &str, event: &str, data: &Value) -> AppResult<()>;
}

/// Publisher used when no Pusher credentials are configured.
pub struct NoopPublisher;

#[async_trait]
impl RealtimePublisher for NoopPublisher {
    async fn trigger(&self, channel: &str, event: &str, _data: &Value) -> AppResult<()> {
        log::debug!("Realtime disabled, dropping {event} on {channel}");
        Ok(())
    }
}

#[derive(Clone)]
pub struct PusherClient {
    http: Client,
    cfg: PusherConfig,
}

impl PusherClient {
    pub fn new(cfg: PusherConfig) -> Self {
        let http = Client::builder()
            .user_agent("backoffice-backend/pusher")
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, cfg }
    }

    fn events_path(&self) -> String {
        format!("/apps/{}/events", self.cfg.app_id)
    }

    /// Query string for a signed `POST /apps/{id}/events` call, including
    /// `auth_signature`. Parameters are already in the sorted order the
    /// signature requires.
    pub fn signed_query(&self, body: &str, timestamp: i64) -> String {
        let query = format!(
            "auth_key={}&auth_timestamp={}&auth_version=1.0&body_md5={}",
            self.cfg.key,
            timestamp,
            md5_hex(body)
        );
        let to_sign = format!("POST\n{}\n{}", self.events_path(), query);
        let signature = hmac_sha256_hex(&self.cfg.secret, &to_sign);
        format!("{query}&auth_signature={signature}")
    }

    /// Credentials for a private or presence channel subscription.
    ///
    /// The signature covers `socket_id:channel_name` and, for presence
    /// channels, `:channel_data`.
    pub fn authorize_channel(
        &self,
        socket_id: &str,
        channel_name: &str,
        channel_data: Option<&str>,
    ) -> Value {
        let to_sign = match channel_data {
            Some(data) => format!("{socket_id}:{channel_name}:{data}"),
            None => format!("{socket_id}:{channel_name}"),
        };
        let signature = hmac_sha256_hex(&self.cfg.secret, &to_sign);
        let mut body = json!({ "auth": format!("{}:{}", self.cfg.key, signature) });
        if let Some(data) = channel_data {
            body["channel_data"] = json!(data);
        }
        body
    }
}

#[async_trait]
impl RealtimePublisher for PusherClient {
    async fn trigger(&self, channel: &str, event: &str, data: &Value) -> AppResult<()> {
        // Pusher expects `data` as a JSON-encoded string
        let body = serde_json::to_string(&json!({
            "name": event,
            "channels": [channel],
            "data": serde_json::to_string(data)?,
        }))?;
        let url = format!(
            "https://api-{}.pusher.com{}?{}",
            self.cfg.cluster,
            self.events_path(),
            self.signed_query(&body, chrono::Utc::now().timestamp())
        );

        let resp = self
            .http
            .post(&url)
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(AppError::ExternalApiError(format!(
                "Pusher trigger failed: HTTP {}: {}",
                status.as_u16(),
                text
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PusherClient {
        PusherClient::new(PusherConfig {
            app_id: "3".into(),
            key: "278d425bdf160c739803".into(),
            secret: "7ad3773142a6692b25b8".into(),
            cluster: "ap1".into(),
        })
    }

    #[test]
    fn test_private_channel_auth_signature() {
        let auth = client().authorize_channel("1234.1234", "private-foobar", None);
        assert_eq!(
            auth["auth"],
            "278d425bdf160c739803:58df8b0c36d6982b82c3ecf6b4662e34fe8c25bba48f5369f135bf843651c3a4"
        );
        assert!(auth.get("channel_data").is_none());
    }

    #[test]
    fn test_presence_auth_echoes_channel_data() {
        let data = r#"{"user_id":"u-1","user_info":{"type":"auth"}}"#;
        let auth = client().authorize_channel("1.2", "presence-dashboard", Some(data));
        assert_eq!(auth["channel_data"], data);
        let expected = hmac_sha256_hex(
            "7ad3773142a6692b25b8",
            &format!("1.2:presence-dashboard:{data}"),
        );
        assert_eq!(auth["auth"], format!("278d425bdf160c739803:{expected}"));
    }

    #[test]
    fn test_signed_query_covers_method_path_and_body_digest() {
        let body = r#"{"name":"foo","channels":["project-3"],"data":"{\"some\":\"data\"}"}"#;
        let query = client().signed_query(body, 1353088179);
        let unsigned = format!(
            "auth_key=278d425bdf160c739803&auth_timestamp=1353088179&auth_version=1.0&body_md5={}",
            md5_hex(body)
        );
        let signature = hmac_sha256_hex(
            "7ad3773142a6692b25b8",
            &format!("POST\n/apps/3/events\n{unsigned}"),
        );
        assert_eq!(query, format!("{unsigned}&auth_signature={signature}"));
    }
}
