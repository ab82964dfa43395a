//! Qbet88 betting-ledger client.
//!
//! Every call is signed with `md5(operator_code + timestamp + operation + secret_key)`
//! where `timestamp` is Unix seconds.

use crate::config::Qbet88Config;
use crate::error::{AppError, AppResult};
use crate::utils::md5_hex;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::time::Duration;

pub const OP_BALANCE: &str = "balance";
pub const OP_TRANSFER: &str = "transfer";

/// Deposit credit entry of a transfer batch.
pub const TXN_TYPE_CREDIT: &str = "CREDIT";

pub fn sign(operator_code: &str, timestamp: i64, operation: &str, secret_key: &str) -> String {
    md5_hex(&format!("{operator_code}{timestamp}{operation}{secret_key}"))
}

/// Single entry of a transfer batch.
#[derive(Debug, Clone, Serialize)]
pub struct LedgerTransfer {
    /// Local record id, echoed back by the ledger.
    pub id: String,
    /// Idempotency reference on the ledger side.
    pub txn: String,
    #[serde(rename = "type")]
    pub txn_type: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LedgerReply {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub balance_after: Option<f64>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl LedgerReply {
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// `balance_after` is returned at the top level or inside the first
    /// batch result depending on the operation.
    pub fn balance_after(&self) -> Option<f64> {
        self.balance_after.or_else(|| {
            let data = self.data.as_ref()?;
            data.get("balance_after")
                .or_else(|| data.get(0).and_then(|d| d.get("balance_after")))
                .and_then(Value::as_f64)
        })
    }
}

#[async_trait]
pub trait LedgerApi: Send + Sync {
    async fn credit(&self, member: &str, transfer: LedgerTransfer) -> AppResult<LedgerReply>;
    async fn balance(&self, member: &str) -> AppResult<Value>;
    /// Signed pass-through for an arbitrary ledger operation.
    async fn call(&self, operation: &str, payload: Value) -> AppResult<Value>;
}

#[derive(Clone)]
pub struct Qbet88Client {
    http: Client,
    cfg: Qbet88Config,
}

impl Qbet88Client {
    pub fn new(cfg: Qbet88Config) -> Self {
        let http = Client::builder()
            .user_agent("backoffice-backend/qbet88")
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, cfg }
    }

    fn signed_body(&self, operation: &str, timestamp: i64, mut payload: Value) -> Value {
        let sig = sign(
            &self.cfg.operator_code,
            timestamp,
            operation,
            &self.cfg.secret_key,
        );
        if !payload.is_object() {
            payload = json!({ "data": payload });
        }
        payload["operator_code"] = json!(self.cfg.operator_code);
        payload["timestamp"] = json!(timestamp);
        payload["sign"] = json!(sig);
        payload
    }

    async fn post(&self, operation: &str, payload: Value) -> AppResult<Value> {
        if self.cfg.base_url.is_empty() {
            return Err(AppError::ExternalApiError(
                "Qbet88 ledger is not configured".to_string(),
            ));
        }
        let url = format!(
            "{}/api/{}",
            self.cfg.base_url.trim_end_matches('/'),
            operation
        );
        let body = self.signed_body(operation, chrono::Utc::now().timestamp(), payload);

        let resp = self.http.post(&url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        let parsed: Value = serde_json::from_str(&text).map_err(|_| {
            AppError::ExternalApiError(format!(
                "Qbet88 returned non-JSON response (HTTP {})",
                status.as_u16()
            ))
        })?;

        if !status.is_success() {
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message: "Qbet88 request failed".to_string(),
                body: parsed,
            });
        }
        Ok(parsed)
    }
}

#[async_trait]
impl LedgerApi for Qbet88Client {
    async fn credit(&self, member: &str, transfer: LedgerTransfer) -> AppResult<LedgerReply> {
        let payload = json!({
            "member_account": member,
            "transactions": [transfer],
        });
        let raw = self.post(OP_TRANSFER, payload).await?;
        let reply: LedgerReply = serde_json::from_value(raw)?;
        if !reply.is_success() {
            log::warn!(
                "Qbet88 credit for {member} returned code {}: {:?}",
                reply.code,
                reply.message
            );
        }
        Ok(reply)
    }

    async fn balance(&self, member: &str) -> AppResult<Value> {
        self.post(OP_BALANCE, json!({ "member_account": member }))
            .await
    }

    async fn call(&self, operation: &str, payload: Value) -> AppResult<Value> {
        self.post(operation, payload).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_concatenates_in_fixed_order() {
        assert_eq!(
            sign("OP1", 1700000000, "transfer", "s3cret"),
            md5_hex("OP11700000000transfers3cret")
        );
    }

    #[test]
    fn test_signed_body_adds_operator_timestamp_and_sign() {
        let client = Qbet88Client::new(Qbet88Config {
            base_url: "https://ledger.test".into(),
            operator_code: "OP1".into(),
            secret_key: "s3cret".into(),
            internal_api_key: String::new(),
        });
        let body = client.signed_body("balance", 42, json!({"member_account": "p1"}));
        assert_eq!(body["operator_code"], "OP1");
        assert_eq!(body["timestamp"], 42);
        assert_eq!(body["sign"], sign("OP1", 42, "balance", "s3cret"));
        assert_eq!(body["member_account"], "p1");
    }

    #[test]
    fn test_reply_success_and_balance_after_lookup() {
        let ok: LedgerReply =
            serde_json::from_value(json!({"code": 0, "data": [{"balance_after": 1500.5}]}))
                .unwrap();
        assert!(ok.is_success());
        assert_eq!(ok.balance_after(), Some(1500.5));

        let failed: LedgerReply =
            serde_json::from_value(json!({"code": 1003, "message": "member not found"})).unwrap();
        assert!(!failed.is_success());
        assert_eq!(failed.balance_after(), None);
    }

    #[test]
    fn test_transfer_serializes_type_field() {
        let t = LedgerTransfer {
            id: "tx-1".into(),
            txn: "DP-1".into(),
            txn_type: TXN_TYPE_CREDIT.into(),
            amount: 500.0,
        };
        let v = serde_json::to_value(t).unwrap();
        assert_eq!(v["type"], "CREDIT");
        assert_eq!(v["txn"], "DP-1");
    }
}
