use super::gateway::{GatewayOrder, GatewayReply, MerchantCredentials, PaymentGatewayApi};
use crate::config::DpayConfig;
use crate::entities::{PaymentType, SettlementStatus};
use crate::error::{AppError, AppResult};
use crate::utils::md5_hex;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;

/// Dpay numeric status codes reported by webhooks.
pub const DPAY_STATUS_SUCCESS: i64 = 3;
pub const DPAY_STATUS_REJECTED: i64 = 4;

pub fn map_dpay_status(code: i64) -> SettlementStatus {
    match code {
        DPAY_STATUS_SUCCESS => SettlementStatus::Completed,
        DPAY_STATUS_REJECTED => SettlementStatus::Rejected,
        _ => SettlementStatus::Pending,
    }
}

/// `md5("k1=v1&k2=v2&...&key=<secret>")` over the parameters sorted by key.
pub fn sign_params(params: &BTreeMap<&str, String>, secret_key: &str) -> String {
    let joined = params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    md5_hex(&format!("{joined}&key={secret_key}"))
}

#[derive(Clone)]
pub struct DpayClient {
    http: Client,
    cfg: DpayConfig,
}

impl DpayClient {
    pub fn new(cfg: DpayConfig) -> Self {
        let http = Client::builder()
            .user_agent("backoffice-backend/dpay")
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, cfg }
    }

    fn merchant<'a>(
        merchant: Option<&'a MerchantCredentials>,
    ) -> AppResult<&'a MerchantCredentials> {
        merchant.ok_or_else(|| {
            AppError::ValidationError("Dpay is not configured for this casino group".to_string())
        })
    }

    fn order_payload(&self, merchant: &MerchantCredentials, order: &GatewayOrder) -> Value {
        let mut params = BTreeMap::new();
        params.insert("merchant_code", merchant.merchant_code.clone());
        params.insert("order_no", order.order_no.clone());
        params.insert("amount", format!("{:.2}", order.amount));
        params.insert("user_id", order.external_user_id.clone());
        params.insert("notify_url", self.cfg.callback_url.clone());
        let sign = sign_params(&params, &merchant.secret_key);

        let mut body = json!(params);
        body["sign"] = json!(sign);
        if let Value::Object(extra) = &order.details {
            for (k, v) in extra {
                if body.get(k).is_none() {
                    body[k.as_str()] = v.clone();
                }
            }
        }
        body
    }
}

#[async_trait]
impl PaymentGatewayApi for DpayClient {
    async fn submit(
        &self,
        merchant: Option<&MerchantCredentials>,
        order: &GatewayOrder,
    ) -> AppResult<GatewayReply> {
        let merchant = Self::merchant(merchant)?;
        let path = match order.payment_type {
            PaymentType::Deposit => "deposit",
            PaymentType::Withdraw => "withdraw",
        };
        let url = format!("{}/api/{}", self.cfg.base_url.trim_end_matches('/'), path);
        let resp = self
            .http
            .post(&url)
            .json(&self.order_payload(merchant, order))
            .send()
            .await?;
        GatewayReply::from_response("Dpay", resp).await
    }

    async fn balance(&self, merchant: Option<&MerchantCredentials>) -> AppResult<GatewayReply> {
        let merchant = Self::merchant(merchant)?;
        let mut params = BTreeMap::new();
        params.insert("merchant_code", merchant.merchant_code.clone());
        params.insert("timestamp", chrono::Utc::now().timestamp().to_string());
        let sign = sign_params(&params, &merchant.secret_key);
        let mut body = json!(params);
        body["sign"] = json!(sign);

        let url = format!("{}/api/balance", self.cfg.base_url.trim_end_matches('/'));
        let resp = self.http.post(&url).json(&body).send().await?;
        GatewayReply::from_response("Dpay", resp).await
    }
}
