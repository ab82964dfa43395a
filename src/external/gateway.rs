//! Shared shape of the payment-gateway clients.

use crate::entities::PaymentType;
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Response;
use serde_json::Value;

/// Merchant credentials for gateways configured per casino group.
#[derive(Debug, Clone)]
pub struct MerchantCredentials {
    pub merchant_code: String,
    pub secret_key: String,
}

#[derive(Debug, Clone)]
pub struct GatewayOrder {
    /// Local transaction id, sent as the merchant order number.
    pub order_no: String,
    pub payment_type: PaymentType,
    pub amount: f64,
    pub external_user_id: String,
    /// Gateway-specific fields (bank, account, channel) passed through as-is.
    pub details: Value,
}

/// Raw gateway answer. Non-2xx answers are returned too so the caller can
/// mirror the gateway status.
#[derive(Debug, Clone)]
pub struct GatewayReply {
    pub status: u16,
    pub body: Value,
}

impl GatewayReply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn transaction_number(&self) -> Option<String> {
        let body = &self.body;
        let candidates = [
            body.get("transaction_number"),
            body.get("transactionNumber"),
            body.pointer("/data/transaction_number"),
            body.pointer("/data/transactionNumber"),
            body.pointer("/data/trade_no"),
        ];
        candidates.into_iter().flatten().find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    pub(crate) async fn from_response(gateway: &str, resp: Response) -> AppResult<Self> {
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        let body = serde_json::from_str(&text).map_err(|_| {
            AppError::ExternalApiError(format!("{gateway} returned non-JSON response (HTTP {status})"))
        })?;
        Ok(Self { status, body })
    }
}

#[async_trait]
pub trait PaymentGatewayApi: Send + Sync {
    async fn submit(
        &self,
        merchant: Option<&MerchantCredentials>,
        order: &GatewayOrder,
    ) -> AppResult<GatewayReply>;

    async fn balance(&self, merchant: Option<&MerchantCredentials>) -> AppResult<GatewayReply>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_transaction_number_lookup() {
        let top = GatewayReply {
            status: 200,
            body: json!({"transaction_number": "DP123"}),
        };
        assert_eq!(top.transaction_number().as_deref(), Some("DP123"));

        let nested = GatewayReply {
            status: 200,
            body: json!({"data": {"trade_no": 998877}}),
        };
        assert_eq!(nested.transaction_number().as_deref(), Some("998877"));

        let none = GatewayReply {
            status: 400,
            body: json!({"message": "bad"}),
        };
        assert!(!none.is_success());
        assert!(none.transaction_number().is_none());
    }
}
