use super::gateway::{GatewayOrder, GatewayReply, MerchantCredentials, PaymentGatewayApi};
use crate::config::OptimumPayConfig;
use crate::entities::{PaymentType, SettlementStatus};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// OptimumPay reports textual statuses.
pub fn map_optimum_status(status: &str) -> SettlementStatus {
    match status.trim().to_ascii_uppercase().as_str() {
        "SUCCESS" | "SUCCEEDED" | "COMPLETED" | "PAID" => SettlementStatus::Completed,
        "FAILED" | "REJECTED" | "CANCELLED" | "CANCELED" | "EXPIRED" => SettlementStatus::Rejected,
        _ => SettlementStatus::Pending,
    }
}

#[derive(Clone)]
pub struct OptimumPayClient {
    http: Client,
    cfg: OptimumPayConfig,
}

impl OptimumPayClient {
    pub fn new(cfg: OptimumPayConfig) -> Self {
        let http = Client::builder()
            .user_agent("backoffice-backend/optimum-pay")
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { http, cfg }
    }

    fn endpoint(&self, path: &str) -> AppResult<String> {
        if self.cfg.base_url.is_empty() || self.cfg.api_key.is_empty() {
            return Err(AppError::ValidationError(
                "OptimumPay is not configured".to_string(),
            ));
        }
        Ok(format!(
            "{}/v1/{}",
            self.cfg.base_url.trim_end_matches('/'),
            path
        ))
    }
}

#[async_trait]
impl PaymentGatewayApi for OptimumPayClient {
    async fn submit(
        &self,
        _merchant: Option<&MerchantCredentials>,
        order: &GatewayOrder,
    ) -> AppResult<GatewayReply> {
        let path = match order.payment_type {
            PaymentType::Deposit => "payins",
            PaymentType::Withdraw => "payouts",
        };
        let url = self.endpoint(path)?;
        let body = json!({
            "merchant_id": self.cfg.merchant_id,
            "reference": order.order_no,
            "amount": order.amount,
            "customer_id": order.external_user_id,
            "callback_url": self.cfg.callback_url,
            "details": order.details,
        });
        let resp = self
            .http
            .post(&url)
            .bearer_auth(&self.cfg.api_key)
            .json(&body)
            .send()
            .await?;
        GatewayReply::from_response("OptimumPay", resp).await
    }

    async fn balance(&self, _merchant: Option<&MerchantCredentials>) -> AppResult<GatewayReply> {
        let url = self.endpoint("balance")?;
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&self.cfg.api_key)
            .send()
            .await?;
        GatewayReply::from_response("OptimumPay", resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_textual_status_mapping() {
        assert_eq!(map_optimum_status("success"), SettlementStatus::Completed);
        assert_eq!(map_optimum_status("PAID"), SettlementStatus::Completed);
        assert_eq!(map_optimum_status("expired"), SettlementStatus::Rejected);
        assert_eq!(map_optimum_status("processing"), SettlementStatus::Pending);
    }
}
