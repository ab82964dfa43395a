use crate::entities::{PaymentGateway, SettlementStatus};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::{IntoParams, ToSchema};

/// Deposit or withdrawal initiation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    #[schema(example = "QBET")]
    pub casino_group: String,
    pub external_user_id: String,
    #[schema(example = 500.0)]
    pub amount: f64,
    /// Gateway-specific fields forwarded unchanged.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub details: Value,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTransactionQuery {
    pub gateway: Option<PaymentGateway>,
    pub status: Option<SettlementStatus>,
    pub casino_group: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct GatewayBalanceQuery {
    pub casino_group: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LedgerBalanceRequest {
    pub member: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LedgerGatewayRequest {
    #[schema(example = "balance")]
    pub operation: String,
    #[serde(default)]
    #[schema(value_type = Object)]
    pub payload: Value,
}
