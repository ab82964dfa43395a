use crate::entities::{TransactionRequestStatus, TransactionRequestType};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub casino_group: String,
    pub external_user_id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub request_type: TransactionRequestType,
    pub cashin_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequestQuery {
    pub cashin_id: Option<String>,
    pub status: Option<TransactionRequestStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateTransactionRequestStatus {
    pub status: TransactionRequestStatus,
}
