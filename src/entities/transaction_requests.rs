use super::payment_transactions::LedgerCreditStatus;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionRequestType {
    #[sea_orm(string_value = "CASHIN")]
    Cashin,
    #[sea_orm(string_value = "CASHOUT")]
    Cashout,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionRequestStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "ACCOMMODATING")]
    Accommodating,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    /// Player left the cash-in chat before it was served.
    #[sea_orm(string_value = "LEAVED")]
    Leaved,
}

/// Player request queued against a cash-in chat.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transaction_requests")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    #[sea_orm(indexed, nullable)]
    pub cashin_id: Option<String>,
    #[sea_orm(indexed)]
    pub casino_group_id: String,
    pub external_user_id: String,
    pub amount: f64,
    #[serde(rename = "type")]
    pub request_type: TransactionRequestType,
    pub status: TransactionRequestStatus,
    pub qbet_status: LedgerCreditStatus,
    #[sea_orm(column_type = "Text", nullable)]
    pub raw_request: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
