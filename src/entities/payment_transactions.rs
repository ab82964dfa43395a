//! Outbound payment-gateway interactions (Dpay and OptimumPay).
//!
//! `status` follows the gateway settlement, `qbet_status` follows the
//! in-game ledger credit. The two move independently.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentGateway {
    #[sea_orm(string_value = "DPAY")]
    Dpay,
    #[sea_orm(string_value = "OPTIMUM_PAY")]
    OptimumPay,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentType {
    #[sea_orm(string_value = "DEPOSIT")]
    Deposit,
    #[sea_orm(string_value = "WITHDRAW")]
    Withdraw,
}

/// Gateway-facing settlement state machine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementStatus {
    #[sea_orm(string_value = "INITIATED")]
    Initiated,
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

/// Ledger-facing credit state machine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LedgerCreditStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "LOADED")]
    Loaded,
    #[sea_orm(string_value = "NOT_APPLICABLE")]
    NotApplicable,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payment_transactions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub gateway: PaymentGateway,
    #[sea_orm(indexed)]
    pub casino_group_id: String,
    /// Staff member who initiated the call, absent for player-originated deposits.
    #[sea_orm(nullable)]
    pub initiated_by: Option<String>,
    /// Player account on the betting ledger.
    pub external_user_id: String,
    pub amount: f64,
    pub payment_type: PaymentType,
    pub status: SettlementStatus,
    pub qbet_status: LedgerCreditStatus,
    #[sea_orm(indexed, nullable)]
    pub transaction_number: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub raw_request: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub raw_gateway_response: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub raw_webhook: Option<String>,
    #[sea_orm(nullable)]
    pub reconcile_flagged_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
