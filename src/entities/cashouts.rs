use crate::entities::ticket::{PENDING, TicketDraft, TicketEntity, TicketKind};
use crate::error::AppResult;
use chrono::{DateTime, Utc};
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Player withdrawal; may be paid out in several partial releases.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cashouts")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Creator of the ticket.
    #[sea_orm(indexed)]
    pub user_id: String,
    #[sea_orm(indexed)]
    pub casino_group_id: String,
    pub amount: f64,
    #[sea_orm(nullable)]
    pub payment_method: Option<String>,
    #[sea_orm(nullable)]
    pub account_name: Option<String>,
    #[sea_orm(nullable)]
    pub account_number: Option<String>,
    pub status: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TicketEntity for Entity {
    const KIND: TicketKind = TicketKind::Cashout;

    fn id_column() -> Column {
        Column::Id
    }

    fn creator_column() -> Column {
        Column::UserId
    }

    fn casino_group_column() -> Column {
        Column::CasinoGroupId
    }

    fn status_column() -> Column {
        Column::Status
    }

    fn version_column() -> Column {
        Column::Version
    }

    fn created_at_column() -> Column {
        Column::CreatedAt
    }

    fn updated_at_column() -> Column {
        Column::UpdatedAt
    }

    fn new_ticket(draft: TicketDraft) -> AppResult<ActiveModel> {
        let amount = draft.require_amount()?;
        Ok(ActiveModel {
            id: Set(draft.id),
            user_id: Set(draft.creator_id),
            casino_group_id: Set(draft.casino_group_id),
            amount: Set(amount),
            payment_method: Set(draft.payment_method),
            account_name: Set(draft.account_name),
            account_number: Set(draft.account_number),
            status: Set(PENDING.to_string()),
            version: Set(0),
            created_at: Set(draft.now),
            updated_at: Set(draft.now),
        })
    }
}
