use crate::entities::ticket::{PENDING, TicketDraft, TicketEntity, TicketKind};
use crate::error::AppResult;
use chrono::{DateTime, Utc};
use sea_orm::Set;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Player deposit handled by loaders through a cash-in chat.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cashins")]
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
    #[sea_orm(column_type = "Text", nullable)]
    pub note: Option<String>,
    pub status: String,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TicketEntity for Entity {
    const KIND: TicketKind = TicketKind::Cashin;

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
            note: Set(draft.message),
            status: Set(PENDING.to_string()),
            version: Set(0),
            created_at: Set(draft.now),
            updated_at: Set(draft.now),
        })
    }
}
