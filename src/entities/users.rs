use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    Hash,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    #[sea_orm(string_value = "SUPERADMIN")]
    Superadmin,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "ACCOUNTING")]
    Accounting,
    #[sea_orm(string_value = "LOADER")]
    Loader,
    #[sea_orm(string_value = "SUPPORT")]
    Support,
    #[sea_orm(string_value = "AGENT")]
    Agent,
}

impl UserRole {
    /// ADMIN and SUPERADMIN.
    pub fn is_admin_tier(&self) -> bool {
        matches!(self, UserRole::Superadmin | UserRole::Admin)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Superadmin => write!(f, "SUPERADMIN"),
            UserRole::Admin => write!(f, "ADMIN"),
            UserRole::Accounting => write!(f, "ACCOUNTING"),
            UserRole::Loader => write!(f, "LOADER"),
            UserRole::Support => write!(f, "SUPPORT"),
            UserRole::Agent => write!(f, "AGENT"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(nullable)]
    pub email: Option<String>,
    #[sea_orm(unique)]
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub active: bool,
    pub is_clocked_in: bool,
    pub balance: f64,
    #[sea_orm(nullable)]
    pub messenger_link: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
