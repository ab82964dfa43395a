use crate::entities::UserRole;
use crate::entities::user_entity;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Caller identity resolved from the session token.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    pub id: String,
    pub username: String,
    pub role: UserRole,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.role.is_admin_tier()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "loader01")]
    pub username: String,
    #[schema(example = "Password123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

/// Public view of a staff account.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub username: String,
    pub role: UserRole,
    pub active: bool,
    pub is_clocked_in: bool,
    pub balance: f64,
    pub messenger_link: Option<String>,
    pub casino_group_ids: Vec<String>,
}

impl AccountResponse {
    pub fn from_model(user: user_entity::Model, casino_group_ids: Vec<String>) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            username: user.username,
            role: user.role,
            active: user.active,
            is_clocked_in: user.is_clocked_in,
            balance: user.balance,
            messenger_link: user.messenger_link,
            casino_group_ids,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_in: i64,
    pub user: AccountResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAccountRequest {
    pub name: String,
    pub email: Option<String>,
    pub username: String,
    pub password: String,
    pub role: UserRole,
    pub messenger_link: Option<String>,
    #[serde(default)]
    pub casino_group_ids: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAccountRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<UserRole>,
    pub active: Option<bool>,
    pub password: Option<String>,
    pub messenger_link: Option<String>,
    pub casino_group_ids: Option<Vec<String>>,
}
