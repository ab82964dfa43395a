use crate::entities::{attendance_entity, notification_entity, ready_check_entity, ready_check_participant_entity};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct ClockInRequest {
    pub device: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub user_id: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceStatus {
    pub user_id: String,
    pub is_clocked_in: bool,
    pub attendance: Option<attendance_entity::Model>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateReadyCheckRequest {
    /// Defaults to every active non-admin account.
    pub participant_ids: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadyCheckDetail {
    #[serde(flatten)]
    pub ready_check: ready_check_entity::Model,
    pub participants: Vec<ready_check_participant_entity::Model>,
    pub responded_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    pub user_id: String,
    pub message: String,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    pub notifications: Vec<notification_entity::Model>,
    pub unread_count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupChatRequest {
    pub name: String,
    pub link: Option<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateGroupChatStatusRequest {
    pub status: bool,
}

/// Form posted by the realtime client when subscribing.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ChannelAuthForm {
    pub socket_id: String,
    pub channel_name: String,
}
