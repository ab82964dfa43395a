use crate::entities::{thread_attachment_entity, ticket_thread_entity};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Body of `POST /api/<kind>`. Each kind reads the fields it stores.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    /// Casino group name (case-insensitive) or id.
    #[schema(example = "QBET")]
    pub casino_group: String,
    #[schema(example = 500.0)]
    pub amount: Option<f64>,
    pub subject: Option<String>,
    pub message: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub assignee_id: Option<String>,
    pub payment_method: Option<String>,
    pub account_name: Option<String>,
    pub account_number: Option<String>,
    pub reference_number: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UpdateTicketStatusRequest {
    #[serde(default)]
    #[schema(example = "COMPLETED")]
    pub status: String,
    /// Version last read by the client; stale versions are rejected with 409.
    pub version: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct TicketListQuery {
    pub casino_group: Option<String>,
    pub status: Option<String>,
    pub page: Option<u64>,
    pub page_size: Option<u64>,
}

/// `casinoGroup` (name, case-insensitive) or `casinoGroupId`.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
pub struct CasinoGroupQuery {
    pub casino_group: Option<String>,
    pub casino_group_id: Option<String>,
}

impl CasinoGroupQuery {
    pub fn key(&self) -> Option<&str> {
        self.casino_group
            .as_deref()
            .or(self.casino_group_id.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct TicketThreadView {
    #[serde(flatten)]
    pub thread: ticket_thread_entity::Model,
    pub attachments: Vec<thread_attachment_entity::Model>,
}

/// File received in a thread upload.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Pending counts across every ticket kind for one casino group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingCounts {
    pub cashin: u64,
    pub cashout: u64,
    pub commission: u64,
    pub concern: u64,
    pub customer_support: u64,
    pub remittance: u64,
    pub task: u64,
    pub total: u64,
}
