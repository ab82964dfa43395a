pub mod account;
pub mod attendance;
pub mod auth;
pub mod casino_group;
pub mod group_chat;
pub mod notification;
pub mod payment;
pub mod ready_check;
pub mod realtime;
pub mod ticket;
pub mod transaction_request;

pub use account::account_config;
pub use attendance::attendance_config;
pub use auth::auth_config;
pub use casino_group::casino_group_config;
pub use group_chat::group_chat_config;
pub use notification::notification_config;
pub use payment::{dpay_config, optimum_pay_config, qbet88_config};
pub use ready_check::ready_check_config;
pub use realtime::realtime_config;
pub use ticket::ticket_config;
pub use transaction_request::transaction_request_config;

use actix_web::{HttpResponse, Result};
use serde_json::json;

#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "Service is healthy"))
)]
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({"status": "ok"})))
}
