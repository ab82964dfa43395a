//! Realtime notifications and channel authorization.
//!
//! Events are at-most-once: every emit logs and swallows publisher errors so
//! a mutation that already committed never fails because of the side channel.

use crate::entities::TicketKind;
use crate::entities::ticket::{CLAIMED, COMPLETED, REJECTED};
use crate::error::{AppError, AppResult};
use crate::external::{PusherClient, RealtimePublisher};
use crate::models::{ChannelAuthForm, CurrentUser};
use chrono::Utc;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;

pub const READY_CHECK_CHANNEL: &str = "ready-check";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RealtimeAction {
    Created,
    Approved,
    Rejected,
    Updated,
    Claimed,
}

impl RealtimeAction {
    pub fn from_status(status: &str) -> Self {
        match status {
            COMPLETED => RealtimeAction::Approved,
            REJECTED => RealtimeAction::Rejected,
            CLAIMED => RealtimeAction::Claimed,
            _ => RealtimeAction::Updated,
        }
    }
}

pub fn transactions_channel(casino_group: &str) -> String {
    format!("transactions-{casino_group}")
}

pub fn count_channel(kind: TicketKind, casino_group: &str) -> String {
    format!("{}-{}", kind.policy().channel_prefix, casino_group)
}

pub fn user_channel(user_id: &str) -> String {
    format!("private-user-{user_id}")
}

fn envelope(transaction_id: &str, casino_group: &str, action: RealtimeAction) -> Value {
    json!({
        "transactionId": transaction_id,
        "casinoGroup": casino_group,
        "action": action,
        "timestamp": Utc::now().to_rfc3339(),
    })
}

#[derive(Clone)]
pub struct RealtimeNotifier {
    publisher: Arc<dyn RealtimePublisher>,
}

impl RealtimeNotifier {
    pub fn new(publisher: Arc<dyn RealtimePublisher>) -> Self {
        Self { publisher }
    }

    async fn publish(&self, channel: &str, event: &str, data: Value) {
        if let Err(e) = self.publisher.trigger(channel, event, &data).await {
            log::warn!("Realtime publish of {event} on {channel} failed: {e}");
        }
    }

    pub async fn emit_ticket_updated(
        &self,
        kind: TicketKind,
        ticket_id: &str,
        casino_group: &str,
        action: RealtimeAction,
    ) {
        let event = format!("{}-updated", kind.slug());
        self.publish(
            &transactions_channel(casino_group),
            &event,
            envelope(ticket_id, casino_group, action),
        )
        .await;
    }

    pub async fn emit_pending_count(&self, kind: TicketKind, casino_group: &str, count: u64) {
        let data = json!({
            "casinoGroup": casino_group,
            "type": kind.slug(),
            "count": count,
            "timestamp": Utc::now().to_rfc3339(),
        });
        self.publish(&count_channel(kind, casino_group), "pending-count", data)
            .await;
    }

    pub async fn emit_thread_created(
        &self,
        kind: TicketKind,
        ticket_id: &str,
        casino_group: &str,
        thread_id: &str,
    ) {
        let mut data = envelope(ticket_id, casino_group, RealtimeAction::Updated);
        data["threadId"] = json!(thread_id);
        data["type"] = json!(kind.slug());
        self.publish(&transactions_channel(casino_group), "thread-created", data)
            .await;
    }

    pub async fn emit_transaction_request(
        &self,
        request_id: &str,
        casino_group: &str,
        action: RealtimeAction,
    ) {
        self.publish(
            &transactions_channel(casino_group),
            "transaction-request-updated",
            envelope(request_id, casino_group, action),
        )
        .await;
    }

    pub async fn emit_ready_check(&self, event: &str, ready_check_id: &str, data: Value) {
        let mut payload = json!({
            "readyCheckId": ready_check_id,
            "timestamp": Utc::now().to_rfc3339(),
        });
        if let (Value::Object(target), Value::Object(extra)) = (&mut payload, data) {
            target.extend(extra);
        }
        self.publish(READY_CHECK_CHANNEL, event, payload).await;
    }

    pub async fn emit_notification(&self, user_id: &str, notification: Value) {
        self.publish(&user_channel(user_id), "notification", notification)
            .await;
    }
}

/// Exchanges a session (or guest id) for channel subscription credentials.
#[derive(Clone)]
pub struct ChannelAuthService {
    pusher: Option<PusherClient>,
}

impl ChannelAuthService {
    pub fn new(pusher: Option<PusherClient>) -> Self {
        Self { pusher }
    }

    pub fn authorize(
        &self,
        user: Option<&CurrentUser>,
        guest_id: &str,
        form: &ChannelAuthForm,
    ) -> AppResult<Value> {
        let pusher = self.pusher.as_ref().ok_or_else(|| {
            AppError::ExternalApiError("Realtime service is not configured".to_string())
        })?;
        if form.socket_id.trim().is_empty() || form.channel_name.trim().is_empty() {
            return Err(AppError::ValidationError(
                "socket_id and channel_name are required".to_string(),
            ));
        }
        let channel = form.channel_name.as_str();

        if let Some(owner) = channel.strip_prefix("private-user-") {
            return match user {
                Some(u) if u.id == owner => Ok(pusher.authorize_channel(&form.socket_id, channel, None)),
                _ => Err(AppError::Forbidden),
            };
        }

        if channel.starts_with("presence-") {
            let member = match user {
                Some(u) => json!({
                    "user_id": u.id,
                    "user_info": {"username": u.username, "role": u.role, "type": "auth"},
                }),
                None => json!({
                    "user_id": guest_id,
                    "user_info": {"type": "guest"},
                }),
            };
            let channel_data = member.to_string();
            return Ok(pusher.authorize_channel(&form.socket_id, channel, Some(&channel_data)));
        }

        if channel.starts_with("private-") && user.is_none() {
            return Err(AppError::Forbidden);
        }
        Ok(pusher.authorize_channel(&form.socket_id, channel, None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PusherConfig;
    use crate::entities::UserRole;
    use crate::test_support::{FailingPublisher, RecordingPublisher};

    fn auth_service() -> ChannelAuthService {
        ChannelAuthService::new(Some(PusherClient::new(PusherConfig {
            app_id: "1".into(),
            key: "key".into(),
            secret: "secret".into(),
            cluster: "ap1".into(),
        })))
    }

    fn form(channel: &str) -> ChannelAuthForm {
        ChannelAuthForm {
            socket_id: "123.456".into(),
            channel_name: channel.into(),
        }
    }

    fn loader() -> CurrentUser {
        CurrentUser {
            id: "u-1".into(),
            username: "loader".into(),
            role: UserRole::Loader,
        }
    }

    #[test]
    fn test_status_to_action_mapping() {
        assert_eq!(RealtimeAction::from_status("COMPLETED"), RealtimeAction::Approved);
        assert_eq!(RealtimeAction::from_status("REJECTED"), RealtimeAction::Rejected);
        assert_eq!(RealtimeAction::from_status("CLAIMED"), RealtimeAction::Claimed);
        assert_eq!(RealtimeAction::from_status("PARTIAL"), RealtimeAction::Updated);
        assert_eq!(RealtimeAction::from_status("BANANA"), RealtimeAction::Updated);
    }

    #[tokio::test]
    async fn test_ticket_event_envelope_and_channel() {
        let publisher = Arc::new(RecordingPublisher::default());
        let notifier = RealtimeNotifier::new(publisher.clone());
        notifier
            .emit_ticket_updated(TicketKind::Cashout, "t-1", "QBET", RealtimeAction::Approved)
            .await;

        let events = publisher.events();
        assert_eq!(events.len(), 1);
        let (channel, event, data) = &events[0];
        assert_eq!(channel, "transactions-QBET");
        assert_eq!(event, "cashout-updated");
        assert_eq!(data["transactionId"], "t-1");
        assert_eq!(data["casinoGroup"], "QBET");
        assert_eq!(data["action"], "APPROVED");
        assert!(data["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_publish_failure_is_swallowed() {
        let notifier = RealtimeNotifier::new(Arc::new(FailingPublisher));
        // must not panic or propagate
        notifier
            .emit_pending_count(TicketKind::CustomerSupport, "QBET", 3)
            .await;
    }

    #[tokio::test]
    async fn test_count_channel_uses_kind_prefix() {
        let publisher = Arc::new(RecordingPublisher::default());
        let notifier = RealtimeNotifier::new(publisher.clone());
        notifier
            .emit_pending_count(TicketKind::CustomerSupport, "QBET", 3)
            .await;
        let events = publisher.events();
        assert_eq!(events[0].0, "customer-support-QBET");
        assert_eq!(events[0].2["count"], 3);
    }

    #[test]
    fn test_presence_member_tagged_auth_or_guest() {
        let svc = auth_service();
        let user = loader();
        let auth = svc
            .authorize(Some(&user), "guest-x", &form("presence-dashboard"))
            .unwrap();
        let data: Value = serde_json::from_str(auth["channel_data"].as_str().unwrap()).unwrap();
        assert_eq!(data["user_id"], "u-1");
        assert_eq!(data["user_info"]["type"], "auth");

        let guest = svc
            .authorize(None, "guest-x", &form("presence-dashboard"))
            .unwrap();
        let data: Value = serde_json::from_str(guest["channel_data"].as_str().unwrap()).unwrap();
        assert_eq!(data["user_id"], "guest-x");
        assert_eq!(data["user_info"]["type"], "guest");
    }

    #[test]
    fn test_private_user_channel_only_for_owner() {
        let svc = auth_service();
        let user = loader();
        assert!(svc
            .authorize(Some(&user), "g", &form("private-user-u-1"))
            .is_ok());
        assert!(matches!(
            svc.authorize(Some(&user), "g", &form("private-user-u-2")),
            Err(AppError::Forbidden)
        ));
        assert!(matches!(
            svc.authorize(None, "g", &form("private-ops")),
            Err(AppError::Forbidden)
        ));
    }
}
