//! Shared shape of the seven ticket tables.
//!
//! Every ticket kind lives in its own table but exposes the same core
//! columns (creator, casino group, free-text status, version). The
//! [`TicketEntity`] trait maps those columns so status transitions, counts
//! and threads are written once and parameterized by [`TicketKind`].

use crate::entities::UserRole;
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, FromQueryResult};
use serde::{Deserialize, Serialize};

pub const PENDING: &str = "PENDING";
pub const ACCOMMODATING: &str = "ACCOMMODATING";
pub const PARTIAL: &str = "PARTIAL";
pub const COMPLETED: &str = "COMPLETED";
pub const REJECTED: &str = "REJECTED";
pub const CLAIMED: &str = "CLAIMED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TicketKind {
    Cashin,
    Cashout,
    Commission,
    Concern,
    CustomerSupport,
    Remittance,
    Task,
}

/// Per-kind configuration consumed by the generic ticket operations.
#[derive(Debug)]
pub struct TicketPolicy {
    pub kind: TicketKind,
    /// Route segment, also stored as `ticket_type` on logs and threads.
    pub slug: &'static str,
    /// Key of the ticket object in JSON responses.
    pub response_key: &'static str,
    /// Count-update channel is `<channel_prefix>-<casino group>`.
    pub channel_prefix: &'static str,
    pub known_statuses: &'static [&'static str],
    /// Statuses counted by the pending-count aggregate.
    pub open_statuses: &'static [&'static str],
    /// Roles besides ADMIN/SUPERADMIN allowed to transition any ticket.
    pub extra_roles: &'static [UserRole],
}

static POLICIES: [TicketPolicy; 7] = [
    TicketPolicy {
        kind: TicketKind::Cashin,
        slug: "cashin",
        response_key: "cashin",
        channel_prefix: "cashin",
        known_statuses: &[PENDING, ACCOMMODATING, COMPLETED, REJECTED],
        open_statuses: &[PENDING],
        extra_roles: &[],
    },
    TicketPolicy {
        kind: TicketKind::Cashout,
        slug: "cashout",
        response_key: "cashout",
        channel_prefix: "cashout",
        known_statuses: &[PENDING, PARTIAL, COMPLETED, REJECTED],
        open_statuses: &[PENDING, PARTIAL],
        extra_roles: &[],
    },
    TicketPolicy {
        kind: TicketKind::Commission,
        slug: "commission",
        response_key: "commission",
        channel_prefix: "commission",
        known_statuses: &[PENDING, COMPLETED, REJECTED],
        open_statuses: &[PENDING],
        extra_roles: &[],
    },
    TicketPolicy {
        kind: TicketKind::Concern,
        slug: "concern",
        response_key: "concern",
        channel_prefix: "concern",
        known_statuses: &[PENDING, CLAIMED, COMPLETED, REJECTED],
        open_statuses: &[PENDING],
        extra_roles: &[],
    },
    TicketPolicy {
        kind: TicketKind::CustomerSupport,
        slug: "customer-support",
        response_key: "customerSupport",
        channel_prefix: "customer-support",
        known_statuses: &[PENDING, CLAIMED, COMPLETED, REJECTED],
        open_statuses: &[PENDING],
        extra_roles: &[],
    },
    TicketPolicy {
        kind: TicketKind::Remittance,
        slug: "remittance",
        response_key: "remittance",
        channel_prefix: "remittance",
        known_statuses: &[PENDING, COMPLETED, REJECTED],
        open_statuses: &[PENDING],
        extra_roles: &[UserRole::Accounting],
    },
    TicketPolicy {
        kind: TicketKind::Task,
        slug: "task",
        response_key: "task",
        channel_prefix: "task",
        known_statuses: &[PENDING, CLAIMED, COMPLETED, REJECTED],
        open_statuses: &[PENDING],
        extra_roles: &[],
    },
];

impl TicketKind {
    pub const ALL: [TicketKind; 7] = [
        TicketKind::Cashin,
        TicketKind::Cashout,
        TicketKind::Commission,
        TicketKind::Concern,
        TicketKind::CustomerSupport,
        TicketKind::Remittance,
        TicketKind::Task,
    ];

    pub fn policy(self) -> &'static TicketPolicy {
        &POLICIES[self as usize]
    }

    pub fn slug(self) -> &'static str {
        self.policy().slug
    }
}

impl TicketPolicy {
    pub fn is_known_status(&self, status: &str) -> bool {
        self.known_statuses.contains(&status)
    }

    pub fn allows_role(&self, role: UserRole) -> bool {
        role.is_admin_tier() || self.extra_roles.contains(&role)
    }
}

/// Core columns of any ticket row, selected generically.
#[derive(Debug, Clone, FromQueryResult)]
pub struct TicketHead {
    pub id: String,
    pub creator_id: String,
    pub casino_group_id: String,
    pub status: String,
    pub version: i32,
}

/// Input for a new ticket of any kind. Each entity picks the fields it
/// stores and validates the ones it requires.
#[derive(Debug, Clone)]
pub struct TicketDraft {
    pub id: String,
    pub creator_id: String,
    pub casino_group_id: String,
    pub now: DateTime<Utc>,
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

impl TicketDraft {
    pub fn require_amount(&self) -> AppResult<f64> {
        match self.amount {
            Some(amount) if amount.is_finite() && amount > 0.0 => Ok(amount),
            _ => Err(AppError::ValidationError(
                "amount must be greater than 0".to_string(),
            )),
        }
    }

    pub fn require_text(value: &Option<String>, field: &str) -> AppResult<String> {
        match value.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() => Ok(v.to_string()),
            _ => Err(AppError::ValidationError(format!("{field} is required"))),
        }
    }
}

/// Column mapping implemented by each ticket table.
pub trait TicketEntity:
    EntityTrait<
        Model: Serialize + Send + Sync,
        ActiveModel: ActiveModelTrait<Entity = Self> + Send,
    > + Default
{
    const KIND: TicketKind;

    fn id_column() -> Self::Column;
    fn creator_column() -> Self::Column;
    fn casino_group_column() -> Self::Column;
    fn status_column() -> Self::Column;
    fn version_column() -> Self::Column;
    fn created_at_column() -> Self::Column;
    fn updated_at_column() -> Self::Column;

    fn new_ticket(draft: TicketDraft) -> AppResult<Self::ActiveModel>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_table_is_indexed_by_kind() {
        for kind in TicketKind::ALL {
            assert_eq!(kind.policy().kind, kind);
        }
    }

    #[test]
    fn test_cashout_counts_partial_as_open() {
        let policy = TicketKind::Cashout.policy();
        assert_eq!(policy.open_statuses, &[PENDING, PARTIAL]);
        assert_eq!(TicketKind::Cashin.policy().open_statuses, &[PENDING]);
    }

    #[test]
    fn test_accounting_only_authorized_for_remittance() {
        assert!(TicketKind::Remittance.policy().allows_role(UserRole::Accounting));
        assert!(!TicketKind::Cashout.policy().allows_role(UserRole::Accounting));
        assert!(TicketKind::Task.policy().allows_role(UserRole::Superadmin));
        assert!(!TicketKind::Task.policy().allows_role(UserRole::Loader));
    }

    #[test]
    fn test_draft_amount_validation() {
        let mut draft = TicketDraft {
            id: "t".into(),
            creator_id: "u".into(),
            casino_group_id: "g".into(),
            now: Utc::now(),
            amount: Some(0.0),
            subject: None,
            message: None,
            title: None,
            description: None,
            assignee_id: None,
            payment_method: None,
            account_name: None,
            account_number: None,
            reference_number: None,
        };
        assert!(draft.require_amount().is_err());
        draft.amount = Some(500.0);
        assert_eq!(draft.require_amount().unwrap(), 500.0);
        assert!(TicketDraft::require_text(&Some("  ".into()), "subject").is_err());
    }
}
