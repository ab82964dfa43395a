use crate::entities::{
    LedgerCreditStatus, TransactionRequestStatus, TransactionRequestType, UserRole, cashins,
    transaction_request_entity as transaction_requests,
};
use crate::error::{AppError, AppResult};
use crate::external::{LedgerApi, LedgerTransfer, TXN_TYPE_CREDIT};
use crate::models::*;
use crate::services::CasinoGroupService;
use crate::services::realtime_service::{RealtimeAction, RealtimeNotifier};
use crate::utils::RateLimiter;
use chrono::Utc;
use sea_orm::{
    ActiveEnum, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use uuid::Uuid;

/// Loaders serve cash-in chats; admins may settle anything.
fn can_settle(role: UserRole) -> bool {
    role.is_admin_tier() || role == UserRole::Loader
}

fn is_terminal(status: TransactionRequestStatus) -> bool {
    matches!(
        status,
        TransactionRequestStatus::Completed
            | TransactionRequestStatus::Rejected
            | TransactionRequestStatus::Leaved
    )
}

#[derive(Clone)]
pub struct TransactionRequestService {
    pool: DatabaseConnection,
    casino_groups: CasinoGroupService,
    notifier: RealtimeNotifier,
    ledger: Arc<dyn LedgerApi>,
    rate_limiter: Arc<dyn RateLimiter>,
}

impl TransactionRequestService {
    pub fn new(
        pool: DatabaseConnection,
        casino_groups: CasinoGroupService,
        notifier: RealtimeNotifier,
        ledger: Arc<dyn LedgerApi>,
        rate_limiter: Arc<dyn RateLimiter>,
    ) -> Self {
        Self {
            pool,
            casino_groups,
            notifier,
            ledger,
            rate_limiter,
        }
    }

    /// Rate limited per external user.
    pub async fn create(
        &self,
        actor: &CurrentUser,
        request: CreateTransactionRequest,
    ) -> AppResult<transaction_requests::Model> {
        let external_user_id = request.external_user_id.trim();
        if external_user_id.is_empty() {
            return Err(AppError::ValidationError(
                "externalUserId is required".to_string(),
            ));
        }
        if !self
            .rate_limiter
            .check(&format!("transaction-request:{external_user_id}"))
        {
            log::warn!("Transaction request rate limit hit for {external_user_id}");
            return Err(AppError::RateLimited);
        }
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(AppError::ValidationError(
                "amount must be greater than 0".to_string(),
            ));
        }

        let group = self.casino_groups.resolve(&request.casino_group).await?;

        if let Some(cashin_id) = request.cashin_id.as_deref() {
            let cashin = cashins::Entity::find_by_id(cashin_id.to_string())
                .one(&self.pool)
                .await?
                .ok_or_else(|| AppError::NotFound(format!("Cashin {cashin_id} not found")))?;
            if cashin.casino_group_id != group.id {
                return Err(AppError::ValidationError(
                    "Cashin belongs to another casino group".to_string(),
                ));
            }
        }

        let qbet_status = match request.request_type {
            TransactionRequestType::Cashin => LedgerCreditStatus::Pending,
            TransactionRequestType::Cashout => LedgerCreditStatus::NotApplicable,
        };
        let now = Utc::now();
        let row = transaction_requests::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            cashin_id: Set(request.cashin_id.clone()),
            casino_group_id: Set(group.id.clone()),
            external_user_id: Set(external_user_id.to_string()),
            amount: Set(request.amount),
            request_type: Set(request.request_type),
            status: Set(TransactionRequestStatus::Pending),
            qbet_status: Set(qbet_status),
            raw_request: Set(Some(serde_json::to_string(&request)?)),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await?;

        log::info!(
            "{} opened {:?} request {} for {}",
            actor.username,
            row.request_type,
            row.id,
            row.external_user_id
        );
        self.notifier
            .emit_transaction_request(&row.id, &group.name, RealtimeAction::Created)
            .await;
        Ok(row)
    }

    pub async fn list(
        &self,
        query: &TransactionRequestQuery,
    ) -> AppResult<Vec<transaction_requests::Model>> {
        let mut select = transaction_requests::Entity::find();
        if let Some(cashin_id) = query.cashin_id.as_deref() {
            select = select.filter(transaction_requests::Column::CashinId.eq(cashin_id));
        }
        if let Some(status) = query.status {
            select = select.filter(transaction_requests::Column::Status.eq(status));
        }
        Ok(select
            .order_by_desc(transaction_requests::Column::CreatedAt)
            .all(&self.pool)
            .await?)
    }

    /// Completing a CASHIN credits the ledger once; a refused credit leaves
    /// `qbetStatus` PENDING while the request itself is still completed.
    /// Terminal requests only accept their own status again, which retries a
    /// credit that is still pending.
    pub async fn update_status(
        &self,
        actor: &CurrentUser,
        id: &str,
        request: UpdateTransactionRequestStatus,
    ) -> AppResult<transaction_requests::Model> {
        if !can_settle(actor.role) {
            return Err(AppError::Forbidden);
        }
        let row = transaction_requests::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction request {id} not found")))?;
        if is_terminal(row.status) && row.status != request.status {
            return Err(AppError::Conflict(format!(
                "Transaction request {id} is already {}",
                row.status.to_value()
            )));
        }

        let mut qbet_status = row.qbet_status;
        if request.status == TransactionRequestStatus::Completed
            && row.request_type == TransactionRequestType::Cashin
            && row.qbet_status == LedgerCreditStatus::Pending
        {
            let transfer = LedgerTransfer {
                id: row.id.clone(),
                txn: row.id.clone(),
                txn_type: TXN_TYPE_CREDIT.to_string(),
                amount: row.amount,
            };
            match self.ledger.credit(&row.external_user_id, transfer).await {
                Ok(reply) if reply.is_success() => {
                    log::info!("Ledger credited {} for request {}", row.external_user_id, row.id);
                    qbet_status = LedgerCreditStatus::Loaded;
                }
                Ok(reply) => log::error!(
                    "Ledger refused request {} with code {}: {:?}",
                    row.id,
                    reply.code,
                    reply.message
                ),
                Err(e) => log::error!("Ledger credit for request {} failed: {e}", row.id),
            }
        }

        let mut active: transaction_requests::ActiveModel = row.into();
        active.status = Set(request.status);
        active.qbet_status = Set(qbet_status);
        active.updated_at = Set(Utc::now());
        let row = active.update(&self.pool).await?;

        log::info!("{} set request {} to {:?}", actor.username, row.id, row.status);
        let label = self.casino_groups.label(&row.casino_group_id).await;
        self.notifier
            .emit_transaction_request(
                &row.id,
                &label,
                RealtimeAction::from_status(&row.status.to_value()),
            )
            .await;
        Ok(row)
    }
}
