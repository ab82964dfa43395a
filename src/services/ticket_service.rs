//! Generic ticket operations shared by all seven ticket kinds.
//!
//! A status transition is: authorize, conditional update on `version` plus
//! one audit-log row in a single transaction, then recount and publish.
//! Publishing happens after commit and never fails the request.

use crate::entities::ticket::COMPLETED;
use crate::entities::{
    TicketDraft, TicketEntity, TicketHead, TicketKind, TransactionRequestStatus, cashins,
    thread_attachment_entity as thread_attachments, ticket_log_entity as ticket_logs,
    ticket_thread_entity as ticket_threads, transaction_request_entity as transaction_requests,
};
use crate::error::{AppError, AppResult};
use crate::external::BlobStore;
use crate::models::*;
use crate::services::pending_count::{count_open, count_open_kind};
use crate::services::realtime_service::{RealtimeAction, RealtimeNotifier};
use crate::services::CasinoGroupService;
use chrono::{DateTime, Utc};
use futures_util::future::try_join_all;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Clone)]
pub struct TicketService {
    pool: DatabaseConnection,
    casino_groups: CasinoGroupService,
    notifier: RealtimeNotifier,
    blob_store: Arc<dyn BlobStore>,
    strict_status_validation: bool,
}

impl TicketService {
    pub fn new(
        pool: DatabaseConnection,
        casino_groups: CasinoGroupService,
        notifier: RealtimeNotifier,
        blob_store: Arc<dyn BlobStore>,
        strict_status_validation: bool,
    ) -> Self {
        Self {
            pool,
            casino_groups,
            notifier,
            blob_store,
            strict_status_validation,
        }
    }

    async fn load_head<E: TicketEntity, C: ConnectionTrait>(
        db: &C,
        id: &str,
    ) -> AppResult<TicketHead> {
        E::find()
            .select_only()
            .column_as(E::id_column(), "id")
            .column_as(E::creator_column(), "creator_id")
            .column_as(E::casino_group_column(), "casino_group_id")
            .column_as(E::status_column(), "status")
            .column_as(E::version_column(), "version")
            .filter(E::id_column().eq(id))
            .into_model::<TicketHead>()
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {id} not found", E::KIND.slug())))
    }

    fn authorize(kind: TicketKind, head: &TicketHead, actor: &CurrentUser) -> AppResult<()> {
        if head.creator_id == actor.id || kind.policy().allows_role(actor.role) {
            return Ok(());
        }
        log::warn!(
            "User {} ({}) may not transition {} {}",
            actor.id,
            actor.role,
            kind.slug(),
            head.id
        );
        Err(AppError::Forbidden)
    }

    /// Conditional status write plus its audit row. Must run inside a
    /// transaction so the two land together.
    async fn write_transition<E: TicketEntity, C: ConnectionTrait>(
        db: &C,
        head: &TicketHead,
        status: &str,
        actor_id: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        let result = E::update_many()
            .col_expr(E::status_column(), Expr::value(status))
            .col_expr(
                E::version_column(),
                Expr::col(E::version_column()).add(1),
            )
            .col_expr(E::updated_at_column(), Expr::value(now))
            .filter(E::id_column().eq(head.id.as_str()))
            .filter(E::version_column().eq(head.version))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::Conflict(format!(
                "{} {} was modified by someone else, reload and retry",
                E::KIND.slug(),
                head.id
            )));
        }

        ticket_logs::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            ticket_type: Set(E::KIND.slug().to_string()),
            ticket_id: Set(head.id.clone()),
            action: Set(status.to_string()),
            performed_by_id: Set(actor_id.to_string()),
            created_at: Set(now),
        }
        .insert(db)
        .await?;
        Ok(())
    }

    /// Recount and publish after a committed change.
    async fn announce(
        &self,
        kind: TicketKind,
        casino_group_id: &str,
        ticket_id: &str,
        action: RealtimeAction,
    ) {
        let label = self.casino_groups.label(casino_group_id).await;
        match count_open_kind(&self.pool, kind, casino_group_id).await {
            Ok(count) => self.notifier.emit_pending_count(kind, &label, count).await,
            Err(e) => log::warn!("Failed to recount pending {}: {e}", kind.slug()),
        }
        self.notifier
            .emit_ticket_updated(kind, ticket_id, &label, action)
            .await;
    }

    async fn thread_views(&self, kind: TicketKind, ticket_id: &str) -> AppResult<Vec<TicketThreadView>> {
        let threads = ticket_threads::Entity::find()
            .filter(ticket_threads::Column::TicketType.eq(kind.slug()))
            .filter(ticket_threads::Column::TicketId.eq(ticket_id))
            .order_by_asc(ticket_threads::Column::CreatedAt)
            .all(&self.pool)
            .await?;
        if threads.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = threads.iter().map(|t| t.id.clone()).collect();
        let mut attachments = thread_attachments::Entity::find()
            .filter(thread_attachments::Column::ParentThreadId.is_in(ids))
            .order_by_asc(thread_attachments::Column::CreatedAt)
            .all(&self.pool)
            .await?;

        Ok(threads
            .into_iter()
            .map(|thread| {
                let (mine, rest): (Vec<_>, Vec<_>) = attachments
                    .drain(..)
                    .partition(|a| a.parent_thread_id == thread.id);
                attachments = rest;
                TicketThreadView {
                    thread,
                    attachments: mine,
                }
            })
            .collect())
    }

    /// Ticket row with `logs` and `threads[].attachments` merged in.
    pub async fn get<E: TicketEntity>(&self, id: &str) -> AppResult<Value> {
        let kind = E::KIND;
        let model = E::find()
            .filter(E::id_column().eq(id))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {id} not found", kind.slug())))?;

        let logs_fut = ticket_logs::Entity::find()
            .filter(ticket_logs::Column::TicketType.eq(kind.slug()))
            .filter(ticket_logs::Column::TicketId.eq(id))
            .order_by_asc(ticket_logs::Column::CreatedAt)
            .all(&self.pool);
        let (logs, threads) = tokio::try_join!(
            async { logs_fut.await.map_err(AppError::from) },
            self.thread_views(kind, id)
        )?;

        let mut value = serde_json::to_value(&model)?;
        if let Value::Object(map) = &mut value {
            map.insert("logs".to_string(), serde_json::to_value(logs)?);
            map.insert("threads".to_string(), serde_json::to_value(threads)?);
        }
        Ok(value)
    }

    pub async fn list<E: TicketEntity>(
        &self,
        query: &TicketListQuery,
    ) -> AppResult<PaginatedResponse<E::Model>> {
        let params = PaginationParams::new(query.page, query.page_size);
        let mut select = E::find();

        if let Some(key) = query.casino_group.as_deref().filter(|s| !s.trim().is_empty()) {
            let group = self.casino_groups.resolve(key).await?;
            select = select.filter(E::casino_group_column().eq(group.id));
        }
        if let Some(status) = query.status.as_deref().filter(|s| !s.trim().is_empty()) {
            select = select.filter(E::status_column().eq(status.trim()));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(E::created_at_column())
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;

        Ok(PaginatedResponse::new(rows, &params, total))
    }

    pub async fn create<E: TicketEntity>(
        &self,
        actor: &CurrentUser,
        request: CreateTicketRequest,
    ) -> AppResult<Value> {
        let group = self.casino_groups.resolve(&request.casino_group).await?;
        let id = Uuid::new_v4().to_string();

        let active = E::new_ticket(TicketDraft {
            id: id.clone(),
            creator_id: actor.id.clone(),
            casino_group_id: group.id.clone(),
            now: Utc::now(),
            amount: request.amount,
            subject: request.subject,
            message: request.message,
            title: request.title,
            description: request.description,
            assignee_id: request.assignee_id,
            payment_method: request.payment_method,
            account_name: request.account_name,
            account_number: request.account_number,
            reference_number: request.reference_number,
        })?;
        E::insert(active).exec(&self.pool).await?;
        log::info!("{} {id} created by {} in {}", E::KIND.slug(), actor.id, group.name);

        self.announce(E::KIND, &group.id, &id, RealtimeAction::Created)
            .await;
        self.get::<E>(&id).await
    }

    pub async fn update_status<E: TicketEntity>(
        &self,
        actor: &CurrentUser,
        id: &str,
        request: UpdateTicketStatusRequest,
    ) -> AppResult<Value> {
        let kind = E::KIND;
        let head = Self::load_head::<E, _>(&self.pool, id).await?;

        let status = request.status.trim();
        if status.is_empty() {
            return Err(AppError::ValidationError("status is required".to_string()));
        }
        Self::authorize(kind, &head, actor)?;

        if !kind.policy().is_known_status(status) {
            if self.strict_status_validation {
                return Err(AppError::ValidationError(format!(
                    "Unknown {} status: {status}",
                    kind.slug()
                )));
            }
            log::warn!("Writing unknown {} status {status} on {id}", kind.slug());
        }
        if let Some(expected) = request.version
            && expected != head.version
        {
            return Err(AppError::Conflict(format!(
                "{} {id} is at version {}, not {expected}",
                kind.slug(),
                head.version
            )));
        }

        let txn = self.pool.begin().await?;
        Self::write_transition::<E, _>(&txn, &head, status, &actor.id, Utc::now()).await?;
        txn.commit().await?;
        log::info!("{} {id}: {} -> {status} by {}", kind.slug(), head.status, actor.id);

        self.announce(kind, &head.casino_group_id, id, RealtimeAction::from_status(status))
            .await;
        self.get::<E>(id).await
    }

    /// Adds a comment with attachments. Uploads run concurrently before the
    /// rows are written.
    pub async fn add_thread<E: TicketEntity>(
        &self,
        actor: &CurrentUser,
        id: &str,
        message: String,
        files: Vec<UploadedFile>,
    ) -> AppResult<TicketThreadView> {
        let kind = E::KIND;
        let message = message.trim().to_string();
        if message.is_empty() && files.is_empty() {
            return Err(AppError::ValidationError("message is required".to_string()));
        }
        let head = Self::load_head::<E, _>(&self.pool, id).await?;
        let thread_id = Uuid::new_v4().to_string();

        let uploads = files.into_iter().map(|file| {
            let store = self.blob_store.clone();
            let path = format!(
                "threads/{}/{}/{}/{}-{}",
                kind.slug(),
                id,
                thread_id,
                Uuid::new_v4(),
                sanitize_filename(&file.filename)
            );
            async move {
                let url = store.put(&path, &file.content_type, file.bytes).await?;
                Ok::<_, AppError>((url, file.filename, file.content_type))
            }
        });
        let uploaded = try_join_all(uploads).await?;

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let thread = ticket_threads::ActiveModel {
            id: Set(thread_id.clone()),
            ticket_type: Set(kind.slug().to_string()),
            ticket_id: Set(head.id.clone()),
            author_id: Set(actor.id.clone()),
            message: Set(message),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut attachments = Vec::with_capacity(uploaded.len());
        for (url, filename, mimetype) in uploaded {
            let row = thread_attachments::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                parent_thread_id: Set(thread_id.clone()),
                url: Set(url),
                filename: Set(filename),
                mimetype: Set(mimetype),
                created_at: Set(now),
            }
            .insert(&txn)
            .await?;
            attachments.push(row);
        }
        txn.commit().await?;

        let label = self.casino_groups.label(&head.casino_group_id).await;
        self.notifier
            .emit_thread_created(kind, id, &label, &thread_id)
            .await;

        Ok(TicketThreadView {
            thread,
            attachments,
        })
    }

    pub async fn count_pending<E: TicketEntity>(&self, query: &CasinoGroupQuery) -> AppResult<u64> {
        let group = self.casino_groups.resolve_query(query).await?;
        count_open::<E, _>(&self.pool, &group.id).await
    }

    /// Completes a cash-in chat and releases its queued transaction requests.
    /// A cash-in that is already COMPLETED is returned untouched.
    pub async fn close_cashin_chat(&self, actor: &CurrentUser, id: &str) -> AppResult<Value> {
        let head = Self::load_head::<cashins::Entity, _>(&self.pool, id).await?;
        Self::authorize(TicketKind::Cashin, &head, actor)?;

        if head.status == COMPLETED {
            log::debug!("cashin {id} already closed");
            return self.get::<cashins::Entity>(id).await;
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        Self::write_transition::<cashins::Entity, _>(&txn, &head, COMPLETED, &actor.id, now)
            .await?;
        let released = transaction_requests::Entity::update_many()
            .col_expr(
                transaction_requests::Column::Status,
                Expr::value(TransactionRequestStatus::Leaved),
            )
            .col_expr(transaction_requests::Column::UpdatedAt, Expr::value(now))
            .filter(transaction_requests::Column::CashinId.eq(id))
            .filter(transaction_requests::Column::Status.is_in([
                TransactionRequestStatus::Pending,
                TransactionRequestStatus::Accommodating,
            ]))
            .exec(&txn)
            .await?;
        txn.commit().await?;
        log::info!(
            "cashin {id} closed by {}, {} transaction request(s) left",
            actor.id,
            released.rows_affected
        );

        self.announce(
            TicketKind::Cashin,
            &head.casino_group_id,
            id,
            RealtimeAction::Approved,
        )
        .await;
        self.get::<cashins::Entity>(id).await
    }
}

fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{
        LedgerCreditStatus, TransactionRequestType, UserRole, cashouts, remittances, tasks,
    };
    use crate::services::pending_count::pending_counts;
    use crate::test_support::*;
    use sea_orm::DatabaseConnection;

    struct Fixture {
        db: DatabaseConnection,
        svc: TicketService,
        publisher: Arc<RecordingPublisher>,
        loader: CurrentUser,
        other: CurrentUser,
        admin: CurrentUser,
        accounting: CurrentUser,
    }

    async fn fixture() -> Fixture {
        let db = setup_db().await;
        seed_group(&db, "g-1", "QBET").await;
        let loader = seed_user(&db, "u-loader", "loader", UserRole::Loader).await;
        let other = seed_user(&db, "u-other", "other", UserRole::Support).await;
        let admin = seed_user(&db, "u-admin", "admin", UserRole::Admin).await;
        let accounting = seed_user(&db, "u-acc", "acc", UserRole::Accounting).await;
        let publisher = Arc::new(RecordingPublisher::default());
        let svc = TicketService::new(
            db.clone(),
            CasinoGroupService::new(db.clone()),
            RealtimeNotifier::new(publisher.clone()),
            Arc::new(MemoryBlobStore::default()),
            false,
        );
        Fixture {
            db,
            svc,
            publisher,
            loader,
            other,
            admin,
            accounting,
        }
    }

    fn cashin_request(amount: f64) -> CreateTicketRequest {
        CreateTicketRequest {
            casino_group: "qbet".into(),
            amount: Some(amount),
            ..Default::default()
        }
    }

    fn status(s: &str) -> UpdateTicketStatusRequest {
        UpdateTicketStatusRequest {
            status: s.into(),
            version: None,
        }
    }

    async fn log_count(db: &DatabaseConnection, ticket_id: &str) -> u64 {
        ticket_logs::Entity::find()
            .filter(ticket_logs::Column::TicketId.eq(ticket_id))
            .count(db)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_cashin_starts_pending_and_announces() {
        let f = fixture().await;
        let ticket = f
            .svc
            .create::<cashins::Entity>(&f.loader, cashin_request(500.0))
            .await
            .unwrap();
        assert_eq!(ticket["status"], "PENDING");
        assert_eq!(ticket["amount"], 500.0);
        assert_eq!(ticket["version"], 0);
        assert_eq!(ticket["logs"].as_array().unwrap().len(), 0);

        let events = f.publisher.events();
        assert!(events
            .iter()
            .any(|(c, e, d)| c == "cashin-QBET" && e == "pending-count" && d["count"] == 1));
        assert!(events
            .iter()
            .any(|(c, _, d)| c == "transactions-QBET" && d["action"] == "CREATED"));
    }

    #[tokio::test]
    async fn test_create_validates_required_fields() {
        let f = fixture().await;
        let err = f
            .svc
            .create::<cashins::Entity>(&f.loader, cashin_request(0.0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));

        let err = f
            .svc
            .create::<tasks::Entity>(
                &f.loader,
                CreateTicketRequest {
                    casino_group: "QBET".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_transition_writes_exactly_one_log_row() {
        let f = fixture().await;
        let ticket = f
            .svc
            .create::<cashouts::Entity>(&f.loader, cashin_request(300.0))
            .await
            .unwrap();
        let id = ticket["id"].as_str().unwrap().to_string();

        let updated = f
            .svc
            .update_status::<cashouts::Entity>(&f.admin, &id, status("COMPLETED"))
            .await
            .unwrap();
        assert_eq!(updated["status"], "COMPLETED");
        assert_eq!(updated["version"], 1);

        let logs = updated["logs"].as_array().unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0]["action"], "COMPLETED");
        assert_eq!(logs[0]["performedById"], "u-admin");
        assert_eq!(log_count(&f.db, &id).await, 1);

        assert!(f
            .publisher
            .events()
            .iter()
            .any(|(_, e, d)| e == "cashout-updated" && d["action"] == "APPROVED"));
    }

    #[tokio::test]
    async fn test_creator_may_transition_own_ticket() {
        let f = fixture().await;
        let ticket = f
            .svc
            .create::<cashins::Entity>(&f.loader, cashin_request(100.0))
            .await
            .unwrap();
        let id = ticket["id"].as_str().unwrap();
        let updated = f
            .svc
            .update_status::<cashins::Entity>(&f.loader, id, status("ACCOMMODATING"))
            .await
            .unwrap();
        assert_eq!(updated["status"], "ACCOMMODATING");
    }

    #[tokio::test]
    async fn test_forbidden_transition_makes_no_writes() {
        let f = fixture().await;
        let ticket = f
            .svc
            .create::<cashins::Entity>(&f.loader, cashin_request(100.0))
            .await
            .unwrap();
        let id = ticket["id"].as_str().unwrap();

        let err = f
            .svc
            .update_status::<cashins::Entity>(&f.other, id, status("COMPLETED"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert_eq!(log_count(&f.db, id).await, 0);

        let unchanged = f.svc.get::<cashins::Entity>(id).await.unwrap();
        assert_eq!(unchanged["status"], "PENDING");
        assert_eq!(unchanged["version"], 0);
    }

    #[tokio::test]
    async fn test_accounting_may_settle_remittance_only() {
        let f = fixture().await;
        let remittance = f
            .svc
            .create::<remittances::Entity>(&f.loader, cashin_request(1000.0))
            .await
            .unwrap();
        let rid = remittance["id"].as_str().unwrap();
        assert!(f
            .svc
            .update_status::<remittances::Entity>(&f.accounting, rid, status("COMPLETED"))
            .await
            .is_ok());

        let cashout = f
            .svc
            .create::<cashouts::Entity>(&f.loader, cashin_request(1000.0))
            .await
            .unwrap();
        let cid = cashout["id"].as_str().unwrap();
        assert!(matches!(
            f.svc
                .update_status::<cashouts::Entity>(&f.accounting, cid, status("COMPLETED"))
                .await,
            Err(AppError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_unknown_status_is_written_verbatim() {
        let f = fixture().await;
        let ticket = f
            .svc
            .create::<cashins::Entity>(&f.loader, cashin_request(100.0))
            .await
            .unwrap();
        let id = ticket["id"].as_str().unwrap();
        let updated = f
            .svc
            .update_status::<cashins::Entity>(&f.admin, id, status("BANANA"))
            .await
            .unwrap();
        assert_eq!(updated["status"], "BANANA");
        assert_eq!(updated["logs"][0]["action"], "BANANA");
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_unknown_status() {
        let f = fixture().await;
        let strict = TicketService {
            strict_status_validation: true,
            ..f.svc.clone()
        };
        let ticket = strict
            .create::<cashins::Entity>(&f.loader, cashin_request(100.0))
            .await
            .unwrap();
        let id = ticket["id"].as_str().unwrap();
        let err = strict
            .update_status::<cashins::Entity>(&f.admin, id, status("BANANA"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
        assert_eq!(log_count(&f.db, id).await, 0);
    }

    #[tokio::test]
    async fn test_missing_ticket_and_empty_status() {
        let f = fixture().await;
        assert!(matches!(
            f.svc
                .update_status::<cashins::Entity>(&f.admin, "missing", status("COMPLETED"))
                .await,
            Err(AppError::NotFound(_))
        ));

        let ticket = f
            .svc
            .create::<cashins::Entity>(&f.loader, cashin_request(100.0))
            .await
            .unwrap();
        let id = ticket["id"].as_str().unwrap();
        assert!(matches!(
            f.svc
                .update_status::<cashins::Entity>(&f.admin, id, status("   "))
                .await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_stale_version_is_rejected_with_conflict() {
        let f = fixture().await;
        let ticket = f
            .svc
            .create::<cashins::Entity>(&f.loader, cashin_request(100.0))
            .await
            .unwrap();
        let id = ticket["id"].as_str().unwrap();
        f.svc
            .update_status::<cashins::Entity>(&f.admin, id, status("ACCOMMODATING"))
            .await
            .unwrap();

        let stale = UpdateTicketStatusRequest {
            status: "COMPLETED".into(),
            version: Some(0),
        };
        let err = f
            .svc
            .update_status::<cashins::Entity>(&f.admin, id, stale)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(log_count(&f.db, id).await, 1);
    }

    #[tokio::test]
    async fn test_conditional_update_detects_concurrent_write() {
        let f = fixture().await;
        let ticket = f
            .svc
            .create::<cashins::Entity>(&f.loader, cashin_request(100.0))
            .await
            .unwrap();
        let id = ticket["id"].as_str().unwrap();
        let head = TicketService::load_head::<cashins::Entity, _>(&f.db, id)
            .await
            .unwrap();

        // another writer bumps the version after our read
        f.svc
            .update_status::<cashins::Entity>(&f.admin, id, status("ACCOMMODATING"))
            .await
            .unwrap();

        let err = TicketService::write_transition::<cashins::Entity, _>(
            &f.db,
            &head,
            "COMPLETED",
            "u-admin",
            Utc::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_close_chat_is_idempotent_and_releases_requests() {
        let f = fixture().await;
        let ticket = f
            .svc
            .create::<cashins::Entity>(&f.loader, cashin_request(500.0))
            .await
            .unwrap();
        let id = ticket["id"].as_str().unwrap().to_string();

        let now = Utc::now();
        for (rid, st) in [
            ("tr-1", TransactionRequestStatus::Pending),
            ("tr-2", TransactionRequestStatus::Accommodating),
            ("tr-3", TransactionRequestStatus::Completed),
        ] {
            transaction_requests::ActiveModel {
                id: Set(rid.into()),
                cashin_id: Set(Some(id.clone())),
                casino_group_id: Set("g-1".into()),
                external_user_id: Set("player-1".into()),
                amount: Set(100.0),
                request_type: Set(TransactionRequestType::Cashin),
                status: Set(st),
                qbet_status: Set(LedgerCreditStatus::Pending),
                raw_request: Set(None),
                created_at: Set(now),
                updated_at: Set(now),
            }
            .insert(&f.db)
            .await
            .unwrap();
        }

        let closed = f.svc.close_cashin_chat(&f.loader, &id).await.unwrap();
        assert_eq!(closed["status"], "COMPLETED");
        assert_eq!(log_count(&f.db, &id).await, 1);

        let statuses = |db: DatabaseConnection| async move {
            let mut rows = transaction_requests::Entity::find().all(&db).await.unwrap();
            rows.sort_by(|a, b| a.id.cmp(&b.id));
            rows.into_iter().map(|r| r.status).collect::<Vec<_>>()
        };
        let after_first = statuses(f.db.clone()).await;
        assert_eq!(
            after_first,
            vec![
                TransactionRequestStatus::Leaved,
                TransactionRequestStatus::Leaved,
                TransactionRequestStatus::Completed,
            ]
        );

        let again = f.svc.close_cashin_chat(&f.loader, &id).await.unwrap();
        assert_eq!(again["status"], "COMPLETED");
        assert_eq!(again["version"], closed["version"]);
        assert_eq!(log_count(&f.db, &id).await, 1);
        assert_eq!(statuses(f.db.clone()).await, after_first);
    }

    #[tokio::test]
    async fn test_pending_counts_example() {
        let f = fixture().await;
        for _ in 0..3 {
            f.svc
                .create::<cashouts::Entity>(&f.loader, cashin_request(10.0))
                .await
                .unwrap();
        }
        f.svc
            .create::<tasks::Entity>(
                &f.loader,
                CreateTicketRequest {
                    casino_group: "QBET".into(),
                    title: Some("restock".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let counts = pending_counts(&f.db, "g-1").await.unwrap();
        assert_eq!(counts.cashout, 3);
        assert_eq!(counts.remittance, 0);
        assert_eq!(counts.task, 1);
        assert_eq!(counts.total, 4);
        // no mutation in between, same answer
        assert_eq!(pending_counts(&f.db, "g-1").await.unwrap(), counts);
    }

    #[tokio::test]
    async fn test_partial_cashout_still_counts_as_open() {
        let f = fixture().await;
        let ticket = f
            .svc
            .create::<cashouts::Entity>(&f.loader, cashin_request(10.0))
            .await
            .unwrap();
        let id = ticket["id"].as_str().unwrap();
        f.svc
            .update_status::<cashouts::Entity>(&f.admin, id, status("PARTIAL"))
            .await
            .unwrap();

        let query = CasinoGroupQuery {
            casino_group: Some("QBET".into()),
            casino_group_id: None,
        };
        assert_eq!(f.svc.count_pending::<cashouts::Entity>(&query).await.unwrap(), 1);

        f.svc
            .update_status::<cashouts::Entity>(&f.admin, id, status("COMPLETED"))
            .await
            .unwrap();
        assert_eq!(f.svc.count_pending::<cashouts::Entity>(&query).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_thread_with_attachments() {
        let f = fixture().await;
        let ticket = f
            .svc
            .create::<cashins::Entity>(&f.loader, cashin_request(100.0))
            .await
            .unwrap();
        let id = ticket["id"].as_str().unwrap();

        let files = vec![
            UploadedFile {
                filename: "receipt 1.png".into(),
                content_type: "image/png".into(),
                bytes: vec![1, 2, 3],
            },
            UploadedFile {
                filename: "slip.pdf".into(),
                content_type: "application/pdf".into(),
                bytes: vec![4, 5],
            },
        ];
        let view = f
            .svc
            .add_thread::<cashins::Entity>(&f.other, id, "paid".into(), files)
            .await
            .unwrap();
        assert_eq!(view.attachments.len(), 2);
        assert!(view.attachments[0].url.contains("receipt_1.png"));

        let full = f.svc.get::<cashins::Entity>(id).await.unwrap();
        assert_eq!(full["threads"][0]["message"], "paid");
        assert_eq!(full["threads"][0]["attachments"].as_array().unwrap().len(), 2);

        assert!(matches!(
            f.svc
                .add_thread::<cashins::Entity>(&f.other, id, "  ".into(), vec![])
                .await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_list_filters_by_group_and_status() {
        let f = fixture().await;
        seed_group(&f.db, "g-2", "LUCKY").await;
        f.svc
            .create::<cashins::Entity>(&f.loader, cashin_request(1.0))
            .await
            .unwrap();
        f.svc
            .create::<cashins::Entity>(
                &f.loader,
                CreateTicketRequest {
                    casino_group: "LUCKY".into(),
                    amount: Some(2.0),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let page = f
            .svc
            .list::<cashins::Entity>(&TicketListQuery {
                casino_group: Some("lucky".into()),
                status: Some("PENDING".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.data[0].amount, 2.0);
    }
}
