//! Payment-gateway proxy and ledger crediting.
//!
//! Settlement (`status`) and ledger credit (`qbet_status`) are tracked as two
//! separate state machines on the same row. A gateway success whose ledger
//! credit fails ends as `FAILED`/`PENDING` and is picked up by the
//! reconciliation sweep instead of being reported as loaded.

use crate::entities::{
    LedgerCreditStatus, PaymentGateway, PaymentType, SettlementStatus, UserRole,
    dpay_config_entity as dpay_configs, payment_transaction_entity as payment_transactions,
};
use crate::error::{AppError, AppResult};
use crate::external::{
    GatewayOrder, LedgerApi, LedgerReply, LedgerTransfer, MerchantCredentials, PaymentGatewayApi,
    TXN_TYPE_CREDIT, map_dpay_status, map_optimum_status,
};
use crate::models::*;
use crate::services::{CasinoGroupService, NotificationService};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

/// Outcome of a deposit credit attempt on both state machines.
pub fn settle_deposit(credit: &AppResult<LedgerReply>) -> (SettlementStatus, LedgerCreditStatus) {
    match credit {
        Ok(reply) if reply.is_success() => (SettlementStatus::Completed, LedgerCreditStatus::Loaded),
        _ => (SettlementStatus::Failed, LedgerCreditStatus::Pending),
    }
}

fn json_str(payload: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match payload.get(*k) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Transaction reference and reported settlement of a webhook body.
/// Log line for a webhook that cannot be applied; carries the raw body so
/// the payload survives in the logs.
pub fn dropped_webhook_line(gateway: PaymentGateway, reason: &str, raw: &str) -> String {
    format!("Dropped {gateway:?} webhook ({reason}): {raw}")
}

pub fn parse_webhook(
    gateway: PaymentGateway,
    payload: &Value,
) -> AppResult<(String, SettlementStatus)> {
    let (reference, status) = match gateway {
        PaymentGateway::Dpay => {
            let reference = json_str(payload, &["order_no", "transaction_number", "merchant_order_no"]);
            let code = json_str(payload, &["status"])
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or_default();
            (reference, map_dpay_status(code))
        }
        PaymentGateway::OptimumPay => {
            let reference = json_str(payload, &["reference", "transaction_number", "id"]);
            let status = json_str(payload, &["status"]).unwrap_or_default();
            (reference, map_optimum_status(&status))
        }
    };
    let reference = reference.ok_or_else(|| {
        AppError::ValidationError("Webhook is missing the transaction reference".to_string())
    })?;
    Ok((reference, status))
}

#[derive(Clone)]
pub struct PaymentService {
    pool: DatabaseConnection,
    casino_groups: CasinoGroupService,
    dpay: Arc<dyn PaymentGatewayApi>,
    optimum_pay: Arc<dyn PaymentGatewayApi>,
    ledger: Arc<dyn LedgerApi>,
    notifications: NotificationService,
}

impl PaymentService {
    pub fn new(
        pool: DatabaseConnection,
        casino_groups: CasinoGroupService,
        dpay: Arc<dyn PaymentGatewayApi>,
        optimum_pay: Arc<dyn PaymentGatewayApi>,
        ledger: Arc<dyn LedgerApi>,
        notifications: NotificationService,
    ) -> Self {
        Self {
            pool,
            casino_groups,
            dpay,
            optimum_pay,
            ledger,
            notifications,
        }
    }

    fn client(&self, gateway: PaymentGateway) -> &Arc<dyn PaymentGatewayApi> {
        match gateway {
            PaymentGateway::Dpay => &self.dpay,
            PaymentGateway::OptimumPay => &self.optimum_pay,
        }
    }

    async fn merchant(
        &self,
        gateway: PaymentGateway,
        casino_group_id: &str,
    ) -> AppResult<Option<MerchantCredentials>> {
        if gateway != PaymentGateway::Dpay {
            return Ok(None);
        }
        let cfg = dpay_configs::Entity::find()
            .filter(dpay_configs::Column::CasinoGroupId.eq(casino_group_id))
            .filter(dpay_configs::Column::Active.eq(true))
            .one(&self.pool)
            .await?
            .ok_or_else(|| {
                AppError::ValidationError("Dpay is not configured for this casino group".to_string())
            })?;
        Ok(Some(MerchantCredentials {
            merchant_code: cfg.merchant_code,
            secret_key: cfg.secret_key,
        }))
    }

    async fn save_status(
        &self,
        row: payment_transactions::Model,
        status: SettlementStatus,
        qbet_status: LedgerCreditStatus,
    ) -> AppResult<payment_transactions::Model> {
        let mut active: payment_transactions::ActiveModel = row.into();
        active.status = Set(status);
        active.qbet_status = Set(qbet_status);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.pool).await?)
    }

    /// Persists the row, calls the gateway and passes its body through.
    /// A non-2xx answer marks the row FAILED and mirrors the gateway status.
    pub async fn initiate(
        &self,
        gateway: PaymentGateway,
        payment_type: PaymentType,
        actor: Option<&CurrentUser>,
        request: PaymentRequest,
    ) -> AppResult<Value> {
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(AppError::ValidationError(
                "amount must be greater than 0".to_string(),
            ));
        }
        if request.external_user_id.trim().is_empty() {
            return Err(AppError::ValidationError(
                "externalUserId is required".to_string(),
            ));
        }
        let group = self.casino_groups.resolve(&request.casino_group).await?;
        let merchant = self.merchant(gateway, &group.id).await?;

        let now = Utc::now();
        let qbet_status = match payment_type {
            PaymentType::Deposit => LedgerCreditStatus::Pending,
            PaymentType::Withdraw => LedgerCreditStatus::NotApplicable,
        };
        let row = payment_transactions::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            gateway: Set(gateway),
            casino_group_id: Set(group.id.clone()),
            initiated_by: Set(actor.map(|a| a.id.clone())),
            external_user_id: Set(request.external_user_id.trim().to_string()),
            amount: Set(request.amount),
            payment_type: Set(payment_type),
            status: Set(SettlementStatus::Initiated),
            qbet_status: Set(qbet_status),
            transaction_number: Set(None),
            raw_request: Set(Some(serde_json::to_string(&request)?)),
            raw_gateway_response: Set(None),
            raw_webhook: Set(None),
            reconcile_flagged_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.pool)
        .await?;

        let order = GatewayOrder {
            order_no: row.id.clone(),
            payment_type,
            amount: row.amount,
            external_user_id: row.external_user_id.clone(),
            details: request.details,
        };
        let reply = match self.client(gateway).submit(merchant.as_ref(), &order).await {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("{gateway:?} call for {} failed: {e}", row.id);
                let qbet = row.qbet_status;
                self.save_status(row, SettlementStatus::Failed, qbet).await?;
                return Err(e);
            }
        };

        let id = row.id.clone();
        let qbet = row.qbet_status;
        let mut active: payment_transactions::ActiveModel = row.into();
        active.raw_gateway_response = Set(Some(reply.body.to_string()));
        active.transaction_number = Set(reply.transaction_number());
        active.status = Set(if reply.is_success() {
            SettlementStatus::Pending
        } else {
            SettlementStatus::Failed
        });
        active.qbet_status = Set(qbet);
        active.updated_at = Set(Utc::now());
        active.update(&self.pool).await?;

        if !reply.is_success() {
            let message = json_str(&reply.body, &["message", "msg", "error"])
                .unwrap_or_else(|| "Payment gateway rejected the request".to_string());
            return Err(AppError::Upstream {
                status: reply.status,
                message,
                body: reply.body,
            });
        }

        log::info!("{gateway:?} {payment_type:?} {id} accepted by gateway");
        let mut body = reply.body;
        if let Value::Object(map) = &mut body {
            map.insert("transactionId".to_string(), json!(id));
        }
        Ok(body)
    }

    pub async fn balance(&self, gateway: PaymentGateway, casino_group: &str) -> AppResult<Value> {
        let group = self.casino_groups.resolve(casino_group).await?;
        let merchant = self.merchant(gateway, &group.id).await?;
        let reply = self.client(gateway).balance(merchant.as_ref()).await?;
        if !reply.is_success() {
            return Err(AppError::Upstream {
                status: reply.status,
                message: "Balance request failed".to_string(),
                body: reply.body,
            });
        }
        Ok(reply.body)
    }

    async fn credit_ledger(
        &self,
        row: &payment_transactions::Model,
    ) -> (SettlementStatus, LedgerCreditStatus) {
        let transfer = LedgerTransfer {
            id: row.id.clone(),
            txn: row
                .transaction_number
                .clone()
                .unwrap_or_else(|| row.id.clone()),
            txn_type: TXN_TYPE_CREDIT.to_string(),
            amount: row.amount,
        };
        let result = self.ledger.credit(&row.external_user_id, transfer).await;
        match &result {
            Ok(reply) if reply.is_success() => log::info!(
                "Ledger credited {} for {} (balance after {:?})",
                row.external_user_id,
                row.id,
                reply.balance_after()
            ),
            Ok(reply) => log::error!(
                "Ledger credit for {} refused with code {}: {:?}",
                row.id,
                reply.code,
                reply.message
            ),
            Err(e) => log::error!("Ledger credit for {} failed: {e}", row.id),
        }
        settle_deposit(&result)
    }

    /// Applies a gateway webhook. The raw body is stored before anything else.
    pub async fn handle_webhook(
        &self,
        gateway: PaymentGateway,
        payload: Value,
    ) -> AppResult<payment_transactions::Model> {
        let (reference, reported) = match parse_webhook(gateway, &payload) {
            Ok(parsed) => parsed,
            Err(e) => {
                log::warn!("{}", dropped_webhook_line(gateway, &e.to_string(), &payload.to_string()));
                return Err(e);
            }
        };

        let found = payment_transactions::Entity::find()
            .filter(payment_transactions::Column::Gateway.eq(gateway))
            .filter(
                Condition::any()
                    .add(payment_transactions::Column::Id.eq(reference.as_str()))
                    .add(payment_transactions::Column::TransactionNumber.eq(reference.as_str())),
            )
            .one(&self.pool)
            .await?;
        let Some(row) = found else {
            log::warn!(
                "{}",
                dropped_webhook_line(gateway, "unknown transaction", &payload.to_string())
            );
            return Err(AppError::NotFound(format!("Transaction {reference} not found")));
        };

        let mut active: payment_transactions::ActiveModel = row.into();
        active.raw_webhook = Set(Some(payload.to_string()));
        active.updated_at = Set(Utc::now());
        let row = active.update(&self.pool).await?;

        if row.qbet_status == LedgerCreditStatus::Loaded {
            log::info!("Webhook for {} ignored, ledger already credited", row.id);
            return Ok(row);
        }

        let (status, qbet_status) = match (reported, row.payment_type) {
            (SettlementStatus::Completed, PaymentType::Deposit) => self.credit_ledger(&row).await,
            (SettlementStatus::Completed, PaymentType::Withdraw) => {
                (SettlementStatus::Completed, LedgerCreditStatus::NotApplicable)
            }
            (other, _) => (other, row.qbet_status),
        };
        log::info!("{gateway:?} webhook {}: {status:?}/{qbet_status:?}", row.id);
        self.save_status(row, status, qbet_status).await
    }

    /// Retries the ledger credit of a divergent deposit.
    pub async fn retry_credit(&self, id: &str) -> AppResult<payment_transactions::Model> {
        let row = payment_transactions::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Transaction {id} not found")))?;

        if row.qbet_status == LedgerCreditStatus::Loaded {
            return Err(AppError::Conflict("Ledger already credited".to_string()));
        }
        if row.payment_type != PaymentType::Deposit
            || row.status != SettlementStatus::Failed
            || row.raw_webhook.is_none()
        {
            return Err(AppError::ValidationError(
                "Only settled deposits with a failed ledger credit can be retried".to_string(),
            ));
        }

        let (status, qbet_status) = self.credit_ledger(&row).await;
        self.save_status(row, status, qbet_status).await
    }

    pub async fn list(
        &self,
        query: &PaymentTransactionQuery,
    ) -> AppResult<PaginatedResponse<payment_transactions::Model>> {
        let params = PaginationParams::new(query.page, query.page_size);
        let mut select = payment_transactions::Entity::find();
        if let Some(gateway) = query.gateway {
            select = select.filter(payment_transactions::Column::Gateway.eq(gateway));
        }
        if let Some(status) = query.status {
            select = select.filter(payment_transactions::Column::Status.eq(status));
        }
        if let Some(key) = query.casino_group.as_deref() {
            let group = self.casino_groups.resolve(key).await?;
            select = select.filter(payment_transactions::Column::CasinoGroupId.eq(group.id));
        }

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(payment_transactions::Column::CreatedAt)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        Ok(PaginatedResponse::new(rows, &params, total))
    }

    fn divergent_query() -> sea_orm::Select<payment_transactions::Entity> {
        payment_transactions::Entity::find()
            .filter(payment_transactions::Column::Status.eq(SettlementStatus::Failed))
            .filter(payment_transactions::Column::QbetStatus.eq(LedgerCreditStatus::Pending))
            .filter(payment_transactions::Column::RawWebhook.is_not_null())
    }

    /// Gateway settled but ledger not credited.
    pub async fn divergent(&self) -> AppResult<Vec<payment_transactions::Model>> {
        Ok(Self::divergent_query()
            .order_by_asc(payment_transactions::Column::UpdatedAt)
            .all(&self.pool)
            .await?)
    }

    /// Alerts SUPERADMIN and ACCOUNTING about divergent rows not flagged yet.
    pub async fn flag_divergent(&self) -> AppResult<u64> {
        let rows = Self::divergent_query()
            .filter(payment_transactions::Column::ReconcileFlaggedAt.is_null())
            .all(&self.pool)
            .await?;

        let mut flagged = 0;
        for row in rows {
            log::error!(
                "Divergent payment {}: gateway settled {:.2} for {} but ledger credit is pending",
                row.id,
                row.amount,
                row.external_user_id
            );
            let message = format!(
                "Payment {} of {:.2} for {} settled at the gateway but was not credited",
                row.transaction_number.as_deref().unwrap_or(&row.id),
                row.amount,
                row.external_user_id
            );
            self.notifications
                .notify_roles(
                    &[UserRole::Superadmin, UserRole::Accounting],
                    &message,
                    Some(format!("/payments/{}", row.id)),
                )
                .await?;

            let mut active: payment_transactions::ActiveModel = row.into();
            active.reconcile_flagged_at = Set(Some(Utc::now()));
            active.update(&self.pool).await?;
            flagged += 1;
        }
        Ok(flagged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::realtime_service::RealtimeNotifier;
    use crate::test_support::*;
    use crate::entities::notification_entity as notifications;

    struct Fixture {
        db: DatabaseConnection,
        ledger: Arc<FakeLedger>,
        svc: PaymentService,
    }

    async fn fixture(ledger_code: i64, gateway_status: u16, gateway_body: Value) -> Fixture {
        let db = setup_db().await;
        seed_group(&db, "g-1", "QBET").await;
        seed_user(&db, "u-sa", "root", UserRole::Superadmin).await;
        seed_user(&db, "u-acc", "acc", UserRole::Accounting).await;
        let now = Utc::now();
        dpay_configs::ActiveModel {
            id: Set("dc-1".into()),
            casino_group_id: Set("g-1".into()),
            merchant_code: Set("M1".into()),
            secret_key: Set("k".into()),
            active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&db)
        .await
        .unwrap();

        let ledger = Arc::new(FakeLedger::with_code(ledger_code));
        let notifier = RealtimeNotifier::new(Arc::new(RecordingPublisher::default()));
        let svc = PaymentService::new(
            db.clone(),
            CasinoGroupService::new(db.clone()),
            Arc::new(FakeGateway::new(gateway_status, gateway_body.clone())),
            Arc::new(FakeGateway::new(gateway_status, gateway_body)),
            ledger.clone(),
            NotificationService::new(db.clone(), notifier),
        );
        Fixture { db, ledger, svc }
    }

    fn deposit() -> PaymentRequest {
        PaymentRequest {
            casino_group: "QBET".into(),
            external_user_id: "player-1".into(),
            amount: 500.0,
            details: json!({"bank_code": "GCASH"}),
        }
    }

    async fn initiated(f: &Fixture) -> payment_transactions::Model {
        let body = f
            .svc
            .initiate(PaymentGateway::Dpay, PaymentType::Deposit, None, deposit())
            .await
            .unwrap();
        let id = body["transactionId"].as_str().unwrap().to_string();
        payment_transactions::Entity::find_by_id(id)
            .one(&f.db)
            .await
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_settle_deposit_never_reports_loaded_on_refusal() {
        let ok = Ok(LedgerReply {
            code: 0,
            message: None,
            balance_after: Some(10.0),
            data: None,
        });
        assert_eq!(
            settle_deposit(&ok),
            (SettlementStatus::Completed, LedgerCreditStatus::Loaded)
        );
        let refused = Ok(LedgerReply {
            code: 7,
            message: Some("nope".into()),
            balance_after: None,
            data: None,
        });
        assert_eq!(
            settle_deposit(&refused),
            (SettlementStatus::Failed, LedgerCreditStatus::Pending)
        );
        let unreachable = Err(AppError::ExternalApiError("timeout".into()));
        assert_eq!(
            settle_deposit(&unreachable),
            (SettlementStatus::Failed, LedgerCreditStatus::Pending)
        );
    }

    #[test]
    fn test_parse_webhook_accepts_numeric_or_string_codes() {
        let (r, s) = parse_webhook(PaymentGateway::Dpay, &json!({"order_no": "a", "status": "3"}))
            .unwrap();
        assert_eq!((r.as_str(), s), ("a", SettlementStatus::Completed));
        let (_, s) =
            parse_webhook(PaymentGateway::Dpay, &json!({"order_no": "a", "status": 4})).unwrap();
        assert_eq!(s, SettlementStatus::Rejected);
        assert!(parse_webhook(PaymentGateway::Dpay, &json!({"status": 3})).is_err());
        let (_, s) = parse_webhook(
            PaymentGateway::OptimumPay,
            &json!({"reference": "b", "status": "SUCCESS"}),
        )
        .unwrap();
        assert_eq!(s, SettlementStatus::Completed);
    }

    #[tokio::test]
    async fn test_initiate_persists_pending_row_with_gateway_number() {
        let f = fixture(0, 200, json!({"transaction_number": "DP-77", "pay_url": "https://pay"})).await;
        let row = initiated(&f).await;
        assert_eq!(row.status, SettlementStatus::Pending);
        assert_eq!(row.qbet_status, LedgerCreditStatus::Pending);
        assert_eq!(row.transaction_number.as_deref(), Some("DP-77"));
        assert!(row.raw_request.unwrap().contains("player-1"));
        assert!(row.raw_gateway_response.unwrap().contains("pay_url"));
    }

    #[tokio::test]
    async fn test_initiate_mirrors_gateway_error_and_marks_failed() {
        let f = fixture(0, 422, json!({"message": "Invalid amount"})).await;
        let err = f
            .svc
            .initiate(PaymentGateway::Dpay, PaymentType::Deposit, None, deposit())
            .await
            .unwrap_err();
        match err {
            AppError::Upstream { status, message, body } => {
                assert_eq!(status, 422);
                assert_eq!(message, "Invalid amount");
                assert_eq!(body["message"], "Invalid amount");
            }
            other => panic!("unexpected error {other:?}"),
        }
        let rows = payment_transactions::Entity::find().all(&f.db).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, SettlementStatus::Failed);
    }

    #[tokio::test]
    async fn test_webhook_success_with_ledger_ok_is_completed_and_loaded() {
        let f = fixture(0, 200, json!({"transaction_number": "DP-1"})).await;
        let row = initiated(&f).await;

        let done = f
            .svc
            .handle_webhook(PaymentGateway::Dpay, json!({"transaction_number": "DP-1", "status": 3}))
            .await
            .unwrap();
        assert_eq!(done.status, SettlementStatus::Completed);
        assert_eq!(done.qbet_status, LedgerCreditStatus::Loaded);
        assert!(done.raw_webhook.is_some());
        assert_eq!(f.ledger.credit_count(), 1);
        let credits = f.ledger.credits.lock().unwrap();
        assert_eq!(credits[0].0, "player-1");
        assert_eq!(credits[0].1.id, row.id);
        assert_eq!(credits[0].1.txn, "DP-1");
    }

    #[tokio::test]
    async fn test_webhook_success_with_ledger_refusal_is_failed_and_pending() {
        let f = fixture(1003, 200, json!({"transaction_number": "DP-2"})).await;
        let row = initiated(&f).await;

        let done = f
            .svc
            .handle_webhook(PaymentGateway::Dpay, json!({"order_no": row.id, "status": 3}))
            .await
            .unwrap();
        assert_eq!(done.status, SettlementStatus::Failed);
        assert_eq!(done.qbet_status, LedgerCreditStatus::Pending);

        let divergent = f.svc.divergent().await.unwrap();
        assert_eq!(divergent.len(), 1);

        assert_eq!(f.svc.flag_divergent().await.unwrap(), 1);
        assert_eq!(f.svc.flag_divergent().await.unwrap(), 0);
        let alerts = notifications::Entity::find().all(&f.db).await.unwrap();
        assert_eq!(alerts.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_webhook_skips_ledger_but_keeps_raw_body() {
        let f = fixture(0, 200, json!({"transaction_number": "DP-3"})).await;
        initiated(&f).await;
        let done = f
            .svc
            .handle_webhook(PaymentGateway::Dpay, json!({"transaction_number": "DP-3", "status": 4}))
            .await
            .unwrap();
        assert_eq!(done.status, SettlementStatus::Rejected);
        assert_eq!(done.qbet_status, LedgerCreditStatus::Pending);
        assert!(done.raw_webhook.unwrap().contains("DP-3"));
        assert_eq!(f.ledger.credit_count(), 0);
    }

    #[tokio::test]
    async fn test_loaded_row_is_never_credited_twice() {
        let f = fixture(0, 200, json!({"transaction_number": "DP-4"})).await;
        initiated(&f).await;
        let hook = json!({"transaction_number": "DP-4", "status": 3});
        f.svc.handle_webhook(PaymentGateway::Dpay, hook.clone()).await.unwrap();
        let again = f.svc.handle_webhook(PaymentGateway::Dpay, hook).await.unwrap();
        assert_eq!(again.qbet_status, LedgerCreditStatus::Loaded);
        assert_eq!(f.ledger.credit_count(), 1);
        assert!(matches!(
            f.svc.retry_credit(&again.id).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_withdraw_completion_is_not_applicable_to_ledger() {
        let f = fixture(0, 200, json!({"transaction_number": "WD-1"})).await;
        f.svc
            .initiate(PaymentGateway::Dpay, PaymentType::Withdraw, None, deposit())
            .await
            .unwrap();
        let done = f
            .svc
            .handle_webhook(PaymentGateway::Dpay, json!({"transaction_number": "WD-1", "status": 3}))
            .await
            .unwrap();
        assert_eq!(done.status, SettlementStatus::Completed);
        assert_eq!(done.qbet_status, LedgerCreditStatus::NotApplicable);
        assert_eq!(f.ledger.credit_count(), 0);
    }

    #[tokio::test]
    async fn test_unknown_webhook_reference_is_not_found() {
        let f = fixture(0, 200, json!({"code": 0})).await;
        let payload = json!({"transaction_number": "nope", "status": 3});
        assert!(matches!(
            f.svc.handle_webhook(PaymentGateway::Dpay, payload).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(f.ledger.credit_count(), 0);
    }

    #[test]
    fn test_dropped_webhook_line_keeps_raw_body() {
        let raw = r#"{"transaction_number":"nope","status":3}"#;
        let line = dropped_webhook_line(PaymentGateway::Dpay, "unknown transaction", raw);
        assert!(line.contains("Dpay"));
        assert!(line.ends_with(raw));
    }

    #[tokio::test]
    async fn test_group_without_dpay_config_is_rejected() {
        let f = fixture(0, 200, json!({})).await;
        seed_group(&f.db, "g-2", "LUCKY").await;
        let mut req = deposit();
        req.casino_group = "LUCKY".into();
        assert!(matches!(
            f.svc
                .initiate(PaymentGateway::Dpay, PaymentType::Deposit, None, req)
                .await,
            Err(AppError::ValidationError(_))
        ));
    }
}
