//! Shared fixtures for service tests: an in-memory SQLite schema built from
//! the entities, plus recording fakes for the outbound collaborators.

use crate::entities::*;
use crate::error::{AppError, AppResult};
use crate::external::{
    BlobStore, GatewayOrder, GatewayReply, LedgerApi, LedgerReply, LedgerTransfer,
    MerchantCredentials, PaymentGatewayApi, RealtimePublisher,
};
use crate::models::CurrentUser;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectOptions, ConnectionTrait, Database, DatabaseConnection, EntityTrait,
    Schema, Set,
};
use serde_json::{Value, json};
use std::sync::Mutex;

async fn create<E: EntityTrait>(db: &DatabaseConnection, schema: &Schema, entity: E) {
    let backend = db.get_database_backend();
    db.execute(backend.build(&schema.create_table_from_entity(entity)))
        .await
        .unwrap();
}

pub async fn setup_db() -> DatabaseConnection {
    let mut opts = ConnectOptions::new("sqlite::memory:");
    // a single connection keeps every query on the same in-memory database
    opts.max_connections(1).min_connections(1).sqlx_logging(false);
    let db = Database::connect(opts).await.unwrap();
    let schema = Schema::new(db.get_database_backend());

    create(&db, &schema, casino_groups::Entity).await;
    create(&db, &schema, users::Entity).await;
    create(&db, &schema, user_casino_groups::Entity).await;
    create(&db, &schema, cashins::Entity).await;
    create(&db, &schema, cashouts::Entity).await;
    create(&db, &schema, commissions::Entity).await;
    create(&db, &schema, concerns::Entity).await;
    create(&db, &schema, customer_supports::Entity).await;
    create(&db, &schema, remittances::Entity).await;
    create(&db, &schema, tasks::Entity).await;
    create(&db, &schema, ticket_logs::Entity).await;
    create(&db, &schema, ticket_threads::Entity).await;
    create(&db, &schema, thread_attachments::Entity).await;
    create(&db, &schema, transaction_requests::Entity).await;
    create(&db, &schema, dpay_configs::Entity).await;
    create(&db, &schema, payment_transactions::Entity).await;
    create(&db, &schema, attendances::Entity).await;
    create(&db, &schema, ready_checks::Entity).await;
    create(&db, &schema, ready_check_participants::Entity).await;
    create(&db, &schema, notifications::Entity).await;
    create(&db, &schema, group_chats::Entity).await;
    create(&db, &schema, group_chat_users::Entity).await;
    db
}

pub async fn seed_group(db: &DatabaseConnection, id: &str, name: &str) -> casino_groups::Model {
    let now = Utc::now();
    casino_groups::ActiveModel {
        id: Set(id.to_string()),
        name: Set(name.to_string()),
        description: Set(None),
        active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap()
}

/// Inserts an account with password `Password123` hashed at minimum cost.
pub async fn seed_user(
    db: &DatabaseConnection,
    id: &str,
    username: &str,
    role: UserRole,
) -> CurrentUser {
    let now = Utc::now();
    let hash = bcrypt::hash("Password123", 4).unwrap();
    users::ActiveModel {
        id: Set(id.to_string()),
        name: Set(username.to_string()),
        email: Set(None),
        username: Set(username.to_string()),
        password_hash: Set(hash),
        role: Set(role),
        active: Set(true),
        is_clocked_in: Set(false),
        balance: Set(0.0),
        messenger_link: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .unwrap();
    CurrentUser {
        id: id.to_string(),
        username: username.to_string(),
        role,
    }
}

#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<(String, String, Value)>>,
}

impl RecordingPublisher {
    pub fn events(&self) -> Vec<(String, String, Value)> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl RealtimePublisher for RecordingPublisher {
    async fn trigger(&self, channel: &str, event: &str, data: &Value) -> AppResult<()> {
        self.events
            .lock()
            .unwrap()
            .push((channel.to_string(), event.to_string(), data.clone()));
        Ok(())
    }
}

pub struct FailingPublisher;

#[async_trait]
impl RealtimePublisher for FailingPublisher {
    async fn trigger(&self, _channel: &str, _event: &str, _data: &Value) -> AppResult<()> {
        Err(AppError::ExternalApiError("pusher down".to_string()))
    }
}

/// Ledger answering every credit with a fixed `code`.
pub struct FakeLedger {
    pub code: i64,
    pub credits: Mutex<Vec<(String, LedgerTransfer)>>,
}

impl FakeLedger {
    pub fn with_code(code: i64) -> Self {
        Self {
            code,
            credits: Mutex::new(Vec::new()),
        }
    }

    pub fn credit_count(&self) -> usize {
        self.credits.lock().unwrap().len()
    }
}

#[async_trait]
impl LedgerApi for FakeLedger {
    async fn credit(&self, member: &str, transfer: LedgerTransfer) -> AppResult<LedgerReply> {
        let amount = transfer.amount;
        self.credits
            .lock()
            .unwrap()
            .push((member.to_string(), transfer));
        Ok(LedgerReply {
            code: self.code,
            message: None,
            balance_after: (self.code == 0).then_some(1000.0 + amount),
            data: None,
        })
    }

    async fn balance(&self, member: &str) -> AppResult<Value> {
        Ok(json!({"code": 0, "member": member, "balance": 1000.0}))
    }

    async fn call(&self, operation: &str, payload: Value) -> AppResult<Value> {
        Ok(json!({"code": 0, "operation": operation, "echo": payload}))
    }
}

/// Gateway answering with a canned status and body.
pub struct FakeGateway {
    pub reply_status: u16,
    pub reply_body: Value,
    pub orders: Mutex<Vec<GatewayOrder>>,
}

impl FakeGateway {
    pub fn new(reply_status: u16, reply_body: Value) -> Self {
        Self {
            reply_status,
            reply_body,
            orders: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PaymentGatewayApi for FakeGateway {
    async fn submit(
        &self,
        _merchant: Option<&MerchantCredentials>,
        order: &GatewayOrder,
    ) -> AppResult<GatewayReply> {
        self.orders.lock().unwrap().push(order.clone());
        Ok(GatewayReply {
            status: self.reply_status,
            body: self.reply_body.clone(),
        })
    }

    async fn balance(&self, _merchant: Option<&MerchantCredentials>) -> AppResult<GatewayReply> {
        Ok(GatewayReply {
            status: self.reply_status,
            body: self.reply_body.clone(),
        })
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    pub puts: Mutex<Vec<(String, String, usize)>>,
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, path: &str, content_type: &str, bytes: Vec<u8>) -> AppResult<String> {
        self.puts
            .lock()
            .unwrap()
            .push((path.to_string(), content_type.to_string(), bytes.len()));
        Ok(format!("https://blob.test/{path}"))
    }
}
