use crate::entities::{
    UserRole, ready_check_entity as ready_checks, ready_check_participant_entity as participants,
    user_entity as users,
};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::realtime_service::RealtimeNotifier;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde_json::json;
use uuid::Uuid;

const LIST_LIMIT: u64 = 50;

#[derive(Clone)]
pub struct ReadyCheckService {
    pool: DatabaseConnection,
    notifier: RealtimeNotifier,
}

impl ReadyCheckService {
    pub fn new(pool: DatabaseConnection, notifier: RealtimeNotifier) -> Self {
        Self { pool, notifier }
    }

    async fn load(&self, id: &str) -> AppResult<ReadyCheckDetail> {
        let ready_check = ready_checks::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ready check {id} not found")))?;
        let participants = participants::Entity::find()
            .filter(participants::Column::ReadyCheckId.eq(id))
            .all(&self.pool)
            .await?;
        let responded_count = participants.iter().filter(|p| p.responded).count() as u64;
        Ok(ReadyCheckDetail {
            ready_check,
            participants,
            responded_count,
        })
    }

    /// Participants default to every active non-admin account; their clock-in
    /// state is snapshotted at start.
    pub async fn create(
        &self,
        actor: &CurrentUser,
        request: CreateReadyCheckRequest,
    ) -> AppResult<ReadyCheckDetail> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden);
        }

        let mut select = users::Entity::find().filter(users::Column::Active.eq(true));
        select = match request.participant_ids {
            Some(ids) if !ids.is_empty() => select.filter(users::Column::Id.is_in(ids)),
            _ => select.filter(
                users::Column::Role.is_not_in([UserRole::Superadmin, UserRole::Admin]),
            ),
        };
        let members = select.all(&self.pool).await?;
        if members.is_empty() {
            return Err(AppError::ValidationError(
                "No participants for the ready check".to_string(),
            ));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let clocked_in = members.iter().filter(|u| u.is_clocked_in).count();

        let txn = self.pool.begin().await?;
        ready_checks::ActiveModel {
            id: Set(id.clone()),
            initiator_id: Set(actor.id.clone()),
            started_at: Set(now),
            ended_at: Set(None),
            total_participants: Set(members.len() as i32),
            total_clocked_in: Set(clocked_in as i32),
        }
        .insert(&txn)
        .await?;
        for member in &members {
            participants::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                ready_check_id: Set(id.clone()),
                user_id: Set(member.id.clone()),
                was_clocked_in: Set(member.is_clocked_in),
                responded: Set(false),
                responded_at: Set(None),
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        log::info!(
            "{} started ready check {id} for {} users",
            actor.username,
            members.len()
        );
        let participant_ids: Vec<&str> = members.iter().map(|m| m.id.as_str()).collect();
        self.notifier
            .emit_ready_check(
                "ready-check-started",
                &id,
                json!({"initiatorId": actor.id, "participantIds": participant_ids}),
            )
            .await;
        self.load(&id).await
    }

    /// Checks started by the caller or including them; admins see all.
    pub async fn list(&self, actor: &CurrentUser) -> AppResult<Vec<ready_checks::Model>> {
        let mut select = ready_checks::Entity::find();
        if !actor.is_admin() {
            let joined: Vec<String> = participants::Entity::find()
                .select_only()
                .column(participants::Column::ReadyCheckId)
                .filter(participants::Column::UserId.eq(actor.id.as_str()))
                .into_tuple()
                .all(&self.pool)
                .await?;
            select = select.filter(
                sea_orm::Condition::any()
                    .add(ready_checks::Column::InitiatorId.eq(actor.id.as_str()))
                    .add(ready_checks::Column::Id.is_in(joined)),
            );
        }
        Ok(select
            .order_by_desc(ready_checks::Column::StartedAt)
            .limit(LIST_LIMIT)
            .all(&self.pool)
            .await?)
    }

    pub async fn detail(&self, actor: &CurrentUser, id: &str) -> AppResult<ReadyCheckDetail> {
        let detail = self.load(id).await?;
        let allowed = actor.is_admin()
            || detail.ready_check.initiator_id == actor.id
            || detail.participants.iter().any(|p| p.user_id == actor.id);
        if !allowed {
            return Err(AppError::Forbidden);
        }
        Ok(detail)
    }

    /// Responding twice keeps the first response time.
    pub async fn respond(&self, actor: &CurrentUser, id: &str) -> AppResult<ReadyCheckDetail> {
        let ready_check = ready_checks::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ready check {id} not found")))?;
        if ready_check.ended_at.is_some() {
            return Err(AppError::Conflict("Ready check has ended".to_string()));
        }

        let participant = participants::Entity::find()
            .filter(participants::Column::ReadyCheckId.eq(id))
            .filter(participants::Column::UserId.eq(actor.id.as_str()))
            .one(&self.pool)
            .await?
            .ok_or(AppError::Forbidden)?;

        if !participant.responded {
            let mut active: participants::ActiveModel = participant.into();
            active.responded = Set(true);
            active.responded_at = Set(Some(Utc::now()));
            active.update(&self.pool).await?;
            self.notifier
                .emit_ready_check("ready-check-response", id, json!({"userId": actor.id}))
                .await;
        }
        self.load(id).await
    }

    pub async fn end(&self, actor: &CurrentUser, id: &str) -> AppResult<ReadyCheckDetail> {
        let ready_check = ready_checks::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Ready check {id} not found")))?;
        if ready_check.initiator_id != actor.id && !actor.is_admin() {
            return Err(AppError::Forbidden);
        }

        if ready_check.ended_at.is_none() {
            let mut active: ready_checks::ActiveModel = ready_check.into();
            active.ended_at = Set(Some(Utc::now()));
            active.update(&self.pool).await?;
            self.notifier
                .emit_ready_check("ready-check-ended", id, json!({"endedBy": actor.id}))
                .await;
        }
        self.load(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingPublisher, seed_user, setup_db};
    use sea_orm::sea_query::Expr;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_ready_check_lifecycle() {
        let db = setup_db().await;
        let admin = seed_user(&db, "u-a", "admin", UserRole::Admin).await;
        let loader = seed_user(&db, "u-l", "loader", UserRole::Loader).await;
        let support = seed_user(&db, "u-s", "support", UserRole::Support).await;
        users::Entity::update_many()
            .col_expr(users::Column::IsClockedIn, Expr::value(true))
            .filter(users::Column::Id.eq("u-l"))
            .exec(&db)
            .await
            .unwrap();
        let publisher = Arc::new(RecordingPublisher::default());
        let svc = ReadyCheckService::new(db, RealtimeNotifier::new(publisher.clone()));

        assert!(matches!(
            svc.create(&loader, CreateReadyCheckRequest::default()).await,
            Err(AppError::Forbidden)
        ));

        let started = svc
            .create(&admin, CreateReadyCheckRequest::default())
            .await
            .unwrap();
        let id = started.ready_check.id.clone();
        assert_eq!(started.ready_check.total_participants, 2);
        assert_eq!(started.ready_check.total_clocked_in, 1);
        assert_eq!(started.responded_count, 0);

        let first = svc.respond(&loader, &id).await.unwrap();
        let at = first
            .participants
            .iter()
            .find(|p| p.user_id == "u-l")
            .and_then(|p| p.responded_at);
        let again = svc.respond(&loader, &id).await.unwrap();
        assert_eq!(again.responded_count, 1);
        assert_eq!(
            again
                .participants
                .iter()
                .find(|p| p.user_id == "u-l")
                .and_then(|p| p.responded_at),
            at
        );

        assert!(matches!(svc.respond(&admin, &id).await, Err(AppError::Forbidden)));
        assert!(svc.detail(&support, &id).await.is_ok());
        assert!(matches!(svc.end(&support, &id).await, Err(AppError::Forbidden)));

        let ended = svc.end(&admin, &id).await.unwrap();
        assert!(ended.ready_check.ended_at.is_some());
        assert!(matches!(
            svc.respond(&support, &id).await,
            Err(AppError::Conflict(_))
        ));

        let events: Vec<String> = publisher.events().into_iter().map(|e| e.1).collect();
        assert_eq!(
            events,
            vec!["ready-check-started", "ready-check-response", "ready-check-ended"]
        );
        assert_eq!(svc.list(&loader).await.unwrap().len(), 1);
    }
}
