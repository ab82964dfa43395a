use crate::entities::{UserRole, notification_entity as notifications, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::{CreateNotificationRequest, CurrentUser, NotificationList};
use crate::services::realtime_service::RealtimeNotifier;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

const LIST_LIMIT: u64 = 100;

#[derive(Clone)]
pub struct NotificationService {
    pool: DatabaseConnection,
    notifier: RealtimeNotifier,
}

impl NotificationService {
    pub fn new(pool: DatabaseConnection, notifier: RealtimeNotifier) -> Self {
        Self { pool, notifier }
    }

    /// Latest notifications plus the unread count.
    pub async fn list(&self, actor: &CurrentUser) -> AppResult<NotificationList> {
        let rows = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(actor.id.as_str()))
            .order_by_desc(notifications::Column::CreatedAt)
            .limit(LIST_LIMIT)
            .all(&self.pool)
            .await?;
        let unread_count = notifications::Entity::find()
            .filter(notifications::Column::UserId.eq(actor.id.as_str()))
            .filter(notifications::Column::IsRead.eq(false))
            .count(&self.pool)
            .await?;

        Ok(NotificationList {
            notifications: rows,
            unread_count,
        })
    }

    pub async fn create(
        &self,
        actor: &CurrentUser,
        request: CreateNotificationRequest,
    ) -> AppResult<notifications::Model> {
        let message = request.message.trim();
        if message.is_empty() {
            return Err(AppError::ValidationError("message is required".to_string()));
        }
        let exists = users::Entity::find_by_id(request.user_id.clone())
            .one(&self.pool)
            .await?
            .is_some();
        if !exists {
            return Err(AppError::NotFound(format!("User {} not found", request.user_id)));
        }
        log::debug!("{} notifies {}", actor.id, request.user_id);
        self.notify(&request.user_id, message, request.link).await
    }

    /// Stores a notification and pushes it on the user's private channel.
    pub async fn notify(
        &self,
        user_id: &str,
        message: &str,
        link: Option<String>,
    ) -> AppResult<notifications::Model> {
        let row = notifications::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(user_id.to_string()),
            message: Set(message.to_string()),
            link: Set(link),
            is_read: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(&self.pool)
        .await?;

        self.notifier
            .emit_notification(user_id, serde_json::to_value(&row)?)
            .await;
        Ok(row)
    }

    /// Notifies every active user holding one of `roles`.
    pub async fn notify_roles(
        &self,
        roles: &[UserRole],
        message: &str,
        link: Option<String>,
    ) -> AppResult<usize> {
        let recipients: Vec<String> = users::Entity::find()
            .select_only()
            .column(users::Column::Id)
            .filter(users::Column::Active.eq(true))
            .filter(users::Column::Role.is_in(roles.iter().copied()))
            .into_tuple()
            .all(&self.pool)
            .await?;

        for user_id in &recipients {
            self.notify(user_id, message, link.clone()).await?;
        }
        Ok(recipients.len())
    }

    pub async fn mark_read(&self, actor: &CurrentUser, id: &str) -> AppResult<notifications::Model> {
        let row = notifications::Entity::find_by_id(id.to_string())
            .filter(notifications::Column::UserId.eq(actor.id.as_str()))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Notification not found".to_string()))?;
        if row.is_read {
            return Ok(row);
        }
        let mut active: notifications::ActiveModel = row.into();
        active.is_read = Set(true);
        Ok(active.update(&self.pool).await?)
    }

    pub async fn mark_all_read(&self, actor: &CurrentUser) -> AppResult<u64> {
        let result = notifications::Entity::update_many()
            .col_expr(notifications::Column::IsRead, Expr::value(true))
            .filter(notifications::Column::UserId.eq(actor.id.as_str()))
            .filter(notifications::Column::IsRead.eq(false))
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingPublisher, seed_user, setup_db};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_notify_roles_reaches_superadmin_and_accounting_only() {
        let db = setup_db().await;
        seed_user(&db, "u-sa", "root", UserRole::Superadmin).await;
        seed_user(&db, "u-acc", "acc", UserRole::Accounting).await;
        let loader = seed_user(&db, "u-l", "loader", UserRole::Loader).await;
        let publisher = Arc::new(RecordingPublisher::default());
        let svc = NotificationService::new(db, RealtimeNotifier::new(publisher.clone()));

        let sent = svc
            .notify_roles(&[UserRole::Superadmin, UserRole::Accounting], "check", None)
            .await
            .unwrap();
        assert_eq!(sent, 2);
        assert_eq!(svc.list(&loader).await.unwrap().unread_count, 0);

        let channels: Vec<String> = publisher.events().into_iter().map(|e| e.0).collect();
        assert!(channels.contains(&"private-user-u-sa".to_string()));
        assert!(channels.contains(&"private-user-u-acc".to_string()));
    }

    #[tokio::test]
    async fn test_read_and_read_all() {
        let db = setup_db().await;
        let me = seed_user(&db, "u-1", "me", UserRole::Support).await;
        let other = seed_user(&db, "u-2", "other", UserRole::Support).await;
        let svc = NotificationService::new(
            db,
            RealtimeNotifier::new(Arc::new(RecordingPublisher::default())),
        );

        let first = svc.notify("u-1", "one", None).await.unwrap();
        svc.notify("u-1", "two", Some("/cashin/1".into())).await.unwrap();
        svc.notify("u-1", "three", None).await.unwrap();
        assert_eq!(svc.list(&me).await.unwrap().unread_count, 3);

        // not visible to someone else
        assert!(matches!(
            svc.mark_read(&other, &first.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(svc.mark_read(&me, &first.id).await.unwrap().is_read);
        assert_eq!(svc.list(&me).await.unwrap().unread_count, 2);

        assert_eq!(svc.mark_all_read(&me).await.unwrap(), 2);
        let list = svc.list(&me).await.unwrap();
        assert_eq!(list.unread_count, 0);
        assert_eq!(list.notifications.len(), 3);
    }
}
