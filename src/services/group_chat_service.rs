use crate::entities::{group_chat_entity as group_chats, group_chat_user_entity as members};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct GroupChatService {
    pool: DatabaseConnection,
}

impl GroupChatService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list(&self, actor: &CurrentUser) -> AppResult<Vec<group_chats::Model>> {
        let mut select = group_chats::Entity::find().order_by_asc(group_chats::Column::Name);
        if !actor.is_admin() {
            let ids: Vec<String> = members::Entity::find()
                .select_only()
                .column(members::Column::GroupChatId)
                .filter(members::Column::UserId.eq(actor.id.as_str()))
                .into_tuple()
                .all(&self.pool)
                .await?;
            select = select
                .filter(group_chats::Column::Id.is_in(ids))
                .filter(group_chats::Column::Status.eq(true));
        }
        Ok(select.all(&self.pool).await?)
    }

    pub async fn create(
        &self,
        actor: &CurrentUser,
        request: CreateGroupChatRequest,
    ) -> AppResult<group_chats::Model> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden);
        }
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("name is required".to_string()));
        }

        let now = Utc::now();
        let txn = self.pool.begin().await?;
        let chat = group_chats::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            name: Set(name.to_string()),
            link: Set(request.link),
            status: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;

        let mut user_ids = request.user_ids;
        user_ids.sort();
        user_ids.dedup();
        for user_id in user_ids {
            members::ActiveModel {
                group_chat_id: Set(chat.id.clone()),
                user_id: Set(user_id),
            }
            .insert(&txn)
            .await?;
        }
        txn.commit().await?;

        log::info!("{} created group chat {}", actor.username, chat.name);
        Ok(chat)
    }

    pub async fn set_status(
        &self,
        actor: &CurrentUser,
        id: &str,
        request: UpdateGroupChatStatusRequest,
    ) -> AppResult<group_chats::Model> {
        if !actor.is_admin() {
            return Err(AppError::Forbidden);
        }
        let chat = group_chats::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Group chat {id} not found")))?;
        let mut active: group_chats::ActiveModel = chat.into();
        active.status = Set(request.status);
        active.updated_at = Set(Utc::now());
        Ok(active.update(&self.pool).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use crate::test_support::{seed_user, setup_db};

    #[tokio::test]
    async fn test_members_see_only_their_active_chats() {
        let db = setup_db().await;
        let admin = seed_user(&db, "u-a", "admin", UserRole::Admin).await;
        let loader = seed_user(&db, "u-l", "loader", UserRole::Loader).await;
        let svc = GroupChatService::new(db);

        let mine = svc
            .create(
                &admin,
                CreateGroupChatRequest {
                    name: "Loaders".into(),
                    link: Some("https://m.me/j/abc".into()),
                    user_ids: vec!["u-l".into(), "u-l".into()],
                },
            )
            .await
            .unwrap();
        svc.create(
            &admin,
            CreateGroupChatRequest {
                name: "Accounting".into(),
                link: None,
                user_ids: vec![],
            },
        )
        .await
        .unwrap();

        assert_eq!(svc.list(&admin).await.unwrap().len(), 2);
        assert_eq!(svc.list(&loader).await.unwrap().len(), 1);

        svc.set_status(&admin, &mine.id, UpdateGroupChatStatusRequest { status: false })
            .await
            .unwrap();
        assert!(svc.list(&loader).await.unwrap().is_empty());
        assert!(matches!(
            svc.set_status(&loader, &mine.id, UpdateGroupChatStatusRequest { status: true })
                .await,
            Err(AppError::Forbidden)
        ));
    }
}
