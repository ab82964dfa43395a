use crate::entities::{casino_group_entity as casino_groups, user_casino_group_entity as memberships};
use crate::error::{AppError, AppResult};
use crate::models::{CasinoGroupQuery, CurrentUser, PendingCounts};
use crate::services::pending_count;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};

#[derive(Clone)]
pub struct CasinoGroupService {
    pool: DatabaseConnection,
}

impl CasinoGroupService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Case-insensitive name match first, then id.
    pub async fn resolve(&self, name_or_id: &str) -> AppResult<casino_groups::Model> {
        let key = name_or_id.trim();
        if key.is_empty() {
            return Err(AppError::ValidationError("casinoGroup is required".to_string()));
        }

        let by_name = casino_groups::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col(casino_groups::Column::Name)))
                    .eq(key.to_lowercase()),
            )
            .one(&self.pool)
            .await?;
        if let Some(group) = by_name {
            return Ok(group);
        }

        casino_groups::Entity::find_by_id(key.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Casino group '{key}' not found")))
    }

    pub async fn resolve_query(&self, query: &CasinoGroupQuery) -> AppResult<casino_groups::Model> {
        let key = query.key().ok_or_else(|| {
            AppError::ValidationError("casinoGroup or casinoGroupId is required".to_string())
        })?;
        self.resolve(key).await
    }

    /// Channel label for a group id; falls back to the id if the row is gone.
    pub async fn label(&self, casino_group_id: &str) -> String {
        match casino_groups::Entity::find_by_id(casino_group_id.to_string())
            .one(&self.pool)
            .await
        {
            Ok(Some(group)) => group.name,
            Ok(None) => casino_group_id.to_string(),
            Err(e) => {
                log::warn!("Failed to load casino group {casino_group_id}: {e}");
                casino_group_id.to_string()
            }
        }
    }

    /// Active groups visible to the caller: all for admins, memberships otherwise.
    pub async fn list_for(&self, actor: &CurrentUser) -> AppResult<Vec<casino_groups::Model>> {
        let mut select = casino_groups::Entity::find()
            .filter(casino_groups::Column::Active.eq(true))
            .order_by_asc(casino_groups::Column::Name);

        if !actor.is_admin() {
            let ids: Vec<String> = memberships::Entity::find()
                .select_only()
                .column(memberships::Column::CasinoGroupId)
                .filter(memberships::Column::UserId.eq(actor.id.as_str()))
                .into_tuple()
                .all(&self.pool)
                .await?;
            select = select.filter(casino_groups::Column::Id.is_in(ids));
        }

        Ok(select.all(&self.pool).await?)
    }

    pub async fn pending_counts(&self, query: &CasinoGroupQuery) -> AppResult<PendingCounts> {
        let group = self.resolve_query(query).await?;
        pending_count::pending_counts(&self.pool, &group.id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use crate::test_support::{seed_group, seed_user, setup_db};
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn test_resolve_is_case_insensitive_then_by_id() {
        let db = setup_db().await;
        seed_group(&db, "g-1", "QBET").await;
        let svc = CasinoGroupService::new(db);

        assert_eq!(svc.resolve("qbet").await.unwrap().id, "g-1");
        assert_eq!(svc.resolve("g-1").await.unwrap().name, "QBET");
        assert!(matches!(svc.resolve("nope").await, Err(AppError::NotFound(_))));
        assert!(matches!(svc.resolve("  ").await, Err(AppError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_list_for_non_admin_is_limited_to_memberships() {
        let db = setup_db().await;
        seed_group(&db, "g-1", "QBET").await;
        seed_group(&db, "g-2", "LUCKY").await;
        let loader = seed_user(&db, "u-1", "loader", UserRole::Loader).await;
        let admin = seed_user(&db, "u-2", "boss", UserRole::Admin).await;
        memberships::ActiveModel {
            user_id: Set("u-1".into()),
            casino_group_id: Set("g-2".into()),
        }
        .insert(&db)
        .await
        .unwrap();

        let svc = CasinoGroupService::new(db);
        let mine = svc.list_for(&loader).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].name, "LUCKY");
        assert_eq!(svc.list_for(&admin).await.unwrap().len(), 2);
    }
}
