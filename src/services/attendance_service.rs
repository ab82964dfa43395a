use crate::entities::{attendance_entity as attendances, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr, TransactionTrait,
};
use uuid::Uuid;

#[derive(Clone)]
pub struct AttendanceService {
    pool: DatabaseConnection,
}

impl AttendanceService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// Self, or anyone for admin-tier callers.
    fn target<'a>(actor: &'a CurrentUser, user_id: Option<&'a str>) -> AppResult<&'a str> {
        match user_id {
            Some(id) if id != actor.id && !actor.is_admin() => Err(AppError::Forbidden),
            Some(id) => Ok(id),
            None => Ok(actor.id.as_str()),
        }
    }

    /// At most one active row per user. The user row is locked before the
    /// check so concurrent clock-ins queue up; `idx_attendances_one_active`
    /// backs this at the schema level.
    pub async fn clock_in(
        &self,
        actor: &CurrentUser,
        request: ClockInRequest,
        ip_address: Option<String>,
    ) -> AppResult<attendances::Model> {
        let txn = self.pool.begin().await?;

        users::Entity::find_by_id(actor.id.clone())
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {} not found", actor.id)))?;

        let open = attendances::Entity::find()
            .filter(attendances::Column::UserId.eq(actor.id.as_str()))
            .filter(attendances::Column::Active.eq(true))
            .one(&txn)
            .await?;
        if open.is_some() {
            return Err(AppError::Conflict("Already clocked in".to_string()));
        }

        let now = Utc::now();
        let row = attendances::ActiveModel {
            id: Set(Uuid::new_v4().to_string()),
            user_id: Set(actor.id.clone()),
            time: Set(now),
            active: Set(true),
            ip_address: Set(ip_address),
            device: Set(request.device),
            clocked_out_at: Set(None),
        }
        .insert(&txn)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Already clocked in".to_string())
            }
            _ => AppError::DatabaseError(e),
        })?;

        users::Entity::update_many()
            .col_expr(users::Column::IsClockedIn, Expr::value(true))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(actor.id.as_str()))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        log::info!("{} clocked in", actor.username);
        Ok(row)
    }

    pub async fn clock_out(&self, actor: &CurrentUser) -> AppResult<attendances::Model> {
        let txn = self.pool.begin().await?;
        let open = attendances::Entity::find()
            .filter(attendances::Column::UserId.eq(actor.id.as_str()))
            .filter(attendances::Column::Active.eq(true))
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::Conflict("Not clocked in".to_string()))?;

        let now = Utc::now();
        let mut active: attendances::ActiveModel = open.into();
        active.active = Set(false);
        active.clocked_out_at = Set(Some(now));
        let row = active.update(&txn).await?;

        users::Entity::update_many()
            .col_expr(users::Column::IsClockedIn, Expr::value(false))
            .col_expr(users::Column::UpdatedAt, Expr::value(now))
            .filter(users::Column::Id.eq(actor.id.as_str()))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        log::info!("{} clocked out", actor.username);
        Ok(row)
    }

    pub async fn status(
        &self,
        actor: &CurrentUser,
        user_id: Option<&str>,
    ) -> AppResult<AttendanceStatus> {
        let user_id = Self::target(actor, user_id)?;
        let attendance = attendances::Entity::find()
            .filter(attendances::Column::UserId.eq(user_id))
            .filter(attendances::Column::Active.eq(true))
            .one(&self.pool)
            .await?;
        Ok(AttendanceStatus {
            user_id: user_id.to_string(),
            is_clocked_in: attendance.is_some(),
            attendance,
        })
    }

    pub async fn logs(
        &self,
        actor: &CurrentUser,
        query: &AttendanceQuery,
    ) -> AppResult<PaginatedResponse<attendances::Model>> {
        let user_id = Self::target(actor, query.user_id.as_deref())?;
        let params = PaginationParams::new(query.page, query.page_size);
        let select = attendances::Entity::find().filter(attendances::Column::UserId.eq(user_id));

        let total = select.clone().count(&self.pool).await?;
        let rows = select
            .order_by_desc(attendances::Column::Time)
            .limit(params.get_limit())
            .offset(params.get_offset())
            .all(&self.pool)
            .await?;
        Ok(PaginatedResponse::new(rows, &params, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use crate::test_support::{seed_user, setup_db};

    #[tokio::test]
    async fn test_single_active_clock_in() {
        let db = setup_db().await;
        let me = seed_user(&db, "u-1", "loader", UserRole::Loader).await;
        let svc = AttendanceService::new(db.clone());

        svc.clock_in(&me, ClockInRequest::default(), Some("10.0.0.1".into()))
            .await
            .unwrap();
        assert!(matches!(
            svc.clock_in(&me, ClockInRequest::default(), None).await,
            Err(AppError::Conflict(_))
        ));
        let user = users::Entity::find_by_id("u-1".to_string())
            .one(&db)
            .await
            .unwrap()
            .unwrap();
        assert!(user.is_clocked_in);

        let status = svc.status(&me, None).await.unwrap();
        assert!(status.is_clocked_in);

        let out = svc.clock_out(&me).await.unwrap();
        assert!(!out.active);
        assert!(out.clocked_out_at.is_some());
        assert!(matches!(svc.clock_out(&me).await, Err(AppError::Conflict(_))));

        svc.clock_in(&me, ClockInRequest::default(), None).await.unwrap();
        let logs = svc.logs(&me, &AttendanceQuery::default()).await.unwrap();
        assert_eq!(logs.total, 2);
    }

    #[tokio::test]
    async fn test_concurrent_clock_ins_leave_one_active_row() {
        let db = setup_db().await;
        let me = seed_user(&db, "u-1", "loader", UserRole::Loader).await;
        let svc = AttendanceService::new(db.clone());

        let (a, b) = tokio::join!(
            svc.clock_in(&me, ClockInRequest::default(), None),
            svc.clock_in(&me, ClockInRequest::default(), None)
        );
        assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);
        assert!(matches!(a.err().or(b.err()), Some(AppError::Conflict(_))));

        let active = attendances::Entity::find()
            .filter(attendances::Column::UserId.eq("u-1"))
            .filter(attendances::Column::Active.eq(true))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(active, 1);
    }

    #[tokio::test]
    async fn test_clock_in_unknown_user_is_not_found() {
        let db = setup_db().await;
        let svc = AttendanceService::new(db);
        let ghost = CurrentUser {
            id: "ghost".into(),
            username: "ghost".into(),
            role: UserRole::Loader,
        };
        assert!(matches!(
            svc.clock_in(&ghost, ClockInRequest::default(), None).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_logs_of_others_need_admin() {
        let db = setup_db().await;
        let loader = seed_user(&db, "u-1", "loader", UserRole::Loader).await;
        let admin = seed_user(&db, "u-2", "admin", UserRole::Admin).await;
        let svc = AttendanceService::new(db);
        let query = AttendanceQuery {
            user_id: Some("u-2".into()),
            ..Default::default()
        };
        assert!(matches!(svc.logs(&loader, &query).await, Err(AppError::Forbidden)));

        let query = AttendanceQuery {
            user_id: Some("u-1".into()),
            ..Default::default()
        };
        assert_eq!(svc.logs(&admin, &query).await.unwrap().total, 0);
    }
}
