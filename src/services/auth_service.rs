use crate::entities::{user_casino_group_entity as memberships, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QuerySelect, Set,
};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    async fn casino_group_ids(&self, user_id: &str) -> AppResult<Vec<String>> {
        Ok(memberships::Entity::find()
            .select_only()
            .column(memberships::Column::CasinoGroupId)
            .filter(memberships::Column::UserId.eq(user_id))
            .into_tuple()
            .all(&self.pool)
            .await?)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let username = request.username.trim();
        if username.is_empty() || request.password.is_empty() {
            return Err(AppError::ValidationError(
                "username and password are required".to_string(),
            ));
        }

        // unknown, inactive and wrong password share one message
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.pool)
            .await?
            .filter(|u| u.active)
            .ok_or_else(|| AppError::Unauthorized("Invalid username or password".to_string()))?;

        if !verify_password(&request.password, &user.password_hash)? {
            return Err(AppError::Unauthorized(
                "Invalid username or password".to_string(),
            ));
        }

        let token = self
            .jwt_service
            .generate_session_token(&user.id, &user.username, user.role)?;
        log::info!("User {} logged in", user.username);

        let casino_group_ids = self.casino_group_ids(&user.id).await?;
        Ok(LoginResponse {
            token,
            expires_in: self.jwt_service.session_expires_in(),
            user: AccountResponse::from_model(user, casino_group_ids),
        })
    }

    pub async fn me(&self, actor: &CurrentUser) -> AppResult<AccountResponse> {
        let user = users::Entity::find_by_id(actor.id.clone())
            .one(&self.pool)
            .await?
            .filter(|u| u.active)
            .ok_or_else(|| AppError::Unauthorized("Account no longer active".to_string()))?;
        let casino_group_ids = self.casino_group_ids(&user.id).await?;
        Ok(AccountResponse::from_model(user, casino_group_ids))
    }

    /// Returns the first failed check only.
    pub async fn change_password(
        &self,
        actor: &CurrentUser,
        request: ChangePasswordRequest,
    ) -> AppResult<()> {
        if request.current_password.is_empty() {
            return Err(AppError::ValidationError(
                "Current password is required".to_string(),
            ));
        }
        validate_password(&request.new_password)?;
        if request.new_password != request.confirm_password {
            return Err(AppError::ValidationError(
                "Passwords do not match".to_string(),
            ));
        }

        let user = users::Entity::find_by_id(actor.id.clone())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        if !verify_password(&request.current_password, &user.password_hash)? {
            return Err(AppError::ValidationError(
                "Current password is incorrect".to_string(),
            ));
        }

        let mut active: users::ActiveModel = user.into();
        active.password_hash = Set(hash_password(&request.new_password)?);
        active.updated_at = Set(Utc::now());
        active.update(&self.pool).await?;
        log::info!("User {} changed password", actor.username);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use crate::test_support::{seed_user, setup_db};

    async fn service() -> (AuthService, CurrentUser) {
        let db = setup_db().await;
        let user = seed_user(&db, "u-1", "loader01", UserRole::Loader).await;
        (AuthService::new(db, JwtService::new("secret", 3600)), user)
    }

    fn change(current: &str, new: &str, confirm: &str) -> ChangePasswordRequest {
        ChangePasswordRequest {
            current_password: current.into(),
            new_password: new.into(),
            confirm_password: confirm.into(),
        }
    }

    #[tokio::test]
    async fn test_login_issues_token_for_valid_credentials() {
        let (svc, _) = service().await;
        let resp = svc
            .login(LoginRequest {
                username: "loader01".into(),
                password: "Password123".into(),
            })
            .await
            .unwrap();
        assert_eq!(resp.user.username, "loader01");
        assert_eq!(resp.expires_in, 3600);
        let claims = JwtService::new("secret", 3600)
            .verify_session_token(&resp.token)
            .unwrap();
        assert_eq!(claims.sub, "u-1");

        let bad = svc
            .login(LoginRequest {
                username: "loader01".into(),
                password: "wrong".into(),
            })
            .await;
        assert!(matches!(bad, Err(AppError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_change_password_reports_first_issue() {
        let (svc, user) = service().await;
        let err = svc.change_password(&user, change("", "short", "x")).await;
        assert!(matches!(err, Err(AppError::ValidationError(m)) if m.contains("Current password is required")));

        let err = svc
            .change_password(&user, change("Password123", "short", "other"))
            .await;
        assert!(matches!(err, Err(AppError::ValidationError(m)) if m.contains("between 8 and 128")));

        let err = svc
            .change_password(&user, change("Password123", "NewPassword1", "NewPassword2"))
            .await;
        assert!(matches!(err, Err(AppError::ValidationError(m)) if m == "Passwords do not match"));

        let err = svc
            .change_password(&user, change("Wrong1234", "NewPassword1", "NewPassword1"))
            .await;
        assert!(matches!(err, Err(AppError::ValidationError(m)) if m == "Current password is incorrect"));

        svc.change_password(&user, change("Password123", "NewPassword1", "NewPassword1"))
            .await
            .unwrap();
        assert!(svc
            .login(LoginRequest {
                username: "loader01".into(),
                password: "NewPassword1".into(),
            })
            .await
            .is_ok());
    }
}
