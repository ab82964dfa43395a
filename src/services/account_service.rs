//! Staff account administration (admin tier only).

use crate::entities::{user_casino_group_entity as memberships, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::Utc;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::LazyLock;
use uuid::Uuid;

static USERNAME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.\-]{3,32}$").ok());
static EMAIL_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").ok());

fn matches(re: &LazyLock<Option<Regex>>, value: &str) -> bool {
    re.as_ref().is_some_and(|r| r.is_match(value))
}

pub fn validate_username(username: &str) -> AppResult<()> {
    if !matches(&USERNAME_RE, username) {
        return Err(AppError::ValidationError(
            "Username must be 3-32 letters, digits, dots, dashes or underscores".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> AppResult<()> {
    if !matches(&EMAIL_RE, email) {
        return Err(AppError::ValidationError("Invalid email address".to_string()));
    }
    Ok(())
}

async fn replace_memberships<C: ConnectionTrait>(
    conn: &C,
    user_id: &str,
    casino_group_ids: &[String],
) -> AppResult<()> {
    memberships::Entity::delete_many()
        .filter(memberships::Column::UserId.eq(user_id))
        .exec(conn)
        .await?;
    let mut ids: Vec<&String> = casino_group_ids.iter().collect();
    ids.sort();
    ids.dedup();
    for gid in ids {
        memberships::ActiveModel {
            user_id: Set(user_id.to_string()),
            casino_group_id: Set(gid.clone()),
        }
        .insert(conn)
        .await?;
    }
    Ok(())
}

#[derive(Clone)]
pub struct AccountService {
    pool: DatabaseConnection,
}

impl AccountService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    fn require_admin(actor: &CurrentUser) -> AppResult<()> {
        if actor.is_admin() { Ok(()) } else { Err(AppError::Forbidden) }
    }

    async fn load(&self, id: &str) -> AppResult<AccountResponse> {
        let user = users::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {id} not found")))?;
        let groups = memberships::Entity::find()
            .filter(memberships::Column::UserId.eq(id))
            .all(&self.pool)
            .await?
            .into_iter()
            .map(|m| m.casino_group_id)
            .collect();
        Ok(AccountResponse::from_model(user, groups))
    }

    pub async fn list(&self, actor: &CurrentUser) -> AppResult<Vec<AccountResponse>> {
        Self::require_admin(actor)?;
        let rows = users::Entity::find()
            .order_by_asc(users::Column::Username)
            .all(&self.pool)
            .await?;

        let mut groups: HashMap<String, Vec<String>> = HashMap::new();
        for m in memberships::Entity::find().all(&self.pool).await? {
            groups.entry(m.user_id).or_default().push(m.casino_group_id);
        }

        Ok(rows
            .into_iter()
            .map(|u| {
                let ids = groups.remove(&u.id).unwrap_or_default();
                AccountResponse::from_model(u, ids)
            })
            .collect())
    }

    pub async fn create(
        &self,
        actor: &CurrentUser,
        request: CreateAccountRequest,
    ) -> AppResult<AccountResponse> {
        Self::require_admin(actor)?;
        let username = request.username.trim().to_string();
        validate_username(&username)?;
        if request.name.trim().is_empty() {
            return Err(AppError::ValidationError("name is required".to_string()));
        }
        if let Some(email) = request.email.as_deref() {
            validate_email(email)?;
        }
        validate_password(&request.password)?;

        let taken = users::Entity::find()
            .filter(users::Column::Username.eq(username.as_str()))
            .one(&self.pool)
            .await?
            .is_some();
        if taken {
            return Err(AppError::Conflict(format!("Username {username} is taken")));
        }

        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let txn = self.pool.begin().await?;
        users::ActiveModel {
            id: Set(id.clone()),
            name: Set(request.name.trim().to_string()),
            email: Set(request.email),
            username: Set(username),
            password_hash: Set(hash_password(&request.password)?),
            role: Set(request.role),
            active: Set(true),
            is_clocked_in: Set(false),
            balance: Set(0.0),
            messenger_link: Set(request.messenger_link),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await?;
        replace_memberships(&txn, &id, &request.casino_group_ids).await?;
        txn.commit().await?;

        log::info!("{} created account {id} ({})", actor.username, request.role);
        self.load(&id).await
    }

    pub async fn update(
        &self,
        actor: &CurrentUser,
        id: &str,
        request: UpdateAccountRequest,
    ) -> AppResult<AccountResponse> {
        Self::require_admin(actor)?;
        let user = users::Entity::find_by_id(id.to_string())
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Account {id} not found")))?;

        if let Some(email) = request.email.as_deref() {
            validate_email(email)?;
        }
        let password_hash = match request.password.as_deref() {
            Some(p) => {
                validate_password(p)?;
                Some(hash_password(p)?)
            }
            None => None,
        };

        let txn = self.pool.begin().await?;
        let mut active: users::ActiveModel = user.into();
        if let Some(name) = request.name {
            active.name = Set(name);
        }
        if request.email.is_some() {
            active.email = Set(request.email);
        }
        if let Some(role) = request.role {
            active.role = Set(role);
        }
        if let Some(flag) = request.active {
            active.active = Set(flag);
        }
        if let Some(hash) = password_hash {
            active.password_hash = Set(hash);
        }
        if request.messenger_link.is_some() {
            active.messenger_link = Set(request.messenger_link);
        }
        active.updated_at = Set(Utc::now());
        active.update(&txn).await?;
        if let Some(ids) = request.casino_group_ids.as_deref() {
            replace_memberships(&txn, id, ids).await?;
        }
        txn.commit().await?;

        log::info!("{} updated account {id}", actor.username);
        self.load(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::UserRole;
    use crate::test_support::{seed_group, seed_user, setup_db};

    fn new_account(username: &str) -> CreateAccountRequest {
        CreateAccountRequest {
            name: "Loader One".into(),
            email: Some("loader@example.com".into()),
            username: username.into(),
            password: "Password123".into(),
            role: UserRole::Loader,
            messenger_link: None,
            casino_group_ids: vec!["g-1".into(), "g-1".into()],
        }
    }

    #[test]
    fn test_username_and_email_rules() {
        assert!(validate_username("loader_01").is_ok());
        assert!(validate_username("ab").is_err());
        assert!(validate_username("has space").is_err());
        assert!(validate_email("a@b.co").is_ok());
        assert!(validate_email("nope").is_err());
    }

    #[tokio::test]
    async fn test_admin_creates_and_updates_accounts() {
        let db = setup_db().await;
        seed_group(&db, "g-1", "QBET").await;
        seed_group(&db, "g-2", "LUCKY").await;
        let admin = seed_user(&db, "u-a", "admin", UserRole::Admin).await;
        let svc = AccountService::new(db);

        let created = svc.create(&admin, new_account("loader01")).await.unwrap();
        assert_eq!(created.casino_group_ids, vec!["g-1".to_string()]);
        assert!(matches!(
            svc.create(&admin, new_account("loader01")).await,
            Err(AppError::Conflict(_))
        ));

        let updated = svc
            .update(
                &admin,
                &created.id,
                UpdateAccountRequest {
                    active: Some(false),
                    casino_group_ids: Some(vec!["g-2".into()]),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!updated.active);
        assert_eq!(updated.casino_group_ids, vec!["g-2".to_string()]);
        assert_eq!(svc.list(&admin).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_non_admin_is_forbidden() {
        let db = setup_db().await;
        let support = seed_user(&db, "u-s", "support", UserRole::Support).await;
        let svc = AccountService::new(db);
        assert!(matches!(svc.list(&support).await, Err(AppError::Forbidden)));
        assert!(matches!(
            svc.create(&support, new_account("x_user")).await,
            Err(AppError::Forbidden)
        ));
    }
}
