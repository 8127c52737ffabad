use async_trait::async_trait;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use tracing::{error, warn};
use uuid::Uuid;

use crate::users::{
    errors::{UserError, UserResult},
    query,
    repo_types::{NewUser, PublicUser, User, UserChanges, UserFilter},
};

/// Store seam for user records. Every read sees active rows only.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Active user by email, hash included.
    async fn find_active_by_email(&self, email: &str) -> UserResult<Option<User>>;

    async fn count_active_by_email(&self, email: &str) -> UserResult<i64>;

    /// Fails with `DuplicateEmail` when the active-email constraint rejects the row.
    async fn insert(&self, user: &NewUser) -> UserResult<()>;

    async fn find_active_by_id(&self, id: Uuid) -> UserResult<Option<PublicUser>>;

    /// Unreadable rows are skipped, not fatal.
    async fn list_active(&self, filter: &UserFilter) -> UserResult<Vec<PublicUser>>;

    /// Returns the number of rows affected.
    async fn update(
        &self,
        id: Uuid,
        changes: &UserChanges,
        updated_at: OffsetDateTime,
    ) -> UserResult<u64>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

fn store_err(op: &'static str) -> impl FnOnce(sqlx::Error) -> UserError {
    move |e| {
        error!(error = %e, op, "user store call failed");
        UserError::StoreUnavailable(e)
    }
}

fn write_err(op: &'static str) -> impl FnOnce(sqlx::Error) -> UserError {
    move |e| classify_write_error(op, e)
}

/// Unique violations become `DuplicateEmail`; anything else is a store failure.
fn classify_write_error(op: &'static str, e: sqlx::Error) -> UserError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            warn!(op, constraint = ?db.constraint(), "active email already taken");
            return UserError::DuplicateEmail;
        }
    }
    store_err(op)(e)
}

/// Drops rows that failed to decode, logging each one.
fn keep_readable<I>(rows: I) -> Vec<PublicUser>
where
    I: IntoIterator<Item = Result<PublicUser, sqlx::Error>>,
{
    rows.into_iter()
        .filter_map(|row| match row {
            Ok(u) => Some(u),
            Err(e) => {
                warn!(error = %e, "skipping unreadable user row");
                None
            }
        })
        .collect()
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_active_by_email(&self, email: &str) -> UserResult<Option<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, role, created_at, updated_at
            FROM users
            WHERE email = $1 AND deleted_at = 0
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(store_err("find user by email"))
    }

    async fn count_active_by_email(&self, email: &str) -> UserResult<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE email = $1 AND deleted_at = 0
            "#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await
        .map_err(store_err("count users by email"))
    }

    async fn insert(&self, user: &NewUser) -> UserResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .execute(&self.db)
        .await
        .map_err(write_err("insert user"))?;
        Ok(())
    }

    async fn find_active_by_id(&self, id: Uuid) -> UserResult<Option<PublicUser>> {
        let filter = UserFilter {
            id: Some(id),
            ..Default::default()
        };
        let user = query::select_active(&filter)
            .build_query_as::<PublicUser>()
            .fetch_optional(&self.db)
            .await
            .map_err(store_err("get user by id"))?;
        Ok(user)
    }

    async fn list_active(&self, filter: &UserFilter) -> UserResult<Vec<PublicUser>> {
        let rows = query::select_active(filter)
            .build()
            .fetch_all(&self.db)
            .await
            .map_err(store_err("list users"))?;

        Ok(keep_readable(rows.iter().map(|row| PublicUser::from_row(row))))
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &UserChanges,
        updated_at: OffsetDateTime,
    ) -> UserResult<u64> {
        let res = query::update_active(id, changes, updated_at)
            .build()
            .execute(&self.db)
            .await
            .map_err(write_err("update user"))?;
        Ok(res.rows_affected())
    }
}
