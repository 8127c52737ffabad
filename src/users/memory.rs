//! In-process `UserStore` used by tests. Mirrors the Postgres table: the
//! `deleted_at = 0` visibility filter, uniqueness of active emails, and
//! affected-row counts on update.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::{
    errors::{UserError, UserResult},
    repo::UserStore,
    repo_types::{NewUser, PublicUser, User, UserChanges, UserFilter},
};

#[derive(Debug, Clone)]
struct Row {
    user: User,
    deleted_at: i64,
}

#[derive(Default)]
pub struct MemoryUserStore {
    rows: Mutex<Vec<Row>>,
    offline: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call fail like a dropped connection.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn soft_delete(&self, id: Uuid) {
        let mut rows = self.rows.lock().unwrap();
        for row in rows.iter_mut().filter(|r| r.user.id == id) {
            row.deleted_at = OffsetDateTime::now_utc().unix_timestamp();
        }
    }

    /// Stored hash for `id`, deleted or not.
    pub fn stored_hash(&self, id: Uuid) -> Option<String> {
        let rows = self.rows.lock().unwrap();
        rows.iter()
            .find(|r| r.user.id == id)
            .map(|r| r.user.password_hash.clone())
    }

    fn check_online(&self) -> UserResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(UserError::StoreUnavailable(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    fn email_taken(rows: &[Row], email: &str, except: Option<Uuid>) -> bool {
        rows.iter()
            .any(|r| r.deleted_at == 0 && r.user.email == email && Some(r.user.id) != except)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_active_by_email(&self, email: &str) -> UserResult<Option<User>> {
        self.check_online()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.deleted_at == 0 && r.user.email == email)
            .map(|r| r.user.clone()))
    }

    async fn count_active_by_email(&self, email: &str) -> UserResult<i64> {
        self.check_online()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.deleted_at == 0 && r.user.email == email)
            .count() as i64)
    }

    async fn insert(&self, user: &NewUser) -> UserResult<()> {
        self.check_online()?;
        let mut rows = self.rows.lock().unwrap();
        if Self::email_taken(&rows, &user.email, None) {
            return Err(UserError::DuplicateEmail);
        }
        rows.push(Row {
            user: User {
                id: user.id,
                email: user.email.clone(),
                password_hash: user.password_hash.clone(),
                role: user.role,
                created_at: user.created_at,
                updated_at: user.created_at,
            },
            deleted_at: 0,
        });
        Ok(())
    }

    async fn find_active_by_id(&self, id: Uuid) -> UserResult<Option<PublicUser>> {
        self.check_online()?;
        let rows = self.rows.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.deleted_at == 0 && r.user.id == id)
            .map(|r| r.user.clone().into()))
    }

    async fn list_active(&self, filter: &UserFilter) -> UserResult<Vec<PublicUser>> {
        self.check_online()?;
        let rows = self.rows.lock().unwrap();
        let mut users: Vec<PublicUser> = rows
            .iter()
            .filter(|r| r.deleted_at == 0)
            .filter(|r| filter.id.map_or(true, |id| r.user.id == id))
            .filter(|r| filter.email.as_ref().map_or(true, |e| &r.user.email == e))
            .filter(|r| filter.role.map_or(true, |role| r.user.role == role))
            .map(|r| r.user.clone().into())
            .collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: &UserChanges,
        updated_at: OffsetDateTime,
    ) -> UserResult<u64> {
        self.check_online()?;
        let mut rows = self.rows.lock().unwrap();
        if let Some(email) = &changes.email {
            if Self::email_taken(&rows, email, Some(id)) {
                return Err(UserError::DuplicateEmail);
            }
        }
        let mut affected = 0;
        for row in rows
            .iter_mut()
            .filter(|r| r.deleted_at == 0 && r.user.id == id)
        {
            if let Some(email) = &changes.email {
                row.user.email = email.clone();
            }
            if let Some(role) = changes.role {
                row.user.role = role;
            }
            row.user.updated_at = updated_at;
            affected += 1;
        }
        Ok(affected)
    }
}
