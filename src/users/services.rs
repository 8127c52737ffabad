use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use time::OffsetDateTime;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::auth::password::CredentialManager;
use crate::users::{
    dto::{ListUsersRequest, LoginRequest, RegisterOutcome, RegisterRequest, UpdateUserRequest},
    errors::{UserError, UserResult},
    repo::UserStore,
    repo_types::{
        normalize_email, provided, NewUser, PublicUser, Role, UpdatedUser, UserChanges, UserFilter,
    },
};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Account operations on top of a `UserStore`.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
    credentials: Arc<CredentialManager>,
}

impl UserService {
    pub fn new(store: Arc<dyn UserStore>, credentials: Arc<CredentialManager>) -> Self {
        Self { store, credentials }
    }

    /// Verifies credentials for an active user. `NotFound` and
    /// `InvalidCredentials` stay distinct here; the HTTP layer merges them.
    pub async fn login(&self, req: LoginRequest) -> UserResult<PublicUser> {
        let email = normalize_email(&req.email);

        let Some(user) = self.store.find_active_by_email(&email).await? else {
            // same argon2 cost as a wrong password, so timing does not reveal the miss
            self.verify_password(req.password, None).await?;
            warn!(%email, "login unknown email");
            return Err(UserError::NotFound);
        };

        let ok = self
            .verify_password(req.password, Some(user.password_hash.clone()))
            .await?;
        if !ok {
            warn!(%email, user_id = %user.id, "login invalid password");
            return Err(UserError::InvalidCredentials);
        }

        info!(user_id = %user.id, "user logged in");
        Ok(user.into())
    }

    /// Runs on the blocking pool; `None` verifies against the dummy hash.
    async fn verify_password(&self, password: String, hash: Option<String>) -> UserResult<bool> {
        let creds = self.credentials.clone();
        tokio::task::spawn_blocking(move || match hash {
            Some(hash) => creds.verify(&password, &hash),
            None => creds.verify_dummy(&password),
        })
        .await
        .map_err(|e| {
            error!(error = %e, "password verification task failed");
            UserError::Credential(e.to_string())
        })
    }

    /// Creates an account unless the email is already active.
    pub async fn register(&self, req: RegisterRequest) -> UserResult<RegisterOutcome> {
        let email = normalize_email(&req.email);
        if !is_valid_email(&email) {
            warn!(%email, "invalid email");
            return Err(UserError::InvalidEmail);
        }
        let role = Role::parse(&req.role)?;

        if self.store.count_active_by_email(&email).await? > 0 {
            warn!(%email, "duplicate email found");
            return Ok(RegisterOutcome::Duplicate);
        }

        let creds = self.credentials.clone();
        let password_hash = tokio::task::spawn_blocking(move || creds.hash(&req.password))
            .await
            .map_err(|e| {
                error!(error = %e, "password hashing task failed");
                UserError::Credential(e.to_string())
            })?
            .map_err(|e| UserError::Credential(e.to_string()))?;

        let new_user = NewUser {
            id: Uuid::new_v4(),
            email,
            password_hash,
            role,
            created_at: OffsetDateTime::now_utc(),
        };

        match self.store.insert(&new_user).await {
            Ok(()) => {}
            // lost the race against a concurrent registration
            Err(UserError::DuplicateEmail) => {
                warn!(email = %new_user.email, "duplicate email on insert");
                return Ok(RegisterOutcome::Duplicate);
            }
            Err(e) => return Err(e),
        }

        info!(user_id = %new_user.id, email = %new_user.email, role = %role, "user registered");
        Ok(RegisterOutcome::Registered(PublicUser {
            id: new_user.id,
            email: new_user.email,
            role: new_user.role,
            created_at: new_user.created_at,
            updated_at: new_user.created_at,
        }))
    }

    pub async fn get_by_id(&self, id: Uuid) -> UserResult<PublicUser> {
        match self.store.find_active_by_id(id).await? {
            Some(user) => Ok(user),
            None => {
                debug!(user_id = %id, "user not found");
                Err(UserError::NotFound)
            }
        }
    }

    /// Active users matching every set filter field; empty when none match.
    pub async fn list_users(&self, req: ListUsersRequest) -> UserResult<Vec<PublicUser>> {
        let Some(filter) = build_filter(&req) else {
            debug!(?req, "filter can never match");
            return Ok(Vec::new());
        };
        let users = self.store.list_active(&filter).await?;
        debug!(count = users.len(), "users listed");
        Ok(users)
    }

    /// Applies the supplied fields and echoes them back with the new `updated_at`.
    pub async fn update(&self, id: Uuid, req: UpdateUserRequest) -> UserResult<UpdatedUser> {
        let changes = build_changes(&req)?;
        if changes.is_empty() {
            return Err(UserError::NoFieldsSpecified);
        }

        let updated_at = OffsetDateTime::now_utc();
        let affected = self.store.update(id, &changes, updated_at).await?;
        if affected == 0 {
            warn!(user_id = %id, "update matched no active user");
            return Err(UserError::NotFound);
        }

        info!(user_id = %id, "user updated");
        Ok(UpdatedUser {
            id,
            email: changes.email,
            role: changes.role,
            updated_at,
        })
    }
}

/// `None` when a supplied value can never match a stored row
/// (an id that is not a UUID, a role outside the permitted set).
fn build_filter(req: &ListUsersRequest) -> Option<UserFilter> {
    let mut filter = UserFilter::default();
    if let Some(id) = provided(req.id.as_deref()) {
        filter.id = Some(Uuid::parse_str(id).ok()?);
    }
    if let Some(email) = provided(req.email.as_deref()) {
        filter.email = Some(normalize_email(email));
    }
    if let Some(role) = provided(req.role.as_deref()) {
        filter.role = Some(Role::parse(role).ok()?);
    }
    Some(filter)
}

fn build_changes(req: &UpdateUserRequest) -> UserResult<UserChanges> {
    let mut changes = UserChanges::default();
    if let Some(email) = provided(req.email.as_deref()) {
        let email = normalize_email(email);
        if !is_valid_email(&email) {
            return Err(UserError::InvalidEmail);
        }
        changes.email = Some(email);
    }
    if let Some(role) = provided(req.role.as_deref()) {
        changes.role = Some(Role::parse(role)?);
    }
    Ok(changes)
}
