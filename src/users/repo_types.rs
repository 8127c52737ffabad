use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::users::errors::UserError;

/// Placeholder older clients send for "not set".
pub const LEGACY_UNSET: &str = "string";

/// Permitted roles. Stored as lowercase text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Client,
    #[serde(alias = "contractor")]
    Contractors,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Contractors => "contractors",
        }
    }

    pub fn parse(raw: &str) -> Result<Self, UserError> {
        match raw.trim().to_lowercase().as_str() {
            "client" => Ok(Role::Client),
            "contractors" | "contractor" => Ok(Role::Contractors),
            _ => Err(UserError::InvalidRole(raw.to_string())),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = UserError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Role::parse(&raw)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full user row. Only login reads this shape; it never leaves the crate.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// User as returned by every operation: no hash field exists here.
#[derive(Debug, Clone, Serialize, FromRow, PartialEq)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    #[sqlx(try_from = "String")]
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

/// Row about to be inserted.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub created_at: OffsetDateTime,
}

/// Normalized listing filter; `None` fields do not constrain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserFilter {
    pub id: Option<Uuid>,
    pub email: Option<String>,
    pub role: Option<Role>,
}

/// Normalized update; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub role: Option<Role>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.role.is_none()
    }
}

/// Echo of an applied update: the supplied fields plus the new `updated_at`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UpdatedUser {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Empty, whitespace and the legacy placeholder all mean "not set".
pub fn provided(value: Option<&str>) -> Option<&str> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty() && *v != LEGACY_UNSET)
}

pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
