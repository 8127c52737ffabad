use serde::{Deserialize, Serialize};

use crate::users::repo_types::PublicUser;

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub role: String,
}

/// Query string for listing. Empty or `"string"` means no constraint.
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersRequest {
    pub id: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Request body for a partial update.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub role: Option<String>,
}

/// Result of registration. A duplicate is an outcome, not an error.
#[derive(Debug)]
pub enum RegisterOutcome {
    Registered(PublicUser),
    Duplicate,
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum RegisterStatus {
    Registered,
    DuplicateEmail,
}

/// Response returned by the register route.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub status: RegisterStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<PublicUser>,
}

impl From<RegisterOutcome> for RegisterResponse {
    fn from(outcome: RegisterOutcome) -> Self {
        match outcome {
            RegisterOutcome::Registered(user) => Self {
                status: RegisterStatus::Registered,
                user: Some(user),
            },
            RegisterOutcome::Duplicate => Self {
                status: RegisterStatus::DuplicateEmail,
                user: None,
            },
        }
    }
}
