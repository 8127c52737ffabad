use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,

    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("email already registered")]
    DuplicateEmail,

    #[error("invalid role: {0}")]
    InvalidRole(String),

    #[error("invalid email")]
    InvalidEmail,

    #[error("no fields to update")]
    NoFieldsSpecified,

    /// Driver text stays in the source chain; `Display` never shows it.
    #[error("storage unavailable")]
    StoreUnavailable(#[source] sqlx::Error),

    #[error("credential processing failed: {0}")]
    Credential(String),
}

pub type UserResult<T> = Result<T, UserError>;
