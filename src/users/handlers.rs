use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};
use uuid::Uuid;

use crate::{
    state::AppState,
    users::{
        dto::{
            ListUsersRequest, LoginRequest, RegisterRequest, RegisterResponse, RegisterStatus,
            UpdateUserRequest,
        },
        errors::UserError,
        repo_types::{PublicUser, UpdatedUser},
    },
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/:id", get(get_user).patch(update_user))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    match state.users.login(payload).await {
        Ok(user) => Ok(Json(user)),
        // unknown email and wrong password look the same from outside
        Err(UserError::NotFound) => Err(reject(UserError::InvalidCredentials)),
        Err(e) => Err(reject(e)),
    }
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), (StatusCode, String)> {
    let resp = RegisterResponse::from(state.users.register(payload).await.map_err(reject)?);
    let status = match resp.status {
        RegisterStatus::Registered => StatusCode::CREATED,
        RegisterStatus::DuplicateEmail => StatusCode::CONFLICT,
    };
    Ok((status, Json(resp)))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<PublicUser>, (StatusCode, String)> {
    state.users.get_by_id(id).await.map(Json).map_err(reject)
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    Query(filter): Query<ListUsersRequest>,
) -> Result<Json<Vec<PublicUser>>, (StatusCode, String)> {
    state.users.list_users(filter).await.map(Json).map_err(reject)
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UpdatedUser>, (StatusCode, String)> {
    state.users.update(id, payload).await.map(Json).map_err(reject)
}

/// Maps a domain error to a status and a fixed message; driver text never leaves.
fn reject(e: UserError) -> (StatusCode, String) {
    match e {
        UserError::NotFound => (StatusCode::NOT_FOUND, "User not found".into()),
        UserError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials".into()),
        UserError::DuplicateEmail => (StatusCode::CONFLICT, "Email already registered".into()),
        UserError::InvalidRole(role) => (StatusCode::BAD_REQUEST, format!("Invalid role: {role}")),
        UserError::InvalidEmail => (StatusCode::BAD_REQUEST, "Invalid email".into()),
        UserError::NoFieldsSpecified => (StatusCode::BAD_REQUEST, "No fields to update".into()),
        UserError::StoreUnavailable(_) => {
            (StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable".into())
        }
        UserError::Credential(msg) => {
            error!(error = %msg, "credential processing failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
        }
    }
}
