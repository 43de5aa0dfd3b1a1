//! User endpoints. Registration is open; everything else is gated.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use auth::Identity;
use common::UserId;
use domain::{Context, RegisterUser, UserService};
use store::{User, UserStore};

use crate::error::ApiError;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub credential_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub role: String,
}

#[derive(Serialize)]
pub struct RegisteredResponse {
    pub user_id: UserId,
}

#[derive(Serialize)]
pub struct UserResponse {
    pub user_id: UserId,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub role: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            user_id: user.id,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            role: user.role,
        }
    }
}

/// POST /users — register a member (open endpoint).
pub async fn register<U: UserStore>(
    State(users): State<Arc<UserService<U>>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredResponse>), ApiError> {
    let user_id = users
        .register(RegisterUser {
            username: req.username,
            credential_hash: req.credential_hash,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            role: req.role,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(RegisteredResponse { user_id })))
}

/// GET /users/{id}
pub async fn get<U: UserStore>(
    State(users): State<Arc<UserService<U>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<UserResponse>, ApiError> {
    let ctx = Context::new(identity);
    let user = users.get(&ctx, UserId::new(id)).await?;
    Ok(Json(user.into()))
}

/// DELETE /users/{id} — blocked while the user holds an active borrowing.
pub async fn delete<U: UserStore>(
    State(users): State<Arc<UserService<U>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let ctx = Context::new(identity);
    users.delete(&ctx, UserId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
