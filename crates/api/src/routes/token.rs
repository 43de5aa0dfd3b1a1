//! Token issuance endpoint.
//!
//! Hands out a signed bearer token for a username without checking
//! credentials, mirroring the deployment where an upstream proxy has
//! already authenticated the caller. Credential-backed login lives
//! outside this system.

use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use auth::{IdentityGate, TOKEN_TTL};

use crate::error::ApiError;

#[derive(Deserialize)]
pub struct TokenRequest {
    pub username: String,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub token: String,
}

/// POST /auth/token — issue a bearer token for `username`.
pub async fn issue(
    Extension(gate): Extension<IdentityGate>,
    Json(req): Json<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    if req.username.trim().is_empty() {
        return Err(ApiError::BadRequest("username is required".to_string()));
    }

    let token = gate.issue(&req.username, TOKEN_TTL)?;
    Ok(Json(TokenResponse { token }))
}
