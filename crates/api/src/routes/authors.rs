//! Author endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use auth::Identity;
use common::AuthorId;
use domain::{AuthorService, Context, CreateAuthor, UpdateAuthor};
use store::{Author, AuthorStore, AuthorSummary};

use crate::error::ApiError;

#[derive(Deserialize)]
pub struct AuthorRequest {
    pub name: String,
    pub birthdate: Option<String>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
}

#[derive(Deserialize)]
pub struct RangeQuery {
    #[serde(default = "default_min")]
    pub min: i64,
    #[serde(default = "default_max")]
    pub max: i64,
}

fn default_min() -> i64 {
    1
}

fn default_max() -> i64 {
    100
}

#[derive(Deserialize)]
pub struct NameQuery {
    pub name: String,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub author_id: AuthorId,
}

/// POST /authors
pub async fn create<A: AuthorStore>(
    State(authors): State<Arc<AuthorService<A>>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<AuthorRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let ctx = Context::new(identity);
    let author_id = authors
        .create(
            &ctx,
            CreateAuthor {
                name: req.name,
                birthdate: req.birthdate,
                nationality: req.nationality,
                biography: req.biography,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { author_id })))
}

/// GET /authors?min=&max=
pub async fn list<A: AuthorStore>(
    State(authors): State<Arc<AuthorService<A>>>,
    Extension(identity): Extension<Identity>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<AuthorSummary>>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(authors.list(&ctx, range.min, range.max).await?))
}

/// GET /authors/search?name=
pub async fn search<A: AuthorStore>(
    State(authors): State<Arc<AuthorService<A>>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<AuthorSummary>>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(authors.search(&ctx, &query.name).await?))
}

/// GET /authors/{id}
pub async fn get<A: AuthorStore>(
    State(authors): State<Arc<AuthorService<A>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<Author>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(authors.get(&ctx, AuthorId::new(id)).await?))
}

/// PUT /authors/{id}
pub async fn update<A: AuthorStore>(
    State(authors): State<Arc<AuthorService<A>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(req): Json<AuthorRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = Context::new(identity);
    authors
        .update(
            &ctx,
            AuthorId::new(id),
            UpdateAuthor {
                name: req.name,
                birthdate: req.birthdate,
                nationality: req.nationality,
                biography: req.biography,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /authors/{id} — blocked while any book references the author.
pub async fn delete<A: AuthorStore>(
    State(authors): State<Arc<AuthorService<A>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let ctx = Context::new(identity);
    authors.delete(&ctx, AuthorId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
