//! Category endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use auth::Identity;
use common::CategoryId;
use domain::{CategoryService, Context, CreateCategory, UpdateCategory};
use store::{Category, CategoryStore, CategorySummary};

use crate::error::ApiError;
use crate::routes::authors::{NameQuery, RangeQuery};

#[derive(Deserialize)]
pub struct CategoryRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub category_id: CategoryId,
}

/// POST /categories
pub async fn create<C: CategoryStore>(
    State(categories): State<Arc<CategoryService<C>>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let ctx = Context::new(identity);
    let category_id = categories
        .create(
            &ctx,
            CreateCategory {
                name: req.name,
                description: req.description,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { category_id })))
}

/// GET /categories?min=&max=
pub async fn list<C: CategoryStore>(
    State(categories): State<Arc<CategoryService<C>>>,
    Extension(identity): Extension<Identity>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<CategorySummary>>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(categories.list(&ctx, range.min, range.max).await?))
}

/// GET /categories/search?name=
pub async fn search<C: CategoryStore>(
    State(categories): State<Arc<CategoryService<C>>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<NameQuery>,
) -> Result<Json<Vec<CategorySummary>>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(categories.search(&ctx, &query.name).await?))
}

/// GET /categories/{id}
pub async fn get<C: CategoryStore>(
    State(categories): State<Arc<CategoryService<C>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<Category>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(categories.get(&ctx, CategoryId::new(id)).await?))
}

/// PUT /categories/{id}
pub async fn update<C: CategoryStore>(
    State(categories): State<Arc<CategoryService<C>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(req): Json<CategoryRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = Context::new(identity);
    categories
        .update(
            &ctx,
            CategoryId::new(id),
            UpdateCategory {
                name: req.name,
                description: req.description,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /categories/{id} — blocked while any book references it.
pub async fn delete<C: CategoryStore>(
    State(categories): State<Arc<CategoryService<C>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let ctx = Context::new(identity);
    categories.delete(&ctx, CategoryId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
