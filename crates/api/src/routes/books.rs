//! Book endpoints.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use auth::Identity;
use common::{AuthorId, BookId, CategoryId};
use domain::{Context, CreateBook, LibraryService, UpdateBook};
use store::{Book, BookSummary, LibraryStore};

use crate::error::ApiError;
use crate::routes::authors::RangeQuery;

#[derive(Deserialize)]
pub struct BookRequest {
    pub title: String,
    pub author_id: i64,
    pub category_id: i64,
    pub published_date: Option<String>,
    pub isbn: Option<String>,
    pub total_stock: i32,
    pub available_stock: i32,
}

#[derive(Deserialize)]
pub struct TitleQuery {
    pub title: String,
}

#[derive(Deserialize)]
pub struct DateWindowQuery {
    pub start: String,
    pub end: String,
}

#[derive(Deserialize)]
pub struct RecommendQuery {
    pub category_id: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    5
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub book_id: BookId,
}

/// POST /books — peer-checks category and author before the insert.
pub async fn create<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<BookRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let ctx = Context::new(identity);
    let book_id = library
        .create_book(
            &ctx,
            CreateBook {
                title: req.title,
                author_id: AuthorId::new(req.author_id),
                category_id: CategoryId::new(req.category_id),
                published_date: req.published_date,
                isbn: req.isbn,
                total_stock: req.total_stock,
                available_stock: req.available_stock,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { book_id })))
}

/// GET /books?min=&max=
pub async fn list<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Query(range): Query<RangeQuery>,
) -> Result<Json<Vec<BookSummary>>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(library.list_books(&ctx, range.min, range.max).await?))
}

/// GET /books/search?title=
pub async fn search<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<TitleQuery>,
) -> Result<Json<Vec<BookSummary>>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(library.search_books(&ctx, &query.title).await?))
}

/// GET /books/by-date?start=&end= — published-date window.
pub async fn by_date<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Query(window): Query<DateWindowQuery>,
) -> Result<Json<Vec<BookSummary>>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(
        library
            .books_by_published_date(&ctx, &window.start, &window.end)
            .await?,
    ))
}

/// GET /books/recommendations?category_id=&limit=
pub async fn recommend<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<RecommendQuery>,
) -> Result<Json<Vec<BookSummary>>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(
        library
            .recommend(&ctx, CategoryId::new(query.category_id), query.limit)
            .await?,
    ))
}

/// GET /books/{id}
pub async fn get<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<Book>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(library.get_book(&ctx, BookId::new(id)).await?))
}

/// PUT /books/{id} — re-checks both foreign references.
pub async fn update<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(req): Json<BookRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = Context::new(identity);
    library
        .update_book(
            &ctx,
            BookId::new(id),
            UpdateBook {
                title: req.title,
                author_id: AuthorId::new(req.author_id),
                category_id: CategoryId::new(req.category_id),
                published_date: req.published_date,
                isbn: req.isbn,
                total_stock: req.total_stock,
                available_stock: req.available_stock,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /books/{id}
pub async fn delete<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let ctx = Context::new(identity);
    library.delete_book(&ctx, BookId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
