//! Borrowing endpoints: the lending lifecycle.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use auth::Identity;
use common::{BookId, BorrowingId, UserId};
use domain::{Context, CreateBorrow, LibraryService, UpdateBorrow};
use store::{Borrowing, BorrowingSummary, LibraryStore};

use crate::error::ApiError;

#[derive(Deserialize)]
pub struct BorrowRequest {
    pub book_id: i64,
    pub user_id: i64,
    pub due_date: String,
}

#[derive(Deserialize)]
pub struct BorrowUpdateRequest {
    pub book_id: i64,
    pub user_id: i64,
    pub borrowed_date: String,
    pub due_date: String,
    pub returned_date: Option<String>,
    pub returned: bool,
}

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub returned: bool,
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
pub struct DateWindowQuery {
    #[serde(default)]
    pub returned: bool,
    pub start: String,
    pub end: String,
}

#[derive(Deserialize)]
pub struct ReturnedFlagQuery {
    #[serde(default)]
    pub returned: bool,
}

#[derive(Serialize)]
pub struct CreatedResponse {
    pub borrowing_id: BorrowingId,
}

/// POST /borrowings — takes one copy off the shelf.
pub async fn create<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<BorrowRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let ctx = Context::new(identity);
    let borrowing_id = library
        .create_borrow(
            &ctx,
            CreateBorrow {
                book_id: BookId::new(req.book_id),
                user_id: UserId::new(req.user_id),
                due_date: req.due_date,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedResponse { borrowing_id })))
}

/// POST /borrowings/{id}/return — closes the loan; stock is untouched.
pub async fn record_return<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let ctx = Context::new(identity);
    library.create_return(&ctx, BorrowingId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /borrowings/{id} — voids the loan and restocks the book.
pub async fn delete<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let ctx = Context::new(identity);
    library.delete_borrow(&ctx, BorrowingId::new(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /borrowings/{id}
pub async fn update<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(req): Json<BorrowUpdateRequest>,
) -> Result<StatusCode, ApiError> {
    let ctx = Context::new(identity);
    library
        .update_borrow(
            &ctx,
            BorrowingId::new(id),
            UpdateBorrow {
                book_id: BookId::new(req.book_id),
                user_id: UserId::new(req.user_id),
                borrowed_date: req.borrowed_date,
                due_date: req.due_date,
                returned_date: req.returned_date,
                returned: req.returned,
            },
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /borrowings/{id}
pub async fn get<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> Result<Json<Borrowing>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(library.get_borrow(&ctx, BorrowingId::new(id)).await?))
}

/// GET /borrowings?returned=&min=&max=
pub async fn list<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<BorrowingSummary>>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(
        library
            .list_borrows(&ctx, query.returned, query.min, query.max)
            .await?,
    ))
}

/// GET /borrowings/by-date?returned=&start=&end=
pub async fn by_date<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Query(query): Query<DateWindowQuery>,
) -> Result<Json<Vec<BorrowingSummary>>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(
        library
            .borrows_by_date(&ctx, query.returned, &query.start, &query.end)
            .await?,
    ))
}

/// GET /borrowings/by-user/{id}?returned=
pub async fn by_user<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Query(query): Query<ReturnedFlagQuery>,
) -> Result<Json<Vec<BorrowingSummary>>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(
        library
            .borrows_for_user(&ctx, query.returned, UserId::new(id))
            .await?,
    ))
}

/// GET /borrowings/overdue — active loans due before they were borrowed.
pub async fn overdue<L: LibraryStore>(
    State(library): State<Arc<LibraryService<L>>>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<Vec<BorrowingSummary>>, ApiError> {
    let ctx = Context::new(identity);
    Ok(Json(library.overdue(&ctx).await?))
}
