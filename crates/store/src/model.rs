//! Entity records and write payloads, one group per owning domain.
//!
//! `author_id`/`category_id` on [`Book`] and `user_id` on [`Borrowing`] are
//! logical references into other domains' stores; nothing at this layer
//! enforces them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use common::{AuthorId, BookId, BorrowingId, CategoryId, UserId};

// -- User domain --

/// A registered user. `credential_hash` is opaque to this system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub credential_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to register a user; timestamps are set by the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub credential_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: String,
    pub role: String,
}

// -- Author domain --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: AuthorId,
    pub name: String,
    pub birthdate: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAuthor {
    pub name: String,
    pub birthdate: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
}

/// Full-overwrite update applied to an existing author.
#[derive(Debug, Clone)]
pub struct AuthorUpdate {
    pub name: String,
    pub birthdate: Option<NaiveDate>,
    pub nationality: Option<String>,
    pub biography: Option<String>,
}

/// Listing row: id and name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorSummary {
    pub id: AuthorId,
    pub name: String,
}

// -- Category domain --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryUpdate {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub id: CategoryId,
    pub name: String,
}

// -- Library domain (books and borrowings) --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author_id: AuthorId,
    pub category_id: CategoryId,
    pub published_date: Option<NaiveDate>,
    pub isbn: Option<String>,
    pub total_stock: i32,
    pub available_stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewBook {
    pub title: String,
    pub author_id: AuthorId,
    pub category_id: CategoryId,
    pub published_date: Option<NaiveDate>,
    pub isbn: Option<String>,
    pub total_stock: i32,
    pub available_stock: i32,
}

#[derive(Debug, Clone)]
pub struct BookUpdate {
    pub title: String,
    pub author_id: AuthorId,
    pub category_id: CategoryId,
    pub published_date: Option<NaiveDate>,
    pub isbn: Option<String>,
    pub total_stock: i32,
    pub available_stock: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookSummary {
    pub id: BookId,
    pub title: String,
    pub author_id: AuthorId,
    pub category_id: CategoryId,
    pub published_date: Option<NaiveDate>,
    pub available_stock: i32,
}

/// One loan of one copy. Active while `returned` is false.
///
/// Invariant: `returned` is true exactly when `returned_date` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Borrowing {
    pub id: BorrowingId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub borrowed_date: NaiveDate,
    pub due_date: NaiveDate,
    pub returned_date: Option<NaiveDate>,
    pub returned: bool,
}

/// A new loan; inserted in the active state.
#[derive(Debug, Clone)]
pub struct NewBorrow {
    pub book_id: BookId,
    pub user_id: UserId,
    pub borrowed_date: NaiveDate,
    pub due_date: NaiveDate,
}

/// Full-overwrite update of a borrowing; never touches stock counters.
#[derive(Debug, Clone)]
pub struct BorrowUpdate {
    pub book_id: BookId,
    pub user_id: UserId,
    pub borrowed_date: NaiveDate,
    pub due_date: NaiveDate,
    pub returned_date: Option<NaiveDate>,
    pub returned: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorrowingSummary {
    pub id: BorrowingId,
    pub book_id: BookId,
    pub user_id: UserId,
    pub borrowed_date: NaiveDate,
}

/// Which borrowing rows a listing targets, combined with a returned flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowSelector {
    /// Borrowing ids within `[min, max]`.
    IdRange { min: i64, max: i64 },
    /// Borrowed date within `[start, end]`.
    BorrowedBetween { start: NaiveDate, end: NaiveDate },
    /// All rows for one user.
    User(UserId),
}
