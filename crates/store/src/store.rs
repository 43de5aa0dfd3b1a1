//! Store traits, one per domain.
//!
//! Absence is data here: lookups return `Option`/`false`, and conditional
//! writes report whether a row matched. Errors are reserved for transport
//! and transaction failures. All implementations must be `Send + Sync`.

use async_trait::async_trait;
use chrono::NaiveDate;

use common::{AuthorId, BookId, BorrowingId, CategoryId, UserId};

use crate::Result;
use crate::model::{
    Author, AuthorSummary, AuthorUpdate, Book, BookSummary, BookUpdate, BorrowSelector,
    BorrowUpdate, Borrowing, BorrowingSummary, Category, CategorySummary, CategoryUpdate,
    NewAuthor, NewBook, NewBorrow, NewCategory, NewUser, User,
};

/// Store owned by the user domain.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> Result<UserId>;

    async fn fetch(&self, id: UserId) -> Result<Option<User>>;

    /// True if any user already carries this username.
    async fn username_taken(&self, username: &str) -> Result<bool>;

    async fn exists(&self, id: UserId) -> Result<bool>;

    /// Deletes the row; false if it was not there.
    async fn delete(&self, id: UserId) -> Result<bool>;
}

/// Store owned by the author domain.
#[async_trait]
pub trait AuthorStore: Send + Sync {
    async fn insert(&self, author: NewAuthor) -> Result<AuthorId>;

    async fn fetch(&self, id: AuthorId) -> Result<Option<Author>>;

    /// Authors with ids within `[min, max]`.
    async fn list_range(&self, min: i64, max: i64) -> Result<Vec<AuthorSummary>>;

    /// Case-insensitive substring search on the name.
    async fn search_name(&self, fragment: &str) -> Result<Vec<AuthorSummary>>;

    async fn name_taken(&self, name: &str) -> Result<bool>;

    async fn exists(&self, id: AuthorId) -> Result<bool>;

    /// Overwrites the row; false if the id was not there.
    async fn update(&self, id: AuthorId, update: AuthorUpdate) -> Result<bool>;

    async fn delete(&self, id: AuthorId) -> Result<bool>;
}

/// Store owned by the category domain.
#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn insert(&self, category: NewCategory) -> Result<CategoryId>;

    async fn fetch(&self, id: CategoryId) -> Result<Option<Category>>;

    async fn list_range(&self, min: i64, max: i64) -> Result<Vec<CategorySummary>>;

    async fn search_name(&self, fragment: &str) -> Result<Vec<CategorySummary>>;

    async fn name_taken(&self, name: &str) -> Result<bool>;

    async fn exists(&self, id: CategoryId) -> Result<bool>;

    async fn update(&self, id: CategoryId, update: CategoryUpdate) -> Result<bool>;

    async fn delete(&self, id: CategoryId) -> Result<bool>;
}

/// Store owned by the library domain: books plus the borrowing ledger.
///
/// The stock-sensitive operations (`insert_borrow`, `delete_borrow`) must
/// adjust `available_stock` and the borrowing row in one transaction; the
/// decrement must re-check availability inside that transaction so two
/// concurrent borrows of the last copy cannot both succeed.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    // Books

    async fn insert_book(&self, book: NewBook) -> Result<BookId>;

    async fn fetch_book(&self, id: BookId) -> Result<Option<Book>>;

    async fn list_books_range(&self, min: i64, max: i64) -> Result<Vec<BookSummary>>;

    async fn list_books_published_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BookSummary>>;

    async fn search_title(&self, fragment: &str) -> Result<Vec<BookSummary>>;

    /// Up to `limit` books in the category, in no promised order.
    async fn pick_in_category(&self, category: CategoryId, limit: i64) -> Result<Vec<BookSummary>>;

    async fn update_book(&self, id: BookId, update: BookUpdate) -> Result<bool>;

    async fn delete_book(&self, id: BookId) -> Result<bool>;

    async fn book_exists(&self, id: BookId) -> Result<bool>;

    // Usage facts served to peer domains

    async fn any_book_with_author(&self, id: AuthorId) -> Result<bool>;

    async fn any_book_with_category(&self, id: CategoryId) -> Result<bool>;

    /// True if the user holds at least one active borrowing. Returned
    /// loans never count.
    async fn any_active_borrow_for_user(&self, id: UserId) -> Result<bool>;

    // Borrowings

    /// Decrements the book's `available_stock` and inserts the active
    /// borrowing row in one transaction. Returns `None` without writing
    /// anything when the book is missing or out of stock.
    async fn insert_borrow(&self, borrow: NewBorrow) -> Result<Option<BorrowingId>>;

    async fn fetch_borrow(&self, id: BorrowingId) -> Result<Option<Borrowing>>;

    /// Transitions an active borrowing to returned, stamping `on`. False
    /// when no active row has this id. Stock is not touched.
    async fn mark_returned(&self, id: BorrowingId, on: NaiveDate) -> Result<bool>;

    /// Deletes the borrowing and restocks the referenced book by one, in
    /// one transaction, whatever the returned flag says.
    async fn delete_borrow(&self, id: BorrowingId) -> Result<bool>;

    async fn update_borrow(&self, id: BorrowingId, update: BorrowUpdate) -> Result<bool>;

    async fn list_borrows(
        &self,
        returned: bool,
        selector: BorrowSelector,
    ) -> Result<Vec<BorrowingSummary>>;

    /// Active borrowings whose due date precedes their borrowed date.
    async fn list_overdue(&self) -> Result<Vec<BorrowingSummary>>;
}
