//! In-memory store implementations for testing.
//!
//! Each store keeps its rows in a `BTreeMap` guarded by one async lock, so
//! every mutation is as atomic as the Postgres transaction it stands in
//! for: preconditions are evaluated and the write applied under a single
//! write lock. `set_fail_writes` makes the next mutations fail, for
//! exercising `WriteFailed` paths.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use common::{AuthorId, BookId, BorrowingId, CategoryId, UserId};

use crate::error::{Result, StoreError};
use crate::model::{
    Author, AuthorSummary, AuthorUpdate, Book, BookSummary, BookUpdate, BorrowSelector,
    BorrowUpdate, Borrowing, BorrowingSummary, Category, CategorySummary, CategoryUpdate,
    NewAuthor, NewBook, NewBorrow, NewCategory, NewUser, User,
};
use crate::store::{AuthorStore, CategoryStore, LibraryStore, UserStore};

fn injected_failure() -> StoreError {
    StoreError::Failed("injected write failure".to_string())
}

// -- User domain --

#[derive(Debug, Default)]
struct UserState {
    rows: BTreeMap<i64, User>,
    next_id: i64,
    fail_writes: bool,
}

/// In-memory user store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserStore {
    state: Arc<RwLock<UserState>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent mutations fail until cleared.
    pub async fn set_fail_writes(&self, fail: bool) {
        self.state.write().await.fail_writes = fail;
    }

    pub async fn user_count(&self) -> usize {
        self.state.read().await.rows.len()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: NewUser) -> Result<UserId> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }

        state.next_id += 1;
        let id = state.next_id;
        let now = Utc::now();
        state.rows.insert(
            id,
            User {
                id: UserId::new(id),
                username: user.username,
                credential_hash: user.credential_hash,
                first_name: user.first_name,
                last_name: user.last_name,
                email: user.email,
                role: user.role,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(UserId::new(id))
    }

    async fn fetch(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.rows.get(&id.as_i64()).cloned())
    }

    async fn username_taken(&self, username: &str) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .rows
            .values()
            .any(|u| u.username == username))
    }

    async fn exists(&self, id: UserId) -> Result<bool> {
        Ok(self.state.read().await.rows.contains_key(&id.as_i64()))
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }
        Ok(state.rows.remove(&id.as_i64()).is_some())
    }
}

// -- Author domain --

#[derive(Debug, Default)]
struct AuthorState {
    rows: BTreeMap<i64, Author>,
    next_id: i64,
    fail_writes: bool,
}

/// In-memory author store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthorStore {
    state: Arc<RwLock<AuthorState>>,
}

impl InMemoryAuthorStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_writes(&self, fail: bool) {
        self.state.write().await.fail_writes = fail;
    }

    pub async fn author_count(&self) -> usize {
        self.state.read().await.rows.len()
    }
}

#[async_trait]
impl AuthorStore for InMemoryAuthorStore {
    async fn insert(&self, author: NewAuthor) -> Result<AuthorId> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }

        state.next_id += 1;
        let id = state.next_id;
        let now = Utc::now();
        state.rows.insert(
            id,
            Author {
                id: AuthorId::new(id),
                name: author.name,
                birthdate: author.birthdate,
                nationality: author.nationality,
                biography: author.biography,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(AuthorId::new(id))
    }

    async fn fetch(&self, id: AuthorId) -> Result<Option<Author>> {
        Ok(self.state.read().await.rows.get(&id.as_i64()).cloned())
    }

    async fn list_range(&self, min: i64, max: i64) -> Result<Vec<AuthorSummary>> {
        if min > max {
            return Ok(Vec::new());
        }
        Ok(self
            .state
            .read()
            .await
            .rows
            .range(min..=max)
            .map(|(_, a)| AuthorSummary {
                id: a.id,
                name: a.name.clone(),
            })
            .collect())
    }

    async fn search_name(&self, fragment: &str) -> Result<Vec<AuthorSummary>> {
        let needle = fragment.to_lowercase();
        Ok(self
            .state
            .read()
            .await
            .rows
            .values()
            .filter(|a| a.name.to_lowercase().contains(&needle))
            .map(|a| AuthorSummary {
                id: a.id,
                name: a.name.clone(),
            })
            .collect())
    }

    async fn name_taken(&self, name: &str) -> Result<bool> {
        Ok(self.state.read().await.rows.values().any(|a| a.name == name))
    }

    async fn exists(&self, id: AuthorId) -> Result<bool> {
        Ok(self.state.read().await.rows.contains_key(&id.as_i64()))
    }

    async fn update(&self, id: AuthorId, update: AuthorUpdate) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }
        match state.rows.get_mut(&id.as_i64()) {
            Some(author) => {
                author.name = update.name;
                author.birthdate = update.birthdate;
                author.nationality = update.nationality;
                author.biography = update.biography;
                author.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: AuthorId) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }
        Ok(state.rows.remove(&id.as_i64()).is_some())
    }
}

// -- Category domain --

#[derive(Debug, Default)]
struct CategoryState {
    rows: BTreeMap<i64, Category>,
    next_id: i64,
    fail_writes: bool,
}

/// In-memory category store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCategoryStore {
    state: Arc<RwLock<CategoryState>>,
}

impl InMemoryCategoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_writes(&self, fail: bool) {
        self.state.write().await.fail_writes = fail;
    }

    pub async fn category_count(&self) -> usize {
        self.state.read().await.rows.len()
    }
}

#[async_trait]
impl CategoryStore for InMemoryCategoryStore {
    async fn insert(&self, category: NewCategory) -> Result<CategoryId> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }

        state.next_id += 1;
        let id = state.next_id;
        let now = Utc::now();
        state.rows.insert(
            id,
            Category {
                id: CategoryId::new(id),
                name: category.name,
                description: category.description,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(CategoryId::new(id))
    }

    async fn fetch(&self, id: CategoryId) -> Result<Option<Category>> {
        Ok(self.state.read().await.rows.get(&id.as_i64()).cloned())
    }

    async fn list_range(&self, min: i64, max: i64) -> Result<Vec<CategorySummary>> {
        if min > max {
            return Ok(Vec::new());
        }
        Ok(self
            .state
            .read()
            .await
            .rows
            .range(min..=max)
            .map(|(_, c)| CategorySummary {
                id: c.id,
                name: c.name.clone(),
            })
            .collect())
    }

    async fn search_name(&self, fragment: &str) -> Result<Vec<CategorySummary>> {
        let needle = fragment.to_lowercase();
        Ok(self
            .state
            .read()
            .await
            .rows
            .values()
            .filter(|c| c.name.to_lowercase().contains(&needle))
            .map(|c| CategorySummary {
                id: c.id,
                name: c.name.clone(),
            })
            .collect())
    }

    async fn name_taken(&self, name: &str) -> Result<bool> {
        Ok(self.state.read().await.rows.values().any(|c| c.name == name))
    }

    async fn exists(&self, id: CategoryId) -> Result<bool> {
        Ok(self.state.read().await.rows.contains_key(&id.as_i64()))
    }

    async fn update(&self, id: CategoryId, update: CategoryUpdate) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }
        match state.rows.get_mut(&id.as_i64()) {
            Some(category) => {
                category.name = update.name;
                category.description = update.description;
                category.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: CategoryId) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }
        Ok(state.rows.remove(&id.as_i64()).is_some())
    }
}

// -- Library domain --

#[derive(Debug, Default)]
struct LibraryState {
    books: BTreeMap<i64, Book>,
    borrows: BTreeMap<i64, Borrowing>,
    next_book_id: i64,
    next_borrow_id: i64,
    fail_writes: bool,
}

/// In-memory library store (books + borrowings).
///
/// Unlike the Postgres implementation, `pick_in_category` is deterministic
/// (ascending id order) so tests can assert on its output.
#[derive(Debug, Clone, Default)]
pub struct InMemoryLibraryStore {
    state: Arc<RwLock<LibraryState>>,
}

impl InMemoryLibraryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_writes(&self, fail: bool) {
        self.state.write().await.fail_writes = fail;
    }

    pub async fn book_count(&self) -> usize {
        self.state.read().await.books.len()
    }

    pub async fn borrow_count(&self) -> usize {
        self.state.read().await.borrows.len()
    }
}

fn summarize_book(book: &Book) -> BookSummary {
    BookSummary {
        id: book.id,
        title: book.title.clone(),
        author_id: book.author_id,
        category_id: book.category_id,
        published_date: book.published_date,
        available_stock: book.available_stock,
    }
}

fn summarize_borrow(borrow: &Borrowing) -> BorrowingSummary {
    BorrowingSummary {
        id: borrow.id,
        book_id: borrow.book_id,
        user_id: borrow.user_id,
        borrowed_date: borrow.borrowed_date,
    }
}

#[async_trait]
impl LibraryStore for InMemoryLibraryStore {
    async fn insert_book(&self, book: NewBook) -> Result<BookId> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }

        state.next_book_id += 1;
        let id = state.next_book_id;
        let now = Utc::now();
        state.books.insert(
            id,
            Book {
                id: BookId::new(id),
                title: book.title,
                author_id: book.author_id,
                category_id: book.category_id,
                published_date: book.published_date,
                isbn: book.isbn,
                total_stock: book.total_stock,
                available_stock: book.available_stock,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(BookId::new(id))
    }

    async fn fetch_book(&self, id: BookId) -> Result<Option<Book>> {
        Ok(self.state.read().await.books.get(&id.as_i64()).cloned())
    }

    async fn list_books_range(&self, min: i64, max: i64) -> Result<Vec<BookSummary>> {
        if min > max {
            return Ok(Vec::new());
        }
        Ok(self
            .state
            .read()
            .await
            .books
            .range(min..=max)
            .map(|(_, b)| summarize_book(b))
            .collect())
    }

    async fn list_books_published_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BookSummary>> {
        Ok(self
            .state
            .read()
            .await
            .books
            .values()
            .filter(|b| {
                b.published_date
                    .is_some_and(|d| d >= start && d <= end)
            })
            .map(summarize_book)
            .collect())
    }

    async fn search_title(&self, fragment: &str) -> Result<Vec<BookSummary>> {
        let needle = fragment.to_lowercase();
        Ok(self
            .state
            .read()
            .await
            .books
            .values()
            .filter(|b| b.title.to_lowercase().contains(&needle))
            .map(summarize_book)
            .collect())
    }

    async fn pick_in_category(&self, category: CategoryId, limit: i64) -> Result<Vec<BookSummary>> {
        Ok(self
            .state
            .read()
            .await
            .books
            .values()
            .filter(|b| b.category_id == category)
            .take(limit.max(0) as usize)
            .map(summarize_book)
            .collect())
    }

    async fn update_book(&self, id: BookId, update: BookUpdate) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }
        match state.books.get_mut(&id.as_i64()) {
            Some(book) => {
                book.title = update.title;
                book.author_id = update.author_id;
                book.category_id = update.category_id;
                book.published_date = update.published_date;
                book.isbn = update.isbn;
                book.total_stock = update.total_stock;
                book.available_stock = update.available_stock;
                book.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_book(&self, id: BookId) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }
        Ok(state.books.remove(&id.as_i64()).is_some())
    }

    async fn book_exists(&self, id: BookId) -> Result<bool> {
        Ok(self.state.read().await.books.contains_key(&id.as_i64()))
    }

    async fn any_book_with_author(&self, id: AuthorId) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .books
            .values()
            .any(|b| b.author_id == id))
    }

    async fn any_book_with_category(&self, id: CategoryId) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .books
            .values()
            .any(|b| b.category_id == id))
    }

    async fn any_active_borrow_for_user(&self, id: UserId) -> Result<bool> {
        Ok(self
            .state
            .read()
            .await
            .borrows
            .values()
            .any(|b| b.user_id == id && !b.returned))
    }

    async fn insert_borrow(&self, borrow: NewBorrow) -> Result<Option<BorrowingId>> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }

        // Availability is re-checked under the same write lock that applies
        // the decrement, mirroring the conditional UPDATE in Postgres.
        let Some(book) = state.books.get_mut(&borrow.book_id.as_i64()) else {
            return Ok(None);
        };
        if book.available_stock <= 0 {
            return Ok(None);
        }
        book.available_stock -= 1;
        book.updated_at = Utc::now();

        state.next_borrow_id += 1;
        let id = state.next_borrow_id;
        state.borrows.insert(
            id,
            Borrowing {
                id: BorrowingId::new(id),
                book_id: borrow.book_id,
                user_id: borrow.user_id,
                borrowed_date: borrow.borrowed_date,
                due_date: borrow.due_date,
                returned_date: None,
                returned: false,
            },
        );
        Ok(Some(BorrowingId::new(id)))
    }

    async fn fetch_borrow(&self, id: BorrowingId) -> Result<Option<Borrowing>> {
        Ok(self.state.read().await.borrows.get(&id.as_i64()).cloned())
    }

    async fn mark_returned(&self, id: BorrowingId, on: NaiveDate) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }
        match state.borrows.get_mut(&id.as_i64()) {
            Some(borrow) if !borrow.returned => {
                borrow.returned = true;
                borrow.returned_date = Some(on);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_borrow(&self, id: BorrowingId) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }
        let Some(borrow) = state.borrows.remove(&id.as_i64()) else {
            return Ok(false);
        };
        if let Some(book) = state.books.get_mut(&borrow.book_id.as_i64()) {
            book.available_stock += 1;
            book.updated_at = Utc::now();
        }
        Ok(true)
    }

    async fn update_borrow(&self, id: BorrowingId, update: BorrowUpdate) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.fail_writes {
            return Err(injected_failure());
        }
        match state.borrows.get_mut(&id.as_i64()) {
            Some(borrow) => {
                borrow.book_id = update.book_id;
                borrow.user_id = update.user_id;
                borrow.borrowed_date = update.borrowed_date;
                borrow.due_date = update.due_date;
                borrow.returned_date = update.returned_date;
                borrow.returned = update.returned;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn list_borrows(
        &self,
        returned: bool,
        selector: BorrowSelector,
    ) -> Result<Vec<BorrowingSummary>> {
        let state = self.state.read().await;
        let rows = state.borrows.values().filter(|b| b.returned == returned);

        Ok(match selector {
            BorrowSelector::IdRange { min, max } => rows
                .filter(|b| (min..=max).contains(&b.id.as_i64()))
                .map(summarize_borrow)
                .collect(),
            BorrowSelector::BorrowedBetween { start, end } => rows
                .filter(|b| b.borrowed_date >= start && b.borrowed_date <= end)
                .map(summarize_borrow)
                .collect(),
            BorrowSelector::User(user_id) => rows
                .filter(|b| b.user_id == user_id)
                .map(summarize_borrow)
                .collect(),
        })
    }

    async fn list_overdue(&self) -> Result<Vec<BorrowingSummary>> {
        Ok(self
            .state
            .read()
            .await
            .borrows
            .values()
            .filter(|b| !b.returned && b.due_date < b.borrowed_date)
            .map(summarize_borrow)
            .collect())
    }
}
