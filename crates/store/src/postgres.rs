//! PostgreSQL-backed store handles, one pool per domain.
//!
//! The four stores live in four independent databases; the structs here
//! never join across them.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Row, postgres::PgRow};

use common::{AuthorId, BookId, BorrowingId, CategoryId, UserId};

use crate::error::Result;
use crate::model::{
    Author, AuthorSummary, AuthorUpdate, Book, BookSummary, BookUpdate, BorrowSelector,
    BorrowUpdate, Borrowing, BorrowingSummary, Category, CategorySummary, CategoryUpdate,
    NewAuthor, NewBook, NewBorrow, NewCategory, NewUser, User,
};
use crate::store::{AuthorStore, CategoryStore, LibraryStore, UserStore};

// -- User domain --

/// Store handle for the user domain database.
#[derive(Clone)]
pub struct PostgresUserStore {
    pool: PgPool,
}

impl PostgresUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("migrations/user").run(&self.pool).await
    }
}

fn row_to_user(row: PgRow) -> std::result::Result<User, sqlx::Error> {
    Ok(User {
        id: UserId::new(row.try_get("user_id")?),
        username: row.try_get("username")?,
        credential_hash: row.try_get("credential_hash")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        role: row.try_get("role")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl UserStore for PostgresUserStore {
    async fn insert(&self, user: NewUser) -> Result<UserId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO users (username, credential_hash, first_name, last_name, email, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, now(), now())
            RETURNING user_id
            "#,
        )
        .bind(&user.username)
        .bind(&user.credential_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.role)
        .fetch_one(&self.pool)
        .await?;

        Ok(UserId::new(id))
    }

    async fn fetch(&self, id: UserId) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT user_id, username, credential_hash, first_name, last_name, email, role, created_at, updated_at \
             FROM users WHERE user_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_user).transpose().map_err(Into::into)
    }

    async fn username_taken(&self, username: &str) -> Result<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    async fn exists(&self, id: UserId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE user_id = $1)")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn delete(&self, id: UserId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE user_id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// -- Author domain --

/// Store handle for the author domain database.
#[derive(Clone)]
pub struct PostgresAuthorStore {
    pool: PgPool,
}

impl PostgresAuthorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("migrations/author").run(&self.pool).await
    }
}

fn row_to_author(row: PgRow) -> std::result::Result<Author, sqlx::Error> {
    Ok(Author {
        id: AuthorId::new(row.try_get("author_id")?),
        name: row.try_get("name")?,
        birthdate: row.try_get("birthdate")?,
        nationality: row.try_get("nationality")?,
        biography: row.try_get("biography")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_author_summary(row: PgRow) -> std::result::Result<AuthorSummary, sqlx::Error> {
    Ok(AuthorSummary {
        id: AuthorId::new(row.try_get("author_id")?),
        name: row.try_get("name")?,
    })
}

#[async_trait]
impl AuthorStore for PostgresAuthorStore {
    async fn insert(&self, author: NewAuthor) -> Result<AuthorId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO authors (name, birthdate, nationality, biography, created_at, updated_at)
            VALUES ($1, $2, $3, $4, now(), now())
            RETURNING author_id
            "#,
        )
        .bind(&author.name)
        .bind(author.birthdate)
        .bind(&author.nationality)
        .bind(&author.biography)
        .fetch_one(&self.pool)
        .await?;

        Ok(AuthorId::new(id))
    }

    async fn fetch(&self, id: AuthorId) -> Result<Option<Author>> {
        let row = sqlx::query(
            "SELECT author_id, name, birthdate, nationality, biography, created_at, updated_at \
             FROM authors WHERE author_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_author).transpose().map_err(Into::into)
    }

    async fn list_range(&self, min: i64, max: i64) -> Result<Vec<AuthorSummary>> {
        let rows = sqlx::query(
            "SELECT author_id, name FROM authors WHERE author_id BETWEEN $1 AND $2 ORDER BY author_id",
        )
        .bind(min)
        .bind(max)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(row_to_author_summary)
            .collect::<std::result::Result<_, _>>()
            .map_err(Into::into)
    }

    async fn search_name(&self, fragment: &str) -> Result<Vec<AuthorSummary>> {
        let rows = sqlx::query(
            "SELECT author_id, name FROM authors WHERE name ILIKE $1 ORDER BY author_id",
        )
        .bind(format!("%{fragment}%"))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(row_to_author_summary)
            .collect::<std::result::Result<_, _>>()
            .map_err(Into::into)
    }

    async fn name_taken(&self, name: &str) -> Result<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM authors WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    async fn exists(&self, id: AuthorId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM authors WHERE author_id = $1)")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn update(&self, id: AuthorId, update: AuthorUpdate) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE authors SET name = $1, birthdate = $2, nationality = $3, biography = $4, updated_at = now() \
             WHERE author_id = $5",
        )
        .bind(&update.name)
        .bind(update.birthdate)
        .bind(&update.nationality)
        .bind(&update.biography)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: AuthorId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM authors WHERE author_id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// -- Category domain --

/// Store handle for the category domain database.
#[derive(Clone)]
pub struct PostgresCategoryStore {
    pool: PgPool,
}

impl PostgresCategoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("migrations/category").run(&self.pool).await
    }
}

fn row_to_category(row: PgRow) -> std::result::Result<Category, sqlx::Error> {
    Ok(Category {
        id: CategoryId::new(row.try_get("category_id")?),
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_category_summary(row: PgRow) -> std::result::Result<CategorySummary, sqlx::Error> {
    Ok(CategorySummary {
        id: CategoryId::new(row.try_get("category_id")?),
        name: row.try_get("name")?,
    })
}

#[async_trait]
impl CategoryStore for PostgresCategoryStore {
    async fn insert(&self, category: NewCategory) -> Result<CategoryId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO categories (name, description, created_at, updated_at)
            VALUES ($1, $2, now(), now())
            RETURNING category_id
            "#,
        )
        .bind(&category.name)
        .bind(&category.description)
        .fetch_one(&self.pool)
        .await?;

        Ok(CategoryId::new(id))
    }

    async fn fetch(&self, id: CategoryId) -> Result<Option<Category>> {
        let row = sqlx::query(
            "SELECT category_id, name, description, created_at, updated_at \
             FROM categories WHERE category_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_category).transpose().map_err(Into::into)
    }

    async fn list_range(&self, min: i64, max: i64) -> Result<Vec<CategorySummary>> {
        let rows = sqlx::query(
            "SELECT category_id, name FROM categories WHERE category_id BETWEEN $1 AND $2 ORDER BY category_id",
        )
        .bind(min)
        .bind(max)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(row_to_category_summary)
            .collect::<std::result::Result<_, _>>()
            .map_err(Into::into)
    }

    async fn search_name(&self, fragment: &str) -> Result<Vec<CategorySummary>> {
        let rows = sqlx::query(
            "SELECT category_id, name FROM categories WHERE name ILIKE $1 ORDER BY category_id",
        )
        .bind(format!("%{fragment}%"))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(row_to_category_summary)
            .collect::<std::result::Result<_, _>>()
            .map_err(Into::into)
    }

    async fn name_taken(&self, name: &str) -> Result<bool> {
        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE name = $1)")
                .bind(name)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    async fn exists(&self, id: CategoryId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM categories WHERE category_id = $1)")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn update(&self, id: CategoryId, update: CategoryUpdate) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE categories SET name = $1, description = $2, updated_at = now() WHERE category_id = $3",
        )
        .bind(&update.name)
        .bind(&update.description)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: CategoryId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE category_id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// -- Library domain --

/// Store handle for the library domain database (books + borrowings).
#[derive(Clone)]
pub struct PostgresLibraryStore {
    pool: PgPool,
}

impl PostgresLibraryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> std::result::Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("migrations/library").run(&self.pool).await
    }
}

fn row_to_book(row: PgRow) -> std::result::Result<Book, sqlx::Error> {
    Ok(Book {
        id: BookId::new(row.try_get("book_id")?),
        title: row.try_get("title")?,
        author_id: AuthorId::new(row.try_get("author_id")?),
        category_id: CategoryId::new(row.try_get("category_id")?),
        published_date: row.try_get("published_date")?,
        isbn: row.try_get("isbn")?,
        total_stock: row.try_get("total_stock")?,
        available_stock: row.try_get("available_stock")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn row_to_book_summary(row: PgRow) -> std::result::Result<BookSummary, sqlx::Error> {
    Ok(BookSummary {
        id: BookId::new(row.try_get("book_id")?),
        title: row.try_get("title")?,
        author_id: AuthorId::new(row.try_get("author_id")?),
        category_id: CategoryId::new(row.try_get("category_id")?),
        published_date: row.try_get("published_date")?,
        available_stock: row.try_get("available_stock")?,
    })
}

fn row_to_borrowing(row: PgRow) -> std::result::Result<Borrowing, sqlx::Error> {
    Ok(Borrowing {
        id: BorrowingId::new(row.try_get("borrowing_id")?),
        book_id: BookId::new(row.try_get("book_id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        borrowed_date: row.try_get("borrowed_date")?,
        due_date: row.try_get("due_date")?,
        returned_date: row.try_get("returned_date")?,
        returned: row.try_get("returned")?,
    })
}

fn row_to_borrowing_summary(row: PgRow) -> std::result::Result<BorrowingSummary, sqlx::Error> {
    Ok(BorrowingSummary {
        id: BorrowingId::new(row.try_get("borrowing_id")?),
        book_id: BookId::new(row.try_get("book_id")?),
        user_id: UserId::new(row.try_get("user_id")?),
        borrowed_date: row.try_get("borrowed_date")?,
    })
}

const BOOK_SUMMARY_COLUMNS: &str =
    "book_id, title, author_id, category_id, published_date, available_stock";

const BORROWING_SUMMARY_COLUMNS: &str = "borrowing_id, book_id, user_id, borrowed_date";

#[async_trait]
impl LibraryStore for PostgresLibraryStore {
    async fn insert_book(&self, book: NewBook) -> Result<BookId> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO books (title, author_id, category_id, published_date, isbn, total_stock, available_stock, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, now(), now())
            RETURNING book_id
            "#,
        )
        .bind(&book.title)
        .bind(book.author_id.as_i64())
        .bind(book.category_id.as_i64())
        .bind(book.published_date)
        .bind(&book.isbn)
        .bind(book.total_stock)
        .bind(book.available_stock)
        .fetch_one(&self.pool)
        .await?;

        Ok(BookId::new(id))
    }

    async fn fetch_book(&self, id: BookId) -> Result<Option<Book>> {
        let row = sqlx::query(
            "SELECT book_id, title, author_id, category_id, published_date, isbn, total_stock, available_stock, created_at, updated_at \
             FROM books WHERE book_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_book).transpose().map_err(Into::into)
    }

    async fn list_books_range(&self, min: i64, max: i64) -> Result<Vec<BookSummary>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_SUMMARY_COLUMNS} FROM books WHERE book_id BETWEEN $1 AND $2 ORDER BY book_id",
        ))
        .bind(min)
        .bind(max)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(row_to_book_summary)
            .collect::<std::result::Result<_, _>>()
            .map_err(Into::into)
    }

    async fn list_books_published_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<BookSummary>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_SUMMARY_COLUMNS} FROM books WHERE published_date BETWEEN $1 AND $2 ORDER BY book_id",
        ))
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(row_to_book_summary)
            .collect::<std::result::Result<_, _>>()
            .map_err(Into::into)
    }

    async fn search_title(&self, fragment: &str) -> Result<Vec<BookSummary>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_SUMMARY_COLUMNS} FROM books WHERE title ILIKE $1 ORDER BY book_id",
        ))
        .bind(format!("%{fragment}%"))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(row_to_book_summary)
            .collect::<std::result::Result<_, _>>()
            .map_err(Into::into)
    }

    async fn pick_in_category(&self, category: CategoryId, limit: i64) -> Result<Vec<BookSummary>> {
        let rows = sqlx::query(&format!(
            "SELECT {BOOK_SUMMARY_COLUMNS} FROM books WHERE category_id = $1 ORDER BY RANDOM() LIMIT $2",
        ))
        .bind(category.as_i64())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(row_to_book_summary)
            .collect::<std::result::Result<_, _>>()
            .map_err(Into::into)
    }

    async fn update_book(&self, id: BookId, update: BookUpdate) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE books SET title = $1, author_id = $2, category_id = $3, published_date = $4, \
             isbn = $5, total_stock = $6, available_stock = $7, updated_at = now() WHERE book_id = $8",
        )
        .bind(&update.title)
        .bind(update.author_id.as_i64())
        .bind(update.category_id.as_i64())
        .bind(update.published_date)
        .bind(&update.isbn)
        .bind(update.total_stock)
        .bind(update.available_stock)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_book(&self, id: BookId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM books WHERE book_id = $1")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn book_exists(&self, id: BookId) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE book_id = $1)")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn any_book_with_author(&self, id: AuthorId) -> Result<bool> {
        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE author_id = $1)")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await?;
        Ok(referenced)
    }

    async fn any_book_with_category(&self, id: CategoryId) -> Result<bool> {
        let referenced: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM books WHERE category_id = $1)")
                .bind(id.as_i64())
                .fetch_one(&self.pool)
                .await?;
        Ok(referenced)
    }

    async fn any_active_borrow_for_user(&self, id: UserId) -> Result<bool> {
        let borrowing: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM borrowings WHERE user_id = $1 AND returned = FALSE)",
        )
        .bind(id.as_i64())
        .fetch_one(&self.pool)
        .await?;
        Ok(borrowing)
    }

    async fn insert_borrow(&self, borrow: NewBorrow) -> Result<Option<BorrowingId>> {
        let mut tx = self.pool.begin().await?;

        // The decrement is the availability check: the row lock taken here
        // serializes concurrent borrows of the same book, so the pre-check
        // done by the orchestrator is advisory only.
        let decremented = sqlx::query(
            "UPDATE books SET available_stock = available_stock - 1, updated_at = now() \
             WHERE book_id = $1 AND available_stock > 0",
        )
        .bind(borrow.book_id.as_i64())
        .execute(&mut *tx)
        .await?;

        if decremented.rows_affected() == 0 {
            // Missing book or no stock; the open transaction rolls back on drop.
            return Ok(None);
        }

        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO borrowings (book_id, user_id, borrowed_date, due_date, returned_date, returned)
            VALUES ($1, $2, $3, $4, NULL, FALSE)
            RETURNING borrowing_id
            "#,
        )
        .bind(borrow.book_id.as_i64())
        .bind(borrow.user_id.as_i64())
        .bind(borrow.borrowed_date)
        .bind(borrow.due_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(BorrowingId::new(id)))
    }

    async fn fetch_borrow(&self, id: BorrowingId) -> Result<Option<Borrowing>> {
        let row = sqlx::query(
            "SELECT borrowing_id, book_id, user_id, borrowed_date, due_date, returned_date, returned \
             FROM borrowings WHERE borrowing_id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        row.map(row_to_borrowing).transpose().map_err(Into::into)
    }

    async fn mark_returned(&self, id: BorrowingId, on: NaiveDate) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE borrowings SET returned = TRUE, returned_date = $1 \
             WHERE borrowing_id = $2 AND returned = FALSE",
        )
        .bind(on)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_borrow(&self, id: BorrowingId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let book_id: Option<i64> = sqlx::query_scalar(
            "DELETE FROM borrowings WHERE borrowing_id = $1 RETURNING book_id",
        )
        .bind(id.as_i64())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(book_id) = book_id else {
            return Ok(false);
        };

        // Voiding the loan puts the copy back on the shelf.
        sqlx::query(
            "UPDATE books SET available_stock = available_stock + 1, updated_at = now() \
             WHERE book_id = $1",
        )
        .bind(book_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn update_borrow(&self, id: BorrowingId, update: BorrowUpdate) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE borrowings SET book_id = $1, user_id = $2, borrowed_date = $3, due_date = $4, \
             returned_date = $5, returned = $6 WHERE borrowing_id = $7",
        )
        .bind(update.book_id.as_i64())
        .bind(update.user_id.as_i64())
        .bind(update.borrowed_date)
        .bind(update.due_date)
        .bind(update.returned_date)
        .bind(update.returned)
        .bind(id.as_i64())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_borrows(
        &self,
        returned: bool,
        selector: BorrowSelector,
    ) -> Result<Vec<BorrowingSummary>> {
        let rows = match selector {
            BorrowSelector::IdRange { min, max } => {
                sqlx::query(&format!(
                    "SELECT {BORROWING_SUMMARY_COLUMNS} FROM borrowings \
                     WHERE returned = $1 AND borrowing_id BETWEEN $2 AND $3 ORDER BY borrowing_id",
                ))
                .bind(returned)
                .bind(min)
                .bind(max)
                .fetch_all(&self.pool)
                .await?
            }
            BorrowSelector::BorrowedBetween { start, end } => {
                sqlx::query(&format!(
                    "SELECT {BORROWING_SUMMARY_COLUMNS} FROM borrowings \
                     WHERE returned = $1 AND borrowed_date BETWEEN $2 AND $3 ORDER BY borrowing_id",
                ))
                .bind(returned)
                .bind(start)
                .bind(end)
                .fetch_all(&self.pool)
                .await?
            }
            BorrowSelector::User(user_id) => {
                sqlx::query(&format!(
                    "SELECT {BORROWING_SUMMARY_COLUMNS} FROM borrowings \
                     WHERE returned = $1 AND user_id = $2 ORDER BY borrowing_id",
                ))
                .bind(returned)
                .bind(user_id.as_i64())
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter()
            .map(row_to_borrowing_summary)
            .collect::<std::result::Result<_, _>>()
            .map_err(Into::into)
    }

    async fn list_overdue(&self) -> Result<Vec<BorrowingSummary>> {
        let rows = sqlx::query(&format!(
            "SELECT {BORROWING_SUMMARY_COLUMNS} FROM borrowings \
             WHERE returned = FALSE AND due_date < borrowed_date ORDER BY borrowing_id",
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(row_to_borrowing_summary)
            .collect::<std::result::Result<_, _>>()
            .map_err(Into::into)
    }
}
