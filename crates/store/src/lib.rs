//! Store handles for the four domain databases.
//!
//! Each domain owns exactly one relational store and is the only writer of
//! its tables. The traits in [`store`] describe what each domain's
//! orchestrator needs from its own store; [`postgres`] implements them over
//! one `PgPool` per domain, [`memory`] provides equivalents for tests.
//! There are no cross-store constraints — referential integrity across
//! domains is the orchestrators' job.

pub mod connect;
pub mod error;
pub mod memory;
pub mod model;
pub mod postgres;
pub mod store;

pub use common::{AuthorId, BookId, BorrowingId, CategoryId, UserId};
pub use connect::connect_with_retry;
pub use error::{Result, StoreError};
pub use memory::{
    InMemoryAuthorStore, InMemoryCategoryStore, InMemoryLibraryStore, InMemoryUserStore,
};
pub use model::{
    Author, AuthorSummary, AuthorUpdate, Book, BookSummary, BookUpdate, BorrowSelector,
    BorrowUpdate, Borrowing, BorrowingSummary, Category, CategorySummary, CategoryUpdate,
    NewAuthor, NewBook, NewBorrow, NewCategory, NewUser, User,
};
pub use postgres::{
    PostgresAuthorStore, PostgresCategoryStore, PostgresLibraryStore, PostgresUserStore,
};
pub use store::{AuthorStore, CategoryStore, LibraryStore, UserStore};
