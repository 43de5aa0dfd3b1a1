//! Library domain: books, stock counters, and the borrowing ledger.

mod borrow;
mod commands;
mod service;

pub use borrow::{BorrowState, is_overdue, state_of};
pub use commands::{CreateBook, CreateBorrow, UpdateBook, UpdateBorrow};
pub use service::LibraryService;
