//! Shared types for the library lending system.
//!
//! Every domain keys its entities by a sequential integer id. The newtypes
//! here keep ids from different domains from being mixed up at compile time.

pub mod deadline;
pub mod types;

pub use deadline::{Deadline, DeadlineExpired};
pub use types::{AuthorId, BookId, BorrowingId, CategoryId, UserId};
