//! Domain layer for the library lending system.
//!
//! Four independently-stored domains — users, authors, categories, and the
//! library (books + borrowings) — each own their writes and answer narrow
//! existence/usage questions for the others. The services here sequence
//! local validation, peer checks, and the local write so that nothing is
//! created against a missing reference and nothing referenced is destroyed.
//!
//! The peer checks are synchronous and not atomic with the local write: a
//! referenced row can vanish between a positive answer and the commit. That
//! gap is a property of the protocol, documented on each service and pinned
//! down by the integration tests, not something this layer papers over.

pub mod author;
pub mod category;
pub mod context;
pub mod error;
pub mod input;
pub mod library;
pub mod peer;
pub mod user;

pub use auth::{Identity, IdentityGate};
pub use context::Context;
pub use error::DomainError;
pub use peer::{
    AuthorDirectory, AuthorDirectoryHandle, CategoryDirectory, CategoryDirectoryHandle,
    LibraryUsage, LibraryUsageHandle, PEER_CALL_TIMEOUT, PeerError, StubPeers, UserDirectory,
    UserDirectoryHandle,
};

pub use author::{AuthorService, CreateAuthor, UpdateAuthor};
pub use category::{CategoryService, CreateCategory, UpdateCategory};
pub use library::{
    BorrowState, CreateBook, CreateBorrow, LibraryService, UpdateBook, UpdateBorrow, is_overdue,
};
pub use user::{RegisterUser, UserService};
