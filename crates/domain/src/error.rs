//! Domain error taxonomy.
//!
//! Every failure mode of the integrity protocol is a distinct variant and
//! is surfaced verbatim to the caller; nothing here is retried. A peer
//! answering "no" is data (`ReferenceNotFound`, `ReferencedByOther`), a
//! peer not answering at all is `DependencyUnavailable`.

use thiserror::Error;

use auth::AuthError;
use common::BookId;
use store::StoreError;

/// Errors surfaced by the domain services.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The identity gate rejected the call.
    #[error("unauthenticated: {0}")]
    Unauthenticated(#[from] AuthError),

    /// A required field was missing, empty, or unparseable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The operation's target does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    /// An update named an id that does not exist.
    #[error("{entity} id {id} is invalid")]
    InvalidId { entity: &'static str, id: i64 },

    /// A uniqueness guard tripped on create.
    #[error("{entity} \"{name}\" already exists")]
    AlreadyExists { entity: &'static str, name: String },

    /// A foreign reference points at a peer row that does not exist.
    #[error("referenced {entity} {id} does not exist")]
    ReferenceNotFound { entity: &'static str, id: i64 },

    /// A delete was blocked because a peer still references the row.
    #[error("{entity} {id} is still referenced by {referenced_by}")]
    ReferencedByOther {
        entity: &'static str,
        id: i64,
        referenced_by: &'static str,
    },

    /// No copy of the book is on the shelf.
    #[error("book {0} is not available")]
    BookUnavailable(BookId),

    /// A peer check failed or timed out; distinct from a definitive "no".
    #[error("{peer} domain unavailable: {reason}")]
    DependencyUnavailable {
        peer: &'static str,
        reason: String,
    },

    /// The local transactional write failed.
    #[error("write failed: {0}")]
    WriteFailed(#[from] StoreError),

    /// The request's deadline passed mid-orchestration, before any write.
    #[error("deadline exceeded")]
    DeadlineExceeded,
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
