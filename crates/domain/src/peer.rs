//! Peer checks between domains.
//!
//! Each domain offers two kinds of facts to the others: existence
//! (`Exists(id)`) and usage (`UsageCheck(id)`). The traits here are the
//! whole inter-domain surface — peers never write each other's stores.
//!
//! Production handles wrap the owning domain's store directly (all four
//! domains run in one process); they are built once by the composition
//! root and injected, never reached through process-global state. The
//! [`StubPeers`] double answers from fixed sets and can be made
//! unreachable or slow, for exercising `DependencyUnavailable` paths.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use common::{AuthorId, CategoryId, UserId};
use store::{AuthorStore, CategoryStore, LibraryStore, UserStore};

use crate::context::Context;
use crate::error::{DomainError, Result};

/// Fixed budget for one peer check, independent of the request deadline.
pub const PEER_CALL_TIMEOUT: Duration = Duration::from_secs(1);

/// Transport-level failure of a peer check.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PeerError {
    /// The peer could not be reached or answered with an error.
    #[error("peer transport failure: {0}")]
    Transport(String),

    /// The peer did not answer within [`PEER_CALL_TIMEOUT`].
    #[error("peer call timed out")]
    Timeout,
}

/// Existence facts offered by the user domain.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_exists(&self, id: UserId) -> std::result::Result<bool, PeerError>;
}

/// Existence facts offered by the author domain.
#[async_trait]
pub trait AuthorDirectory: Send + Sync {
    async fn author_exists(&self, id: AuthorId) -> std::result::Result<bool, PeerError>;
}

/// Existence facts offered by the category domain.
#[async_trait]
pub trait CategoryDirectory: Send + Sync {
    async fn category_exists(&self, id: CategoryId) -> std::result::Result<bool, PeerError>;
}

/// Usage facts offered by the library domain.
#[async_trait]
pub trait LibraryUsage: Send + Sync {
    /// Does any book reference this author?
    async fn book_references_author(&self, id: AuthorId) -> std::result::Result<bool, PeerError>;

    /// Does any book reference this category?
    async fn book_references_category(
        &self,
        id: CategoryId,
    ) -> std::result::Result<bool, PeerError>;

    /// Does the user hold an active borrowing? Returned loans never count.
    async fn user_has_active_borrowing(&self, id: UserId)
    -> std::result::Result<bool, PeerError>;
}

/// Runs one peer check under the request deadline and the per-call timeout.
///
/// Every check passes through here, which keeps the ordering rule honest:
/// the deadline is re-examined before the call, transport errors and
/// timeouts both surface as `DependencyUnavailable`, and a definitive
/// boolean answer is returned untouched.
pub(crate) async fn peer_check<F>(ctx: &Context, peer: &'static str, call: F) -> Result<bool>
where
    F: Future<Output = std::result::Result<bool, PeerError>>,
{
    ctx.check_deadline()?;
    match tokio::time::timeout(PEER_CALL_TIMEOUT, call).await {
        Ok(Ok(answer)) => Ok(answer),
        Ok(Err(e)) => Err(DomainError::DependencyUnavailable {
            peer,
            reason: e.to_string(),
        }),
        Err(_) => Err(DomainError::DependencyUnavailable {
            peer,
            reason: PeerError::Timeout.to_string(),
        }),
    }
}

// -- Production handles, one per offering domain --

/// User-domain existence handle backed by its store.
#[derive(Clone)]
pub struct UserDirectoryHandle<S: UserStore> {
    store: S,
}

impl<S: UserStore> UserDirectoryHandle<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: UserStore> UserDirectory for UserDirectoryHandle<S> {
    async fn user_exists(&self, id: UserId) -> std::result::Result<bool, PeerError> {
        self.store
            .exists(id)
            .await
            .map_err(|e| PeerError::Transport(e.to_string()))
    }
}

/// Author-domain existence handle backed by its store.
#[derive(Clone)]
pub struct AuthorDirectoryHandle<S: AuthorStore> {
    store: S,
}

impl<S: AuthorStore> AuthorDirectoryHandle<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: AuthorStore> AuthorDirectory for AuthorDirectoryHandle<S> {
    async fn author_exists(&self, id: AuthorId) -> std::result::Result<bool, PeerError> {
        self.store
            .exists(id)
            .await
            .map_err(|e| PeerError::Transport(e.to_string()))
    }
}

/// Category-domain existence handle backed by its store.
#[derive(Clone)]
pub struct CategoryDirectoryHandle<S: CategoryStore> {
    store: S,
}

impl<S: CategoryStore> CategoryDirectoryHandle<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: CategoryStore> CategoryDirectory for CategoryDirectoryHandle<S> {
    async fn category_exists(&self, id: CategoryId) -> std::result::Result<bool, PeerError> {
        self.store
            .exists(id)
            .await
            .map_err(|e| PeerError::Transport(e.to_string()))
    }
}

/// Library-domain usage handle backed by its store.
#[derive(Clone)]
pub struct LibraryUsageHandle<S: LibraryStore> {
    store: S,
}

impl<S: LibraryStore> LibraryUsageHandle<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: LibraryStore> LibraryUsage for LibraryUsageHandle<S> {
    async fn book_references_author(&self, id: AuthorId) -> std::result::Result<bool, PeerError> {
        self.store
            .any_book_with_author(id)
            .await
            .map_err(|e| PeerError::Transport(e.to_string()))
    }

    async fn book_references_category(
        &self,
        id: CategoryId,
    ) -> std::result::Result<bool, PeerError> {
        self.store
            .any_book_with_category(id)
            .await
            .map_err(|e| PeerError::Transport(e.to_string()))
    }

    async fn user_has_active_borrowing(
        &self,
        id: UserId,
    ) -> std::result::Result<bool, PeerError> {
        self.store
            .any_active_borrow_for_user(id)
            .await
            .map_err(|e| PeerError::Transport(e.to_string()))
    }
}

// -- Test double --

#[derive(Debug, Default)]
struct StubState {
    users: HashSet<i64>,
    authors: HashSet<i64>,
    categories: HashSet<i64>,
    authors_in_use: HashSet<i64>,
    categories_in_use: HashSet<i64>,
    active_borrowers: HashSet<i64>,
    unreachable: bool,
    delay: Option<Duration>,
}

/// Scriptable peer answering from fixed id sets.
///
/// Answers are snapshots: they do not track any store, which is exactly
/// what makes the check-then-write gap reproducible in tests.
#[derive(Debug, Clone, Default)]
pub struct StubPeers {
    state: Arc<RwLock<StubState>>,
}

impl StubPeers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, id: UserId) {
        self.state.write().unwrap().users.insert(id.as_i64());
    }

    pub fn add_author(&self, id: AuthorId) {
        self.state.write().unwrap().authors.insert(id.as_i64());
    }

    pub fn add_category(&self, id: CategoryId) {
        self.state.write().unwrap().categories.insert(id.as_i64());
    }

    pub fn mark_author_in_use(&self, id: AuthorId) {
        self.state.write().unwrap().authors_in_use.insert(id.as_i64());
    }

    pub fn mark_category_in_use(&self, id: CategoryId) {
        self.state
            .write()
            .unwrap()
            .categories_in_use
            .insert(id.as_i64());
    }

    pub fn mark_active_borrower(&self, id: UserId) {
        self.state
            .write()
            .unwrap()
            .active_borrowers
            .insert(id.as_i64());
    }

    pub fn clear_active_borrower(&self, id: UserId) {
        self.state
            .write()
            .unwrap()
            .active_borrowers
            .remove(&id.as_i64());
    }

    /// Makes every check fail with a transport error.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state.write().unwrap().unreachable = unreachable;
    }

    /// Makes every check stall for `delay` before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state.write().unwrap().delay = delay;
    }

    async fn answer(&self, lookup: impl FnOnce(&StubState) -> bool) -> std::result::Result<bool, PeerError> {
        let delay = {
            let state = self.state.read().unwrap();
            if state.unreachable {
                return Err(PeerError::Transport("peer unreachable".to_string()));
            }
            state.delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        Ok(lookup(&self.state.read().unwrap()))
    }
}

#[async_trait]
impl UserDirectory for StubPeers {
    async fn user_exists(&self, id: UserId) -> std::result::Result<bool, PeerError> {
        self.answer(|s| s.users.contains(&id.as_i64())).await
    }
}

#[async_trait]
impl AuthorDirectory for StubPeers {
    async fn author_exists(&self, id: AuthorId) -> std::result::Result<bool, PeerError> {
        self.answer(|s| s.authors.contains(&id.as_i64())).await
    }
}

#[async_trait]
impl CategoryDirectory for StubPeers {
    async fn category_exists(&self, id: CategoryId) -> std::result::Result<bool, PeerError> {
        self.answer(|s| s.categories.contains(&id.as_i64())).await
    }
}

#[async_trait]
impl LibraryUsage for StubPeers {
    async fn book_references_author(&self, id: AuthorId) -> std::result::Result<bool, PeerError> {
        self.answer(|s| s.authors_in_use.contains(&id.as_i64())).await
    }

    async fn book_references_category(
        &self,
        id: CategoryId,
    ) -> std::result::Result<bool, PeerError> {
        self.answer(|s| s.categories_in_use.contains(&id.as_i64()))
            .await
    }

    async fn user_has_active_borrowing(
        &self,
        id: UserId,
    ) -> std::result::Result<bool, PeerError> {
        self.answer(|s| s.active_borrowers.contains(&id.as_i64()))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Deadline;

    fn ctx() -> Context {
        let gate = auth::IdentityGate::new(b"peer-test");
        let token = gate.issue("tester", auth::TOKEN_TTL).unwrap();
        let identity = gate.verify(Some(&format!("Bearer {token}"))).unwrap();
        Context::new(identity)
    }

    #[tokio::test]
    async fn stub_answers_from_its_sets() {
        let peers = StubPeers::new();
        peers.add_user(UserId::new(1));

        assert!(peers.user_exists(UserId::new(1)).await.unwrap());
        assert!(!peers.user_exists(UserId::new(2)).await.unwrap());
    }

    #[tokio::test]
    async fn unreachable_peer_maps_to_dependency_unavailable() {
        let peers = StubPeers::new();
        peers.set_unreachable(true);

        let err = peer_check(&ctx(), "user", peers.user_exists(UserId::new(1)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::DependencyUnavailable { peer: "user", .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_peer_times_out() {
        let peers = StubPeers::new();
        peers.add_user(UserId::new(1));
        peers.set_delay(Some(Duration::from_secs(30)));

        let err = peer_check(&ctx(), "user", peers.user_exists(UserId::new(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DependencyUnavailable { .. }));
    }

    #[tokio::test]
    async fn expired_deadline_short_circuits_before_the_call() {
        let peers = StubPeers::new();
        peers.add_user(UserId::new(1));
        let gate = auth::IdentityGate::new(b"peer-test");
        let token = gate.issue("tester", auth::TOKEN_TTL).unwrap();
        let identity = gate.verify(Some(&format!("Bearer {token}"))).unwrap();
        let ctx = Context::with_deadline(identity, Deadline::after(Duration::ZERO));

        let err = peer_check(&ctx, "user", peers.user_exists(UserId::new(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::DeadlineExceeded));
    }
}
