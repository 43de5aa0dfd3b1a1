//! User domain orchestrator.

use std::sync::Arc;

use common::UserId;
use store::{User, UserStore};

use crate::context::Context;
use crate::error::{DomainError, Result};
use crate::peer::{LibraryUsage, peer_check};

use super::RegisterUser;

/// Owns all writes to the user store.
///
/// Deletion consults the library domain first: a user holding an active
/// borrowing cannot be removed, while any number of returned loans is no
/// obstacle. The check and the delete are not atomic across domains — a
/// borrow created between them leaves a dangling `user_id` in the library
/// store, which is the protocol's documented gap.
pub struct UserService<S: UserStore> {
    store: S,
    library: Arc<dyn LibraryUsage>,
}

impl<S: UserStore> UserService<S> {
    pub fn new(store: S, library: Arc<dyn LibraryUsage>) -> Self {
        Self { store, library }
    }

    /// Registers a new member. Open to unauthenticated callers; this is
    /// how an identity comes to exist in the first place.
    #[tracing::instrument(skip(self, cmd), fields(username = %cmd.username))]
    pub async fn register(&self, cmd: RegisterUser) -> Result<UserId> {
        let user = cmd.validate()?;

        if self.store.username_taken(&user.username).await? {
            return Err(DomainError::AlreadyExists {
                entity: "user",
                name: user.username,
            });
        }

        let id = self.store.insert(user).await?;
        tracing::info!(user_id = %id, "user registered");
        Ok(id)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: &Context, id: UserId) -> Result<User> {
        ctx.check_deadline()?;
        self.store
            .fetch(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "user",
                id: id.as_i64(),
            })
    }

    /// Existence fact for peers and callers; absence is not an error.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn exists(&self, ctx: &Context, id: UserId) -> Result<bool> {
        ctx.check_deadline()?;
        Ok(self.store.exists(id).await?)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &Context, id: UserId) -> Result<()> {
        ctx.check_deadline()?;

        if !self.store.exists(id).await? {
            return Err(DomainError::NotFound {
                entity: "user",
                id: id.as_i64(),
            });
        }

        let still_borrowing =
            peer_check(ctx, "library", self.library.user_has_active_borrowing(id)).await?;
        if still_borrowing {
            return Err(DomainError::ReferencedByOther {
                entity: "user",
                id: id.as_i64(),
                referenced_by: "an active borrowing",
            });
        }

        ctx.check_deadline()?;
        if !self.store.delete(id).await? {
            // Vanished between the existence check and the delete.
            return Err(DomainError::NotFound {
                entity: "user",
                id: id.as_i64(),
            });
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use store::InMemoryUserStore;

    use super::*;
    use crate::peer::StubPeers;

    fn ctx() -> Context {
        let gate = auth::IdentityGate::new(b"user-test");
        let token = gate.issue("librarian", auth::TOKEN_TTL).unwrap();
        let identity = gate.verify(Some(&format!("Bearer {token}"))).unwrap();
        Context::new(identity)
    }

    fn register_cmd(username: &str) -> RegisterUser {
        RegisterUser {
            username: username.to_string(),
            credential_hash: "$argon$stub".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            email: format!("{username}@example.com"),
            role: "member".to_string(),
        }
    }

    fn service() -> (UserService<InMemoryUserStore>, StubPeers) {
        let peers = StubPeers::new();
        let service = UserService::new(InMemoryUserStore::new(), Arc::new(peers.clone()));
        (service, peers)
    }

    #[tokio::test]
    async fn register_and_get() {
        let (service, _) = service();
        let id = service.register(register_cmd("ada")).await.unwrap();

        let user = service.get(&ctx(), id).await.unwrap();
        assert_eq!(user.username, "ada");
        assert_eq!(user.role, "member");
    }

    #[tokio::test]
    async fn register_rejects_missing_fields() {
        let (service, _) = service();
        let mut cmd = register_cmd("ada");
        cmd.role = "".to_string();

        let err = service.register(cmd).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn register_rejects_duplicate_username() {
        let (service, _) = service();
        service.register(register_cmd("ada")).await.unwrap();

        let err = service.register(register_cmd("ada")).await.unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists { entity: "user", .. }));
    }

    #[tokio::test]
    async fn delete_blocked_by_active_borrowing() {
        let (service, peers) = service();
        let id = service.register(register_cmd("ada")).await.unwrap();
        peers.mark_active_borrower(id);

        let err = service.delete(&ctx(), id).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::ReferencedByOther { entity: "user", .. }
        ));
        assert!(service.exists(&ctx(), id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_succeeds_once_loans_are_returned() {
        let (service, peers) = service();
        let id = service.register(register_cmd("ada")).await.unwrap();

        peers.mark_active_borrower(id);
        service.delete(&ctx(), id).await.unwrap_err();

        // Historical (returned) loans do not block deletion.
        peers.clear_active_borrower(id);
        service.delete(&ctx(), id).await.unwrap();
        assert!(!service.exists(&ctx(), id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_with_unreachable_library_is_unavailable_not_deleted() {
        let (service, peers) = service();
        let id = service.register(register_cmd("ada")).await.unwrap();
        peers.set_unreachable(true);

        let err = service.delete(&ctx(), id).await.unwrap_err();
        assert!(matches!(err, DomainError::DependencyUnavailable { .. }));
        // No write happened.
        assert!(service.exists(&ctx(), id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_of_unknown_user_is_not_found() {
        let (service, _) = service();
        let err = service.delete(&ctx(), UserId::new(99)).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { entity: "user", .. }));
    }

    #[tokio::test]
    async fn failed_store_write_surfaces_as_write_failed() {
        let peers = StubPeers::new();
        let store = InMemoryUserStore::new();
        let service = UserService::new(store.clone(), Arc::new(peers));
        store.set_fail_writes(true).await;

        let err = service.register(register_cmd("ada")).await.unwrap_err();
        assert!(matches!(err, DomainError::WriteFailed(_)));
        assert_eq!(store.user_count().await, 0);
    }

    #[tokio::test]
    async fn expired_deadline_fails_before_any_check() {
        use std::time::Duration;

        use common::Deadline;

        let (service, _) = service();
        let id = service.register(register_cmd("ada")).await.unwrap();

        let gate = auth::IdentityGate::new(b"user-test");
        let token = gate.issue("librarian", auth::TOKEN_TTL).unwrap();
        let identity = gate.verify(Some(&format!("Bearer {token}"))).unwrap();
        let expired = Context::with_deadline(identity, Deadline::after(Duration::ZERO));

        let err = service.delete(&expired, id).await.unwrap_err();
        assert!(matches!(err, DomainError::DeadlineExceeded));
        assert!(service.exists(&ctx(), id).await.unwrap());
    }
}
