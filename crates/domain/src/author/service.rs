//! Author domain orchestrator.

use std::sync::Arc;

use common::AuthorId;
use store::{Author, AuthorStore, AuthorSummary};

use crate::context::Context;
use crate::error::{DomainError, Result};
use crate::peer::{LibraryUsage, peer_check};

use super::{CreateAuthor, UpdateAuthor};

/// Owns all writes to the author store.
///
/// Deletion asks the library domain whether any book still references the
/// author; a positive answer blocks the delete. The usage check and the
/// delete are not atomic across domains.
pub struct AuthorService<S: AuthorStore> {
    store: S,
    library: Arc<dyn LibraryUsage>,
}

impl<S: AuthorStore> AuthorService<S> {
    pub fn new(store: S, library: Arc<dyn LibraryUsage>) -> Self {
        Self { store, library }
    }

    #[tracing::instrument(skip(self, ctx, cmd), fields(name = %cmd.name))]
    pub async fn create(&self, ctx: &Context, cmd: CreateAuthor) -> Result<AuthorId> {
        ctx.check_deadline()?;
        let author = cmd.validate()?;

        if self.store.name_taken(&author.name).await? {
            return Err(DomainError::AlreadyExists {
                entity: "author",
                name: author.name,
            });
        }

        ctx.check_deadline()?;
        let id = self.store.insert(author).await?;
        tracing::info!(author_id = %id, "author created");
        Ok(id)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: &Context, id: AuthorId) -> Result<Author> {
        ctx.check_deadline()?;
        self.store
            .fetch(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "author",
                id: id.as_i64(),
            })
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list(&self, ctx: &Context, min: i64, max: i64) -> Result<Vec<AuthorSummary>> {
        ctx.check_deadline()?;
        Ok(self.store.list_range(min, max).await?)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn search(&self, ctx: &Context, fragment: &str) -> Result<Vec<AuthorSummary>> {
        ctx.check_deadline()?;
        Ok(self.store.search_name(fragment).await?)
    }

    /// Existence fact for peers and callers; absence is not an error.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn exists(&self, ctx: &Context, id: AuthorId) -> Result<bool> {
        ctx.check_deadline()?;
        Ok(self.store.exists(id).await?)
    }

    #[tracing::instrument(skip(self, ctx, cmd))]
    pub async fn update(&self, ctx: &Context, id: AuthorId, cmd: UpdateAuthor) -> Result<()> {
        ctx.check_deadline()?;
        let update = cmd.validate()?;

        if !self.store.exists(id).await? {
            return Err(DomainError::InvalidId {
                entity: "author",
                id: id.as_i64(),
            });
        }

        ctx.check_deadline()?;
        if !self.store.update(id, update).await? {
            return Err(DomainError::InvalidId {
                entity: "author",
                id: id.as_i64(),
            });
        }
        tracing::info!(author_id = %id, "author updated");
        Ok(())
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &Context, id: AuthorId) -> Result<()> {
        ctx.check_deadline()?;

        if !self.store.exists(id).await? {
            return Err(DomainError::NotFound {
                entity: "author",
                id: id.as_i64(),
            });
        }

        let in_use = peer_check(ctx, "library", self.library.book_references_author(id)).await?;
        if in_use {
            return Err(DomainError::ReferencedByOther {
                entity: "author",
                id: id.as_i64(),
                referenced_by: "a book",
            });
        }

        ctx.check_deadline()?;
        if !self.store.delete(id).await? {
            return Err(DomainError::NotFound {
                entity: "author",
                id: id.as_i64(),
            });
        }
        tracing::info!(author_id = %id, "author deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use store::InMemoryAuthorStore;

    use super::*;
    use crate::peer::StubPeers;

    fn ctx() -> Context {
        let gate = auth::IdentityGate::new(b"author-test");
        let token = gate.issue("librarian", auth::TOKEN_TTL).unwrap();
        let identity = gate.verify(Some(&format!("Bearer {token}"))).unwrap();
        Context::new(identity)
    }

    fn create_cmd(name: &str) -> CreateAuthor {
        CreateAuthor {
            name: name.to_string(),
            birthdate: Some("1929-10-21".to_string()),
            nationality: Some("American".to_string()),
            biography: None,
        }
    }

    fn service() -> (AuthorService<InMemoryAuthorStore>, StubPeers) {
        let peers = StubPeers::new();
        let service = AuthorService::new(InMemoryAuthorStore::new(), Arc::new(peers.clone()));
        (service, peers)
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let (service, _) = service();
        let id = service.create(&ctx(), create_cmd("Ursula K. Le Guin")).await.unwrap();

        let author = service.get(&ctx(), id).await.unwrap();
        assert_eq!(author.name, "Ursula K. Le Guin");
        assert!(author.birthdate.is_some());
    }

    #[tokio::test]
    async fn create_rejects_bad_birthdate() {
        let (service, _) = service();
        let mut cmd = create_cmd("Ursula K. Le Guin");
        cmd.birthdate = Some("21-10-1929".to_string());

        let err = service.create(&ctx(), cmd).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name() {
        let (service, _) = service();
        service.create(&ctx(), create_cmd("Ursula K. Le Guin")).await.unwrap();

        let err = service
            .create(&ctx(), create_cmd("Ursula K. Le Guin"))
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::AlreadyExists { entity: "author", .. }));
    }

    #[tokio::test]
    async fn update_of_unknown_id_is_invalid_id() {
        let (service, _) = service();
        let err = service
            .update(
                &ctx(),
                AuthorId::new(404),
                UpdateAuthor {
                    name: "Nobody".to_string(),
                    birthdate: None,
                    nationality: None,
                    biography: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidId { entity: "author", .. }));
    }

    #[tokio::test]
    async fn delete_blocked_while_referenced_by_book() {
        let (service, peers) = service();
        let id = service.create(&ctx(), create_cmd("Ursula K. Le Guin")).await.unwrap();
        peers.mark_author_in_use(id);

        let err = service.delete(&ctx(), id).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::ReferencedByOther { entity: "author", .. }
        ));
        assert!(service.exists(&ctx(), id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_of_unreferenced_author_succeeds() {
        let (service, _) = service();
        let id = service.create(&ctx(), create_cmd("Ursula K. Le Guin")).await.unwrap();

        service.delete(&ctx(), id).await.unwrap();
        assert!(!service.exists(&ctx(), id).await.unwrap());
    }

    #[tokio::test]
    async fn delete_with_unreachable_library_leaves_row_in_place() {
        let (service, peers) = service();
        let id = service.create(&ctx(), create_cmd("Ursula K. Le Guin")).await.unwrap();
        peers.set_unreachable(true);

        let err = service.delete(&ctx(), id).await.unwrap_err();
        assert!(matches!(err, DomainError::DependencyUnavailable { .. }));
        assert!(service.exists(&ctx(), id).await.unwrap());
    }

    #[tokio::test]
    async fn list_and_search() {
        let (service, _) = service();
        service.create(&ctx(), create_cmd("Ursula K. Le Guin")).await.unwrap();
        service.create(&ctx(), create_cmd("Octavia Butler")).await.unwrap();

        let all = service.list(&ctx(), 1, 10).await.unwrap();
        assert_eq!(all.len(), 2);

        let hits = service.search(&ctx(), "le guin").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Ursula K. Le Guin");
    }
}
