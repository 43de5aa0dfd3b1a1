//! Category domain orchestrator.

use std::sync::Arc;

use common::CategoryId;
use store::{Category, CategoryStore, CategorySummary};

use crate::context::Context;
use crate::error::{DomainError, Result};
use crate::peer::{LibraryUsage, peer_check};

use super::{CreateCategory, UpdateCategory};

/// Owns all writes to the category store. Deletion is blocked while any
/// book in the library domain references the category.
pub struct CategoryService<S: CategoryStore> {
    store: S,
    library: Arc<dyn LibraryUsage>,
}

impl<S: CategoryStore> CategoryService<S> {
    pub fn new(store: S, library: Arc<dyn LibraryUsage>) -> Self {
        Self { store, library }
    }

    #[tracing::instrument(skip(self, ctx, cmd), fields(name = %cmd.name))]
    pub async fn create(&self, ctx: &Context, cmd: CreateCategory) -> Result<CategoryId> {
        ctx.check_deadline()?;
        let category = cmd.validate()?;

        if self.store.name_taken(&category.name).await? {
            return Err(DomainError::AlreadyExists {
                entity: "category",
                name: category.name,
            });
        }

        ctx.check_deadline()?;
        let id = self.store.insert(category).await?;
        tracing::info!(category_id = %id, "category created");
        Ok(id)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get(&self, ctx: &Context, id: CategoryId) -> Result<Category> {
        ctx.check_deadline()?;
        self.store
            .fetch(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "category",
                id: id.as_i64(),
            })
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list(&self, ctx: &Context, min: i64, max: i64) -> Result<Vec<CategorySummary>> {
        ctx.check_deadline()?;
        Ok(self.store.list_range(min, max).await?)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn search(&self, ctx: &Context, fragment: &str) -> Result<Vec<CategorySummary>> {
        ctx.check_deadline()?;
        Ok(self.store.search_name(fragment).await?)
    }

    /// Existence fact for peers and callers; absence is not an error.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn exists(&self, ctx: &Context, id: CategoryId) -> Result<bool> {
        ctx.check_deadline()?;
        Ok(self.store.exists(id).await?)
    }

    #[tracing::instrument(skip(self, ctx, cmd))]
    pub async fn update(&self, ctx: &Context, id: CategoryId, cmd: UpdateCategory) -> Result<()> {
        ctx.check_deadline()?;
        let update = cmd.validate()?;

        if !self.store.exists(id).await? {
            return Err(DomainError::InvalidId {
                entity: "category",
                id: id.as_i64(),
            });
        }

        ctx.check_deadline()?;
        if !self.store.update(id, update).await? {
            return Err(DomainError::InvalidId {
                entity: "category",
                id: id.as_i64(),
            });
        }
        tracing::info!(category_id = %id, "category updated");
        Ok(())
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete(&self, ctx: &Context, id: CategoryId) -> Result<()> {
        ctx.check_deadline()?;

        if !self.store.exists(id).await? {
            return Err(DomainError::NotFound {
                entity: "category",
                id: id.as_i64(),
            });
        }

        let in_use = peer_check(ctx, "library", self.library.book_references_category(id)).await?;
        if in_use {
            return Err(DomainError::ReferencedByOther {
                entity: "category",
                id: id.as_i64(),
                referenced_by: "a book",
            });
        }

        ctx.check_deadline()?;
        if !self.store.delete(id).await? {
            return Err(DomainError::NotFound {
                entity: "category",
                id: id.as_i64(),
            });
        }
        tracing::info!(category_id = %id, "category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use store::InMemoryCategoryStore;

    use super::*;
    use crate::peer::StubPeers;

    fn ctx() -> Context {
        let gate = auth::IdentityGate::new(b"category-test");
        let token = gate.issue("librarian", auth::TOKEN_TTL).unwrap();
        let identity = gate.verify(Some(&format!("Bearer {token}"))).unwrap();
        Context::new(identity)
    }

    fn service() -> (CategoryService<InMemoryCategoryStore>, StubPeers) {
        let peers = StubPeers::new();
        let service = CategoryService::new(InMemoryCategoryStore::new(), Arc::new(peers.clone()));
        (service, peers)
    }

    fn create_cmd(name: &str) -> CreateCategory {
        CreateCategory {
            name: name.to_string(),
            description: Some("speculative fiction".to_string()),
        }
    }

    #[tokio::test]
    async fn create_requires_name() {
        let (service, _) = service();
        let err = service.create(&ctx(), create_cmd(" ")).await.unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn create_rejects_duplicate_name() {
        let (service, _) = service();
        service.create(&ctx(), create_cmd("Science Fiction")).await.unwrap();

        let err = service
            .create(&ctx(), create_cmd("Science Fiction"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::AlreadyExists { entity: "category", .. }
        ));
    }

    #[tokio::test]
    async fn delete_blocked_while_referenced_by_book() {
        let (service, peers) = service();
        let id = service.create(&ctx(), create_cmd("Science Fiction")).await.unwrap();
        peers.mark_category_in_use(id);

        let err = service.delete(&ctx(), id).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::ReferencedByOther { entity: "category", .. }
        ));
    }

    #[tokio::test]
    async fn unreferenced_category_deletes_cleanly() {
        let (service, _) = service();
        let id = service.create(&ctx(), create_cmd("Science Fiction")).await.unwrap();

        service.delete(&ctx(), id).await.unwrap();
        assert!(!service.exists(&ctx(), id).await.unwrap());
    }

    #[tokio::test]
    async fn update_roundtrip() {
        let (service, _) = service();
        let id = service.create(&ctx(), create_cmd("Science Fiction")).await.unwrap();

        service
            .update(
                &ctx(),
                id,
                UpdateCategory {
                    name: "SF".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();

        let category = service.get(&ctx(), id).await.unwrap();
        assert_eq!(category.name, "SF");
        assert_eq!(category.description, None);
    }
}
