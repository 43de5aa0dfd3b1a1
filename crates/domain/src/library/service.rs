//! Library domain orchestrator: book catalog plus the borrowing ledger.

use std::sync::Arc;

use chrono::Utc;

use common::{AuthorId, BookId, BorrowingId, CategoryId, UserId};
use store::{
    Book, BookSummary, BorrowSelector, Borrowing, BorrowingSummary, LibraryStore, NewBorrow,
};

use crate::context::Context;
use crate::error::{DomainError, Result};
use crate::input::parse_date;
use crate::peer::{AuthorDirectory, CategoryDirectory, UserDirectory, peer_check};

use super::{CreateBook, CreateBorrow, UpdateBook, UpdateBorrow};

/// Owns all writes to the library store (books and borrowings).
///
/// Creating or editing a book peer-checks the category and author domains,
/// in that order, before any local write; creating a borrow peer-checks
/// the user domain. The checks are synchronous and each must pass before
/// the next runs. They are not atomic with the local commit: a peer row
/// deleted in between leaves a dangling reference behind — the protocol's
/// accepted gap.
///
/// Stock movement is confined to two transitions: taking out a loan
/// decrements `available_stock`, and *voiding* a loan (`delete_borrow`)
/// increments it. Recording a return closes the loan without restocking;
/// a returned copy stays off the shelf until the loan record is voided.
pub struct LibraryService<S: LibraryStore> {
    store: S,
    users: Arc<dyn UserDirectory>,
    authors: Arc<dyn AuthorDirectory>,
    categories: Arc<dyn CategoryDirectory>,
}

impl<S: LibraryStore> LibraryService<S> {
    pub fn new(
        store: S,
        users: Arc<dyn UserDirectory>,
        authors: Arc<dyn AuthorDirectory>,
        categories: Arc<dyn CategoryDirectory>,
    ) -> Self {
        Self {
            store,
            users,
            authors,
            categories,
        }
    }

    // -- Books --

    #[tracing::instrument(skip(self, ctx, cmd), fields(title = %cmd.title))]
    pub async fn create_book(&self, ctx: &Context, cmd: CreateBook) -> Result<BookId> {
        ctx.check_deadline()?;
        let book = cmd.validate()?;

        self.check_category(ctx, book.category_id).await?;
        self.check_author(ctx, book.author_id).await?;

        ctx.check_deadline()?;
        let id = self.store.insert_book(book).await?;
        tracing::info!(book_id = %id, "book created");
        Ok(id)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_book(&self, ctx: &Context, id: BookId) -> Result<Book> {
        ctx.check_deadline()?;
        self.store
            .fetch_book(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "book",
                id: id.as_i64(),
            })
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_books(&self, ctx: &Context, min: i64, max: i64) -> Result<Vec<BookSummary>> {
        ctx.check_deadline()?;
        Ok(self.store.list_books_range(min, max).await?)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn books_by_published_date(
        &self,
        ctx: &Context,
        start: &str,
        end: &str,
    ) -> Result<Vec<BookSummary>> {
        ctx.check_deadline()?;
        let start = parse_date("start_date", start)?;
        let end = parse_date("end_date", end)?;
        Ok(self.store.list_books_published_between(start, end).await?)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn search_books(&self, ctx: &Context, fragment: &str) -> Result<Vec<BookSummary>> {
        ctx.check_deadline()?;
        Ok(self.store.search_title(fragment).await?)
    }

    /// Picks up to `limit` books from a category. The category is
    /// peer-checked so an empty answer means "nothing here", never "no
    /// such category".
    #[tracing::instrument(skip(self, ctx))]
    pub async fn recommend(
        &self,
        ctx: &Context,
        category: CategoryId,
        limit: i64,
    ) -> Result<Vec<BookSummary>> {
        self.check_category(ctx, category).await?;
        ctx.check_deadline()?;
        Ok(self.store.pick_in_category(category, limit).await?)
    }

    #[tracing::instrument(skip(self, ctx, cmd))]
    pub async fn update_book(&self, ctx: &Context, id: BookId, cmd: UpdateBook) -> Result<()> {
        ctx.check_deadline()?;
        let update = cmd.validate()?;

        self.check_category(ctx, update.category_id).await?;
        self.check_author(ctx, update.author_id).await?;

        if !self.store.book_exists(id).await? {
            return Err(DomainError::InvalidId {
                entity: "book",
                id: id.as_i64(),
            });
        }

        ctx.check_deadline()?;
        if !self.store.update_book(id, update).await? {
            return Err(DomainError::InvalidId {
                entity: "book",
                id: id.as_i64(),
            });
        }
        tracing::info!(book_id = %id, "book updated");
        Ok(())
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete_book(&self, ctx: &Context, id: BookId) -> Result<()> {
        ctx.check_deadline()?;

        if !self.store.book_exists(id).await? {
            return Err(DomainError::NotFound {
                entity: "book",
                id: id.as_i64(),
            });
        }

        ctx.check_deadline()?;
        if !self.store.delete_book(id).await? {
            return Err(DomainError::NotFound {
                entity: "book",
                id: id.as_i64(),
            });
        }
        tracing::info!(book_id = %id, "book deleted");
        Ok(())
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn book_exists(&self, ctx: &Context, id: BookId) -> Result<bool> {
        ctx.check_deadline()?;
        Ok(self.store.book_exists(id).await?)
    }

    // -- Usage facts this domain serves to its peers --

    #[tracing::instrument(skip(self, ctx))]
    pub async fn author_in_use(&self, ctx: &Context, id: AuthorId) -> Result<bool> {
        ctx.check_deadline()?;
        Ok(self.store.any_book_with_author(id).await?)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn category_in_use(&self, ctx: &Context, id: CategoryId) -> Result<bool> {
        ctx.check_deadline()?;
        Ok(self.store.any_book_with_category(id).await?)
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn user_still_borrows(&self, ctx: &Context, id: UserId) -> Result<bool> {
        ctx.check_deadline()?;
        Ok(self.store.any_active_borrow_for_user(id).await?)
    }

    // -- Borrowings --

    /// Takes one copy off the shelf for `user_id`.
    ///
    /// The availability read here is advisory; the store re-checks stock
    /// inside the same transaction that inserts the loan, so two
    /// concurrent borrows of the last copy cannot both succeed.
    #[tracing::instrument(skip(self, ctx, cmd), fields(book_id = %cmd.book_id, user_id = %cmd.user_id))]
    pub async fn create_borrow(&self, ctx: &Context, cmd: CreateBorrow) -> Result<BorrowingId> {
        ctx.check_deadline()?;
        let due_date = cmd.due_date()?;

        let user_known = peer_check(ctx, "user", self.users.user_exists(cmd.user_id)).await?;
        if !user_known {
            return Err(DomainError::ReferenceNotFound {
                entity: "user",
                id: cmd.user_id.as_i64(),
            });
        }

        match self.store.fetch_book(cmd.book_id).await? {
            Some(book) if book.available_stock > 0 => {}
            _ => return Err(DomainError::BookUnavailable(cmd.book_id)),
        }

        ctx.check_deadline()?;
        let borrowed = NewBorrow {
            book_id: cmd.book_id,
            user_id: cmd.user_id,
            borrowed_date: Utc::now().date_naive(),
            due_date,
        };
        let id = self
            .store
            .insert_borrow(borrowed)
            .await?
            .ok_or(DomainError::BookUnavailable(cmd.book_id))?;

        metrics::counter!("borrowings_created_total").increment(1);
        tracing::info!(borrowing_id = %id, "borrow created");
        Ok(id)
    }

    /// Closes an active loan. Stock is deliberately left untouched: only
    /// voiding the loan (`delete_borrow`) puts the copy back.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn create_return(&self, ctx: &Context, id: BorrowingId) -> Result<()> {
        ctx.check_deadline()?;

        let transitioned = self
            .store
            .mark_returned(id, Utc::now().date_naive())
            .await?;
        if !transitioned {
            // Unknown id or already returned; the terminal state has no
            // second transition.
            return Err(DomainError::NotFound {
                entity: "active borrowing",
                id: id.as_i64(),
            });
        }

        metrics::counter!("returns_recorded_total").increment(1);
        tracing::info!(borrowing_id = %id, "return recorded");
        Ok(())
    }

    /// Voids a loan: removes the row and restocks the book by one, in one
    /// transaction, whatever the returned flag says.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn delete_borrow(&self, ctx: &Context, id: BorrowingId) -> Result<()> {
        ctx.check_deadline()?;

        if !self.store.delete_borrow(id).await? {
            return Err(DomainError::NotFound {
                entity: "borrowing",
                id: id.as_i64(),
            });
        }

        metrics::counter!("borrowings_voided_total").increment(1);
        tracing::info!(borrowing_id = %id, "borrow voided");
        Ok(())
    }

    #[tracing::instrument(skip(self, ctx, cmd))]
    pub async fn update_borrow(
        &self,
        ctx: &Context,
        id: BorrowingId,
        cmd: UpdateBorrow,
    ) -> Result<()> {
        ctx.check_deadline()?;
        let update = cmd.validate()?;

        if self.store.fetch_borrow(id).await?.is_none() {
            return Err(DomainError::InvalidId {
                entity: "borrowing",
                id: id.as_i64(),
            });
        }

        if !self.store.book_exists(update.book_id).await? {
            return Err(DomainError::ReferenceNotFound {
                entity: "book",
                id: update.book_id.as_i64(),
            });
        }

        let user_known = peer_check(ctx, "user", self.users.user_exists(update.user_id)).await?;
        if !user_known {
            return Err(DomainError::ReferenceNotFound {
                entity: "user",
                id: update.user_id.as_i64(),
            });
        }

        ctx.check_deadline()?;
        if !self.store.update_borrow(id, update).await? {
            return Err(DomainError::InvalidId {
                entity: "borrowing",
                id: id.as_i64(),
            });
        }
        tracing::info!(borrowing_id = %id, "borrow updated");
        Ok(())
    }

    #[tracing::instrument(skip(self, ctx))]
    pub async fn get_borrow(&self, ctx: &Context, id: BorrowingId) -> Result<Borrowing> {
        ctx.check_deadline()?;
        self.store
            .fetch_borrow(id)
            .await?
            .ok_or(DomainError::NotFound {
                entity: "borrowing",
                id: id.as_i64(),
            })
    }

    /// Active (or returned) loans with ids in `[min, max]`.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn list_borrows(
        &self,
        ctx: &Context,
        returned: bool,
        min: i64,
        max: i64,
    ) -> Result<Vec<BorrowingSummary>> {
        ctx.check_deadline()?;
        Ok(self
            .store
            .list_borrows(returned, BorrowSelector::IdRange { min, max })
            .await?)
    }

    /// Loans borrowed within `[start, end]`, calendar-day granularity.
    #[tracing::instrument(skip(self, ctx))]
    pub async fn borrows_by_date(
        &self,
        ctx: &Context,
        returned: bool,
        start: &str,
        end: &str,
    ) -> Result<Vec<BorrowingSummary>> {
        ctx.check_deadline()?;
        let start = parse_date("start_date", start)?;
        let end = parse_date("end_date", end)?;
        Ok(self
            .store
            .list_borrows(returned, BorrowSelector::BorrowedBetween { start, end })
            .await?)
    }

    /// One user's loans. The user is peer-checked first so the caller can
    /// distinguish "no loans" from "no such user".
    #[tracing::instrument(skip(self, ctx))]
    pub async fn borrows_for_user(
        &self,
        ctx: &Context,
        returned: bool,
        user_id: UserId,
    ) -> Result<Vec<BorrowingSummary>> {
        let user_known = peer_check(ctx, "user", self.users.user_exists(user_id)).await?;
        if !user_known {
            return Err(DomainError::ReferenceNotFound {
                entity: "user",
                id: user_id.as_i64(),
            });
        }

        ctx.check_deadline()?;
        Ok(self
            .store
            .list_borrows(returned, BorrowSelector::User(user_id))
            .await?)
    }

    /// Active loans whose due date precedes their borrowed date (see
    /// [`super::is_overdue`] for why the baseline is not "today").
    #[tracing::instrument(skip(self, ctx))]
    pub async fn overdue(&self, ctx: &Context) -> Result<Vec<BorrowingSummary>> {
        ctx.check_deadline()?;
        Ok(self.store.list_overdue().await?)
    }

    // -- Peer checks issued by this domain --

    async fn check_category(&self, ctx: &Context, id: CategoryId) -> Result<()> {
        let known = peer_check(ctx, "category", self.categories.category_exists(id)).await?;
        if known {
            Ok(())
        } else {
            Err(DomainError::ReferenceNotFound {
                entity: "category",
                id: id.as_i64(),
            })
        }
    }

    async fn check_author(&self, ctx: &Context, id: AuthorId) -> Result<()> {
        let known = peer_check(ctx, "author", self.authors.author_exists(id)).await?;
        if known {
            Ok(())
        } else {
            Err(DomainError::ReferenceNotFound {
                entity: "author",
                id: id.as_i64(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use store::InMemoryLibraryStore;

    use super::*;
    use crate::peer::StubPeers;

    fn ctx() -> Context {
        let gate = auth::IdentityGate::new(b"library-test");
        let token = gate.issue("librarian", auth::TOKEN_TTL).unwrap();
        let identity = gate.verify(Some(&format!("Bearer {token}"))).unwrap();
        Context::new(identity)
    }

    fn service() -> (LibraryService<InMemoryLibraryStore>, StubPeers) {
        let peers = StubPeers::new();
        let shared = Arc::new(peers.clone());
        let service = LibraryService::new(
            InMemoryLibraryStore::new(),
            shared.clone(),
            shared.clone(),
            shared,
        );
        (service, peers)
    }

    fn book_cmd(stock: i32) -> CreateBook {
        CreateBook {
            title: "A Wizard of Earthsea".to_string(),
            author_id: AuthorId::new(1),
            category_id: CategoryId::new(1),
            published_date: Some("1968-11-01".to_string()),
            isbn: Some("978-0547773742".to_string()),
            total_stock: stock,
            available_stock: stock,
        }
    }

    fn seeded() -> (LibraryService<InMemoryLibraryStore>, StubPeers) {
        let (service, peers) = service();
        peers.add_author(AuthorId::new(1));
        peers.add_category(CategoryId::new(1));
        peers.add_user(UserId::new(1));
        (service, peers)
    }

    #[tokio::test]
    async fn create_book_with_missing_author_writes_nothing() {
        let (service, peers) = service();
        peers.add_category(CategoryId::new(1));
        // Author 7 does not exist anywhere.
        let cmd = CreateBook {
            author_id: AuthorId::new(7),
            ..book_cmd(3)
        };

        let err = service.create_book(&ctx(), cmd).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::ReferenceNotFound { entity: "author", id: 7 }
        ));
        assert!(service.list_books(&ctx(), 1, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_book_checks_category_before_author() {
        // Neither peer knows anything; the category failure must win.
        let (service, _) = service();
        let err = service.create_book(&ctx(), book_cmd(3)).await.unwrap_err();
        assert!(matches!(
            err,
            DomainError::ReferenceNotFound { entity: "category", .. }
        ));
    }

    #[tokio::test]
    async fn create_book_with_unreachable_peer_is_unavailable() {
        let (service, peers) = seeded();
        peers.set_unreachable(true);

        let err = service.create_book(&ctx(), book_cmd(3)).await.unwrap_err();
        assert!(matches!(err, DomainError::DependencyUnavailable { .. }));
        assert!(service.list_books(&ctx(), 1, 100).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn borrow_decrements_and_void_restocks() {
        let (service, _) = seeded();
        let book_id = service.create_book(&ctx(), book_cmd(3)).await.unwrap();

        let borrow_id = service
            .create_borrow(
                &ctx(),
                CreateBorrow {
                    book_id,
                    user_id: UserId::new(1),
                    due_date: "2030-01-01".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(
            service.get_book(&ctx(), book_id).await.unwrap().available_stock,
            2
        );

        service.delete_borrow(&ctx(), borrow_id).await.unwrap();
        assert_eq!(
            service.get_book(&ctx(), book_id).await.unwrap().available_stock,
            3
        );
    }

    #[tokio::test]
    async fn borrow_of_unknown_user_is_reference_not_found() {
        let (service, _) = seeded();
        let book_id = service.create_book(&ctx(), book_cmd(3)).await.unwrap();

        let err = service
            .create_borrow(
                &ctx(),
                CreateBorrow {
                    book_id,
                    user_id: UserId::new(42),
                    due_date: "2030-01-01".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::ReferenceNotFound { entity: "user", .. }
        ));
        assert_eq!(
            service.get_book(&ctx(), book_id).await.unwrap().available_stock,
            3
        );
    }

    #[tokio::test]
    async fn borrow_at_zero_stock_is_unavailable() {
        let (service, _) = seeded();
        let book_id = service.create_book(&ctx(), book_cmd(0)).await.unwrap();

        let err = service
            .create_borrow(
                &ctx(),
                CreateBorrow {
                    book_id,
                    user_id: UserId::new(1),
                    due_date: "2030-01-01".to_string(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::BookUnavailable(id) if id == book_id));
    }

    #[tokio::test]
    async fn return_closes_loan_without_restocking() {
        let (service, _) = seeded();
        let book_id = service.create_book(&ctx(), book_cmd(2)).await.unwrap();
        let borrow_id = service
            .create_borrow(
                &ctx(),
                CreateBorrow {
                    book_id,
                    user_id: UserId::new(1),
                    due_date: "2030-01-01".to_string(),
                },
            )
            .await
            .unwrap();

        service.create_return(&ctx(), borrow_id).await.unwrap();

        let borrow = service.get_borrow(&ctx(), borrow_id).await.unwrap();
        assert!(borrow.returned);
        assert!(borrow.returned_date.is_some());
        // Returning does not restock; only voiding the loan does.
        assert_eq!(
            service.get_book(&ctx(), book_id).await.unwrap().available_stock,
            1
        );
    }

    #[tokio::test]
    async fn second_return_of_same_loan_is_not_found() {
        let (service, _) = seeded();
        let book_id = service.create_book(&ctx(), book_cmd(2)).await.unwrap();
        let borrow_id = service
            .create_borrow(
                &ctx(),
                CreateBorrow {
                    book_id,
                    user_id: UserId::new(1),
                    due_date: "2030-01-01".to_string(),
                },
            )
            .await
            .unwrap();

        service.create_return(&ctx(), borrow_id).await.unwrap();
        let err = service.create_return(&ctx(), borrow_id).await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
        // Stock unchanged by either call.
        assert_eq!(
            service.get_book(&ctx(), book_id).await.unwrap().available_stock,
            1
        );
    }

    #[tokio::test]
    async fn void_restocks_even_after_return() {
        let (service, _) = seeded();
        let book_id = service.create_book(&ctx(), book_cmd(2)).await.unwrap();
        let borrow_id = service
            .create_borrow(
                &ctx(),
                CreateBorrow {
                    book_id,
                    user_id: UserId::new(1),
                    due_date: "2030-01-01".to_string(),
                },
            )
            .await
            .unwrap();
        service.create_return(&ctx(), borrow_id).await.unwrap();

        // The restock law holds regardless of the returned flag.
        service.delete_borrow(&ctx(), borrow_id).await.unwrap();
        assert_eq!(
            service.get_book(&ctx(), book_id).await.unwrap().available_stock,
            2
        );
    }

    #[tokio::test]
    async fn update_borrow_requires_consistent_flags() {
        let (service, _) = seeded();
        let book_id = service.create_book(&ctx(), book_cmd(2)).await.unwrap();
        let borrow_id = service
            .create_borrow(
                &ctx(),
                CreateBorrow {
                    book_id,
                    user_id: UserId::new(1),
                    due_date: "2030-01-01".to_string(),
                },
            )
            .await
            .unwrap();

        let err = service
            .update_borrow(
                &ctx(),
                borrow_id,
                UpdateBorrow {
                    book_id,
                    user_id: UserId::new(1),
                    borrowed_date: "2024-06-01".to_string(),
                    due_date: "2024-06-15".to_string(),
                    returned_date: None,
                    returned: true,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn overdue_lists_only_inverted_active_loans() {
        let (service, _) = seeded();
        let book_id = service.create_book(&ctx(), book_cmd(5)).await.unwrap();

        // Ordinary loan: due well in the future.
        service
            .create_borrow(
                &ctx(),
                CreateBorrow {
                    book_id,
                    user_id: UserId::new(1),
                    due_date: "2099-01-01".to_string(),
                },
            )
            .await
            .unwrap();
        // Inverted loan: due before today's borrowed_date.
        let odd = service
            .create_borrow(
                &ctx(),
                CreateBorrow {
                    book_id,
                    user_id: UserId::new(1),
                    due_date: "2000-01-01".to_string(),
                },
            )
            .await
            .unwrap();

        let overdue = service.overdue(&ctx()).await.unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, odd);
    }

    #[tokio::test]
    async fn borrows_for_unknown_user_is_reference_not_found() {
        let (service, _) = seeded();
        let err = service
            .borrows_for_user(&ctx(), false, UserId::new(9))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::ReferenceNotFound { entity: "user", .. }
        ));
    }

    #[tokio::test]
    async fn recommend_peer_checks_the_category() {
        let (service, _) = seeded();
        service.create_book(&ctx(), book_cmd(1)).await.unwrap();

        let picks = service
            .recommend(&ctx(), CategoryId::new(1), 5)
            .await
            .unwrap();
        assert_eq!(picks.len(), 1);

        let err = service
            .recommend(&ctx(), CategoryId::new(99), 5)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::ReferenceNotFound { entity: "category", .. }
        ));
    }
}
