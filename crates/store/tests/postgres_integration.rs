//! PostgreSQL integration tests for the library store.
//!
//! These tests use a shared PostgreSQL container for efficiency.
//! Run with:
//!
//! ```bash
//! cargo test -p store --test postgres_integration -- --test-threads=1
//! ```

use std::sync::Arc;

use chrono::NaiveDate;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use serial_test::serial;
use tokio::sync::OnceCell;

use common::{AuthorId, CategoryId, UserId};
use store::{
    BorrowSelector, LibraryStore, NewBook, NewBorrow, NewUser, PostgresLibraryStore,
    PostgresUserStore, UserStore,
};

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            // Both domains share the container but not tables; run both
            // migration sets once up front.
            let temp_pool = PgPool::connect(&connection_string).await.unwrap();
            PostgresUserStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            PostgresLibraryStore::new(temp_pool.clone())
                .run_migrations()
                .await
                .unwrap();
            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Fresh pool and cleared tables per test.
async fn get_test_stores() -> (PostgresUserStore, PostgresLibraryStore) {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE users, books, borrowings RESTART IDENTITY")
        .execute(&pool)
        .await
        .unwrap();

    (
        PostgresUserStore::new(pool.clone()),
        PostgresLibraryStore::new(pool),
    )
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn new_book(stock: i32) -> NewBook {
    NewBook {
        title: "The Dispossessed".to_string(),
        author_id: AuthorId::new(1),
        category_id: CategoryId::new(1),
        published_date: Some(date(1974, 5, 1)),
        isbn: None,
        total_stock: stock,
        available_stock: stock,
    }
}

fn new_borrow(book_id: common::BookId, user_id: UserId) -> NewBorrow {
    NewBorrow {
        book_id,
        user_id,
        borrowed_date: date(2024, 6, 1),
        due_date: date(2024, 6, 15),
    }
}

#[tokio::test]
#[serial]
async fn user_roundtrip_and_existence() {
    let (users, _) = get_test_stores().await;

    let id = users
        .insert(NewUser {
            username: "shevek".to_string(),
            credential_hash: "$stub$".to_string(),
            first_name: None,
            last_name: None,
            email: "shevek@example.com".to_string(),
            role: "member".to_string(),
        })
        .await
        .unwrap();

    assert!(users.exists(id).await.unwrap());
    assert!(users.username_taken("shevek").await.unwrap());
    assert!(!users.username_taken("takver").await.unwrap());

    let user = users.fetch(id).await.unwrap().unwrap();
    assert_eq!(user.username, "shevek");

    assert!(users.delete(id).await.unwrap());
    assert!(!users.exists(id).await.unwrap());
    assert!(!users.delete(id).await.unwrap());
}

#[tokio::test]
#[serial]
async fn borrow_decrement_and_restock_are_transactional() {
    let (_, library) = get_test_stores().await;

    let book_id = library.insert_book(new_book(3)).await.unwrap();
    let borrow_id = library
        .insert_borrow(new_borrow(book_id, UserId::new(1)))
        .await
        .unwrap()
        .unwrap();

    let book = library.fetch_book(book_id).await.unwrap().unwrap();
    assert_eq!(book.available_stock, 2);

    assert!(library.delete_borrow(borrow_id).await.unwrap());
    let book = library.fetch_book(book_id).await.unwrap().unwrap();
    assert_eq!(book.available_stock, 3);
}

#[tokio::test]
#[serial]
async fn exhausted_stock_refuses_the_borrow_without_a_row() {
    let (_, library) = get_test_stores().await;

    let book_id = library.insert_book(new_book(1)).await.unwrap();
    assert!(
        library
            .insert_borrow(new_borrow(book_id, UserId::new(1)))
            .await
            .unwrap()
            .is_some()
    );
    assert!(
        library
            .insert_borrow(new_borrow(book_id, UserId::new(2)))
            .await
            .unwrap()
            .is_none()
    );

    let active = library
        .list_borrows(false, BorrowSelector::IdRange { min: 1, max: 100 })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);

    let book = library.fetch_book(book_id).await.unwrap().unwrap();
    assert_eq!(book.available_stock, 0);
}

#[tokio::test]
#[serial]
async fn concurrent_borrows_of_the_last_copy_admit_exactly_one() {
    let (_, library) = get_test_stores().await;

    let book_id = library.insert_book(new_book(1)).await.unwrap();

    let l1 = library.clone();
    let l2 = library.clone();
    let (a, b) = tokio::join!(
        l1.insert_borrow(new_borrow(book_id, UserId::new(1))),
        l2.insert_borrow(new_borrow(book_id, UserId::new(2))),
    );
    let winners = [a.unwrap(), b.unwrap()]
        .into_iter()
        .flatten()
        .count();
    assert_eq!(winners, 1);

    let book = library.fetch_book(book_id).await.unwrap().unwrap();
    assert_eq!(book.available_stock, 0);
}

#[tokio::test]
#[serial]
async fn return_transition_is_single_shot_and_keeps_the_pairing() {
    let (_, library) = get_test_stores().await;

    let book_id = library.insert_book(new_book(1)).await.unwrap();
    let borrow_id = library
        .insert_borrow(new_borrow(book_id, UserId::new(1)))
        .await
        .unwrap()
        .unwrap();

    assert!(library.mark_returned(borrow_id, date(2024, 6, 10)).await.unwrap());
    assert!(!library.mark_returned(borrow_id, date(2024, 6, 11)).await.unwrap());

    let borrow = library.fetch_borrow(borrow_id).await.unwrap().unwrap();
    assert!(borrow.returned);
    assert_eq!(borrow.returned_date, Some(date(2024, 6, 10)));

    // Returning never restocks.
    let book = library.fetch_book(book_id).await.unwrap().unwrap();
    assert_eq!(book.available_stock, 0);
}

#[tokio::test]
#[serial]
async fn usage_facts_answer_for_peer_domains() {
    let (_, library) = get_test_stores().await;

    let book_id = library.insert_book(new_book(2)).await.unwrap();

    assert!(library.any_book_with_author(AuthorId::new(1)).await.unwrap());
    assert!(!library.any_book_with_author(AuthorId::new(2)).await.unwrap());
    assert!(library.any_book_with_category(CategoryId::new(1)).await.unwrap());

    let borrow_id = library
        .insert_borrow(new_borrow(book_id, UserId::new(9)))
        .await
        .unwrap()
        .unwrap();
    assert!(library.any_active_borrow_for_user(UserId::new(9)).await.unwrap());

    library.mark_returned(borrow_id, date(2024, 6, 10)).await.unwrap();
    // Returned loans stop counting against the user.
    assert!(!library.any_active_borrow_for_user(UserId::new(9)).await.unwrap());
}

#[tokio::test]
#[serial]
async fn overdue_query_matches_the_inverted_date_rule() {
    let (_, library) = get_test_stores().await;

    let book_id = library.insert_book(new_book(5)).await.unwrap();
    library
        .insert_borrow(new_borrow(book_id, UserId::new(1)))
        .await
        .unwrap()
        .unwrap();
    let odd = library
        .insert_borrow(NewBorrow {
            book_id,
            user_id: UserId::new(2),
            borrowed_date: date(2024, 6, 20),
            due_date: date(2024, 6, 5),
        })
        .await
        .unwrap()
        .unwrap();

    let overdue = library.list_overdue().await.unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0].id, odd);
}

#[tokio::test]
#[serial]
async fn borrow_listings_split_by_flag_and_selector() {
    let (_, library) = get_test_stores().await;

    let book_id = library.insert_book(new_book(5)).await.unwrap();
    let first = library
        .insert_borrow(new_borrow(book_id, UserId::new(1)))
        .await
        .unwrap()
        .unwrap();
    let second = library
        .insert_borrow(NewBorrow {
            book_id,
            user_id: UserId::new(2),
            borrowed_date: date(2024, 7, 1),
            due_date: date(2024, 7, 15),
        })
        .await
        .unwrap()
        .unwrap();
    library.mark_returned(first, date(2024, 6, 10)).await.unwrap();

    let active = library
        .list_borrows(false, BorrowSelector::IdRange { min: 1, max: 100 })
        .await
        .unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second);

    let returned_june = library
        .list_borrows(
            true,
            BorrowSelector::BorrowedBetween {
                start: date(2024, 6, 1),
                end: date(2024, 6, 30),
            },
        )
        .await
        .unwrap();
    assert_eq!(returned_june.len(), 1);
    assert_eq!(returned_june[0].id, first);

    let for_user = library
        .list_borrows(false, BorrowSelector::User(UserId::new(2)))
        .await
        .unwrap();
    assert_eq!(for_user.len(), 1);
}
