//! HTTP surface and composition root for the library lending system.
//!
//! This crate only translates requests: paths and bodies become typed
//! domain commands, domain errors become status codes. All integrity
//! logic lives in the `domain` crate. The bearer middleware runs every
//! protected route through the identity gate once; registration and token
//! issuance are the only open endpoints besides health and metrics.

pub mod config;
pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::routing::{get, post};
use axum::{Extension, Router};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::IdentityGate;
use domain::{
    AuthorDirectoryHandle, AuthorService, CategoryDirectoryHandle, CategoryService,
    LibraryService, LibraryUsageHandle, UserDirectoryHandle, UserService,
};
use store::{
    AuthorStore, CategoryStore, InMemoryAuthorStore, InMemoryCategoryStore, InMemoryLibraryStore,
    InMemoryUserStore, LibraryStore, UserStore,
};

/// Shared application state: one service per domain.
pub struct AppState<U: UserStore, A: AuthorStore, C: CategoryStore, L: LibraryStore> {
    pub users: Arc<UserService<U>>,
    pub authors: Arc<AuthorService<A>>,
    pub categories: Arc<CategoryService<C>>,
    pub library: Arc<LibraryService<L>>,
}

impl<U: UserStore, A: AuthorStore, C: CategoryStore, L: LibraryStore> Clone
    for AppState<U, A, C, L>
{
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            authors: self.authors.clone(),
            categories: self.categories.clone(),
            library: self.library.clone(),
        }
    }
}

impl<U: UserStore, A: AuthorStore, C: CategoryStore, L: LibraryStore>
    FromRef<AppState<U, A, C, L>> for Arc<UserService<U>>
{
    fn from_ref(state: &AppState<U, A, C, L>) -> Self {
        state.users.clone()
    }
}

impl<U: UserStore, A: AuthorStore, C: CategoryStore, L: LibraryStore>
    FromRef<AppState<U, A, C, L>> for Arc<AuthorService<A>>
{
    fn from_ref(state: &AppState<U, A, C, L>) -> Self {
        state.authors.clone()
    }
}

impl<U: UserStore, A: AuthorStore, C: CategoryStore, L: LibraryStore>
    FromRef<AppState<U, A, C, L>> for Arc<CategoryService<C>>
{
    fn from_ref(state: &AppState<U, A, C, L>) -> Self {
        state.categories.clone()
    }
}

impl<U: UserStore, A: AuthorStore, C: CategoryStore, L: LibraryStore>
    FromRef<AppState<U, A, C, L>> for Arc<LibraryService<L>>
{
    fn from_ref(state: &AppState<U, A, C, L>) -> Self {
        state.library.clone()
    }
}

/// Builds the application router.
///
/// `/health`, `/metrics`, `/auth/token` and user registration stay open;
/// everything else passes the identity gate first.
pub fn create_app<U, A, C, L>(
    gate: IdentityGate,
    state: AppState<U, A, C, L>,
    metrics_handle: PrometheusHandle,
) -> Router
where
    U: UserStore + 'static,
    A: AuthorStore + 'static,
    C: CategoryStore + 'static,
    L: LibraryStore + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let protected = Router::new()
        .route(
            "/users/{id}",
            get(routes::users::get::<U>).delete(routes::users::delete::<U>),
        )
        .route(
            "/authors",
            post(routes::authors::create::<A>).get(routes::authors::list::<A>),
        )
        .route("/authors/search", get(routes::authors::search::<A>))
        .route(
            "/authors/{id}",
            get(routes::authors::get::<A>)
                .put(routes::authors::update::<A>)
                .delete(routes::authors::delete::<A>),
        )
        .route(
            "/categories",
            post(routes::categories::create::<C>).get(routes::categories::list::<C>),
        )
        .route("/categories/search", get(routes::categories::search::<C>))
        .route(
            "/categories/{id}",
            get(routes::categories::get::<C>)
                .put(routes::categories::update::<C>)
                .delete(routes::categories::delete::<C>),
        )
        .route(
            "/books",
            post(routes::books::create::<L>).get(routes::books::list::<L>),
        )
        .route("/books/search", get(routes::books::search::<L>))
        .route("/books/by-date", get(routes::books::by_date::<L>))
        .route("/books/recommendations", get(routes::books::recommend::<L>))
        .route(
            "/books/{id}",
            get(routes::books::get::<L>)
                .put(routes::books::update::<L>)
                .delete(routes::books::delete::<L>),
        )
        .route(
            "/borrowings",
            post(routes::borrowings::create::<L>).get(routes::borrowings::list::<L>),
        )
        .route("/borrowings/by-date", get(routes::borrowings::by_date::<L>))
        .route(
            "/borrowings/by-user/{id}",
            get(routes::borrowings::by_user::<L>),
        )
        .route("/borrowings/overdue", get(routes::borrowings::overdue::<L>))
        .route(
            "/borrowings/{id}",
            get(routes::borrowings::get::<L>)
                .put(routes::borrowings::update::<L>)
                .delete(routes::borrowings::delete::<L>),
        )
        .route(
            "/borrowings/{id}/return",
            post(routes::borrowings::record_return::<L>),
        )
        .layer(axum::middleware::from_fn(middleware::require_identity));

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/auth/token", post(routes::token::issue))
        .route("/users", post(routes::users::register::<U>))
        .merge(protected)
        .with_state(state)
        .merge(metrics_router)
        .layer(Extension(gate))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires all four domains over in-memory stores, with each domain's peer
/// handle backed by the owning store — the same topology production uses,
/// minus Postgres. Used by tests and local experimentation.
pub fn create_memory_state()
-> AppState<InMemoryUserStore, InMemoryAuthorStore, InMemoryCategoryStore, InMemoryLibraryStore> {
    let user_store = InMemoryUserStore::new();
    let author_store = InMemoryAuthorStore::new();
    let category_store = InMemoryCategoryStore::new();
    let library_store = InMemoryLibraryStore::new();

    let library_usage = Arc::new(LibraryUsageHandle::new(library_store.clone()));

    AppState {
        users: Arc::new(UserService::new(user_store.clone(), library_usage.clone())),
        authors: Arc::new(AuthorService::new(author_store.clone(), library_usage.clone())),
        categories: Arc::new(CategoryService::new(category_store.clone(), library_usage)),
        library: Arc::new(LibraryService::new(
            library_store,
            Arc::new(UserDirectoryHandle::new(user_store)),
            Arc::new(AuthorDirectoryHandle::new(author_store)),
            Arc::new(CategoryDirectoryHandle::new(category_store)),
        )),
    }
}
