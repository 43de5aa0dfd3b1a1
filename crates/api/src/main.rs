//! API server entry point and composition root.
//!
//! Owns the four store connections, the peer handles wired between the
//! domains, and their explicit shutdown. Peer handles are constructed
//! here and injected; no component reaches for process-global state.

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api::config::Config;
use auth::IdentityGate;
use domain::{
    AuthorDirectoryHandle, AuthorService, CategoryDirectoryHandle, CategoryService,
    LibraryService, LibraryUsageHandle, UserDirectoryHandle, UserService,
};
use store::{
    PostgresAuthorStore, PostgresCategoryStore, PostgresLibraryStore, PostgresUserStore,
    connect_with_retry,
};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. One pool per domain store; retry applies to the handshake only
    let user_pool = connect_with_retry(
        "user",
        &config.user_database_url,
        config.connect_attempts,
        config.connect_delay,
    )
    .await
    .expect("user store unreachable");
    let author_pool = connect_with_retry(
        "author",
        &config.author_database_url,
        config.connect_attempts,
        config.connect_delay,
    )
    .await
    .expect("author store unreachable");
    let category_pool = connect_with_retry(
        "category",
        &config.category_database_url,
        config.connect_attempts,
        config.connect_delay,
    )
    .await
    .expect("category store unreachable");
    let library_pool = connect_with_retry(
        "library",
        &config.library_database_url,
        config.connect_attempts,
        config.connect_delay,
    )
    .await
    .expect("library store unreachable");

    let user_store = PostgresUserStore::new(user_pool.clone());
    let author_store = PostgresAuthorStore::new(author_pool.clone());
    let category_store = PostgresCategoryStore::new(category_pool.clone());
    let library_store = PostgresLibraryStore::new(library_pool.clone());

    user_store.run_migrations().await.expect("user migrations failed");
    author_store
        .run_migrations()
        .await
        .expect("author migrations failed");
    category_store
        .run_migrations()
        .await
        .expect("category migrations failed");
    library_store
        .run_migrations()
        .await
        .expect("library migrations failed");

    // 4. Peer handles: each domain's read surface, injected into the others
    let library_usage = Arc::new(LibraryUsageHandle::new(library_store.clone()));

    let state = api::AppState {
        users: Arc::new(UserService::new(user_store.clone(), library_usage.clone())),
        authors: Arc::new(AuthorService::new(
            author_store.clone(),
            library_usage.clone(),
        )),
        categories: Arc::new(CategoryService::new(category_store.clone(), library_usage)),
        library: Arc::new(LibraryService::new(
            library_store,
            Arc::new(UserDirectoryHandle::new(user_store)),
            Arc::new(AuthorDirectoryHandle::new(author_store)),
            Arc::new(CategoryDirectoryHandle::new(category_store)),
        )),
    };

    // 5. Identity gate and application router
    let gate = IdentityGate::new(config.jwt_secret.as_bytes());
    let app = api::create_app(gate, state, metrics_handle);

    // 6. Serve until a shutdown signal arrives
    let addr = config.addr();
    tracing::info!(%addr, "starting API server");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 7. Explicit store shutdown
    user_pool.close().await;
    author_pool.close().await;
    category_pool.close().await;
    library_pool.close().await;

    tracing::info!("server shut down gracefully");
}
