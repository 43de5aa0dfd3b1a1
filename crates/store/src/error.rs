use thiserror::Error;

/// Errors raised by a domain store handle.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A query or transaction against the store failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Running the domain's migrations failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// The initial connection handshake never succeeded.
    #[error("failed to connect to {database} after {attempts} attempts: {source}")]
    Connect {
        database: String,
        attempts: u32,
        source: sqlx::Error,
    },

    /// The store rejected the operation (used by test doubles).
    #[error("store failure: {0}")]
    Failed(String),
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
