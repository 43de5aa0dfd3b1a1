//! Initial store connection with bounded retry.
//!
//! Retry applies to the startup handshake only; per-request queries are
//! never retried here.

use std::time::Duration;

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::error::{Result, StoreError};

/// Opens a pool against `url`, retrying the handshake up to `attempts`
/// times with `delay` between tries.
pub async fn connect_with_retry(
    database: &str,
    url: &str,
    attempts: u32,
    delay: Duration,
) -> Result<PgPool> {
    let mut last_err = None;

    for attempt in 1..=attempts {
        match PgPoolOptions::new().max_connections(5).connect(url).await {
            Ok(pool) => {
                tracing::info!(database, attempt, "connected to store");
                return Ok(pool);
            }
            Err(e) => {
                tracing::warn!(database, attempt, error = %e, "store connection failed");
                last_err = Some(e);
                if attempt < attempts {
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    Err(StoreError::Connect {
        database: database.to_string(),
        attempts,
        source: last_err.unwrap_or(sqlx::Error::PoolClosed),
    })
}
