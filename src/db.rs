use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::PostgresConfig;
use crate::error::Result;

/// Connect a Postgres pool from config.
///
/// Callers acquire a pool per operation and drop it when done rather than
/// holding one long-lived connection across requests.
pub async fn connect(config: &PostgresConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.url)
        .await?;

    Ok(pool)
}
