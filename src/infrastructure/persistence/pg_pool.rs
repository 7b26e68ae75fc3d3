use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, instrument};

use crate::application::ports::RepositoryError;
use crate::application::services::{RetryPolicy, retry};

#[instrument(skip(url))]
pub async fn create_pool(url: &str, max_connections: u32) -> Result<PgPool, RepositoryError> {
    let policy = RetryPolicy::new(5, Duration::from_millis(500));

    let pool = retry(policy, |_| async {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
    })
    .await
    .map_err(|e| RepositoryError::ConnectionFailed(e.to_string()))?;

    info!("PostgreSQL connection pool established");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    info!("Running database migrations");
    sqlx::migrate!()
        .run(pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;
    info!("Migrations complete");
    Ok(())
}
