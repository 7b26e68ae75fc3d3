use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{RepositoryError, ServiceConfigStore};
use crate::domain::{HintConfig, ServiceConfig};

pub struct PgServiceConfigStore {
    pool: PgPool,
}

impl PgServiceConfigStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceConfigStore for PgServiceConfigStore {
    #[instrument(skip(self, config), fields(name = %config.name))]
    async fn add(&self, config: &ServiceConfig) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO service_configs (name, active, job_cache_time, job_run_time, webhint_configs)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&config.name)
        .bind(config.active)
        .bind(seconds_to_db(config.job_cache_time)?)
        .bind(seconds_to_db(config.job_run_time)?)
        .bind(Json(&config.webhint_configs))
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                RepositoryError::ConstraintViolation(db.to_string())
            }
            other => RepositoryError::QueryFailed(other.to_string()),
        })?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn get(&self, name: &str) -> Result<Option<ServiceConfig>, RepositoryError> {
        let row = sqlx::query(
            "SELECT name, active, job_cache_time, job_run_time, webhint_configs \
             FROM service_configs WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(config_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn get_active(&self) -> Result<Option<ServiceConfig>, RepositoryError> {
        let row = sqlx::query(
            "SELECT name, active, job_cache_time, job_run_time, webhint_configs \
             FROM service_configs WHERE active LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(config_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn list(&self) -> Result<Vec<ServiceConfig>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT name, active, job_cache_time, job_run_time, webhint_configs \
             FROM service_configs ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(config_from_row).collect()
    }

    /// Two independent statements, no transaction.
    #[instrument(skip(self))]
    async fn activate(&self, name: &str) -> Result<ServiceConfig, RepositoryError> {
        sqlx::query("UPDATE service_configs SET active = FALSE WHERE active AND name <> $1")
            .bind(name)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        let row = sqlx::query(
            "UPDATE service_configs SET active = TRUE WHERE name = $1 \
             RETURNING name, active, job_cache_time, job_run_time, webhint_configs",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        match row {
            Some(row) => config_from_row(&row),
            None => Err(RepositoryError::NotFound(format!("service config {name}"))),
        }
    }
}

fn seconds_to_db(value: u64) -> Result<i64, RepositoryError> {
    i64::try_from(value).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn config_from_row(row: &PgRow) -> Result<ServiceConfig, RepositoryError> {
    let query_failed = |e: sqlx::Error| RepositoryError::QueryFailed(e.to_string());
    let seconds = |column: &str| -> Result<u64, RepositoryError> {
        let value: i64 = row.try_get(column).map_err(query_failed)?;
        u64::try_from(value).map_err(|e| RepositoryError::Serialization(e.to_string()))
    };

    let Json(webhint_configs) = row
        .try_get::<Json<Vec<HintConfig>>, _>("webhint_configs")
        .map_err(query_failed)?;

    Ok(ServiceConfig {
        name: row.try_get("name").map_err(query_failed)?,
        active: row.try_get("active").map_err(query_failed)?,
        job_cache_time: seconds("job_cache_time")?,
        job_run_time: seconds("job_run_time")?,
        webhint_configs,
    })
}
