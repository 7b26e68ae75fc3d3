use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::instrument;

use crate::application::ports::{JobDateField, JobStore, RepositoryError};
use crate::domain::{ErrorPayload, Hint, HintConfig, Job, JobId, JobStatus, NewJob};

const JOB_COLUMNS: &str = "id, url, status, config, hints, max_run_time, queued, started, \
     finished, error, messages_in_queue, log, webhint_version";

pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    #[instrument(skip(self, new_job), fields(url = %new_job.url))]
    async fn add(&self, new_job: NewJob) -> Result<Job, RepositoryError> {
        let job = Job::create(new_job);

        sqlx::query(
            r#"
            INSERT INTO jobs (id, url, status, config, hints, max_run_time, queued, started,
                              finished, error, messages_in_queue, log, webhint_version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(&job.url)
        .bind(job.status.as_str())
        .bind(Json(&job.config))
        .bind(Json(&job.hints))
        .bind(to_db_int(job.max_run_time)?)
        .bind(job.queued)
        .bind(job.started)
        .bind(job.finished)
        .bind(Json(&job.error))
        .bind(job.messages_in_queue.map(to_db_int).transpose()?)
        .bind(&job.log)
        .bind(&job.webhint_version)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        Ok(job)
    }

    #[instrument(skip(self), fields(job_id = %id))]
    async fn get(&self, id: JobId) -> Result<Option<Job>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        row.as_ref().map(job_from_row).transpose()
    }

    #[instrument(skip(self))]
    async fn get_latest_by_url(&self, url: &str) -> Result<Vec<Job>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE url = $1 ORDER BY queued DESC LIMIT 1"
        ))
        .bind(url)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(job_from_row).collect()
    }

    #[instrument(skip(self), fields(field = field.as_str()))]
    async fn get_by_date_range(
        &self,
        field: JobDateField,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Job>, RepositoryError> {
        let column = field.as_str();
        let rows = sqlx::query(&format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE {column} >= $1 AND {column} < $2 ORDER BY {column}"
        ))
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        rows.iter().map(job_from_row).collect()
    }

    #[instrument(skip(self, job), fields(job_id = %job.id, status = %job.status))]
    async fn update(&self, job: &Job) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE jobs
            SET status = $2, config = $3, hints = $4, max_run_time = $5, started = $6,
                finished = $7, error = $8, messages_in_queue = $9, log = $10,
                webhint_version = $11
            WHERE id = $1
            "#,
        )
        .bind(job.id.as_uuid())
        .bind(job.status.as_str())
        .bind(Json(&job.config))
        .bind(Json(&job.hints))
        .bind(to_db_int(job.max_run_time)?)
        .bind(job.started)
        .bind(job.finished)
        .bind(Json(&job.error))
        .bind(job.messages_in_queue.map(to_db_int).transpose()?)
        .bind(&job.log)
        .bind(&job.webhint_version)
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::QueryFailed(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(job.id.to_string()));
        }
        Ok(())
    }
}

fn to_db_int(value: u64) -> Result<i64, RepositoryError> {
    i64::try_from(value).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn from_db_int(value: i64) -> Result<u64, RepositoryError> {
    u64::try_from(value).map_err(|e| RepositoryError::Serialization(e.to_string()))
}

fn job_from_row(row: &PgRow) -> Result<Job, RepositoryError> {
    let query_failed = |e: sqlx::Error| RepositoryError::QueryFailed(e.to_string());

    let status = row
        .try_get::<String, _>("status")
        .map_err(query_failed)?
        .parse::<JobStatus>()
        .map_err(RepositoryError::QueryFailed)?;

    let Json(config) = row
        .try_get::<Json<Vec<HintConfig>>, _>("config")
        .map_err(query_failed)?;
    let Json(hints) = row
        .try_get::<Json<Vec<Hint>>, _>("hints")
        .map_err(query_failed)?;
    let Json(error) = row
        .try_get::<Json<Vec<ErrorPayload>>, _>("error")
        .map_err(query_failed)?;

    let messages_in_queue = row
        .try_get::<Option<i64>, _>("messages_in_queue")
        .map_err(query_failed)?
        .map(from_db_int)
        .transpose()?;

    Ok(Job {
        id: JobId::from_uuid(row.try_get("id").map_err(query_failed)?),
        url: row.try_get("url").map_err(query_failed)?,
        status,
        config,
        hints,
        max_run_time: from_db_int(row.try_get("max_run_time").map_err(query_failed)?)?,
        queued: row.try_get("queued").map_err(query_failed)?,
        started: row.try_get("started").map_err(query_failed)?,
        finished: row.try_get("finished").map_err(query_failed)?,
        error,
        messages_in_queue,
        log: row.try_get("log").map_err(query_failed)?,
        webhint_version: row.try_get("webhint_version").map_err(query_failed)?,
    })
}
