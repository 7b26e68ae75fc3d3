use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use crate::application::ports::{DistributedLock, LockError, LockHandle};

/// Lock rows in the shared `locks` table. An expired row may be taken over by
/// any caller; release only deletes the row while the acquisition code matches.
pub struct PgDistributedLock {
    pool: PgPool,
    ttl: Duration,
}

impl PgDistributedLock {
    pub fn new(pool: PgPool, ttl: Duration) -> Self {
        Self { pool, ttl }
    }
}

#[async_trait]
impl DistributedLock for PgDistributedLock {
    #[instrument(skip(self))]
    async fn try_acquire(&self, key: &str) -> Result<Option<LockHandle>, LockError> {
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| LockError::Backend(e.to_string()))?;
        let code = Uuid::new_v4();
        let expires_at = Utc::now() + ttl;

        let row = sqlx::query(
            r#"
            INSERT INTO locks (key, code, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (key) DO UPDATE
                SET code = EXCLUDED.code, expires_at = EXCLUDED.expires_at
                WHERE locks.expires_at < NOW()
            RETURNING code, expires_at
            "#,
        )
        .bind(key)
        .bind(code)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| LockError::Backend(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let code: Uuid = row
            .try_get("code")
            .map_err(|e| LockError::Backend(e.to_string()))?;
        let expires_at: DateTime<Utc> = row
            .try_get("expires_at")
            .map_err(|e| LockError::Backend(e.to_string()))?;

        Ok(Some(LockHandle {
            key: key.to_string(),
            code,
            expires_at,
        }))
    }

    #[instrument(skip(self, handle), fields(key = %handle.key))]
    async fn release(&self, handle: &LockHandle) -> Result<(), LockError> {
        let result = sqlx::query("DELETE FROM locks WHERE key = $1 AND code = $2")
            .bind(&handle.key)
            .bind(handle.code)
            .execute(&self.pool)
            .await
            .map_err(|e| LockError::Backend(e.to_string()))?;

        if result.rows_affected() == 0 {
            tracing::warn!("Lock no longer owned by this handle");
        }
        Ok(())
    }
}
