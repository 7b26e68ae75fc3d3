use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Proof of ownership for an acquired lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockHandle {
    pub key: String,
    pub code: Uuid,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait DistributedLock: Send + Sync {
    /// Single attempt. `Ok(None)` when another owner holds an unexpired lock.
    async fn try_acquire(&self, key: &str) -> Result<Option<LockHandle>, LockError>;

    /// Releases the lock only if `handle.code` still owns it.
    async fn release(&self, handle: &LockHandle) -> Result<(), LockError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock not acquired for key {key} after {attempts} attempts")]
    NotAcquired { key: String, attempts: u32 },
    #[error("lock backend failed: {0}")]
    Backend(String),
}
