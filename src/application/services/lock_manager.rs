use std::sync::Arc;

use crate::application::ports::{DistributedLock, LockError, LockHandle};

use super::retry::{RetryPolicy, retry};

/// Acquires named locks with bounded retry and releases them.
#[derive(Clone)]
pub struct LockManager {
    backend: Arc<dyn DistributedLock>,
    policy: RetryPolicy,
}

impl LockManager {
    pub fn new(backend: Arc<dyn DistributedLock>, policy: RetryPolicy) -> Self {
        Self { backend, policy }
    }

    #[tracing::instrument(skip(self))]
    pub async fn acquire(&self, key: &str) -> Result<LockHandle, LockError> {
        let result = retry(self.policy, |attempt| async move {
            match self.backend.try_acquire(key).await? {
                Some(handle) => Ok(handle),
                None => Err(LockError::NotAcquired {
                    key: key.to_string(),
                    attempts: attempt,
                }),
            }
        })
        .await;

        match &result {
            Ok(_) => tracing::debug!(key, "Lock acquired"),
            Err(e) => tracing::error!(key, error = %e, "Lock not acquired"),
        }

        result
    }

    pub async fn release(&self, handle: &LockHandle) -> Result<(), LockError> {
        tracing::debug!(key = %handle.key, "Releasing lock");
        self.backend.release(handle).await
    }

    /// Releases `handle` after the guarded work finished. A release failure
    /// only surfaces when the work itself succeeded.
    pub async fn release_after<T, E>(&self, handle: LockHandle, outcome: Result<T, E>) -> Result<T, E>
    where
        E: From<LockError>,
    {
        match self.release(&handle).await {
            Ok(()) => outcome,
            Err(release_error) => {
                tracing::error!(key = %handle.key, error = %release_error, "Failed to release lock");
                match outcome {
                    Ok(_) => Err(release_error.into()),
                    Err(e) => Err(e),
                }
            }
        }
    }
}
