use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::application::ports::{DistributedLock, LockError, LockHandle};

struct Entry {
    code: Uuid,
    expires_at: DateTime<Utc>,
}

/// Lock table held in process memory. Same ownership and expiry rules as the
/// Postgres lock, scoped to a single instance.
pub struct InMemoryDistributedLock {
    ttl: Duration,
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryDistributedLock {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub async fn is_held(&self, key: &str) -> bool {
        let entries = self.entries.lock().await;
        entries
            .get(key)
            .is_some_and(|entry| entry.expires_at > Utc::now())
    }
}

#[async_trait::async_trait]
impl DistributedLock for InMemoryDistributedLock {
    async fn try_acquire(&self, key: &str) -> Result<Option<LockHandle>, LockError> {
        let now = Utc::now();
        let ttl = chrono::Duration::from_std(self.ttl)
            .map_err(|e| LockError::Backend(e.to_string()))?;

        let mut entries = self.entries.lock().await;
        if entries.get(key).is_some_and(|entry| entry.expires_at > now) {
            return Ok(None);
        }

        let handle = LockHandle {
            key: key.to_string(),
            code: Uuid::new_v4(),
            expires_at: now + ttl,
        };
        entries.insert(
            key.to_string(),
            Entry {
                code: handle.code,
                expires_at: handle.expires_at,
            },
        );
        Ok(Some(handle))
    }

    async fn release(&self, handle: &LockHandle) -> Result<(), LockError> {
        let mut entries = self.entries.lock().await;
        if entries
            .get(&handle.key)
            .is_some_and(|entry| entry.code == handle.code)
        {
            entries.remove(&handle.key);
        } else {
            tracing::warn!(key = %handle.key, "Lock no longer owned by this handle");
        }
        Ok(())
    }
}
