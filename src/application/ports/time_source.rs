use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
pub trait TimeSource: Send + Sync {
    /// Trusted current time, or `None` when the source is unavailable.
    async fn now(&self) -> Option<DateTime<Utc>>;
}
