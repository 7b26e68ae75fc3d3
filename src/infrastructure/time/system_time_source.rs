use chrono::{DateTime, Utc};

use crate::application::ports::TimeSource;

/// Local clock. Used when no network time service is configured.
pub struct SystemTimeSource;

#[async_trait::async_trait]
impl TimeSource for SystemTimeSource {
    async fn now(&self) -> Option<DateTime<Utc>> {
        Some(Utc::now())
    }
}
