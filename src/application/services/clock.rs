use chrono::{DateTime, Utc};

use crate::application::ports::TimeSource;

/// Current time from `source`, falling back to the local clock, and never
/// earlier than `floor`.
pub async fn consistent_time(
    source: &dyn TimeSource,
    floor: Option<DateTime<Utc>>,
) -> DateTime<Utc> {
    let now = match source.now().await {
        Some(t) => t,
        None => {
            tracing::debug!("Time source unavailable, using local clock");
            Utc::now()
        }
    };

    match floor {
        Some(floor) if now < floor => floor,
        _ => now,
    }
}
