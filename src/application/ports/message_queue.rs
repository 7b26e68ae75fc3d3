use async_trait::async_trait;

use crate::domain::QueueMessage;

/// Text some transports return on a generic bad-request when the body is over the limit.
pub const BODY_TOO_LARGE_MESSAGE: &str = "The body of the message is too large.";

#[async_trait]
pub trait MessageQueue: Send + Sync {
    async fn send(&self, message: &QueueMessage) -> Result<(), QueueError>;

    /// Next message, or `None` once the queue is closed and drained.
    async fn receive(&self) -> Result<Option<QueueMessage>, QueueError>;

    /// Approximate depth; advisory only.
    async fn messages_count(&self) -> Result<u64, QueueError>;

    async fn close(&self);
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("message of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("queue closed")]
    Closed,
    #[error("queue unavailable: {0}")]
    Unavailable(String),
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl QueueError {
    /// Rejections that truncating the payload can fix.
    pub fn is_size_limit(&self) -> bool {
        match self {
            QueueError::PayloadTooLarge { .. } => true,
            QueueError::BadRequest(message) => message.contains(BODY_TOO_LARGE_MESSAGE),
            _ => false,
        }
    }
}
