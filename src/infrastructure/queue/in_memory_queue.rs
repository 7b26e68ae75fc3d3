use tokio::sync::{Mutex, RwLock, mpsc};

use crate::application::ports::{MessageQueue, QueueError};
use crate::domain::QueueMessage;

/// Bounded in-process queue. Messages cross it serialized, so the size limit
/// applies to the same JSON a broker would see.
pub struct InMemoryQueue {
    name: String,
    max_message_size: usize,
    sender: RwLock<Option<mpsc::Sender<String>>>,
    receiver: Mutex<mpsc::Receiver<String>>,
}

impl InMemoryQueue {
    pub fn new(name: impl Into<String>, capacity: usize, max_message_size: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            name: name.into(),
            max_message_size,
            sender: RwLock::new(Some(sender)),
            receiver: Mutex::new(receiver),
        }
    }
}

#[async_trait::async_trait]
impl MessageQueue for InMemoryQueue {
    async fn send(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let body =
            serde_json::to_string(message).map_err(|e| QueueError::Serialization(e.to_string()))?;

        if body.len() > self.max_message_size {
            return Err(QueueError::PayloadTooLarge {
                size: body.len(),
                limit: self.max_message_size,
            });
        }

        let sender = self.sender.read().await.clone().ok_or(QueueError::Closed)?;
        sender.send(body).await.map_err(|_| QueueError::Closed)?;

        tracing::debug!(queue = %self.name, job_id = %message.job_id(), "Message enqueued");
        Ok(())
    }

    async fn receive(&self) -> Result<Option<QueueMessage>, QueueError> {
        let body = self.receiver.lock().await.recv().await;
        match body {
            Some(body) => serde_json::from_str(&body)
                .map(Some)
                .map_err(|e| QueueError::Serialization(e.to_string())),
            None => Ok(None),
        }
    }

    async fn messages_count(&self) -> Result<u64, QueueError> {
        let sender = self.sender.read().await;
        Ok(sender
            .as_ref()
            .map(|s| (s.max_capacity() - s.capacity()) as u64)
            .unwrap_or(0))
    }

    /// Pending messages stay receivable; `receive` returns `None` once drained.
    async fn close(&self) {
        self.sender.write().await.take();
        tracing::info!(queue = %self.name, "Queue closed");
    }
}
