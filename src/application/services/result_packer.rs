use serde::Serialize;

use crate::application::ports::{MessageQueue, QueueError};
use crate::domain::{HintStatus, QueueMessage, ResultMessage};

/// Serialized size limit of the results transport.
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 220 * 1024;

/// Splits result messages so each one fits the transport's size limit.
#[derive(Debug, Clone, Copy)]
pub struct ResultPacker {
    max_message_size: usize,
}

impl Default for ResultPacker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_SIZE)
    }
}

impl ResultPacker {
    pub fn new(max_message_size: usize) -> Self {
        Self { max_message_size }
    }

    /// Greedy packing from the last hint to the first. A hint that cannot fit
    /// a message on its own is reduced to a single placeholder finding.
    pub fn pack(&self, message: ResultMessage) -> Result<Vec<ResultMessage>, QueueError> {
        if envelope_size(&message)? <= self.max_message_size {
            return Ok(vec![message]);
        }

        let mut current = message;
        let mut remaining = std::mem::take(&mut current.hints);
        let base_size = envelope_size(&current)?;

        let mut packed = Vec::new();

        while let Some(mut hint) = remaining.pop() {
            let mut hint_size = serialized_size(&hint)?;
            if with_hint(base_size, 0, hint_size) > self.max_message_size {
                tracing::warn!(hint = %hint.name, size = hint_size, "Hint exceeds message size, truncating");
                hint.truncate_messages();
                hint_size = serialized_size(&hint)?;
            }

            let current_size = envelope_size(&current)?;
            if !current.hints.is_empty()
                && with_hint(current_size, current.hints.len(), hint_size) > self.max_message_size
            {
                let full_hints = std::mem::take(&mut current.hints);
                let mut full = current.clone();
                full.hints = full_hints;
                packed.push(full);
                current.hints.push(hint);
            } else {
                current.hints.push(hint);
            }
        }

        if !current.hints.is_empty() {
            packed.push(current);
        }

        Ok(packed)
    }

    /// Packs and sends `message`, returning how many messages went out.
    pub async fn deliver(
        &self,
        queue: &dyn MessageQueue,
        message: ResultMessage,
    ) -> Result<usize, QueueError> {
        let parts = self.pack(message)?;
        let count = parts.len();
        for part in parts {
            self.send_with_truncation(queue, part).await?;
        }
        Ok(count)
    }

    /// Sends once; on a size-limit rejection truncates every reported hint
    /// and sends again.
    pub async fn send_with_truncation(
        &self,
        queue: &dyn MessageQueue,
        mut message: ResultMessage,
    ) -> Result<(), QueueError> {
        tracing::debug!(
            job_id = %message.job_id,
            status = %message.status,
            hints = message.hints.len(),
            "Sending result message"
        );

        match queue.send(&QueueMessage::Result(message.clone())).await {
            Ok(()) => Ok(()),
            Err(e) if e.is_size_limit() => {
                tracing::warn!(job_id = %message.job_id, error = %e, "Result rejected as too large, truncating hints");
                for hint in message
                    .hints
                    .iter_mut()
                    .filter(|h| !matches!(h.status, HintStatus::Pending | HintStatus::Pass))
                {
                    hint.truncate_messages();
                }
                queue.send(&QueueMessage::Result(message)).await
            }
            Err(e) => Err(e),
        }
    }
}

/// Envelope size after appending a hint; every hint after the first also
/// costs its array separator.
fn with_hint(envelope: usize, hints: usize, hint_size: usize) -> usize {
    envelope + hint_size + usize::from(hints > 0)
}

fn serialized_size<T: Serialize>(value: &T) -> Result<usize, QueueError> {
    serde_json::to_vec(value)
        .map(|bytes| bytes.len())
        .map_err(|e| QueueError::Serialization(e.to_string()))
}

/// Borrowed twin of `QueueMessage::Result`; serializes identically.
#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
enum EnvelopeRef<'a> {
    Result(&'a ResultMessage),
}

/// Size of the message as the queue will see it.
pub fn envelope_size(message: &ResultMessage) -> Result<usize, QueueError> {
    serialized_size(&EnvelopeRef::Result(message))
}
