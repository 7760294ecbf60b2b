//! In-memory transport for tests/dev.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::warn;

use super::types::{DEFAULT_MAX_DELIVERIES, MessageId, MessageStatus, QueuedMessage};
use super::{JobQueue, JobSource, QueueError};
use crate::config::QueueOptions;
use crate::descriptor::MigrationJob;

/// In-memory multi-queue transport.
///
/// - Stores the JSON wire payload, so every job really is encoded and decoded
/// - FIFO per queue name, by enqueue time
/// - Acknowledged messages are dropped
/// - Rejected messages are redelivered immediately, up to `max_deliveries`,
///   then parked in a dead-letter list
/// - No persistence; at-least-once only within this process
#[derive(Debug)]
pub struct InMemoryJobQueue {
    messages: RwLock<HashMap<MessageId, QueuedMessage>>,
    dead_letters: RwLock<Vec<QueuedMessage>>,
    max_deliveries: u32,
}

fn poisoned() -> QueueError {
    QueueError::Storage("lock poisoned".to_string())
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::with_max_deliveries(DEFAULT_MAX_DELIVERIES)
    }
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every message is delivered at least once, whatever `max_deliveries` says.
    pub fn with_max_deliveries(max_deliveries: u32) -> Self {
        Self {
            messages: RwLock::new(HashMap::new()),
            dead_letters: RwLock::new(Vec::new()),
            max_deliveries: max_deliveries.max(1),
        }
    }

    pub fn arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn max_deliveries(&self) -> u32 {
        self.max_deliveries
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<MessageId, QueuedMessage>>, QueueError> {
        self.messages.read().map_err(|_| poisoned())
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<MessageId, QueuedMessage>>, QueueError> {
        self.messages.write().map_err(|_| poisoned())
    }

    /// Insert an already-built message as received from elsewhere.
    ///
    /// The payload is stored as-is, without checking it decodes to a job.
    pub fn inject(&self, message: QueuedMessage) -> Result<MessageId, QueueError> {
        let id = message.id;
        self.write()?.insert(id, message);
        Ok(id)
    }

    /// Unsettled messages on `queue_name`, oldest first.
    pub fn messages(&self, queue_name: &str) -> Result<Vec<QueuedMessage>, QueueError> {
        let mut result: Vec<_> = self
            .read()?
            .values()
            .filter(|m| m.queue_name == queue_name)
            .cloned()
            .collect();
        result.sort_by_key(|m| (m.enqueued_at, m.id.as_uuid().as_u128()));
        Ok(result)
    }

    /// Messages on `queue_name` that ran out of deliveries, in the order they died.
    pub fn dead_letters(&self, queue_name: &str) -> Result<Vec<QueuedMessage>, QueueError> {
        Ok(self
            .dead_letters
            .read()
            .map_err(|_| poisoned())?
            .iter()
            .filter(|m| m.queue_name == queue_name)
            .cloned()
            .collect())
    }
}

impl JobQueue for InMemoryJobQueue {
    fn enqueue(
        &self,
        queue_name: &str,
        job: &MigrationJob,
        options: &QueueOptions,
    ) -> Result<MessageId, QueueError> {
        let payload = serde_json::to_value(job).map_err(|e| QueueError::Encode(e.to_string()))?;
        self.inject(QueuedMessage::new(queue_name, payload, options.clone()))
    }
}

impl JobSource for InMemoryJobQueue {
    fn claim_next(&self, queue_name: &str) -> Result<Option<QueuedMessage>, QueueError> {
        let mut messages = self.write()?;

        let next = messages
            .values()
            .filter(|m| m.queue_name == queue_name && m.status == MessageStatus::Pending)
            .min_by_key(|m| (m.enqueued_at, m.id.as_uuid().as_u128()))
            .map(|m| m.id);

        Ok(next.and_then(|id| {
            messages.get_mut(&id).map(|message| {
                message.mark_running();
                message.clone()
            })
        }))
    }

    fn acknowledge(&self, message_id: MessageId) -> Result<(), QueueError> {
        self.write()?
            .remove(&message_id)
            .map(|_| ())
            .ok_or(QueueError::NotFound(message_id))
    }

    fn reject(&self, message_id: MessageId, reason: String) -> Result<(), QueueError> {
        let mut messages = self.write()?;
        let message = messages
            .get_mut(&message_id)
            .ok_or(QueueError::NotFound(message_id))?;
        message.mark_rejected(reason, self.max_deliveries);

        if message.status == MessageStatus::DeadLettered {
            if let Some(message) = messages.remove(&message_id) {
                warn!(
                    message_id = %message_id,
                    attempts = message.attempt,
                    reason = message.last_error.as_deref().unwrap_or_default(),
                    "message dead-lettered"
                );
                self.dead_letters
                    .write()
                    .map_err(|_| poisoned())?
                    .push(message);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn job(identifier: &str) -> MigrationJob {
        MigrationJob::new(identifier, "up").unwrap()
    }

    #[test]
    fn enqueue_stores_the_wire_payload_and_options() {
        let queue = InMemoryJobQueue::new();
        let mut options = QueueOptions::new();
        options.insert("bar".to_string(), json!("baz"));

        let id = queue.enqueue("fooQueue", &job("42"), &options).unwrap();
        let stored = queue.messages("fooQueue").unwrap();

        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);
        assert_eq!(stored[0].payload, json!({"identifier": "42", "direction": "up"}));
        assert_eq!(stored[0].options, options);
        assert_eq!(stored[0].status, MessageStatus::Pending);
    }

    #[test]
    fn claims_fifo_per_queue() {
        let queue = InMemoryJobQueue::new();
        let first = queue.enqueue("a", &job("1"), &QueueOptions::new()).unwrap();
        let other = queue.enqueue("b", &job("2"), &QueueOptions::new()).unwrap();
        let second = queue.enqueue("a", &job("3"), &QueueOptions::new()).unwrap();

        assert_eq!(queue.claim_next("a").unwrap().unwrap().id, first);
        assert_eq!(queue.claim_next("a").unwrap().unwrap().id, second);
        assert!(queue.claim_next("a").unwrap().is_none());

        let claimed = queue.claim_next("b").unwrap().unwrap();
        assert_eq!(claimed.id, other);
        assert_eq!(claimed.attempt, 1);
        assert_eq!(claimed.status, MessageStatus::Running);
    }

    #[test]
    fn acknowledged_messages_are_dropped() {
        let queue = InMemoryJobQueue::new();
        let id = queue.enqueue("q", &job("1"), &QueueOptions::new()).unwrap();

        queue.claim_next("q").unwrap().unwrap();
        queue.acknowledge(id).unwrap();

        assert!(queue.messages("q").unwrap().is_empty());
        assert!(queue.claim_next("q").unwrap().is_none());
        assert!(matches!(queue.acknowledge(id), Err(QueueError::NotFound(m)) if m == id));
    }

    #[test]
    fn rejected_messages_are_redelivered_then_dead_lettered() {
        let queue = InMemoryJobQueue::with_max_deliveries(2);
        let id = queue.enqueue("q", &job("1"), &QueueOptions::new()).unwrap();

        queue.claim_next("q").unwrap().unwrap();
        queue.reject(id, "unknown migration".to_string()).unwrap();

        let again = queue.claim_next("q").unwrap().unwrap();
        assert_eq!(again.id, id);
        assert_eq!(again.attempt, 2);
        assert_eq!(again.last_error.as_deref(), Some("unknown migration"));
        queue.reject(id, "still unknown".to_string()).unwrap();

        assert!(queue.messages("q").unwrap().is_empty());
        assert!(queue.claim_next("q").unwrap().is_none());

        let dead = queue.dead_letters("q").unwrap();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].status, MessageStatus::DeadLettered);
        assert_eq!(dead[0].last_error.as_deref(), Some("still unknown"));
        assert!(queue.dead_letters("other").unwrap().is_empty());
    }

    #[test]
    fn at_least_one_delivery_is_always_allowed() {
        let queue = InMemoryJobQueue::with_max_deliveries(0);
        assert_eq!(queue.max_deliveries(), 1);

        let id = queue.enqueue("q", &job("1"), &QueueOptions::new()).unwrap();
        assert!(queue.claim_next("q").unwrap().is_some());
        queue.reject(id, "nope".to_string()).unwrap();
        assert_eq!(queue.dead_letters("q").unwrap().len(), 1);
    }

    #[test]
    fn settling_an_unknown_message_fails() {
        let queue = InMemoryJobQueue::new();
        let id = MessageId::new();
        assert!(matches!(queue.acknowledge(id), Err(QueueError::NotFound(m)) if m == id));
        assert!(matches!(
            queue.reject(id, "x".to_string()),
            Err(QueueError::NotFound(_))
        ));
    }
}
