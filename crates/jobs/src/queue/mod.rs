//! Queue transport boundary.
//!
//! Producers see [`JobQueue`] (enqueue only); workers see [`JobSource`]
//! (claim, acknowledge, reject). Delivery guarantees, redelivery and
//! dead-lettering belong to the transport behind these traits, never to the
//! dispatch or execution code.

pub mod in_memory;
pub mod types;

use std::sync::Arc;

use crate::config::QueueOptions;
use crate::descriptor::MigrationJob;

pub use in_memory::InMemoryJobQueue;
pub use types::{DEFAULT_MAX_DELIVERIES, MessageId, MessageStatus, QueuedMessage};

/// Transport-level failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum QueueError {
    #[error("failed to encode job payload: {0}")]
    Encode(String),
    #[error("message not found: {0}")]
    NotFound(MessageId),
    #[error("queue storage error: {0}")]
    Storage(String),
}

/// Producer side of the transport.
pub trait JobQueue: Send + Sync {
    /// Submit a job to `queue_name`; `options` are transport-specific.
    fn enqueue(
        &self,
        queue_name: &str,
        job: &MigrationJob,
        options: &QueueOptions,
    ) -> Result<MessageId, QueueError>;
}

/// Consumer side of the transport.
pub trait JobSource: Send + Sync {
    /// Claim the next ready message on `queue_name`, if any.
    fn claim_next(&self, queue_name: &str) -> Result<Option<QueuedMessage>, QueueError>;

    /// The message was processed; it will not be delivered again.
    fn acknowledge(&self, message_id: MessageId) -> Result<(), QueueError>;

    /// The message could not be processed; the transport decides on redelivery.
    fn reject(&self, message_id: MessageId, reason: String) -> Result<(), QueueError>;
}

impl<Q> JobQueue for Arc<Q>
where
    Q: JobQueue + ?Sized,
{
    fn enqueue(
        &self,
        queue_name: &str,
        job: &MigrationJob,
        options: &QueueOptions,
    ) -> Result<MessageId, QueueError> {
        (**self).enqueue(queue_name, job, options)
    }
}

impl<S> JobSource for Arc<S>
where
    S: JobSource + ?Sized,
{
    fn claim_next(&self, queue_name: &str) -> Result<Option<QueuedMessage>, QueueError> {
        (**self).claim_next(queue_name)
    }

    fn acknowledge(&self, message_id: MessageId) -> Result<(), QueueError> {
        (**self).acknowledge(message_id)
    }

    fn reject(&self, message_id: MessageId, reason: String) -> Result<(), QueueError> {
        (**self).reject(message_id, reason)
    }
}
