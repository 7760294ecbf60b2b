//! Queue message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::config::QueueOptions;

/// Deliveries a message gets before the in-memory queue parks it.
pub const DEFAULT_MAX_DELIVERIES: u32 = 3;

/// Unique message identifier assigned by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Delivery state of a queued message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Waiting to be claimed
    Pending,
    /// Claimed by a worker, not yet settled
    Running,
    /// Rejected on its last allowed delivery
    DeadLettered,
}

/// A job payload as held by a transport.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedMessage {
    pub id: MessageId,
    pub queue_name: String,
    /// Encoded [`MigrationJob`](crate::MigrationJob), decoded only by the consumer
    pub payload: JsonValue,
    pub options: QueueOptions,
    pub status: MessageStatus,
    /// Deliveries so far
    pub attempt: u32,
    /// Reason given by the most recent rejection
    pub last_error: Option<String>,
    pub enqueued_at: DateTime<Utc>,
}

impl QueuedMessage {
    pub fn new(queue_name: impl Into<String>, payload: JsonValue, options: QueueOptions) -> Self {
        Self {
            id: MessageId::new(),
            queue_name: queue_name.into(),
            payload,
            options,
            status: MessageStatus::Pending,
            attempt: 0,
            last_error: None,
            enqueued_at: Utc::now(),
        }
    }

    pub fn mark_running(&mut self) {
        self.status = MessageStatus::Running;
        self.attempt += 1;
    }

    /// Settle a failed delivery: back to pending, or dead once `max_deliveries` is reached.
    pub fn mark_rejected(&mut self, reason: String, max_deliveries: u32) {
        self.status = if self.attempt < max_deliveries {
            MessageStatus::Pending
        } else {
            MessageStatus::DeadLettered
        };
        self.last_error = Some(reason);
    }
}
