//! Dispatch configuration.

use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

/// Transport options attached to every enqueued job.
///
/// Passed through to the queue untouched; nothing in this crate interprets them.
pub type QueueOptions = Map<String, JsonValue>;

/// Environment variable holding the queue name.
pub const ENV_QUEUE_NAME: &str = "MIGQ_QUEUE_NAME";
/// Environment variable holding the queue options as a JSON object.
pub const ENV_QUEUE_OPTIONS: &str = "MIGQ_QUEUE_OPTIONS";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("no \"queueName\" given for async migrations")]
    MissingQueueConfiguration,

    #[error("invalid async migration settings: {0}")]
    InvalidSettings(String),
}

/// Where and how async migrations are queued.
///
/// Immutable once built; every constructor rejects a missing or empty queue name.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchConfig {
    queue_name: String,
    queue_options: QueueOptions,
}

impl DispatchConfig {
    pub fn new(queue_name: impl Into<String>) -> Result<Self, ConfigError> {
        let queue_name = queue_name.into();
        if queue_name.trim().is_empty() {
            return Err(ConfigError::MissingQueueConfiguration);
        }
        Ok(Self {
            queue_name,
            queue_options: QueueOptions::new(),
        })
    }

    pub fn with_options(mut self, queue_options: QueueOptions) -> Self {
        self.queue_options = queue_options;
        self
    }

    /// Read `queueName` / `queueOptions` from a settings object.
    pub fn from_settings(settings: &JsonValue) -> Result<Self, ConfigError> {
        let queue_name = match settings.get("queueName") {
            Some(JsonValue::String(name)) => name.clone(),
            Some(JsonValue::Null) | None => return Err(ConfigError::MissingQueueConfiguration),
            Some(other) => {
                return Err(ConfigError::InvalidSettings(format!(
                    "\"queueName\" must be a string, got {other}"
                )));
            }
        };

        let queue_options = match settings.get("queueOptions") {
            Some(JsonValue::Object(options)) => options.clone(),
            Some(JsonValue::Null) | None => QueueOptions::new(),
            Some(other) => {
                return Err(ConfigError::InvalidSettings(format!(
                    "\"queueOptions\" must be an object, got {other}"
                )));
            }
        };

        Ok(Self::new(queue_name)?.with_options(queue_options))
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read the configuration through `lookup` (environment-style keys).
    pub fn from_env_with<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let queue_name = lookup(ENV_QUEUE_NAME).ok_or(ConfigError::MissingQueueConfiguration)?;

        let queue_options = match lookup(ENV_QUEUE_OPTIONS) {
            Some(raw) if !raw.trim().is_empty() => match serde_json::from_str(&raw) {
                Ok(JsonValue::Object(options)) => options,
                Ok(other) => {
                    return Err(ConfigError::InvalidSettings(format!(
                        "{ENV_QUEUE_OPTIONS} must be a JSON object, got {other}"
                    )));
                }
                Err(e) => {
                    return Err(ConfigError::InvalidSettings(format!(
                        "{ENV_QUEUE_OPTIONS}: {e}"
                    )));
                }
            },
            _ => QueueOptions::new(),
        };

        Ok(Self::new(queue_name)?.with_options(queue_options))
    }

    pub fn queue_name(&self) -> &str {
        &self.queue_name
    }

    pub fn queue_options(&self) -> &QueueOptions {
        &self.queue_options
    }
}
