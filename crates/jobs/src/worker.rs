//! Queue worker driving [`ExecuteMigrationJob`].
//!
//! One worker processes one message at a time and keeps no shared mutable
//! state besides its statistics. Two workers may claim duplicates of the same
//! job under at-least-once delivery; each runs it independently.

use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use migq_core::MigrationRegistry;

use crate::executor::{ExecuteError, ExecuteMigrationJob, JobOutcome};
use crate::queue::{JobSource, MessageId, QueueError};
use crate::sink::ErrorSink;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Queue to consume
    pub queue_name: String,
    /// Sleep between polls when the queue is empty
    pub poll_interval: Duration,
    /// Thread name, also used in logs
    pub name: String,
}

impl WorkerConfig {
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            poll_interval: Duration::from_millis(100),
            name: "migration-worker".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}

/// What happened to one claimed message.
#[derive(Debug)]
pub enum Processed {
    /// Executed and acknowledged (possibly with a contained failure).
    Acknowledged {
        message_id: MessageId,
        outcome: JobOutcome,
    },
    /// Not executable (bad payload, unknown migration, wrong type); handed
    /// back to the transport, which decides on redelivery.
    Rejected {
        message_id: MessageId,
        error: ExecuteError,
    },
}

/// Worker runtime statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct WorkerStats {
    pub messages_processed: u64,
    pub jobs_completed: u64,
    pub failures_contained: u64,
    pub messages_rejected: u64,
    pub uptime_secs: u64,
}

impl WorkerStats {
    fn observe(&mut self, processed: &Processed) {
        self.messages_processed += 1;
        match processed {
            Processed::Acknowledged { outcome, .. } => {
                self.jobs_completed += 1;
                if outcome.failure_contained() {
                    self.failures_contained += 1;
                }
            }
            Processed::Rejected { .. } => self.messages_rejected += 1,
        }
    }
}

/// Handle to control a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    shutdown: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
    stats: Arc<Mutex<WorkerStats>>,
}

impl WorkerHandle {
    /// Request graceful shutdown and wait for the current message to finish.
    pub fn shutdown(mut self) {
        let _ = self.shutdown.send(());
        if let Some(j) = self.join.take() {
            let _ = j.join();
        }
    }

    pub fn stats(&self) -> WorkerStats {
        self.stats.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

/// Consumes migration jobs from a [`JobSource`].
pub struct JobWorker<Q, R, S> {
    source: Q,
    registry: R,
    sink: S,
}

impl<Q, R, S> JobWorker<Q, R, S>
where
    Q: JobSource,
    R: MigrationRegistry,
    S: ErrorSink,
{
    pub fn new(source: Q, registry: R, sink: S) -> Self {
        Self {
            source,
            registry,
            sink,
        }
    }

    /// Claim and process at most one message from `queue_name`.
    ///
    /// Only transport errors are returned; everything about the job itself
    /// is reported through [`Processed`].
    pub fn process_next(&self, queue_name: &str) -> Result<Option<Processed>, QueueError> {
        let Some(message) = self.source.claim_next(queue_name)? else {
            return Ok(None);
        };
        debug!(message_id = %message.id, attempt = message.attempt, "claimed message");

        let initialized = ExecuteMigrationJob::from_payload(&message.payload).and_then(|job| {
            job.initialize(&self.registry).map_err(ExecuteError::from)
        });

        let processed = match initialized {
            Ok(job) => {
                let outcome = job.execute(&self.sink);
                self.source.acknowledge(message.id)?;
                Processed::Acknowledged {
                    message_id: message.id,
                    outcome,
                }
            }
            Err(error) => {
                warn!(message_id = %message.id, error = %error, "rejecting migration job");
                self.source.reject(message.id, error.to_string())?;
                Processed::Rejected {
                    message_id: message.id,
                    error,
                }
            }
        };

        Ok(Some(processed))
    }

    /// Process messages until the queue has nothing ready.
    pub fn drain(&self, queue_name: &str) -> Result<Vec<Processed>, QueueError> {
        let mut processed = Vec::new();
        while let Some(p) = self.process_next(queue_name)? {
            processed.push(p);
        }
        Ok(processed)
    }
}

impl<Q, R, S> JobWorker<Q, R, S>
where
    Q: JobSource + 'static,
    R: MigrationRegistry + 'static,
    S: ErrorSink + 'static,
{
    /// Run the worker on a background thread.
    pub fn spawn(self, config: WorkerConfig) -> std::io::Result<WorkerHandle> {
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let stats = Arc::new(Mutex::new(WorkerStats::default()));
        let stats_clone = stats.clone();

        let join = thread::Builder::new()
            .name(config.name.clone())
            .spawn(move || worker_loop(self, config, shutdown_rx, stats_clone))?;

        Ok(WorkerHandle {
            shutdown: shutdown_tx,
            join: Some(join),
            stats,
        })
    }
}

fn worker_loop<Q, R, S>(
    worker: JobWorker<Q, R, S>,
    config: WorkerConfig,
    shutdown_rx: mpsc::Receiver<()>,
    stats: Arc<Mutex<WorkerStats>>,
) where
    Q: JobSource,
    R: MigrationRegistry,
    S: ErrorSink,
{
    info!(worker = %config.name, queue = %config.queue_name, "migration worker started");
    let start_time = Instant::now();

    loop {
        if !matches!(shutdown_rx.try_recv(), Err(mpsc::TryRecvError::Empty)) {
            break;
        }

        let result = worker.process_next(&config.queue_name);

        if let Ok(mut s) = stats.lock() {
            s.uptime_secs = start_time.elapsed().as_secs();
            if let Ok(Some(processed)) = &result {
                s.observe(processed);
            }
        }

        match result {
            Ok(Some(_)) => {}
            Ok(None) => thread::sleep(config.poll_interval),
            Err(e) => {
                error!(worker = %config.name, error = %e, "failed to process message");
                thread::sleep(config.poll_interval);
            }
        }
    }

    info!(worker = %config.name, "migration worker stopped");
}
