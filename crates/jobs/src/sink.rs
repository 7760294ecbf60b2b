//! Destinations for contained migration failures.

use std::sync::{Arc, Mutex};

use tracing::error;

/// Records business failures that were contained by the executor.
///
/// Fire-and-forget: recording must not fail or block the worker.
pub trait ErrorSink: Send + Sync {
    fn record(&self, failure: anyhow::Error);
}

impl<S> ErrorSink for Arc<S>
where
    S: ErrorSink + ?Sized,
{
    fn record(&self, failure: anyhow::Error) {
        (**self).record(failure)
    }
}

impl<S> ErrorSink for &S
where
    S: ErrorSink + ?Sized,
{
    fn record(&self, failure: anyhow::Error) {
        (**self).record(failure)
    }
}

/// Logs failures (with their cause chain) through `tracing`.
#[derive(Debug, Default, Copy, Clone)]
pub struct TracingErrorSink;

impl ErrorSink for TracingErrorSink {
    fn record(&self, failure: anyhow::Error) {
        error!(error = %failure, chain = ?failure, "async migration failed");
    }
}

/// Keeps failures in memory for inspection (tests, diagnostics).
#[derive(Debug, Default)]
pub struct MemoryErrorSink {
    failures: Mutex<Vec<anyhow::Error>>,
}

impl MemoryErrorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.failures.lock().map(|f| f.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Display form of each recorded failure, oldest first.
    pub fn messages(&self) -> Vec<String> {
        self.failures
            .lock()
            .map(|f| f.iter().map(|e| e.to_string()).collect())
            .unwrap_or_default()
    }

    /// Drain the recorded failures.
    pub fn take(&self) -> Vec<anyhow::Error> {
        self.failures
            .lock()
            .map(|mut f| std::mem::take(&mut *f))
            .unwrap_or_default()
    }
}

impl ErrorSink for MemoryErrorSink {
    fn record(&self, failure: anyhow::Error) {
        // A poisoned lock only drops the record; recording never fails.
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(failure);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_failures_in_order() {
        let sink = MemoryErrorSink::new();
        sink.record(anyhow::anyhow!("first"));
        sink.record(anyhow::anyhow!("second"));

        assert_eq!(sink.messages(), vec!["first", "second"]);
        assert_eq!(sink.take().len(), 2);
        assert!(sink.is_empty());
    }

    #[test]
    fn tracing_sink_accepts_failures() {
        TracingErrorSink.record(anyhow::anyhow!("logged").context("outer"));
    }
}
