//! Error types and reporting for pipeline workers.

use crate::pipeline::events::{EventSender, PipelineEvent};
use std::fmt;

/// Errors that can occur while a worker processes one unit.
#[derive(Debug, Clone)]
pub enum WorkerError {
    /// Recoverable error: log, skip the unit, keep the loop running.
    Recoverable(String),
    /// Fatal error: the whole pipeline must drain and stop.
    Fatal(String),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerError::Recoverable(msg) => write!(f, "Recoverable error: {}", msg),
            WorkerError::Fatal(msg) => write!(f, "Fatal error: {}", msg),
        }
    }
}

impl std::error::Error for WorkerError {}

/// Trait for reporting worker errors.
pub trait ErrorReporter: Send + Sync {
    /// Reports an error from a worker.
    fn report(&self, worker: &str, error: &WorkerError);
}

/// Default error reporter backed by the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReporter;

impl ErrorReporter for LogReporter {
    fn report(&self, worker: &str, error: &WorkerError) {
        match error {
            WorkerError::Recoverable(_) => log::warn!("[{}] {}", worker, error),
            WorkerError::Fatal(_) => log::error!("[{}] {}", worker, error),
        }
    }
}

/// Reporter that logs and also publishes the error as a pipeline event so
/// presentation layers can show it.
pub struct EventReporter {
    events: EventSender,
}

impl EventReporter {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

impl ErrorReporter for EventReporter {
    fn report(&self, worker: &str, error: &WorkerError) {
        LogReporter.report(worker, error);
        self.events.emit(PipelineEvent::Error {
            stage: worker.to_string(),
            message: error.to_string(),
        });
    }
}
