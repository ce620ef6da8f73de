//! Worker abstraction and runner for pipeline stages.
//!
//! Every stage follows the same loop: dequeue with a bounded wait, invoke
//! the stage logic, forward any output, and exit on the cancellation flag or
//! the queue sentinel. A fatal error cancels the whole pipeline.

use crate::defaults::QUEUE_POLL;
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::error::{ErrorReporter, WorkerError};
use crate::pipeline::queue::{Dequeued, StageReceiver, StageSender};
use std::thread::{self, JoinHandle};
use std::sync::Arc;

/// A processing worker for one pipeline stage.
///
/// Workers run in their own threads and are connected by stage queues.
pub trait Worker: Send + 'static {
    /// The input type this worker receives.
    type Input: Send + 'static;
    /// The output type this worker produces.
    type Output: Send + 'static;

    /// Processes a single input unit.
    ///
    /// Returns:
    /// - `Ok(Some(output))` - processed and produced output
    /// - `Ok(None)` - processed but nothing to forward (skipped unit)
    /// - `Err(WorkerError)` - processing failed
    fn process(&mut self, input: Self::Input) -> Result<Option<Self::Output>, WorkerError>;

    /// Name of this worker for logging and error reporting.
    fn name(&self) -> &'static str;

    /// Called once when the worker loop exits.
    fn shutdown(&mut self) {}
}

/// Runs a worker in a dedicated thread.
pub struct WorkerRunner {
    handle: Option<JoinHandle<()>>,
    worker_name: &'static str,
}

impl WorkerRunner {
    /// Spawns a worker thread wired between two stage queues.
    pub fn spawn<W: Worker>(
        mut worker: W,
        input: StageReceiver<W::Input>,
        output: StageSender<W::Output>,
        cancel: CancelToken,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        let worker_name = worker.name();

        let handle = thread::spawn(move || {
            Self::run_worker(&mut worker, input, output, cancel, reporter);
        });

        Self {
            handle: Some(handle),
            worker_name,
        }
    }

    fn run_worker<W: Worker>(
        worker: &mut W,
        input: StageReceiver<W::Input>,
        output: StageSender<W::Output>,
        cancel: CancelToken,
        reporter: Arc<dyn ErrorReporter>,
    ) {
        let name = worker.name();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match input.recv_timeout(QUEUE_POLL) {
                Dequeued::Item(unit) => match worker.process(unit) {
                    Ok(Some(out)) => {
                        if !output.send(out) {
                            // Consumer gone; nothing left to do.
                            break;
                        }
                    }
                    Ok(None) => {
                        // Skipped unit (silence, empty transcript, ...)
                    }
                    Err(WorkerError::Recoverable(msg)) => {
                        reporter.report(name, &WorkerError::Recoverable(msg));
                    }
                    Err(WorkerError::Fatal(msg)) => {
                        reporter.report(name, &WorkerError::Fatal(msg));
                        // One dead stage must stop the whole pipeline.
                        cancel.cancel();
                        break;
                    }
                },
                Dequeued::Sentinel => {
                    // Propagate end-of-input downstream before exiting.
                    output.close();
                    break;
                }
                Dequeued::Empty => {
                    // Timeout: loop back and re-check the cancel flag.
                }
                Dequeued::Disconnected => {
                    // Producer died without a sentinel.
                    break;
                }
            }
        }

        worker.shutdown();
    }

    /// Waits for the worker thread to complete.
    pub fn join(mut self) -> Result<(), String> {
        if let Some(handle) = self.handle.take() {
            handle
                .join()
                .map_err(|_| format!("Worker '{}' thread panicked", self.worker_name))
        } else {
            Ok(())
        }
    }

    /// Takes the underlying thread handle for timed joining.
    pub fn into_handle(mut self) -> Option<JoinHandle<()>> {
        self.handle.take()
    }

    /// True once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |h| h.is_finished())
    }

    /// Returns the name of the worker.
    pub fn name(&self) -> &'static str {
        self.worker_name
    }
}
