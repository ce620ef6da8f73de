//! Pipeline supervisor: wires the stages together and owns their lifecycle.
//!
//! The supervisor spawns one thread per stage (capture, recognition,
//! translation, synthesis, mixing) connected by bounded queues. End of input
//! drains through the queues as a sentinel; cancellation short-circuits every
//! stage within one poll interval. Shutdown joins each thread with a bounded
//! wait and detaches stragglers rather than hanging the process.

use crate::audio::accumulator::{ChunkAccumulator, ChunkAccumulatorConfig, ChunkOutput};
use crate::audio::source::AudioSource;
use crate::defaults::{
    self, CHUNK_SECS, CONTEXT_MAX_TURNS, DRAIN_TIMEOUT, OUTPUT_WINDOW_SECS, QUEUE_POLL,
    SEGMENT_QUEUE_CAPACITY, SILENCE_THRESHOLD_PCT, SOURCE_LANGUAGE, SYNTHESIS_QUEUE_CAPACITY,
    TARGET_LANGUAGE, TRANSCRIPT_QUEUE_CAPACITY, TRANSLATION_QUEUE_CAPACITY,
};
use crate::error::{Result, VoxbridgeError};
use crate::pipeline::cancel::CancelToken;
use crate::pipeline::error::{ErrorReporter, LogReporter, WorkerError};
use crate::pipeline::events::{EventSender, PipelineEvent};
use crate::pipeline::mixer::MixerStation;
use crate::pipeline::queue::{stage_queue, StageSender};
use crate::pipeline::recognizer_station::RecognizerStation;
use crate::pipeline::sink::AudioSink;
use crate::pipeline::station::WorkerRunner;
use crate::pipeline::synthesizer_station::SynthesizerStation;
use crate::pipeline::translator_station::TranslatorStation;
use crate::pipeline::types::AudioSegment;
use crate::speech::context::TranslationContext;
use crate::speech::recognizer::Recognizer;
use crate::speech::synthesizer::Synthesizer;
use crate::speech::translator::Translator;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Lifecycle state of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Running,
    Draining,
    Stopped,
}

impl PipelineState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Draining,
            _ => Self::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Running => 1,
            Self::Draining => 2,
            Self::Stopped => 3,
        }
    }
}

/// Tuning knobs for a pipeline run. Defaults mirror the constants in
/// [`crate::defaults`].
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Analysis segment duration in seconds.
    pub chunk_secs: f32,
    /// Peak level (percent) below which a segment is gated out.
    pub silence_threshold_pct: f32,
    /// Apply the stationary noise gate before the amplitude gate.
    pub noise_suppression: bool,
    /// Source language code passed to the recognizer.
    pub source_language: String,
    /// Target language code used in the translation instruction.
    pub target_language: String,
    /// Output window duration in seconds.
    pub output_window_secs: f32,
    /// Retained (user, assistant) pairs in the translation context.
    pub context_max_turns: usize,
    /// Bounded wait per worker thread during shutdown.
    pub drain_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            chunk_secs: CHUNK_SECS,
            silence_threshold_pct: SILENCE_THRESHOLD_PCT,
            noise_suppression: false,
            source_language: SOURCE_LANGUAGE.to_string(),
            target_language: TARGET_LANGUAGE.to_string(),
            output_window_secs: OUTPUT_WINDOW_SECS,
            context_max_turns: CONTEXT_MAX_TURNS,
            drain_timeout: DRAIN_TIMEOUT,
        }
    }
}

impl PipelineConfig {
    fn validate(&self) -> Result<()> {
        if self.chunk_secs <= 0.0 {
            return Err(VoxbridgeError::ConfigInvalidValue {
                key: "chunk_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.output_window_secs <= 0.0 {
            return Err(VoxbridgeError::ConfigInvalidValue {
                key: "output_window_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if !(0.0..=100.0).contains(&self.silence_threshold_pct) {
            return Err(VoxbridgeError::ConfigInvalidValue {
                key: "silence_threshold_pct".to_string(),
                message: "must be within 0..=100".to_string(),
            });
        }
        Ok(())
    }
}

/// An unstarted pipeline holding its collaborators.
pub struct Pipeline {
    source: Box<dyn AudioSource>,
    recognizer: Arc<dyn Recognizer>,
    translator: Arc<dyn Translator>,
    synthesizer: Arc<dyn Synthesizer>,
    sink: Box<dyn AudioSink>,
    config: PipelineConfig,
    events: EventSender,
    reporter: Arc<dyn ErrorReporter>,
}

impl Pipeline {
    pub fn new(
        source: Box<dyn AudioSource>,
        recognizer: Arc<dyn Recognizer>,
        translator: Arc<dyn Translator>,
        synthesizer: Arc<dyn Synthesizer>,
        sink: Box<dyn AudioSink>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            source,
            recognizer,
            translator,
            synthesizer,
            sink,
            config,
            events: EventSender::disabled(),
            reporter: Arc::new(LogReporter),
        }
    }

    /// Sets the status event publisher.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Replaces the worker error reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Verifies every collaborator is ready, starts the source, and spawns
    /// the stage threads. Fails fast: nothing is spawned unless all
    /// readiness checks pass.
    pub fn start(mut self) -> Result<PipelineHandle> {
        self.config.validate()?;

        if !self.recognizer.is_ready() {
            return Err(VoxbridgeError::RecognizerNotReady {
                message: format!("'{}' is not ready", self.recognizer.name()),
            });
        }
        if !self.translator.is_ready() {
            return Err(VoxbridgeError::TranslatorNotReady {
                message: format!("'{}' is not ready", self.translator.name()),
            });
        }
        if !self.synthesizer.is_ready() {
            return Err(VoxbridgeError::SynthesizerNotReady {
                message: format!("'{}' is not ready", self.synthesizer.name()),
            });
        }

        self.source.start()?;
        let sample_rate = self.source.sample_rate();

        let cancel = CancelToken::new();
        let state = Arc::new(AtomicU8::new(PipelineState::Running.as_u8()));

        let (segment_tx, segment_rx) = stage_queue(SEGMENT_QUEUE_CAPACITY);
        let (transcript_tx, transcript_rx) = stage_queue(TRANSCRIPT_QUEUE_CAPACITY);
        let (translation_tx, translation_rx) = stage_queue(TRANSLATION_QUEUE_CAPACITY);
        let (synthesis_tx, synthesis_rx) = stage_queue(SYNTHESIS_QUEUE_CAPACITY);
        // The mixer is terminal; its output queue exists only to satisfy the
        // runner wiring and is never written to.
        let (terminal_tx, _terminal_rx) = stage_queue::<()>(1);

        let recognizer = RecognizerStation::new(self.recognizer, self.config.source_language.clone())
            .with_events(self.events.clone());
        let context = TranslationContext::for_languages(
            &self.config.source_language,
            &self.config.target_language,
            self.config.context_max_turns,
        );
        let translator = TranslatorStation::new(self.translator, context)
            .with_events(self.events.clone());
        let synthesizer =
            SynthesizerStation::new(self.synthesizer).with_events(self.events.clone());
        let window_samples =
            defaults::samples_for_secs(self.config.output_window_secs, sample_rate);
        let mixer = MixerStation::new(window_samples, sample_rate, self.sink)
            .with_events(self.events.clone());

        let workers = vec![
            WorkerRunner::spawn(
                recognizer,
                segment_rx,
                transcript_tx,
                cancel.clone(),
                self.reporter.clone(),
            ),
            WorkerRunner::spawn(
                translator,
                transcript_rx,
                translation_tx,
                cancel.clone(),
                self.reporter.clone(),
            ),
            WorkerRunner::spawn(
                synthesizer,
                translation_rx,
                synthesis_tx,
                cancel.clone(),
                self.reporter.clone(),
            ),
            WorkerRunner::spawn(
                mixer,
                synthesis_rx,
                terminal_tx,
                cancel.clone(),
                self.reporter.clone(),
            ),
        ];

        let accumulator = ChunkAccumulator::new(ChunkAccumulatorConfig {
            chunk_secs: self.config.chunk_secs,
            sample_rate,
            silence_threshold_pct: self.config.silence_threshold_pct,
            noise_suppression: self.config.noise_suppression,
        });

        let capture = CaptureLoop {
            source: self.source,
            accumulator,
            segments: segment_tx,
            cancel: cancel.clone(),
            events: self.events.clone(),
            reporter: self.reporter.clone(),
        };
        let capture_handle = thread::Builder::new()
            .name("capture".to_string())
            .spawn(move || capture.run())
            .map_err(VoxbridgeError::Io)?;

        log::info!(
            "pipeline started ({} Hz, {:.1}s chunks, {:.1}s windows)",
            sample_rate,
            self.config.chunk_secs,
            self.config.output_window_secs
        );

        Ok(PipelineHandle {
            state,
            cancel,
            capture: Some(capture_handle),
            workers,
            drain_timeout: self.config.drain_timeout,
        })
    }
}

/// Capture stage: reads the source, accumulates chunks, feeds the first
/// queue. Runs on its own thread because a blocked `send` (backpressure)
/// must not stall anything else.
struct CaptureLoop {
    source: Box<dyn AudioSource>,
    accumulator: ChunkAccumulator,
    segments: StageSender<AudioSegment>,
    cancel: CancelToken,
    events: EventSender,
    reporter: Arc<dyn ErrorReporter>,
}

impl CaptureLoop {
    fn run(mut self) {
        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            let samples = match self.source.read_samples() {
                Ok(samples) => samples,
                Err(e) => {
                    self.reporter
                        .report("Capture", &WorkerError::Fatal(e.to_string()));
                    self.cancel.cancel();
                    break;
                }
            };

            if samples.is_empty() {
                if self.source.is_finite() {
                    // End of stream: forward the partial tail, then the
                    // sentinel.
                    if let Some(out) = self.accumulator.flush() {
                        if !self.forward(out) {
                            break;
                        }
                    }
                    self.segments.close();
                    break;
                }
                // Live source with nothing buffered yet.
                thread::sleep(QUEUE_POLL);
                continue;
            }

            for out in self.accumulator.push(&samples) {
                if !self.forward(out) {
                    return self.finish();
                }
            }
        }

        self.finish();
    }

    /// Emits metering and enqueues the segment if it passed the gate.
    /// Returns false when the consumer is gone or cancellation fired.
    fn forward(&self, out: ChunkOutput) -> bool {
        self.events.emit(PipelineEvent::Level {
            percent: out.level_percent,
        });
        if self.cancel.is_cancelled() {
            return false;
        }
        match out.segment {
            Some(segment) => self.segments.send(segment),
            None => true,
        }
    }

    fn finish(&mut self) {
        if let Err(e) = self.source.stop() {
            log::warn!("failed to stop audio source: {}", e);
        }
    }
}

/// Handle to a running pipeline.
pub struct PipelineHandle {
    state: Arc<AtomicU8>,
    cancel: CancelToken,
    capture: Option<JoinHandle<()>>,
    workers: Vec<WorkerRunner>,
    drain_timeout: Duration,
}

impl PipelineHandle {
    /// Current lifecycle state.
    pub fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// True once every stage thread has exited.
    pub fn is_finished(&self) -> bool {
        self.capture.as_ref().map_or(true, |h| h.is_finished())
            && self.workers.iter().all(|w| w.is_finished())
    }

    /// Requests cancellation without waiting. `stop` or `wait` still must be
    /// called to join the threads.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Shared cancellation flag, for signal handlers.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Cancels the pipeline and joins every stage within the drain timeout.
    ///
    /// Threads that do not finish in time are detached and reported; the
    /// pipeline still reaches `Stopped`.
    pub fn stop(mut self) -> Result<()> {
        self.state
            .store(PipelineState::Draining.as_u8(), Ordering::SeqCst);
        self.cancel.cancel();

        let deadline = Instant::now() + self.drain_timeout;
        let mut detached = Vec::new();

        if let Some(handle) = self.capture.take() {
            if !join_by(handle, deadline) {
                detached.push("Capture");
            }
        }
        for worker in self.workers.drain(..) {
            let name = worker.name();
            if let Some(handle) = worker.into_handle() {
                if !join_by(handle, deadline) {
                    detached.push(name);
                }
            }
        }

        self.state
            .store(PipelineState::Stopped.as_u8(), Ordering::SeqCst);

        if detached.is_empty() {
            log::info!("pipeline stopped");
            Ok(())
        } else {
            log::warn!("detached unresponsive stages: {}", detached.join(", "));
            Err(VoxbridgeError::Other(format!(
                "stages did not stop within {:?}: {}",
                self.drain_timeout,
                detached.join(", ")
            )))
        }
    }

    /// Waits for the pipeline to drain naturally (finite sources only) and
    /// joins every stage.
    pub fn wait(mut self) -> Result<()> {
        self.state
            .store(PipelineState::Draining.as_u8(), Ordering::SeqCst);

        let mut failures = Vec::new();
        if let Some(handle) = self.capture.take() {
            if handle.join().is_err() {
                failures.push("Capture thread panicked".to_string());
            }
        }
        for worker in self.workers.drain(..) {
            if let Err(e) = worker.join() {
                failures.push(e);
            }
        }

        self.state
            .store(PipelineState::Stopped.as_u8(), Ordering::SeqCst);

        if failures.is_empty() {
            log::info!("pipeline drained");
            Ok(())
        } else {
            Err(VoxbridgeError::Other(failures.join("; ")))
        }
    }
}

/// Joins a thread, polling until the deadline. Returns false (and leaks the
/// handle) when the thread is still running at the deadline.
fn join_by(handle: JoinHandle<()>, deadline: Instant) -> bool {
    while !handle.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(10));
    }
    handle.join().is_ok()
}
