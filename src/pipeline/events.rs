//! Fire-and-forget status events for presentation layers.
//!
//! The pipeline publishes audio levels, captions and stage status through a
//! bounded crossbeam channel using `try_send`: the core never blocks waiting
//! for a display, and a slow (or absent) consumer simply loses events.

use crossbeam_channel::{bounded, Receiver, Sender};

/// Capacity of the event channel. Events beyond this are dropped.
const EVENT_CAPACITY: usize = 256;

/// A status notification consumed by any presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Peak audio level of the latest captured segment, 0–100%.
    Level { percent: f32 },
    /// A short human-readable stage status line ("Transcribing...", etc.).
    Status { stage: &'static str, message: String },
    /// Recognized source-language text with its confidence.
    Caption { text: String, confidence: f32 },
    /// Translated target-language text paired with its source.
    Translation { source: String, text: String },
    /// A mixed output window was emitted (sample count at the output rate).
    WindowEmitted { samples: usize },
    /// A worker reported an error.
    Error { stage: String, message: String },
}

/// Creates the event channel: a sender for the pipeline, a receiver for the
/// presentation layer.
pub fn event_channel() -> (EventSender, Receiver<PipelineEvent>) {
    let (tx, rx) = bounded(EVENT_CAPACITY);
    (EventSender { tx: Some(tx) }, rx)
}

/// Non-blocking event publisher. A disabled sender drops everything.
#[derive(Debug, Clone, Default)]
pub struct EventSender {
    tx: Option<Sender<PipelineEvent>>,
}

impl EventSender {
    /// A sender with no consumer; every emit is a no-op.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Publishes an event without blocking. Dropped if the channel is full
    /// or nobody is listening.
    pub fn emit(&self, event: PipelineEvent) {
        if let Some(ref tx) = self.tx {
            let _ = tx.try_send(event);
        }
    }
}
