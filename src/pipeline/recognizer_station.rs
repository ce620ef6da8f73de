//! Recognition worker: audio segments in, recognized segments out.

use crate::pipeline::error::WorkerError;
use crate::pipeline::events::{EventSender, PipelineEvent};
use crate::pipeline::station::Worker;
use crate::pipeline::types::{AudioSegment, RecognizedSegment};
use crate::speech::recognizer::Recognizer;
use std::sync::Arc;
use std::time::Instant;

/// Worker that recognizes speech in each audio segment.
///
/// An empty transcript is a skip, not an error: the unit is dropped and the
/// loop continues. A failed recognition call is recoverable.
pub struct RecognizerStation {
    recognizer: Arc<dyn Recognizer>,
    language: String,
    events: EventSender,
}

impl RecognizerStation {
    pub fn new(recognizer: Arc<dyn Recognizer>, language: impl Into<String>) -> Self {
        Self {
            recognizer,
            language: language.into(),
            events: EventSender::disabled(),
        }
    }

    /// Sets the status event publisher.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }
}

impl Worker for RecognizerStation {
    type Input = AudioSegment;
    type Output = RecognizedSegment;

    fn process(&mut self, segment: AudioSegment) -> Result<Option<RecognizedSegment>, WorkerError> {
        self.events.emit(PipelineEvent::Status {
            stage: "recognition",
            message: "Transcribing audio...".to_string(),
        });

        let started = Instant::now();
        let transcript = self
            .recognizer
            .recognize(&segment.samples, &self.language)
            .map_err(|e| WorkerError::Recoverable(e.to_string()))?;

        log::info!(
            "recognized segment {} in {:.2}s (confidence {:.2})",
            segment.sequence,
            started.elapsed().as_secs_f32(),
            transcript.confidence
        );

        if transcript.is_empty() {
            self.events.emit(PipelineEvent::Status {
                stage: "recognition",
                message: "No speech detected".to_string(),
            });
            return Ok(None);
        }

        self.events.emit(PipelineEvent::Caption {
            text: transcript.text.clone(),
            confidence: transcript.confidence,
        });

        Ok(Some(RecognizedSegment {
            audio: segment,
            transcript,
        }))
    }

    fn name(&self) -> &'static str {
        "Recognizer"
    }
}
