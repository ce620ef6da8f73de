//! Synthesis worker: translated segments in, synthesized segments out.

use crate::pipeline::error::WorkerError;
use crate::pipeline::events::{EventSender, PipelineEvent};
use crate::pipeline::station::Worker;
use crate::pipeline::types::{SynthesizedSegment, TranslatedSegment};
use crate::speech::synthesizer::Synthesizer;
use std::sync::Arc;
use std::time::Instant;

/// Worker that synthesizes a waveform for each translation.
///
/// An empty waveform is forwarded, not dropped: the mixer short-circuits it
/// and the original audio still reaches the output.
pub struct SynthesizerStation {
    synthesizer: Arc<dyn Synthesizer>,
    events: EventSender,
}

impl SynthesizerStation {
    pub fn new(synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            synthesizer,
            events: EventSender::disabled(),
        }
    }

    /// Sets the status event publisher.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }
}

impl Worker for SynthesizerStation {
    type Input = TranslatedSegment;
    type Output = SynthesizedSegment;

    fn process(
        &mut self,
        unit: TranslatedSegment,
    ) -> Result<Option<SynthesizedSegment>, WorkerError> {
        self.events.emit(PipelineEvent::Status {
            stage: "synthesis",
            message: "Synthesizing speech...".to_string(),
        });

        let started = Instant::now();
        let synthesized = self
            .synthesizer
            .synthesize(&unit.text)
            .map_err(|e| WorkerError::Recoverable(e.to_string()))?;

        log::info!(
            "synthesized segment {} ({} samples) in {:.2}s",
            unit.audio.sequence,
            synthesized.len(),
            started.elapsed().as_secs_f32()
        );

        Ok(Some(SynthesizedSegment {
            original: unit.audio,
            synthesized,
            sample_rate: self.synthesizer.sample_rate(),
        }))
    }

    fn name(&self) -> &'static str {
        "Synthesizer"
    }
}
