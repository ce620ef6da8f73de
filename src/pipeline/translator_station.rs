//! Translation worker: recognized segments in, translated segments out.
//!
//! The worker exclusively owns the translation context, so the
//! read-append-invoke-append cycle is serialized by construction: there is
//! exactly one translation in flight at a time.

use crate::pipeline::error::WorkerError;
use crate::pipeline::events::{EventSender, PipelineEvent};
use crate::pipeline::station::Worker;
use crate::pipeline::types::{RecognizedSegment, TranslatedSegment};
use crate::speech::context::TranslationContext;
use crate::speech::translator::Translator;
use std::sync::Arc;
use std::time::Instant;

/// Worker that translates each recognized transcript.
///
/// The context is updated only on success; a failed call leaves it exactly
/// as it was, and the unit is skipped.
pub struct TranslatorStation {
    translator: Arc<dyn Translator>,
    context: TranslationContext,
    events: EventSender,
}

impl TranslatorStation {
    pub fn new(translator: Arc<dyn Translator>, context: TranslationContext) -> Self {
        Self {
            translator,
            context,
            events: EventSender::disabled(),
        }
    }

    /// Sets the status event publisher.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    /// Retained (user, assistant) pairs; exposed for tests.
    pub fn context_pairs(&self) -> usize {
        self.context.pair_count()
    }
}

impl Worker for TranslatorStation {
    type Input = RecognizedSegment;
    type Output = TranslatedSegment;

    fn process(
        &mut self,
        unit: RecognizedSegment,
    ) -> Result<Option<TranslatedSegment>, WorkerError> {
        let source = unit.transcript.text.trim();
        if source.is_empty() {
            // Upstream filters these; tolerate them anyway.
            return Ok(None);
        }

        self.events.emit(PipelineEvent::Status {
            stage: "translation",
            message: "Translating...".to_string(),
        });

        let turns = self.context.turns_with_pending(source);
        let started = Instant::now();
        let translated = self
            .translator
            .translate(source, &turns)
            .map_err(|e| WorkerError::Recoverable(e.to_string()))?;

        log::info!(
            "translated segment {} in {:.2}s",
            unit.audio.sequence,
            started.elapsed().as_secs_f32()
        );

        if translated.trim().is_empty() {
            self.events.emit(PipelineEvent::Status {
                stage: "translation",
                message: "No translation returned".to_string(),
            });
            return Ok(None);
        }

        // Success: record the exchange for consistency across later calls.
        self.context.push_exchange(source, &translated);

        self.events.emit(PipelineEvent::Translation {
            source: source.to_string(),
            text: translated.clone(),
        });

        Ok(Some(TranslatedSegment {
            audio: unit.audio,
            text: translated,
        }))
    }

    fn name(&self) -> &'static str {
        "Translator"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::{AudioSegment, Transcript};
    use crate::speech::translator::MockTranslator;

    fn unit(text: &str) -> RecognizedSegment {
        RecognizedSegment {
            audio: AudioSegment::new(vec![0.1; 100], 16000, 0),
            transcript: Transcript::new(text, 0.9),
        }
    }

    fn station(translator: MockTranslator) -> TranslatorStation {
        TranslatorStation::new(
            Arc::new(translator),
            TranslationContext::new("translate", 8),
        )
    }

    #[test]
    fn forwards_translation_with_original_audio() {
        let mut station = station(MockTranslator::new().with_mapping("привет", "hello"));

        let out = station.process(unit("привет")).unwrap().unwrap();
        assert_eq!(out.text, "hello");
        assert_eq!(out.audio.samples.len(), 100);
    }

    #[test]
    fn context_grows_by_one_pair_per_success() {
        let mut station = station(
            MockTranslator::new()
                .with_mapping("раз", "one")
                .with_mapping("два", "two"),
        );

        assert_eq!(station.context_pairs(), 0);
        station.process(unit("раз")).unwrap();
        assert_eq!(station.context_pairs(), 1);
        station.process(unit("два")).unwrap();
        assert_eq!(station.context_pairs(), 2);
    }

    #[test]
    fn context_unchanged_on_empty_input() {
        let mut station = station(MockTranslator::new().with_fallback("x"));

        assert!(station.process(unit("")).unwrap().is_none());
        assert!(station.process(unit("   ")).unwrap().is_none());
        assert_eq!(station.context_pairs(), 0);
    }

    #[test]
    fn context_unchanged_on_failure() {
        let mut station = station(MockTranslator::new().with_failure());

        match station.process(unit("привет")) {
            Err(WorkerError::Recoverable(_)) => {}
            other => panic!("expected recoverable error, got {:?}", other),
        }
        assert_eq!(station.context_pairs(), 0);
    }

    #[test]
    fn translator_sees_prior_exchanges() {
        let translator = Arc::new(
            MockTranslator::new()
                .with_mapping("раз", "one")
                .with_mapping("два", "two"),
        );
        let mut station = TranslatorStation::new(
            translator.clone(),
            TranslationContext::new("translate", 8),
        );

        station.process(unit("раз")).unwrap();
        station.process(unit("два")).unwrap();

        assert_eq!(translator.calls(), vec!["раз", "два"]);
        // After two exchanges, context holds two pairs.
        assert_eq!(station.context_pairs(), 2);
    }

    #[test]
    fn blank_translation_is_skipped_without_context_growth() {
        let mut station = station(MockTranslator::new().with_mapping("привет", "  "));

        assert!(station.process(unit("привет")).unwrap().is_none());
        assert_eq!(station.context_pairs(), 0);
    }
}
