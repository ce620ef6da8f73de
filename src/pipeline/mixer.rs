//! Mixing and output accumulation.
//!
//! Each (original, synthesized) unit is blended into one signal, appended to
//! a running buffer, and emitted in fixed-duration windows with the same
//! FIFO-slice discipline as the input accumulator. The tail always carries
//! forward; shutdown flushes it as a final short window.

use crate::defaults::{MIX_ORIGINAL_WEIGHT, MIX_SYNTHESIZED_WEIGHT};
use crate::pipeline::error::WorkerError;
use crate::pipeline::events::{EventSender, PipelineEvent};
use crate::pipeline::sink::AudioSink;
use crate::pipeline::station::Worker;
use crate::pipeline::types::{MixedWindow, SynthesizedSegment};

/// Blends the captured signal with the synthesized one.
///
/// - both empty → empty
/// - one empty → the other, clamped
/// - both non-empty → `0.3 * original + 0.7 * synthesized` over the shorter
///   length
///
/// Every output sample is clamped to [-1.0, 1.0].
pub fn mix(original: &[f32], synthesized: &[f32]) -> Vec<f32> {
    if original.is_empty() && synthesized.is_empty() {
        return Vec::new();
    }
    if original.is_empty() {
        return synthesized.iter().map(|s| s.clamp(-1.0, 1.0)).collect();
    }
    if synthesized.is_empty() {
        return original.iter().map(|s| s.clamp(-1.0, 1.0)).collect();
    }

    let len = original.len().min(synthesized.len());
    (0..len)
        .map(|i| {
            (original[i] * MIX_ORIGINAL_WEIGHT + synthesized[i] * MIX_SYNTHESIZED_WEIGHT)
                .clamp(-1.0, 1.0)
        })
        .collect()
}

/// Accumulates mixed audio and slices exact output windows off the front.
pub struct OutputAccumulator {
    buffer: Vec<f32>,
    window_samples: usize,
    sample_rate: u32,
}

impl OutputAccumulator {
    pub fn new(window_samples: usize, sample_rate: u32) -> Self {
        Self {
            buffer: Vec::new(),
            window_samples: window_samples.max(1),
            sample_rate,
        }
    }

    /// Appends mixed samples and returns every completed window, in order.
    pub fn push(&mut self, mixed: &[f32]) -> Vec<MixedWindow> {
        self.buffer.extend_from_slice(mixed);

        let mut windows = Vec::new();
        while self.buffer.len() >= self.window_samples {
            let rest = self.buffer.split_off(self.window_samples);
            let samples = std::mem::replace(&mut self.buffer, rest);
            windows.push(MixedWindow {
                samples,
                sample_rate: self.sample_rate,
            });
        }
        windows
    }

    /// Emits the retained tail as a final, possibly shorter window.
    pub fn flush(&mut self) -> Option<MixedWindow> {
        if self.buffer.is_empty() {
            return None;
        }
        Some(MixedWindow {
            samples: std::mem::take(&mut self.buffer),
            sample_rate: self.sample_rate,
        })
    }

    /// Samples currently carried forward.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }
}

/// Terminal worker: mixes each unit, windows the result, writes to the sink.
pub struct MixerStation {
    accumulator: OutputAccumulator,
    sink: Box<dyn AudioSink>,
    events: EventSender,
}

impl MixerStation {
    pub fn new(window_samples: usize, sample_rate: u32, sink: Box<dyn AudioSink>) -> Self {
        Self {
            accumulator: OutputAccumulator::new(window_samples, sample_rate),
            sink,
            events: EventSender::disabled(),
        }
    }

    /// Sets the status event publisher.
    pub fn with_events(mut self, events: EventSender) -> Self {
        self.events = events;
        self
    }

    fn emit_window(&mut self, window: MixedWindow) -> Result<(), WorkerError> {
        let samples = window.samples.len();
        self.sink
            .write(&window)
            .map_err(|e| WorkerError::Fatal(e.to_string()))?;
        self.events.emit(PipelineEvent::WindowEmitted { samples });
        Ok(())
    }
}

impl Worker for MixerStation {
    type Input = SynthesizedSegment;
    type Output = ();

    fn process(&mut self, unit: SynthesizedSegment) -> Result<Option<()>, WorkerError> {
        let mixed = mix(&unit.original.samples, &unit.synthesized);
        if mixed.is_empty() {
            return Ok(None);
        }

        for window in self.accumulator.push(&mixed) {
            self.emit_window(window)?;
        }
        Ok(None)
    }

    fn name(&self) -> &'static str {
        "Mixer"
    }

    fn shutdown(&mut self) {
        // Flush the carried tail, then let the sink finalize its file.
        if let Some(window) = self.accumulator.flush() {
            if let Err(e) = self.emit_window(window) {
                log::error!("failed to flush final window: {}", e);
            }
        }
        if let Err(e) = self.sink.finish() {
            log::error!("failed to finalize audio sink: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::sink::CollectorSink;
    use crate::pipeline::types::AudioSegment;

    #[test]
    fn mix_of_two_empties_is_empty() {
        assert!(mix(&[], &[]).is_empty());
    }

    #[test]
    fn mix_with_empty_original_returns_synthesized() {
        let synthesized = vec![0.5, -0.5, 2.0];
        assert_eq!(mix(&[], &synthesized), vec![0.5, -0.5, 1.0]);
    }

    #[test]
    fn mix_with_empty_synthesized_returns_original() {
        let original = vec![0.25, -3.0];
        assert_eq!(mix(&original, &[]), vec![0.25, -1.0]);
    }

    #[test]
    fn mix_blends_with_fixed_weights_over_min_length() {
        let original = vec![1.0, 1.0, 1.0, 1.0];
        let synthesized = vec![0.0, 1.0];

        let mixed = mix(&original, &synthesized);
        assert_eq!(mixed.len(), 2);
        assert!((mixed[0] - 0.3).abs() < 1e-6);
        assert!((mixed[1] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn mix_output_is_always_in_range() {
        let original = vec![1.0, -1.0, 0.9];
        let synthesized = vec![1.0, -1.0, 0.9];

        for sample in mix(&original, &synthesized) {
            assert!((-1.0..=1.0).contains(&sample));
        }
    }

    #[test]
    fn accumulator_emits_exact_windows_and_keeps_tail() {
        let mut acc = OutputAccumulator::new(100, 16000);

        assert!(acc.push(&vec![0.1; 60]).is_empty());
        let windows = acc.push(&vec![0.1; 60]);
        assert_eq!(windows.len(), 1);
        assert_eq!(windows[0].samples.len(), 100);
        assert_eq!(acc.buffered(), 20);
    }

    #[test]
    fn accumulator_conserves_samples_across_windows_and_flush() {
        let mut acc = OutputAccumulator::new(64, 16000);
        let input: Vec<f32> = (0..500).map(|i| i as f32 / 500.0).collect();

        let mut emitted: Vec<f32> = Vec::new();
        for chunk in input.chunks(17) {
            for window in acc.push(chunk) {
                emitted.extend(window.samples);
            }
        }
        if let Some(window) = acc.flush() {
            emitted.extend(window.samples);
        }

        assert_eq!(emitted, input);
    }

    #[test]
    fn flush_on_empty_buffer_is_none() {
        let mut acc = OutputAccumulator::new(64, 16000);
        assert!(acc.flush().is_none());
    }

    fn unit(original: Vec<f32>, synthesized: Vec<f32>) -> SynthesizedSegment {
        SynthesizedSegment {
            original: AudioSegment::new(original, 16000, 0),
            synthesized,
            sample_rate: 16000,
        }
    }

    #[test]
    fn station_emits_once_window_threshold_is_reached() {
        let sink = CollectorSink::new();
        let windows = sink.windows();
        let mut station = MixerStation::new(150, 16000, Box::new(sink));

        // 100 mixed samples: below threshold, nothing emitted.
        station
            .process(unit(vec![0.1; 100], vec![0.2; 100]))
            .unwrap();
        assert!(windows.lock().unwrap().is_empty());

        // Another 100 pushes past the 150-sample window.
        station
            .process(unit(vec![0.1; 100], vec![0.2; 100]))
            .unwrap();
        let emitted = windows.lock().unwrap();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].samples.len(), 150);
    }

    #[test]
    fn station_short_circuits_fully_empty_units() {
        let sink = CollectorSink::new();
        let windows = sink.windows();
        let mut station = MixerStation::new(10, 16000, Box::new(sink));

        station.process(unit(vec![], vec![])).unwrap();
        assert!(windows.lock().unwrap().is_empty());
    }

    #[test]
    fn shutdown_flushes_the_tail() {
        let sink = CollectorSink::new();
        let windows = sink.windows();
        let mut station = MixerStation::new(1000, 16000, Box::new(sink));

        station
            .process(unit(vec![0.1; 100], vec![0.2; 100]))
            .unwrap();
        station.shutdown();

        let emitted = windows.lock().unwrap();
        assert_eq!(emitted.len(), 1);
        assert_eq!(emitted[0].samples.len(), 100);
    }

    #[test]
    fn empty_synthesis_still_carries_original_audio() {
        let sink = CollectorSink::new();
        let windows = sink.windows();
        let mut station = MixerStation::new(50, 16000, Box::new(sink));

        station.process(unit(vec![0.5; 60], vec![])).unwrap();

        let emitted = windows.lock().unwrap();
        assert_eq!(emitted.len(), 1);
        assert!((emitted[0].samples[0] - 0.5).abs() < 1e-6);
    }
}
