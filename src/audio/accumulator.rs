//! Chunk accumulator: turns a variable-rate sample stream into fixed-size
//! analysis segments.
//!
//! Raw samples are appended to a growing buffer; every time the buffer holds
//! a full chunk, exactly that many samples are sliced off the front (FIFO).
//! Excess samples stay buffered for the next cycle, so nothing is dropped
//! and nothing is duplicated. A per-segment amplitude gate keeps near-silence
//! away from the recognizer while level metering is still emitted.

use crate::audio::noise;
use crate::defaults::{self, CHUNK_SECS, SAMPLE_RATE, SILENCE_THRESHOLD_PCT};
use crate::pipeline::types::AudioSegment;

/// Configuration for the chunk accumulator.
#[derive(Debug, Clone)]
pub struct ChunkAccumulatorConfig {
    /// Target segment duration in seconds.
    pub chunk_secs: f32,
    /// Sample rate of the incoming stream.
    pub sample_rate: u32,
    /// Peak level (percent of full scale) below which a segment is gated out.
    pub silence_threshold_pct: f32,
    /// Apply the stationary noise gate before the amplitude gate.
    pub noise_suppression: bool,
}

impl Default for ChunkAccumulatorConfig {
    fn default() -> Self {
        Self {
            chunk_secs: CHUNK_SECS,
            sample_rate: SAMPLE_RATE,
            silence_threshold_pct: SILENCE_THRESHOLD_PCT,
            noise_suppression: false,
        }
    }
}

/// One produced chunk: metering is always present, the segment only when it
/// passed the silence gate.
#[derive(Debug, Clone)]
pub struct ChunkOutput {
    /// Peak level of the produced chunk, 0–100%.
    pub level_percent: f32,
    /// The segment, unless it was gated out as near-silence.
    pub segment: Option<AudioSegment>,
}

/// Accumulates raw PCM into bounded-duration audio segments.
pub struct ChunkAccumulator {
    config: ChunkAccumulatorConfig,
    /// Normalized samples not yet sliced into a segment.
    buffer: Vec<f32>,
    /// Samples per full segment.
    chunk_samples: usize,
    /// Next segment sequence number.
    next_sequence: u64,
}

impl ChunkAccumulator {
    /// Creates an accumulator with the given configuration.
    pub fn new(config: ChunkAccumulatorConfig) -> Self {
        let chunk_samples = defaults::samples_for_secs(config.chunk_secs, config.sample_rate).max(1);
        Self {
            config,
            buffer: Vec::new(),
            chunk_samples,
            next_sequence: 0,
        }
    }

    /// Number of samples in one full segment.
    pub fn chunk_samples(&self) -> usize {
        self.chunk_samples
    }

    /// Samples currently retained, waiting for a full chunk.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Pushes raw 16-bit PCM samples, returning every chunk completed by
    /// this call in FIFO order.
    pub fn push(&mut self, raw: &[i16]) -> Vec<ChunkOutput> {
        self.buffer
            .extend(raw.iter().map(|&s| s as f32 / 32768.0));

        let mut outputs = Vec::new();
        while self.buffer.len() >= self.chunk_samples {
            let rest = self.buffer.split_off(self.chunk_samples);
            let chunk = std::mem::replace(&mut self.buffer, rest);
            outputs.push(self.finish_chunk(chunk));
        }
        outputs
    }

    /// Forwards the retained tail as the final (possibly shorter) segment.
    ///
    /// Returns `None` when nothing is buffered.
    pub fn flush(&mut self) -> Option<ChunkOutput> {
        if self.buffer.is_empty() {
            return None;
        }
        let chunk = std::mem::take(&mut self.buffer);
        Some(self.finish_chunk(chunk))
    }

    fn finish_chunk(&mut self, mut samples: Vec<f32>) -> ChunkOutput {
        if self.config.noise_suppression {
            noise::suppress(&mut samples, self.config.sample_rate);
        }

        let segment = AudioSegment::new(samples, self.config.sample_rate, self.next_sequence);
        self.next_sequence += 1;

        let level_percent = segment.peak_level_percent();
        let segment = if level_percent < self.config.silence_threshold_pct {
            None
        } else {
            Some(segment)
        };

        ChunkOutput {
            level_percent,
            segment,
        }
    }
}
