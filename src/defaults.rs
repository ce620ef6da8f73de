//! Default configuration constants for voxbridge.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

use std::time::Duration;

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition and provides a good balance
/// between quality and computational efficiency for voice applications.
pub const SAMPLE_RATE: u32 = 16000;

/// Default analysis chunk duration in seconds.
///
/// Each recognition call sees one chunk of this length. 3 seconds is long
/// enough for a phrase, short enough to keep end-to-end latency tolerable.
pub const CHUNK_SECS: f32 = 3.0;

/// Default silence threshold as a percentage of full-scale peak amplitude.
///
/// Segments whose peak level falls below this never reach recognition.
pub const SILENCE_THRESHOLD_PCT: f32 = 3.0;

/// Portion of each segment used to estimate the noise floor, in seconds.
///
/// The stationary noise gate treats the first half-second of a segment as a
/// noise profile.
pub const NOISE_PROFILE_SECS: f32 = 0.5;

/// Mixing weight applied to the original (captured) signal.
pub const MIX_ORIGINAL_WEIGHT: f32 = 0.3;

/// Mixing weight applied to the synthesized signal.
pub const MIX_SYNTHESIZED_WEIGHT: f32 = 0.7;

/// Default output window duration in seconds.
///
/// The mixer accumulates blended audio and emits it in windows of this
/// length; any tail shorter than a window carries forward.
pub const OUTPUT_WINDOW_SECS: f32 = 5.0;

/// Default source language code for recognition.
pub const SOURCE_LANGUAGE: &str = "ru";

/// Default target language code for translation.
pub const TARGET_LANGUAGE: &str = "en";

/// How long a worker waits on an empty queue before re-checking the
/// cancellation flag.
pub const QUEUE_POLL: Duration = Duration::from_millis(250);

/// Bounded wait for each worker thread to acknowledge shutdown.
///
/// Threads still running after this are detached; they die with the process.
pub const DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Number of (user, assistant) pairs retained in the translation context.
///
/// Older pairs are dropped to bound memory and request payload size.
pub const CONTEXT_MAX_TURNS: usize = 16;

/// Queue capacities per stage. A full queue blocks the producer, which is
/// the pipeline's only flow-control mechanism.
pub const SEGMENT_QUEUE_CAPACITY: usize = 8;
pub const TRANSCRIPT_QUEUE_CAPACITY: usize = 8;
pub const TRANSLATION_QUEUE_CAPACITY: usize = 8;
pub const SYNTHESIS_QUEUE_CAPACITY: usize = 4;

/// Computes the number of samples in a duration at a sample rate.
pub fn samples_for_secs(secs: f32, sample_rate: u32) -> usize {
    (secs * sample_rate as f32).round() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_for_secs_matches_rate() {
        assert_eq!(samples_for_secs(3.0, 16000), 48000);
        assert_eq!(samples_for_secs(0.5, 16000), 8000);
        assert_eq!(samples_for_secs(1.0, 24000), 24000);
    }

    #[test]
    fn mix_weights_sum_to_one() {
        assert!((MIX_ORIGINAL_WEIGHT + MIX_SYNTHESIZED_WEIGHT - 1.0).abs() < f32::EPSILON);
    }
}
