//! Data types flowing between pipeline stages.
//!
//! Each stage pairs its derived artifact with the original audio so the
//! mixer receives (original, synthesized) units that are in lockstep by
//! construction.

/// A bounded-duration slice of normalized audio samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioSegment {
    /// Amplitude samples in [-1.0, 1.0].
    pub samples: Vec<f32>,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Sequence number for ordering.
    pub sequence: u64,
}

impl AudioSegment {
    /// Creates a new audio segment.
    pub fn new(samples: Vec<f32>, sample_rate: u32, sequence: u64) -> Self {
        Self {
            samples,
            sample_rate,
            sequence,
        }
    }

    /// Duration of the segment in milliseconds.
    pub fn duration_ms(&self) -> u32 {
        if self.sample_rate == 0 {
            return 0;
        }
        (self.samples.len() as u64 * 1000 / self.sample_rate as u64) as u32
    }

    /// Peak amplitude as a percentage of full scale (0–100).
    pub fn peak_level_percent(&self) -> f32 {
        self.samples
            .iter()
            .fold(0.0f32, |acc, &s| acc.max(s.abs()))
            * 100.0
    }
}

/// Recognized text with a confidence score.
///
/// Empty text is a valid value meaning "nothing intelligible" and propagates
/// as a skip signal, never as an error.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    /// Confidence in [0.0, 1.0].
    pub confidence: f32,
}

impl Transcript {
    pub fn new(text: impl Into<String>, confidence: f32) -> Self {
        Self {
            text: text.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }

    /// The "nothing intelligible" value.
    pub fn empty() -> Self {
        Self {
            text: String::new(),
            confidence: 0.0,
        }
    }

    /// True when the transcript carries no usable text.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A segment whose speech has been recognized.
#[derive(Debug, Clone)]
pub struct RecognizedSegment {
    pub audio: AudioSegment,
    pub transcript: Transcript,
}

/// A segment whose transcript has been translated.
#[derive(Debug, Clone)]
pub struct TranslatedSegment {
    pub audio: AudioSegment,
    /// Target-language text.
    pub text: String,
}

/// A translated segment with its synthesized waveform.
///
/// `synthesized` may legitimately be empty; the mixer short-circuits that
/// unit per the mix rules.
#[derive(Debug, Clone)]
pub struct SynthesizedSegment {
    pub original: AudioSegment,
    pub synthesized: Vec<f32>,
    /// Sample rate declared by the synthesizer.
    pub sample_rate: u32,
}

/// A fixed-duration window of blended output samples.
///
/// Always exactly the configured window length except a final flushed tail.
#[derive(Debug, Clone, PartialEq)]
pub struct MixedWindow {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segment_duration_from_rate() {
        let segment = AudioSegment::new(vec![0.0; 48000], 16000, 0);
        assert_eq!(segment.duration_ms(), 3000);

        let short = AudioSegment::new(vec![0.0; 800], 16000, 1);
        assert_eq!(short.duration_ms(), 50);
    }

    #[test]
    fn segment_duration_with_zero_rate_is_zero() {
        let segment = AudioSegment::new(vec![0.0; 100], 0, 0);
        assert_eq!(segment.duration_ms(), 0);
    }

    #[test]
    fn peak_level_uses_absolute_amplitude() {
        let segment = AudioSegment::new(vec![0.1, -0.5, 0.3], 16000, 0);
        assert!((segment.peak_level_percent() - 50.0).abs() < 1e-4);
    }

    #[test]
    fn peak_level_of_empty_segment_is_zero() {
        let segment = AudioSegment::new(vec![], 16000, 0);
        assert_eq!(segment.peak_level_percent(), 0.0);
    }

    #[test]
    fn transcript_confidence_is_clamped() {
        assert_eq!(Transcript::new("hi", 1.5).confidence, 1.0);
        assert_eq!(Transcript::new("hi", -0.2).confidence, 0.0);
    }

    #[test]
    fn empty_transcript_is_a_skip_value() {
        assert!(Transcript::empty().is_empty());
        assert!(Transcript::new("   ", 0.9).is_empty());
        assert!(!Transcript::new("привет", 0.9).is_empty());
    }
}
