//! Audio source trait and test double.

use crate::error::{Result, VoxbridgeError};

/// Trait for raw audio sources.
///
/// A source may be backed by a live device, a file replay, or a network
/// socket; the pipeline only requires an ordered sample stream. An empty
/// read from a finite source marks end-of-stream.
pub trait AudioSource: Send {
    /// Start producing audio.
    fn start(&mut self) -> Result<()>;

    /// Stop producing audio.
    fn stop(&mut self) -> Result<()>;

    /// Read the next batch of 16-bit PCM samples.
    ///
    /// An empty vector means "nothing available right now" for a live
    /// source, or end-of-stream for a finite one.
    fn read_samples(&mut self) -> Result<Vec<i16>>;

    /// Sample rate of the produced stream in Hz.
    fn sample_rate(&self) -> u32;

    /// True when the source ends on its own (file replay), false for live
    /// sources that only stop on cancellation.
    fn is_finite(&self) -> bool {
        false
    }
}

/// Mock audio source for testing.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    is_started: bool,
    chunks: Vec<Vec<i16>>,
    position: usize,
    sample_rate: u32,
    should_fail_start: bool,
    should_fail_read: bool,
}

impl MockAudioSource {
    /// Creates a mock that replays the given chunks, then reports
    /// end-of-stream.
    pub fn new(chunks: Vec<Vec<i16>>) -> Self {
        Self {
            is_started: false,
            chunks,
            position: 0,
            sample_rate: crate::defaults::SAMPLE_RATE,
            should_fail_start: false,
            should_fail_read: false,
        }
    }

    /// Creates a mock from one flat sample buffer, split into equal reads.
    pub fn from_samples(samples: Vec<i16>, read_size: usize) -> Self {
        let chunks = samples
            .chunks(read_size.max(1))
            .map(|c| c.to_vec())
            .collect();
        Self::new(chunks)
    }

    /// Configure the mock to fail on start.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Configure the mock to fail on read.
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Check if the source was started.
    pub fn is_started(&self) -> bool {
        self.is_started
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(VoxbridgeError::AudioCapture {
                message: "mock start failure".to_string(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.is_started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        if self.should_fail_read {
            return Err(VoxbridgeError::AudioCapture {
                message: "mock read failure".to_string(),
            });
        }
        if self.position >= self.chunks.len() {
            return Ok(Vec::new());
        }
        let chunk = self.chunks[self.position].clone();
        self.position += 1;
        Ok(chunk)
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn is_finite(&self) -> bool {
        true
    }
}
