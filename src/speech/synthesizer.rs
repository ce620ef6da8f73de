//! Speech synthesizer trait, HTTP speech implementation, and test double.

use crate::audio::wav::WavAudioSource;
use crate::defaults::SAMPLE_RATE;
use crate::error::{Result, VoxbridgeError};
use serde::Serialize;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

/// Trait for text-to-speech synthesis.
///
/// Empty text must yield an empty waveform, not an error. Implementations
/// declare their output sample rate; the mixer trusts it.
pub trait Synthesizer: Send + Sync {
    /// Synthesize a waveform from target-language text.
    ///
    /// # Returns
    /// Normalized samples in [-1.0, 1.0]; may be empty when the engine
    /// produced nothing playable.
    fn synthesize(&self, text: &str) -> Result<Vec<f32>>;

    /// Sample rate of produced waveforms in Hz.
    fn sample_rate(&self) -> u32;

    /// Name of the backing voice/engine for logging.
    fn name(&self) -> &str;

    /// Check if the synthesizer is ready. Startup aborts when false.
    fn is_ready(&self) -> bool;
}

/// Configuration for the HTTP speech synthesizer.
#[derive(Debug, Clone)]
pub struct ApiSynthesizerConfig {
    /// Speech endpoint URL.
    pub endpoint: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Voice preset.
    pub voice: String,
    /// Bearer token; typically from `VOXBRIDGE_API_KEY`.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiSynthesizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/audio/speech".to_string(),
            model: "gpt-4o-mini-tts".to_string(),
            voice: "alloy".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'static str,
}

/// Synthesizer backed by an OpenAI-compatible speech endpoint.
///
/// The WAV response is downmixed and resampled to the pipeline rate, so
/// [`Synthesizer::sample_rate`] is always 16kHz regardless of what the
/// service returns.
pub struct ApiSynthesizer {
    config: ApiSynthesizerConfig,
    client: reqwest::blocking::Client,
}

impl ApiSynthesizer {
    pub fn new(config: ApiSynthesizerConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VoxbridgeError::SynthesizerNotReady {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { config, client })
    }
}

impl Synthesizer for ApiSynthesizer {
    fn synthesize(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        let request = SpeechRequest {
            model: &self.config.model,
            voice: &self.config.voice,
            input: text,
            response_format: "wav",
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .map_err(|e| VoxbridgeError::Synthesis {
                message: format!("request failed: {}", e),
            })?
            .error_for_status()
            .map_err(|e| VoxbridgeError::Synthesis {
                message: format!("service error: {}", e),
            })?;

        let bytes = response.bytes().map_err(|e| VoxbridgeError::Synthesis {
            message: format!("failed to read response body: {}", e),
        })?;

        let source = WavAudioSource::from_reader(Box::new(Cursor::new(bytes.to_vec())))
            .map_err(|e| VoxbridgeError::Synthesis {
                message: format!("malformed audio response: {}", e),
            })?;

        Ok(source
            .into_samples()
            .into_iter()
            .map(|s| s as f32 / 32768.0)
            .collect())
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn name(&self) -> &str {
        &self.config.voice
    }

    fn is_ready(&self) -> bool {
        !self.config.api_key.is_empty()
    }
}

/// Mock synthesizer for testing.
///
/// Produces a fixed number of samples per call regardless of input text;
/// empty text always yields an empty waveform.
pub struct MockSynthesizer {
    samples_per_call: usize,
    amplitude: f32,
    sample_rate: u32,
    calls: Mutex<Vec<String>>,
    should_fail: bool,
    ready: bool,
}

impl MockSynthesizer {
    /// Creates a mock producing `samples_per_call` samples at 16kHz.
    pub fn new(samples_per_call: usize) -> Self {
        Self {
            samples_per_call,
            amplitude: 0.4,
            sample_rate: crate::defaults::SAMPLE_RATE,
            calls: Mutex::new(Vec::new()),
            should_fail: false,
            ready: true,
        }
    }

    /// Creates a mock that produces nothing playable for any text.
    pub fn empty() -> Self {
        Self::new(0)
    }

    /// Overrides the declared sample rate.
    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    /// Overrides the constant output amplitude.
    pub fn with_amplitude(mut self, amplitude: f32) -> Self {
        self.amplitude = amplitude;
        self
    }

    /// Configure the mock to fail on every call.
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to report not-ready at startup.
    pub fn with_not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    /// Texts received so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of synthesize calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Synthesizer for MockSynthesizer {
    fn synthesize(&self, text: &str) -> Result<Vec<f32>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }
        if self.should_fail {
            return Err(VoxbridgeError::Synthesis {
                message: "mock synthesis failure".to_string(),
            });
        }
        if text.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![self.amplitude; self.samples_per_call])
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn name(&self) -> &str {
        "mock-synthesizer"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}
