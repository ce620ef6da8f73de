//! Speech recognizer trait, HTTP transcription implementation, and test
//! double.

use crate::defaults::SAMPLE_RATE;
use crate::error::{Result, VoxbridgeError};
use crate::pipeline::types::Transcript;
use serde::Deserialize;
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

/// Trait for speech-to-text recognition.
///
/// This trait allows swapping implementations (a real acoustic model vs a
/// mock). Implementations must tolerate empty or too-short input by
/// returning an empty transcript rather than failing.
pub trait Recognizer: Send + Sync {
    /// Recognize speech in normalized audio samples.
    ///
    /// # Arguments
    /// * `samples` - amplitude samples in [-1.0, 1.0]
    /// * `language` - language hint (e.g. "ru")
    ///
    /// # Returns
    /// Transcript with text and confidence; empty text means "nothing
    /// intelligible".
    fn recognize(&self, samples: &[f32], language: &str) -> Result<Transcript>;

    /// Name of the loaded model for logging.
    fn name(&self) -> &str;

    /// Check if the recognizer is ready. Startup aborts when false.
    fn is_ready(&self) -> bool;
}

/// Configuration for the HTTP transcription recognizer.
#[derive(Debug, Clone)]
pub struct ApiRecognizerConfig {
    /// Transcriptions endpoint URL.
    pub endpoint: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Bearer token; typically from `VOXBRIDGE_API_KEY`.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ApiRecognizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
            model: "whisper-1".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Recognizer backed by an OpenAI-compatible transcriptions endpoint.
///
/// Each segment is encoded as a 16-bit mono WAV and uploaded as multipart
/// form data. The endpoint reports no confidence, so a non-empty result
/// carries 1.0.
pub struct ApiRecognizer {
    config: ApiRecognizerConfig,
    client: reqwest::blocking::Client,
}

impl ApiRecognizer {
    pub fn new(config: ApiRecognizerConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VoxbridgeError::RecognizerNotReady {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { config, client })
    }

    /// Encodes normalized samples as an in-memory 16-bit mono WAV.
    fn encode_wav(samples: &[f32]) -> Result<Vec<u8>> {
        let mut cursor = Cursor::new(Vec::new());
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: SAMPLE_RATE,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer =
            hound::WavWriter::new(&mut cursor, spec).map_err(|e| VoxbridgeError::Recognition {
                message: format!("failed to encode segment: {}", e),
            })?;
        for &sample in samples {
            let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
            writer
                .write_sample(quantized)
                .map_err(|e| VoxbridgeError::Recognition {
                    message: format!("failed to encode segment: {}", e),
                })?;
        }
        writer.finalize().map_err(|e| VoxbridgeError::Recognition {
            message: format!("failed to encode segment: {}", e),
        })?;
        Ok(cursor.into_inner())
    }
}

impl Recognizer for ApiRecognizer {
    fn recognize(&self, samples: &[f32], language: &str) -> Result<Transcript> {
        if samples.is_empty() {
            return Ok(Transcript::empty());
        }

        let wav = Self::encode_wav(samples)?;
        let file = reqwest::blocking::multipart::Part::bytes(wav)
            .file_name("segment.wav")
            .mime_str("audio/wav")
            .map_err(|e| VoxbridgeError::Recognition {
                message: format!("failed to build upload: {}", e),
            })?;
        let form = reqwest::blocking::multipart::Form::new()
            .part("file", file)
            .text("model", self.config.model.clone())
            .text("language", language.to_string())
            .text("response_format", "json");

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .multipart(form)
            .send()
            .map_err(|e| VoxbridgeError::Recognition {
                message: format!("request failed: {}", e),
            })?
            .error_for_status()
            .map_err(|e| VoxbridgeError::Recognition {
                message: format!("service error: {}", e),
            })?;

        let parsed: TranscriptionResponse =
            response.json().map_err(|e| VoxbridgeError::Recognition {
                message: format!("malformed response: {}", e),
            })?;

        if parsed.text.trim().is_empty() {
            return Ok(Transcript::empty());
        }
        Ok(Transcript::new(parsed.text.trim(), 1.0))
    }

    fn name(&self) -> &str {
        &self.config.model
    }

    fn is_ready(&self) -> bool {
        !self.config.api_key.is_empty()
    }
}

/// Mock recognizer for testing.
///
/// Returns responses in push order, falling back to a default transcript
/// when scripted responses run out. Records how many calls it received.
pub struct MockRecognizer {
    responses: Mutex<Vec<Transcript>>,
    default: Transcript,
    calls: Mutex<Vec<usize>>,
    keyed: HashMap<usize, Transcript>,
    should_fail: bool,
    ready: bool,
}

impl MockRecognizer {
    /// Creates a mock that always returns the given text.
    pub fn new(text: &str, confidence: f32) -> Self {
        Self {
            responses: Mutex::new(Vec::new()),
            default: Transcript::new(text, confidence),
            calls: Mutex::new(Vec::new()),
            keyed: HashMap::new(),
            should_fail: false,
            ready: true,
        }
    }

    /// Creates a mock that always reports "nothing intelligible".
    pub fn silent() -> Self {
        Self::new("", 0.0)
    }

    /// Scripts responses returned in order before the default kicks in.
    pub fn with_responses(self, responses: Vec<Transcript>) -> Self {
        // Stored reversed so pop() yields them in push order.
        let mut reversed = responses;
        reversed.reverse();
        Self {
            responses: Mutex::new(reversed),
            ..self
        }
    }

    /// Maps an input sample count to a specific transcript.
    pub fn with_keyed_response(mut self, sample_count: usize, transcript: Transcript) -> Self {
        self.keyed.insert(sample_count, transcript);
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

    /// Number of recognize calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Recognizer for MockRecognizer {
    fn recognize(&self, samples: &[f32], _language: &str) -> Result<Transcript> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(samples.len());
        }
        if self.should_fail {
            return Err(VoxbridgeError::Recognition {
                message: "mock recognition failure".to_string(),
            });
        }
        if let Some(transcript) = self.keyed.get(&samples.len()) {
            return Ok(transcript.clone());
        }
        if let Ok(mut responses) = self.responses.lock() {
            if let Some(next) = responses.pop() {
                return Ok(next);
            }
        }
        Ok(self.default.clone())
    }

    fn name(&self) -> &str {
        "mock-recognizer"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_default_transcript() {
        let recognizer = MockRecognizer::new("привет мир", 0.9);
        let result = recognizer.recognize(&[0.1; 100], "ru").unwrap();

        assert_eq!(result.text, "привет мир");
        assert!((result.confidence - 0.9).abs() < f32::EPSILON);
        assert_eq!(recognizer.call_count(), 1);
    }

    #[test]
    fn silent_mock_returns_empty_transcript() {
        let recognizer = MockRecognizer::silent();
        let result = recognizer.recognize(&[0.0; 100], "ru").unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn scripted_responses_come_in_order() {
        let recognizer = MockRecognizer::new("default", 0.5).with_responses(vec![
            Transcript::new("first", 0.9),
            Transcript::new("second", 0.8),
        ]);

        assert_eq!(recognizer.recognize(&[0.1], "ru").unwrap().text, "first");
        assert_eq!(recognizer.recognize(&[0.1], "ru").unwrap().text, "second");
        assert_eq!(recognizer.recognize(&[0.1], "ru").unwrap().text, "default");
    }

    #[test]
    fn keyed_response_matches_sample_count() {
        let recognizer = MockRecognizer::new("default", 0.5)
            .with_keyed_response(3, Transcript::new("keyed", 1.0));

        assert_eq!(
            recognizer.recognize(&[0.1, 0.2, 0.3], "ru").unwrap().text,
            "keyed"
        );
        assert_eq!(recognizer.recognize(&[0.1], "ru").unwrap().text, "default");
    }

    #[test]
    fn failure_mode_returns_error() {
        let recognizer = MockRecognizer::new("x", 0.9).with_failure();
        assert!(recognizer.recognize(&[0.1], "ru").is_err());
    }

    #[test]
    fn readiness_flag_is_reported() {
        assert!(MockRecognizer::new("x", 0.9).is_ready());
        assert!(!MockRecognizer::new("x", 0.9).with_not_ready().is_ready());
    }

    #[test]
    fn trait_is_object_safe() {
        let recognizer: Box<dyn Recognizer> = Box::new(MockRecognizer::new("boxed", 0.7));
        assert_eq!(recognizer.recognize(&[0.2], "ru").unwrap().text, "boxed");
    }

    #[test]
    fn api_recognizer_readiness_requires_api_key() {
        let without_key = ApiRecognizer::new(ApiRecognizerConfig::default()).unwrap();
        assert!(!without_key.is_ready());

        let with_key = ApiRecognizer::new(ApiRecognizerConfig {
            api_key: "sk-test".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(with_key.is_ready());
        assert_eq!(with_key.name(), "whisper-1");
    }

    #[test]
    fn encode_wav_produces_a_parsable_mono_file() {
        let wav = ApiRecognizer::encode_wav(&[0.0, 0.5, -0.5, 1.0]).unwrap();

        let mut reader = hound::WavReader::new(std::io::Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);

        let samples: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], 0);
        assert_eq!(samples[3], i16::MAX);
    }

    #[test]
    fn api_recognizer_treats_empty_input_as_silence() {
        let recognizer = ApiRecognizer::new(ApiRecognizerConfig::default()).unwrap();
        // No request is made for an empty segment.
        assert!(recognizer.recognize(&[], "ru").unwrap().is_empty());
    }
}
