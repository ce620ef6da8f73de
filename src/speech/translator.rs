//! Translator trait, HTTP chat-completions implementation, and test double.

use crate::error::{Result, VoxbridgeError};
use crate::speech::context::ContextTurn;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// Trait for text translation.
///
/// Callers treat any failure as "no translation produced for this turn",
/// never as fatal.
pub trait Translator: Send + Sync {
    /// Translate source-language text given the conversation so far.
    ///
    /// # Arguments
    /// * `text` - source-language text to translate
    /// * `context` - prior turns in request order (system, exchanges, text)
    fn translate(&self, text: &str, context: &[ContextTurn]) -> Result<String>;

    /// Name of the backing engine for logging.
    fn name(&self) -> &str;

    /// Check if the translator is ready. Startup aborts when false.
    fn is_ready(&self) -> bool;
}

/// Configuration for the chat-completions translator.
#[derive(Debug, Clone)]
pub struct ChatTranslatorConfig {
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    /// Model identifier sent with each request.
    pub model: String,
    /// Bearer token; typically from `VOXBRIDGE_API_KEY`.
    pub api_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for ChatTranslatorConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ContextTurn],
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// The JSON object the model is instructed to return.
#[derive(Debug, Deserialize)]
struct TranslationPayload {
    translation: String,
}

/// Translator backed by an OpenAI-compatible chat-completions endpoint.
///
/// The system instruction (carried in the context) asks for a JSON object
/// `{"translation": "..."}`; anything else is a recoverable failure.
pub struct ChatTranslator {
    config: ChatTranslatorConfig,
    client: reqwest::blocking::Client,
}

impl ChatTranslator {
    pub fn new(config: ChatTranslatorConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| VoxbridgeError::TranslatorNotReady {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { config, client })
    }

    /// Parses the model's JSON reply into the translated text.
    fn parse_reply(content: &str) -> Result<String> {
        let payload: TranslationPayload =
            serde_json::from_str(content).map_err(|e| VoxbridgeError::Translation {
                message: format!("malformed translation payload: {}", e),
            })?;
        Ok(payload.translation)
    }
}

impl Translator for ChatTranslator {
    fn translate(&self, _text: &str, context: &[ContextTurn]) -> Result<String> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: context,
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .map_err(|e| VoxbridgeError::Translation {
                message: format!("request failed: {}", e),
            })?
            .error_for_status()
            .map_err(|e| VoxbridgeError::Translation {
                message: format!("service error: {}", e),
            })?;

        let parsed: ChatResponse =
            response.json().map_err(|e| VoxbridgeError::Translation {
                message: format!("malformed response: {}", e),
            })?;

        let content = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| VoxbridgeError::Translation {
                message: "response contained no choices".to_string(),
            })?;

        Self::parse_reply(content)
    }

    fn name(&self) -> &str {
        &self.config.model
    }

    fn is_ready(&self) -> bool {
        !self.config.api_key.is_empty()
    }
}

/// Mock translator for testing.
pub struct MockTranslator {
    mappings: HashMap<String, String>,
    fallback: Option<String>,
    calls: Mutex<Vec<String>>,
    should_fail: bool,
    ready: bool,
}

impl MockTranslator {
    /// Creates a mock with no mappings; unmapped inputs fail unless a
    /// fallback is set.
    pub fn new() -> Self {
        Self {
            mappings: HashMap::new(),
            fallback: None,
            calls: Mutex::new(Vec::new()),
            should_fail: false,
            ready: true,
        }
    }

    /// Maps one source text to a translation.
    pub fn with_mapping(mut self, source: &str, target: &str) -> Self {
        self.mappings.insert(source.to_string(), target.to_string());
        self
    }

    /// Translation returned for unmapped inputs.
    pub fn with_fallback(mut self, target: &str) -> Self {
        self.fallback = Some(target.to_string());
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

    /// Source texts received so far.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Number of translate calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for MockTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl Translator for MockTranslator {
    fn translate(&self, text: &str, _context: &[ContextTurn]) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(text.to_string());
        }
        if self.should_fail {
            return Err(VoxbridgeError::Translation {
                message: "mock translation failure".to_string(),
            });
        }
        if let Some(target) = self.mappings.get(text) {
            return Ok(target.clone());
        }
        if let Some(ref fallback) = self.fallback {
            return Ok(fallback.clone());
        }
        Err(VoxbridgeError::Translation {
            message: format!("no mapping for '{}'", text),
        })
    }

    fn name(&self) -> &str {
        "mock-translator"
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::speech::context::{Role, TranslationContext};

    #[test]
    fn mock_translates_mapped_text() {
        let translator = MockTranslator::new().with_mapping("привет", "hello");
        let result = translator.translate("привет", &[]).unwrap();
        assert_eq!(result, "hello");
        assert_eq!(translator.calls(), vec!["привет"]);
    }

    #[test]
    fn mock_unmapped_without_fallback_fails() {
        let translator = MockTranslator::new();
        assert!(translator.translate("x", &[]).is_err());
    }

    #[test]
    fn mock_fallback_covers_unmapped_text() {
        let translator = MockTranslator::new().with_fallback("…");
        assert_eq!(translator.translate("anything", &[]).unwrap(), "…");
    }

    #[test]
    fn parse_reply_extracts_translation() {
        let content = r#"{"translation": "hello world"}"#;
        assert_eq!(ChatTranslator::parse_reply(content).unwrap(), "hello world");
    }

    #[test]
    fn parse_reply_rejects_malformed_json() {
        assert!(ChatTranslator::parse_reply("not json").is_err());
        assert!(ChatTranslator::parse_reply(r#"{"other": 1}"#).is_err());
    }

    #[test]
    fn chat_request_serializes_context_as_messages() {
        let mut context = TranslationContext::new("translate to English", 4);
        context.push_exchange("раз", "one");
        let turns = context.turns_with_pending("два");

        let request = ChatRequest {
            model: "gpt-4o-mini",
            messages: &turns,
            temperature: 0.0,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["response_format"]["type"], "json_object");
        let messages = json["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[3]["role"], "user");
        assert_eq!(messages[3]["content"], "два");
        assert_eq!(turns[0].role, Role::System);
    }

    #[test]
    fn chat_translator_readiness_requires_api_key() {
        let without_key = ChatTranslator::new(ChatTranslatorConfig::default()).unwrap();
        assert!(!without_key.is_ready());

        let with_key = ChatTranslator::new(ChatTranslatorConfig {
            api_key: "sk-test".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert!(with_key.is_ready());
    }
}
