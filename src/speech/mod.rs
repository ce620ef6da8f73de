//! External collaborator interfaces: recognition, translation, synthesis.
//!
//! The pipeline treats all three as black boxes behind narrow traits so real
//! engines and mocks are interchangeable.

pub mod context;
pub mod recognizer;
pub mod synthesizer;
pub mod translator;

pub use context::{ContextTurn, Role, TranslationContext};
pub use recognizer::{ApiRecognizer, ApiRecognizerConfig, MockRecognizer, Recognizer};
pub use synthesizer::{ApiSynthesizer, ApiSynthesizerConfig, MockSynthesizer, Synthesizer};
pub use translator::{ChatTranslator, ChatTranslatorConfig, MockTranslator, Translator};
