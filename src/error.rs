//! Error types for voxbridge.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoxbridgeError {
    // Configuration errors
    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    // Audio capture errors
    #[error("Audio source failed: {message}")]
    AudioCapture { message: String },

    // Recognition errors
    #[error("Recognizer not ready: {message}")]
    RecognizerNotReady { message: String },

    #[error("Recognition failed: {message}")]
    Recognition { message: String },

    // Translation errors
    #[error("Translator not ready: {message}")]
    TranslatorNotReady { message: String },

    #[error("Translation failed: {message}")]
    Translation { message: String },

    // Synthesis errors
    #[error("Synthesizer not ready: {message}")]
    SynthesizerNotReady { message: String },

    #[error("Synthesis failed: {message}")]
    Synthesis { message: String },

    // Output errors
    #[error("Audio output failed: {message}")]
    AudioOutput { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, VoxbridgeError>;
