//! voxbridge - Near-real-time speech translation for the command line
//!
//! Recognizes speech in one language, translates it, synthesizes the
//! translation, and mixes it back over the original audio.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod app;
pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod speech;

// Core traits (source → stages → sink)
pub use audio::source::AudioSource;
pub use pipeline::sink::{AudioSink, CollectorSink, WavFileSink};
pub use speech::recognizer::Recognizer;
pub use speech::synthesizer::Synthesizer;
pub use speech::translator::Translator;

// Pipeline
pub use pipeline::supervisor::{Pipeline, PipelineConfig, PipelineHandle, PipelineState};

// Error handling
pub use error::{Result, VoxbridgeError};

// Config
pub use config::Config;

// Worker framework (for advanced users)
pub use pipeline::error::{ErrorReporter, WorkerError};
pub use pipeline::station::Worker;
