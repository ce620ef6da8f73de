//! Streaming translation pipeline: capture, recognition, translation,
//! synthesis and mixing stages connected by bounded queues.

pub mod cancel;
pub mod error;
pub mod events;
pub mod mixer;
pub mod queue;
pub mod recognizer_station;
pub mod sink;
pub mod station;
pub mod supervisor;
pub mod synthesizer_station;
pub mod translator_station;
pub mod types;

pub use cancel::CancelToken;
pub use error::{ErrorReporter, EventReporter, LogReporter, WorkerError};
pub use events::{event_channel, EventSender, PipelineEvent};
pub use mixer::{mix, MixerStation, OutputAccumulator};
pub use queue::{stage_queue, Dequeued, StageReceiver, StageSender};
pub use recognizer_station::RecognizerStation;
pub use sink::{AudioSink, CollectorSink, WavFileSink};
pub use station::{Worker, WorkerRunner};
pub use supervisor::{Pipeline, PipelineConfig, PipelineHandle, PipelineState};
pub use synthesizer_station::SynthesizerStation;
pub use translator_station::TranslatorStation;
pub use types::{
    AudioSegment, MixedWindow, RecognizedSegment, SynthesizedSegment, Transcript,
    TranslatedSegment,
};
