//! Audio input: capture sources and the chunk accumulator.

pub mod accumulator;
pub mod noise;
pub mod source;
pub mod wav;

pub use accumulator::{ChunkAccumulator, ChunkAccumulatorConfig, ChunkOutput};
pub use source::{AudioSource, MockAudioSource};
pub use wav::WavAudioSource;
