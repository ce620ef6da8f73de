//! Output sinks for mixed audio windows.

use crate::error::{Result, VoxbridgeError};
use crate::pipeline::types::MixedWindow;
use chrono::Local;
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Destination for mixed output windows.
///
/// `write` is called once per window, in emission order, from the mixer
/// thread. `finish` is called exactly once after the last window.
pub trait AudioSink: Send {
    /// Appends one window of mixed audio.
    fn write(&mut self, window: &MixedWindow) -> Result<()>;

    /// Finalizes the sink. No writes follow.
    fn finish(&mut self) -> Result<()>;

    /// Name of the sink for logging.
    fn name(&self) -> &str;
}

/// Writes mixed windows to a 16-bit mono WAV file.
///
/// The writer is created lazily on the first window so that a run which
/// produces no output leaves no empty file behind.
pub struct WavFileSink {
    path: PathBuf,
    writer: Option<WavWriter<BufWriter<File>>>,
    sample_rate: u32,
    samples_written: u64,
}

impl WavFileSink {
    /// Creates a sink writing to `path`.
    pub fn new(path: impl Into<PathBuf>, sample_rate: u32) -> Self {
        Self {
            path: path.into(),
            writer: None,
            sample_rate,
            samples_written: 0,
        }
    }

    /// Creates a sink with a timestamped filename under `dir`.
    pub fn timestamped(dir: impl AsRef<Path>, sample_rate: u32) -> Self {
        let name = format!("voxbridge-{}.wav", Local::now().format("%Y%m%d-%H%M%S"));
        Self::new(dir.as_ref().join(name), sample_rate)
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn create_writer(path: &Path, sample_rate: u32) -> Result<WavWriter<BufWriter<File>>> {
        let spec = WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let writer = WavWriter::create(path, spec).map_err(|e| VoxbridgeError::AudioOutput {
            message: format!("failed to create {}: {}", path.display(), e),
        })?;
        log::info!("writing mixed output to {}", path.display());
        Ok(writer)
    }
}

impl AudioSink for WavFileSink {
    fn write(&mut self, window: &MixedWindow) -> Result<()> {
        if self.writer.is_none() {
            self.writer = Some(Self::create_writer(&self.path, self.sample_rate)?);
        }
        if let Some(ref mut writer) = self.writer {
            for &sample in &window.samples {
                let quantized = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
                writer
                    .write_sample(quantized)
                    .map_err(|e| VoxbridgeError::AudioOutput {
                        message: format!("failed to write sample: {}", e),
                    })?;
            }
        }
        self.samples_written += window.samples.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finalize().map_err(|e| VoxbridgeError::AudioOutput {
                message: format!("failed to finalize {}: {}", self.path.display(), e),
            })?;
            log::info!(
                "finalized {} ({} samples)",
                self.path.display(),
                self.samples_written
            );
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}

/// Sink that collects windows in memory for tests.
pub struct CollectorSink {
    windows: Arc<Mutex<Vec<MixedWindow>>>,
    finished: Arc<Mutex<bool>>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self {
            windows: Arc::new(Mutex::new(Vec::new())),
            finished: Arc::new(Mutex::new(false)),
        }
    }

    /// Shared handle to the collected windows.
    pub fn windows(&self) -> Arc<Mutex<Vec<MixedWindow>>> {
        self.windows.clone()
    }

    /// Shared flag set when `finish` has been called.
    pub fn finished_flag(&self) -> Arc<Mutex<bool>> {
        self.finished.clone()
    }
}

impl Default for CollectorSink {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSink for CollectorSink {
    fn write(&mut self, window: &MixedWindow) -> Result<()> {
        if let Ok(mut windows) = self.windows.lock() {
            windows.push(window.clone());
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Ok(mut finished) = self.finished.lock() {
            *finished = true;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "collector"
    }
}
