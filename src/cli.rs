//! Command-line interface for voxbridge
//!
//! Provides argument parsing using clap derive macros.

use crate::config::Config;
use clap::Parser;
use std::path::PathBuf;

/// Near-real-time speech translation for the command line
#[derive(Parser, Debug)]
#[command(
    name = "voxbridge",
    version,
    about = "Near-real-time speech translation for the command line"
)]
pub struct Cli {
    /// WAV file to translate
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Source language code (e.g. ru, de, es)
    #[arg(long, value_name = "LANG")]
    pub source_lang: Option<String>,

    /// Target language code (e.g. en, fr)
    #[arg(long, value_name = "LANG")]
    pub target_lang: Option<String>,

    /// Chunk duration in seconds for recognition
    #[arg(long, short = 'c', value_name = "SECONDS", value_parser = parse_chunk_secs)]
    pub chunk_secs: Option<f32>,

    /// Directory for the mixed output WAV file (default: current directory)
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Enable stationary noise suppression on captured segments
    #[arg(long)]
    pub noise_suppression: bool,

    /// Suppress the level meter and captions (errors still shown)
    #[arg(short, long)]
    pub quiet: bool,

    /// Verbose output (-v: stage timings, -vv: full diagnostics)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a chunk duration, accepting bare seconds or `humantime` formats
/// (`3s`, `1500ms`).
fn parse_chunk_secs(s: &str) -> Result<f32, String> {
    let s = s.trim();
    if let Ok(secs) = s.parse::<f32>() {
        if secs > 0.0 {
            return Ok(secs);
        }
        return Err("chunk duration must be positive".to_string());
    }
    humantime::parse_duration(s)
        .map(|d| d.as_secs_f32())
        .map_err(|e| e.to_string())
}

impl Cli {
    /// Folds CLI overrides into the file configuration. CLI flags win.
    pub fn apply_to(&self, mut config: Config) -> Config {
        if let Some(ref lang) = self.source_lang {
            config.recognition.language = lang.clone();
        }
        if let Some(ref lang) = self.target_lang {
            config.translation.target_language = lang.clone();
        }
        if let Some(secs) = self.chunk_secs {
            config.audio.chunk_secs = secs;
        }
        if let Some(ref dir) = self.output {
            config.output.directory = Some(dir.clone());
        }
        if self.noise_suppression {
            config.audio.noise_suppression = true;
        }
        config
    }
}
