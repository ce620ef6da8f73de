//! Application composition: wires configuration, collaborators and the
//! pipeline together for one translation run.

use crate::audio::wav::WavAudioSource;
use crate::cli::Cli;
use crate::config::Config;
use crate::defaults::SAMPLE_RATE;
use crate::output::ConsoleRenderer;
use crate::pipeline::sink::WavFileSink;
use crate::pipeline::{event_channel, EventReporter, Pipeline};
use crate::speech::recognizer::{ApiRecognizer, ApiRecognizerConfig};
use crate::speech::synthesizer::{ApiSynthesizer, ApiSynthesizerConfig};
use crate::speech::translator::{ChatTranslator, ChatTranslatorConfig};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Initializes the `log` backend from the verbosity flags.
///
/// `RUST_LOG` still wins when set.
pub fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}

/// Load configuration from file or use defaults.
///
/// Priority order:
/// 1. Custom config path from CLI (--config)
/// 2. Default config path (~/.config/voxbridge/config.toml)
/// 3. Built-in defaults with environment variable overrides
fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };
    Ok(config.with_env_overrides())
}

/// Runs one full translation of the input file.
pub async fn run(cli: Cli) -> Result<()> {
    let config = cli.apply_to(load_config(cli.config.as_deref())?);

    let api_key = std::env::var("VOXBRIDGE_API_KEY").unwrap_or_default();
    let timeout = Duration::from_secs(60);

    let source = WavAudioSource::from_path(&cli.input)
        .with_context(|| format!("failed to open {}", cli.input.display()))?;

    let recognizer = Arc::new(ApiRecognizer::new(ApiRecognizerConfig {
        endpoint: config.recognition.endpoint.clone(),
        model: config.recognition.model.clone(),
        api_key: api_key.clone(),
        timeout,
    })?);
    let translator = Arc::new(ChatTranslator::new(ChatTranslatorConfig {
        endpoint: config.translation.endpoint.clone(),
        model: config.translation.model.clone(),
        api_key: api_key.clone(),
        timeout: Duration::from_secs(30),
    })?);
    let synthesizer = Arc::new(ApiSynthesizer::new(ApiSynthesizerConfig {
        endpoint: config.synthesis.endpoint.clone(),
        model: config.synthesis.model.clone(),
        voice: config.synthesis.voice.clone(),
        api_key,
        timeout,
    })?);

    let out_dir = config
        .output
        .directory
        .clone()
        .unwrap_or_else(|| PathBuf::from("."));
    let sink = WavFileSink::timestamped(&out_dir, SAMPLE_RATE);
    let output_path = sink.path().to_path_buf();

    let (events, event_rx) = event_channel();
    let handle = Pipeline::new(
        Box::new(source),
        recognizer,
        translator,
        synthesizer,
        Box::new(sink),
        config.pipeline_config(),
    )
    .with_reporter(Arc::new(EventReporter::new(events.clone())))
    .with_events(events)
    .start()?;

    if !cli.quiet {
        println!(
            "Translating {} ({} → {})",
            cli.input.display(),
            config.recognition.language,
            config.translation.target_language
        );
    }

    // Ctrl-C drains the pipeline instead of killing the process.
    let cancel = handle.cancel_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::info!("interrupt received, draining pipeline");
            cancel.cancel();
        }
    });

    // Event rendering runs until every stage drops its sender.
    let quiet = cli.quiet;
    let renderer = std::thread::spawn(move || {
        let mut renderer = ConsoleRenderer::new(quiet);
        while let Ok(event) = event_rx.recv() {
            renderer.render(&event);
        }
    });

    let result = tokio::task::spawn_blocking(move || handle.wait())
        .await
        .context("pipeline thread panicked")?;

    let _ = renderer.join();
    result?;

    if !cli.quiet && output_path.exists() {
        println!("Mixed output written to {}", output_path.display());
    }
    Ok(())
}
