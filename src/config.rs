use crate::defaults;
use crate::pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub recognition: RecognitionConfig,
    pub translation: TranslationConfig,
    pub synthesis: SynthesisConfig,
    pub output: OutputConfig,
}

/// Audio segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub chunk_secs: f32,
    pub silence_threshold_pct: f32,
    pub noise_suppression: bool,
}

/// Speech recognition configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Source language code passed to the recognizer.
    pub language: String,
    pub model: String,
    pub endpoint: String,
}

/// Translation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TranslationConfig {
    pub target_language: String,
    pub model: String,
    pub endpoint: String,
    /// Retained (user, assistant) pairs in the rolling context.
    pub context_max_turns: usize,
}

/// Speech synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    pub model: String,
    pub voice: String,
    pub endpoint: String,
}

/// Mixed output configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for the timestamped WAV file; current directory when unset.
    pub directory: Option<PathBuf>,
    pub window_secs: f32,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            chunk_secs: defaults::CHUNK_SECS,
            silence_threshold_pct: defaults::SILENCE_THRESHOLD_PCT,
            noise_suppression: false,
        }
    }
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            language: defaults::SOURCE_LANGUAGE.to_string(),
            model: "whisper-1".to_string(),
            endpoint: "https://api.openai.com/v1/audio/transcriptions".to_string(),
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini-tts".to_string(),
            voice: "alloy".to_string(),
            endpoint: "https://api.openai.com/v1/audio/speech".to_string(),
        }
    }
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            target_language: defaults::TARGET_LANGUAGE.to_string(),
            model: "gpt-4o-mini".to_string(),
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            context_max_turns: defaults::CONTEXT_MAX_TURNS,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: None,
            window_secs: defaults::OUTPUT_WINDOW_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Returns an error if the file contains invalid TOML.
    /// Missing fields will use default values.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file or return defaults if file doesn't exist
    ///
    /// Only returns defaults if the file is missing.
    /// Returns errors for invalid TOML.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(e) => {
                let missing = e
                    .downcast_ref::<std::io::Error>()
                    .map(|io_err| io_err.kind() == std::io::ErrorKind::NotFound)
                    .unwrap_or(false);
                if missing {
                    Ok(Self::default())
                } else {
                    Err(e.context(format!("failed to load config from {}", path.display())))
                }
            }
        }
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - VOXBRIDGE_SOURCE_LANGUAGE → recognition.language
    /// - VOXBRIDGE_TARGET_LANGUAGE → translation.target_language
    /// - VOXBRIDGE_MODEL → translation.model
    /// - VOXBRIDGE_ENDPOINT → translation.endpoint
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(language) = std::env::var("VOXBRIDGE_SOURCE_LANGUAGE") {
            if !language.is_empty() {
                self.recognition.language = language;
            }
        }

        if let Ok(language) = std::env::var("VOXBRIDGE_TARGET_LANGUAGE") {
            if !language.is_empty() {
                self.translation.target_language = language;
            }
        }

        if let Ok(model) = std::env::var("VOXBRIDGE_MODEL") {
            if !model.is_empty() {
                self.translation.model = model;
            }
        }

        if let Ok(endpoint) = std::env::var("VOXBRIDGE_ENDPOINT") {
            if !endpoint.is_empty() {
                self.translation.endpoint = endpoint;
            }
        }

        self
    }

    /// Get the default configuration file path
    ///
    /// Returns ~/.config/voxbridge/config.toml on Linux
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("voxbridge")
            .join("config.toml")
    }

    /// Translates file configuration into pipeline tuning knobs.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            chunk_secs: self.audio.chunk_secs,
            silence_threshold_pct: self.audio.silence_threshold_pct,
            noise_suppression: self.audio.noise_suppression,
            source_language: self.recognition.language.clone(),
            target_language: self.translation.target_language.clone(),
            output_window_secs: self.output.window_secs,
            context_max_turns: self.translation.context_max_turns,
            drain_timeout: defaults::DRAIN_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;
    use tempfile::NamedTempFile;

    // Mutex to serialize tests that modify environment variables
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_voxbridge_env() {
        std::env::remove_var("VOXBRIDGE_SOURCE_LANGUAGE");
        std::env::remove_var("VOXBRIDGE_TARGET_LANGUAGE");
        std::env::remove_var("VOXBRIDGE_MODEL");
        std::env::remove_var("VOXBRIDGE_ENDPOINT");
    }

    #[test]
    fn default_config_has_expected_values() {
        let config = Config::default();

        assert_eq!(config.audio.chunk_secs, 3.0);
        assert_eq!(config.audio.silence_threshold_pct, 3.0);
        assert!(!config.audio.noise_suppression);

        assert_eq!(config.recognition.language, "ru");
        assert_eq!(config.recognition.model, "whisper-1");
        assert_eq!(config.translation.target_language, "en");
        assert_eq!(config.translation.model, "gpt-4o-mini");
        assert_eq!(config.translation.context_max_turns, 16);
        assert_eq!(config.synthesis.voice, "alloy");
        assert_eq!(config.synthesis.model, "gpt-4o-mini-tts");

        assert_eq!(config.output.directory, None);
        assert_eq!(config.output.window_secs, 5.0);
    }

    #[test]
    fn load_from_toml_file() {
        let toml_content = r#"
            [audio]
            chunk_secs = 2.0
            silence_threshold_pct = 5.0
            noise_suppression = true

            [recognition]
            language = "de"

            [translation]
            target_language = "fr"
            model = "gpt-4o"
            context_max_turns = 4

            [synthesis]
            voice = "nova"

            [output]
            directory = "/tmp/out"
            window_secs = 2.5
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.audio.chunk_secs, 2.0);
        assert_eq!(config.audio.silence_threshold_pct, 5.0);
        assert!(config.audio.noise_suppression);
        assert_eq!(config.recognition.language, "de");
        assert_eq!(config.translation.target_language, "fr");
        assert_eq!(config.translation.model, "gpt-4o");
        assert_eq!(config.translation.context_max_turns, 4);
        assert_eq!(config.synthesis.voice, "nova");
        assert_eq!(config.synthesis.model, "gpt-4o-mini-tts");
        assert_eq!(config.output.directory, Some(PathBuf::from("/tmp/out")));
        assert_eq!(config.output.window_secs, 2.5);
    }

    #[test]
    fn partial_config_uses_defaults_elsewhere() {
        let toml_content = r#"
            [recognition]
            language = "ja"
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(temp_file.path()).unwrap();

        assert_eq!(config.recognition.language, "ja");
        assert_eq!(config.audio.chunk_secs, 3.0);
        assert_eq!(config.translation.target_language, "en");
    }

    #[test]
    fn env_overrides_apply_when_set_and_nonempty() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_voxbridge_env();

        std::env::set_var("VOXBRIDGE_SOURCE_LANGUAGE", "uk");
        std::env::set_var("VOXBRIDGE_MODEL", "");
        let config = Config::default().with_env_overrides();

        assert_eq!(config.recognition.language, "uk");
        // Empty string does not override the default.
        assert_eq!(config.translation.model, "gpt-4o-mini");

        clear_voxbridge_env();
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let invalid_toml = r#"
            [audio
            chunk_secs = "broken
        "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_toml.as_bytes()).unwrap();

        assert!(Config::load(temp_file.path()).is_err());
        assert!(Config::load_or_default(temp_file.path()).is_err());
    }

    #[test]
    fn load_or_default_returns_default_for_missing_file() {
        let missing_path = Path::new("/tmp/nonexistent_voxbridge_config_12345.toml");
        let config = Config::load_or_default(missing_path).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn default_path_is_xdg_compliant() {
        let path = Config::default_path();
        let path_str = path.to_string_lossy();

        assert!(path_str.contains("voxbridge"));
        assert!(path_str.ends_with("config.toml"));
    }

    #[test]
    fn pipeline_config_mirrors_file_values() {
        let mut config = Config::default();
        config.audio.chunk_secs = 1.5;
        config.recognition.language = "es".to_string();

        let pipeline = config.pipeline_config();
        assert_eq!(pipeline.chunk_secs, 1.5);
        assert_eq!(pipeline.source_language, "es");
        assert_eq!(pipeline.target_language, "en");
    }
}
