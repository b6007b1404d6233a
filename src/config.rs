//! Run configuration
//!
//! Every tunable is resolved once at startup into a [`DigestConfig`] and
//! handed to components as `Arc<DigestConfig>`. Sources, lowest priority
//! first: built-in defaults, a YAML file, then CLI overrides applied by the
//! binary.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Static configuration for one run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DigestConfig {
    /// Model identifier sent with every request
    pub model: String,
    /// Full URL of the generate endpoint
    pub endpoint: String,
    /// Appended to the input directory name when no output directory is given
    pub output_suffix: String,
    /// File whose contents replace the built-in month instructions
    pub prompt_file: Option<PathBuf>,
    /// Largest combined text (in characters) summarized in a single call
    pub max_chunk_size: usize,
    /// Assumed generation rate, used only for time estimates
    pub tokens_per_second: f64,
    /// Assumed output length of one call, used only for time estimates
    pub output_tokens_per_call: u32,
    /// Every extracted date is forced into this year
    pub expected_year: i32,
    /// Persist the raw prompts next to the summaries
    pub save_debug_prompts: bool,
    /// Pause between sequential chunk calls of one month
    pub chunk_delay_ms: u64,
    /// Pause between batches of concurrently processed months
    pub batch_delay_ms: u64,
    /// File extensions (without the dot) treated as notes
    pub note_extensions: Vec<String>,
}

impl Default for DigestConfig {
    fn default() -> Self {
        Self {
            model: "llama3.1:8b".to_string(),
            endpoint: "http://localhost:11434/api/generate".to_string(),
            output_suffix: "_summaries".to_string(),
            prompt_file: None,
            max_chunk_size: 40_000,
            tokens_per_second: 20.0,
            output_tokens_per_call: 800,
            expected_year: 2025,
            save_debug_prompts: false,
            chunk_delay_ms: 2_000,
            batch_delay_ms: 5_000,
            note_extensions: vec!["md".to_string(), "txt".to_string()],
        }
    }
}

impl DigestConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist and parse. Without one, the per-user file
    /// (`<config dir>/journal-digest/config.yaml`) is used when present,
    /// otherwise the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => {
                    tracing::debug!(path = %path.display(), "using per-user config file");
                    Self::from_file(&path)?
                }
                None => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file. Missing keys fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        // An empty document deserializes to unit, not to a struct
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text)
    }

    /// Reject values that would make the pipeline meaningless.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "max_chunk_size must be greater than zero".to_string(),
            ));
        }
        if self.tokens_per_second.is_nan() || self.tokens_per_second <= 0.0 {
            return Err(ConfigError::Invalid(
                "tokens_per_second must be positive".to_string(),
            ));
        }
        if self.note_extensions.is_empty() {
            return Err(ConfigError::Invalid(
                "note_extensions must name at least one extension".to_string(),
            ));
        }
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn chunk_delay(&self) -> Duration {
        Duration::from_millis(self.chunk_delay_ms)
    }

    pub fn batch_delay(&self) -> Duration {
        Duration::from_millis(self.batch_delay_ms)
    }

    /// Default output directory: a sibling of the input named
    /// `<input name><output_suffix>`.
    pub fn default_output_dir(&self, input_dir: &Path) -> PathBuf {
        let name = input_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "notes".to_string());
        let parent = input_dir.parent().unwrap_or_else(|| Path::new("."));
        parent.join(format!("{}{}", name, self.output_suffix))
    }

    /// Whether a file extension (without the dot) marks a note.
    pub fn is_note_extension(&self, ext: &str) -> bool {
        self.note_extensions
            .iter()
            .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}

/// Per-user config location (~/.config/journal-digest/config.yaml on Linux)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("journal-digest").join("config.yaml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = DigestConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_chunk_size, 40_000);
        assert_eq!(config.expected_year, 2025);
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_keys() {
        let config = DigestConfig::from_yaml("model: qwen2.5:14b\nexpected_year: 2024\n").unwrap();
        assert_eq!(config.model, "qwen2.5:14b");
        assert_eq!(config.expected_year, 2024);
        assert_eq!(config.max_chunk_size, 40_000);
        assert!(!config.save_debug_prompts);
    }

    #[test]
    fn empty_yaml_is_default() {
        let config = DigestConfig::from_yaml("  \n").unwrap();
        assert_eq!(config.model, DigestConfig::default().model);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let config = DigestConfig {
            max_chunk_size: 0,
            ..DigestConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn non_positive_rate_is_rejected() {
        let config = DigestConfig {
            tokens_per_second: 0.0,
            ..DigestConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_explicit_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_chunk_size: 1234\nsave_debug_prompts: true").unwrap();

        let config = DigestConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.max_chunk_size, 1234);
        assert!(config.save_debug_prompts);
    }

    #[test]
    fn load_missing_explicit_file_fails() {
        let err = DigestConfig::load(Some(Path::new("/definitely/not/here.yaml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_chunk_size: [not, a, number]").unwrap();

        let err = DigestConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn default_output_dir_is_sibling_with_suffix() {
        let config = DigestConfig::default();
        let out = config.default_output_dir(Path::new("/data/journal"));
        assert_eq!(out, PathBuf::from("/data/journal_summaries"));
    }

    #[test]
    fn extension_match_ignores_case_and_dot() {
        let config = DigestConfig {
            note_extensions: vec![".MD".to_string()],
            ..DigestConfig::default()
        };
        assert!(config.is_note_extension("md"));
        assert!(!config.is_note_extension("txt"));
    }
}
