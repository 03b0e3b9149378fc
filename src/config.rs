//! Run configuration for the detection engine.
//!
//! [`RunConfig`] is the immutable per-invocation settings bundle consumed by
//! the engine: which granularities are enabled, phrase window bounds, fuzzy
//! matching threshold and resource ceilings. It is validated once, before any
//! processing begins; violations are fatal.
//!
//! [`FileDefaults`] holds optional user defaults loaded from the platform
//! config directory (e.g. `~/.config/dejatext/config.json` on Linux). CLI
//! arguments take precedence over file defaults, which take precedence over
//! the built-in values.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use thiserror::Error;

/// Built-in default minimum phrase window length (words).
pub const DEFAULT_MIN_PHRASE_LEN: usize = 2;
/// Built-in default maximum phrase window length (words).
pub const DEFAULT_MAX_PHRASE_LEN: usize = 20;
/// Built-in default fuzzy similarity threshold (percent).
pub const DEFAULT_FUZZ_THRESHOLD: u8 = 90;
/// Paragraphs with this many words or fewer are not compared.
pub const DEFAULT_MIN_PARAGRAPH_WORDS: usize = 20;
/// Words shorter than this many characters (after punctuation stripping)
/// are not compared.
pub const DEFAULT_MIN_WORD_CHARS: usize = 2;
/// Default ceiling on fuzzy comparison candidates per granularity.
pub const DEFAULT_MAX_FUZZY_UNITS: usize = 2000;
/// Default wall-clock budget for the fuzzy stage of one granularity.
pub const DEFAULT_FUZZY_TIMEOUT_SECS: u64 = 30;
/// Normalized keys shorter than this are excluded from fuzzy comparison;
/// tiny strings score spuriously high ratios.
pub const DEFAULT_FUZZY_MIN_CHARS: usize = 2;

/// Configuration validation errors. All of these are fatal and reported
/// before any document is read.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// min phrase length exceeds max phrase length.
    #[error("invalid phrase bounds: min {min} > max {max}")]
    PhraseBounds {
        /// Configured minimum window length
        min: usize,
        /// Configured maximum window length
        max: usize,
    },

    /// Phrase windows must contain at least one word.
    #[error("minimum phrase length must be at least 1")]
    PhraseMinZero,

    /// Fuzzy threshold is a percentage.
    #[error("fuzz threshold must be 0-100, got {0}")]
    ThresholdRange(u8),

    /// Running with every granularity disabled would do nothing.
    #[error("at least one granularity check must be enabled")]
    NoChecksEnabled,
}

/// Immutable per-invocation engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Compare whole-file contents.
    pub check_files: bool,
    /// Compare paragraphs (blank-line separated blocks).
    pub check_paragraphs: bool,
    /// Compare sentences.
    pub check_sentences: bool,
    /// Compare sliding phrase windows.
    pub check_phrases: bool,
    /// Tally repeated words.
    pub check_words: bool,

    /// Minimum phrase window length in words (inclusive).
    pub min_phrase_len: usize,
    /// Maximum phrase window length in words (inclusive).
    pub max_phrase_len: usize,
    /// Paragraphs with this many words or fewer are ignored.
    pub min_paragraph_words: usize,
    /// Words shorter than this many characters are ignored.
    pub min_word_chars: usize,

    /// Enable fuzzy (near-duplicate) matching.
    pub fuzzy: bool,
    /// Minimum similarity percentage for a fuzzy match edge.
    pub fuzz_threshold: u8,
    /// Hard ceiling on fuzzy comparison candidates per granularity; above
    /// this the fuzzy stage is skipped with a recorded warning.
    pub max_fuzzy_units: usize,
    /// Wall-clock budget for the fuzzy stage of one granularity; exceeded
    /// budgets are reported as a skip, not a crash.
    pub fuzzy_timeout: Duration,
    /// Normalized keys shorter than this are excluded from fuzzy comparison.
    pub fuzzy_min_chars: usize,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            check_files: true,
            check_paragraphs: true,
            check_sentences: true,
            check_phrases: true,
            check_words: true,
            min_phrase_len: DEFAULT_MIN_PHRASE_LEN,
            max_phrase_len: DEFAULT_MAX_PHRASE_LEN,
            min_paragraph_words: DEFAULT_MIN_PARAGRAPH_WORDS,
            min_word_chars: DEFAULT_MIN_WORD_CHARS,
            fuzzy: false,
            fuzz_threshold: DEFAULT_FUZZ_THRESHOLD,
            max_fuzzy_units: DEFAULT_MAX_FUZZY_UNITS,
            fuzzy_timeout: Duration::from_secs(DEFAULT_FUZZY_TIMEOUT_SECS),
            fuzzy_min_chars: DEFAULT_FUZZY_MIN_CHARS,
        }
    }
}

impl RunConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found. Validation is performed
    /// before any document is read, so a misconfigured run never produces
    /// partial output.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.check_files
            || self.check_paragraphs
            || self.check_sentences
            || self.check_phrases
            || self.check_words)
        {
            return Err(ConfigError::NoChecksEnabled);
        }
        if self.min_phrase_len == 0 {
            return Err(ConfigError::PhraseMinZero);
        }
        if self.min_phrase_len > self.max_phrase_len {
            return Err(ConfigError::PhraseBounds {
                min: self.min_phrase_len,
                max: self.max_phrase_len,
            });
        }
        if self.fuzz_threshold > 100 {
            return Err(ConfigError::ThresholdRange(self.fuzz_threshold));
        }
        Ok(())
    }
}

/// Optional user defaults loaded from the platform config directory.
///
/// Every field is optional; unset fields fall back to the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileDefaults {
    /// Default minimum phrase window length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_phrase_length: Option<usize>,
    /// Default maximum phrase window length.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_phrase_length: Option<usize>,
    /// Default fuzzy similarity threshold.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fuzz_threshold: Option<u8>,
    /// Default paragraph word floor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_paragraph_words: Option<usize>,
    /// Default report output directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,
}

impl FileDefaults {
    /// Load the defaults from the platform-specific config path.
    ///
    /// A missing or unparsable file yields the built-in defaults; a config
    /// file problem never blocks a scan.
    #[must_use]
    pub fn load() -> Self {
        match Self::load_internal() {
            Ok(defaults) => defaults,
            Err(e) => {
                log::debug!("Failed to load config file, using defaults: {}", e);
                Self::default()
            }
        }
    }

    fn load_internal() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let defaults = serde_json::from_str(&content)?;
        Ok(defaults)
    }

    /// Save the defaults to the platform-specific config path.
    ///
    /// # Errors
    ///
    /// Returns an error if the config directory cannot be determined or the
    /// file cannot be written.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "dejatext", "dejatext")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;
        Ok(project_dirs.config_dir().join("config.json"))
    }
}
