//! Configuration types for clann.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::classifier::InvalidDescriptorPolicy;

/// Default suffix identifying class file entries.
pub const DEFAULT_CLASS_SUFFIX: &str = ".class";

/// Top-level configuration for clann.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Analyzer configuration.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Entry name suffix identifying class files (default: `.class`).
    #[serde(default = "default_class_suffix")]
    pub class_suffix: String,

    /// Glob patterns over entry names to skip (e.g. `META-INF/versions/**`).
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Number of worker threads used to decode entries (default: 1).
    #[serde(default)]
    pub parallelism: Option<usize>,

    /// What to do with malformed annotation descriptors.
    #[serde(default)]
    pub on_invalid_descriptor: InvalidDescriptorPolicy,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            class_suffix: default_class_suffix(),
            exclude: Vec::new(),
            parallelism: None,
            on_invalid_descriptor: InvalidDescriptorPolicy::default(),
        }
    }
}

fn default_class_suffix() -> String {
    DEFAULT_CLASS_SUFFIX.to_string()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum ConfigError {
    /// IO error reading config file.
    #[error("Failed to read config file {path}: {source}")]
    #[diagnostic(code(clann::config::io))]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    #[diagnostic(code(clann::config::parse))]
    Parse {
        /// Parse error message.
        message: String,
    },
}
