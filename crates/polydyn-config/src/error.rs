//! Error types for configuration operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or applying a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file
    #[error("failed to read file '{path}': {source}")]
    ReadFile {
        /// Path of the file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Unknown synthesizer engine name
    #[error("unknown synthesizer type: {0}")]
    UnknownSynthType(String),

    /// Unknown dynamics topology name
    #[error("unknown compressor type: {0}")]
    UnknownCompressorType(String),

    /// A value the core cannot accept, found while applying a configuration
    #[error("invalid parameter '{param}' in [{section}]: {reason}")]
    InvalidParameter {
        /// Table the parameter belongs to.
        section: String,
        /// Name of the invalid parameter.
        param: String,
        /// Description of why the parameter is invalid.
        reason: String,
    },

    /// Validation errors
    #[error("validation failed: {0}")]
    Validation(#[from] crate::validation::ValidationError),
}

impl ConfigError {
    /// Create a read file error.
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ConfigError::ReadFile {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid parameter error.
    pub fn invalid_parameter(
        section: impl Into<String>,
        param: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidParameter {
            section: section.into(),
            param: param.into(),
            reason: reason.into(),
        }
    }
}
