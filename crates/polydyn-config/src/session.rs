//! Top-level configuration file.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dynamics_config::DynamicsConfig;
use crate::error::ConfigError;
use crate::synth_config::SynthesizerConfig;
use crate::validation::{ValidationResult, Validator};

/// One track's worth of configuration: engine settings plus an optional dynamics insert.
///
/// # TOML Format
///
/// ```toml
/// sample_rate = 48000
/// block_size = 256
///
/// [synth]
/// volume = 0.8
///
/// [synth.oscillator]
/// waveform = "saw"
///
/// [dynamics]
/// type = "limiter"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolydynConfig {
    /// Host sample rate in Hz.
    pub sample_rate: u32,
    /// Maximum block size in frames.
    pub block_size: usize,
    /// Synthesizer settings.
    pub synth: SynthesizerConfig,
    /// Dynamics insert, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dynamics: Option<DynamicsConfig>,
}

impl Default for PolydynConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            block_size: 512,
            synth: SynthesizerConfig::default(),
            dynamics: None,
        }
    }
}

impl PolydynConfig {
    /// Load from a TOML file. The result is parsed but not validated.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::read_file(path, e))?;
        let config = Self::from_toml(&content)?;
        #[cfg(feature = "tracing")]
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Load from a TOML file and reject it unless it validates.
    pub fn load_validated(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        if let Err(err) = config.validate() {
            #[cfg(feature = "tracing")]
            tracing::warn!(error = %err, "configuration rejected");
            return Err(err.into());
        }
        Ok(config)
    }

    /// Load from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Sample rate as the engines expect it.
    pub fn sample_rate_hz(&self) -> f32 {
        self.sample_rate as f32
    }

    /// Validate every table.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut v = Validator::new("session");
        v.range("sample_rate", self.sample_rate as f32, 8000.0, 384_000.0);
        v.range("block_size", self.block_size as f32, 1.0, 8192.0);
        v.merge(self.synth.validate());
        if let Some(dynamics) = &self.dynamics {
            v.merge(dynamics.validate());
        }
        v.finish()
    }
}
