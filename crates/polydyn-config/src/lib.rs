//! Configuration loading and validation for polydyn.
//!
//! TOML files are deserialized with serde into plain structs, validated on
//! the loading side, then handed to the engines. The engines still clamp
//! whatever they receive; validation exists so a bad file is reported
//! instead of silently corrected.
//!
//! # Features
//!
//! - **Synthesizer**: [`SynthesizerConfig`] with oscillator, filter, LFO and envelope tables
//! - **Dynamics**: [`DynamicsConfig`] with a topology name, per-topology tables and multiband bands
//! - **Session**: [`PolydynConfig`] combining both with a sample rate and block size
//! - **Validation**: every out-of-range value reported at once as a [`ValidationError`]
//!
//! # Example
//!
//! ```rust
//! use polydyn_config::PolydynConfig;
//!
//! let config = PolydynConfig::from_toml(r#"
//!     [synth]
//!     volume = 0.8
//!     [dynamics]
//!     type = "limiter"
//! "#).unwrap();
//! config.validate().unwrap();
//!
//! let synth = config.synth.build(config.sample_rate_hz()).unwrap();
//! assert_eq!(synth.current_volume(), 0.8);
//! ```

mod dynamics_config;
mod error;
mod session;
mod synth_config;

/// Range and name validation.
pub mod validation;

pub use dynamics_config::{BandConfig, DynamicsConfig};
pub use error::ConfigError;
pub use session::PolydynConfig;
pub use synth_config::{EnvelopeConfig, FilterConfig, LfoConfig, OscillatorConfig, SynthesizerConfig};
pub use validation::{ValidationError, ValidationResult};
