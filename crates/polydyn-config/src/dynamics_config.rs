//! Dynamics processor configuration tables.

use polydyn_dynamics::{
    CompressorParameters, CompressorType, DynamicsProcessor, ExpanderParameters, GateParameters,
    LimiterParameters, MasteringParameters, MultibandConfig, VintageParameters,
};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::validation::{ValidationResult, Validator};

/// Largest level, in dB, accepted for thresholds and gains.
const MAX_DB: f32 = 40.0;
/// Deepest level, in dB, accepted for thresholds.
const MIN_DB: f32 = -120.0;

/// One multiband band.
///
/// Every band but the last names the crossover frequency at its upper edge.
/// Unset compressor fields fall back to the shared `[dynamics.compressor]`
/// table.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    /// Upper edge in Hz; omitted on the top band
    pub crossover: Option<f32>,
    /// Linear output gain
    pub gain: f32,
    /// dB
    pub threshold: Option<f32>,
    /// At least 1
    pub ratio: Option<f32>,
    /// Seconds
    pub attack_time: Option<f32>,
    /// Seconds
    pub release_time: Option<f32>,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            crossover: None,
            gain: 1.0,
            threshold: None,
            ratio: None,
            attack_time: None,
            release_time: None,
        }
    }
}

/// A complete dynamics processor configuration.
///
/// Only the tables that are present are applied; absent ones leave the
/// processor's current settings alone.
///
/// # TOML Format
///
/// ```toml
/// type = "multiband"
///
/// [compressor]
/// threshold = -18.0
/// ratio = 3.0
///
/// [[bands]]
/// crossover = 250.0
/// ratio = 2.0
///
/// [[bands]]
/// crossover = 4000.0
///
/// [[bands]]
/// gain = 0.8
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DynamicsConfig {
    /// Topology name
    #[serde(rename = "type")]
    pub compressor_type: String,
    /// Shared compressor table
    pub compressor: Option<CompressorParameters>,
    /// Vintage table
    pub vintage: Option<VintageParameters>,
    /// Mastering table
    pub mastering: Option<MasteringParameters>,
    /// Limiter table
    pub limiter: Option<LimiterParameters>,
    /// Gate table
    pub gate: Option<GateParameters>,
    /// Expander table
    pub expander: Option<ExpanderParameters>,
    /// Multiband bands, lowest first
    pub bands: Vec<BandConfig>,
}

impl Default for DynamicsConfig {
    fn default() -> Self {
        Self {
            compressor_type: CompressorType::Standard.name().to_string(),
            compressor: None,
            vintage: None,
            mastering: None,
            limiter: None,
            gate: None,
            expander: None,
            bands: Vec::new(),
        }
    }
}

impl DynamicsConfig {
    /// Load from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// The topology this configuration selects.
    pub fn compressor_type(&self) -> Result<CompressorType, ConfigError> {
        self.compressor_type
            .parse()
            .map_err(|_| ConfigError::UnknownCompressorType(self.compressor_type.clone()))
    }

    /// Convert the band list into a processor layout.
    ///
    /// Unset per-band values come from `base`.
    pub fn multiband_config(&self, base: &CompressorParameters) -> MultibandConfig {
        MultibandConfig {
            crossover_frequencies: self.bands.iter().filter_map(|b| b.crossover).collect(),
            band_gains: self.bands.iter().map(|b| b.gain).collect(),
            band_thresholds: self
                .bands
                .iter()
                .map(|b| b.threshold.unwrap_or(base.threshold))
                .collect(),
            band_ratios: self
                .bands
                .iter()
                .map(|b| b.ratio.unwrap_or(base.ratio))
                .collect(),
            band_attack_times: self
                .bands
                .iter()
                .map(|b| b.attack_time.unwrap_or(base.attack_time))
                .collect(),
            band_release_times: self
                .bands
                .iter()
                .map(|b| b.release_time.unwrap_or(base.release_time))
                .collect(),
        }
    }

    /// Apply the topology and every present table to `processor`.
    ///
    /// Allocates when a band list is present, so call it from setup code.
    pub fn apply_to(&self, processor: &mut DynamicsProcessor) -> Result<(), ConfigError> {
        processor.set_compressor_type(self.compressor_type()?);
        if let Some(p) = self.compressor {
            processor.set_compressor_parameters(p);
        }
        if let Some(p) = self.vintage {
            processor.set_vintage_parameters(p);
        }
        if let Some(p) = self.mastering {
            processor.set_mastering_parameters(p);
        }
        if let Some(p) = self.limiter {
            processor.set_limiter_parameters(p);
        }
        if let Some(p) = self.gate {
            processor.set_gate_parameters(p);
        }
        if let Some(p) = self.expander {
            processor.set_expander_parameters(p);
        }
        if !self.bands.is_empty() {
            let base = *processor.compressor_parameters();
            processor.set_multiband_config(self.multiband_config(&base));
        }
        Ok(())
    }

    /// Build a processor prepared for `sample_rate` and `block_size`.
    pub fn build(&self, sample_rate: f32, block_size: usize) -> Result<DynamicsProcessor, ConfigError> {
        let mut processor = DynamicsProcessor::new();
        processor.prepare_to_play(sample_rate, block_size);
        self.apply_to(&mut processor)?;
        Ok(processor)
    }

    /// Check every present table against the ranges the processor accepts.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut v = Validator::new("dynamics");
        v.choice::<CompressorType>(
            "type",
            &self.compressor_type,
            "standard, multiband, sidechain, parallel, vintage, modern, mastering, limiter, gate or expander",
        );

        if let Some(p) = &self.compressor {
            let mut c = Validator::new("compressor");
            c.range("threshold", p.threshold, MIN_DB, 0.0);
            c.at_least("ratio", p.ratio, 1.0);
            c.at_least("attack_time", p.attack_time, 0.0);
            c.at_least("release_time", p.release_time, 0.0);
            c.range("knee_width", p.knee_width, 0.0, MAX_DB);
            c.range("makeup_gain", p.makeup_gain, -MAX_DB, MAX_DB);
            c.range("mix", p.mix, 0.0, 1.0);
            v.merge(c.finish());
        }

        if let Some(p) = &self.vintage {
            let mut c = Validator::new("vintage");
            c.range("input_gain", p.input_gain, -MAX_DB, MAX_DB);
            c.range("output_gain", p.output_gain, -MAX_DB, MAX_DB);
            c.range("threshold", p.threshold, MIN_DB, 0.0);
            c.at_least("ratio", p.ratio, 1.0);
            c.at_least("attack_time", p.attack_time, 0.0);
            c.at_least("release_time", p.release_time, 0.0);
            c.range("knee_width", p.knee_width, 0.0, MAX_DB);
            c.range("saturation", p.saturation, 0.0, 1.0);
            c.range("harmonic_content", p.harmonic_content, 0.0, 1.0);
            c.range("transformer_color", p.transformer_color, 0.0, 1.0);
            c.range("tube_warmth", p.tube_warmth, 0.0, 1.0);
            v.merge(c.finish());
        }

        if let Some(p) = &self.mastering {
            let mut c = Validator::new("mastering");
            c.range("threshold", p.threshold, MIN_DB, 0.0);
            c.at_least("ratio", p.ratio, 1.0);
            c.at_least("attack_time", p.attack_time, 0.0);
            c.at_least("release_time", p.release_time, 0.0);
            c.range("knee_width", p.knee_width, 0.0, MAX_DB);
            c.range("makeup_gain", p.makeup_gain, -MAX_DB, MAX_DB);
            c.range("stereo_width", p.stereo_width, 0.0, 2.0);
            c.range("mid_side_balance", p.mid_side_balance, 0.0, 1.0);
            c.range("harmonic_enhancement", p.harmonic_enhancement, 0.0, 1.0);
            c.range("stereo_coherence", p.stereo_coherence, 0.0, 1.0);
            v.merge(c.finish());
        }

        if let Some(p) = &self.limiter {
            let mut c = Validator::new("limiter");
            c.range("ceiling", p.ceiling, MIN_DB, 0.0);
            c.at_least("release_time", p.release_time, 0.0);
            c.at_least("lookahead", p.lookahead, 0.0);
            c.range("dither_amount", p.dither_amount, 0.0, 1.0);
            v.merge(c.finish());
        }

        if let Some(p) = &self.gate {
            let mut c = Validator::new("gate");
            c.range("threshold", p.threshold, MIN_DB, 0.0);
            c.at_least("ratio", p.ratio, 1.0);
            c.at_least("attack_time", p.attack_time, 0.0);
            c.at_least("release_time", p.release_time, 0.0);
            c.at_least("hold_time", p.hold_time, 0.0);
            c.range("range", p.range, 0.0, -MIN_DB);
            c.range("sidechain_threshold", p.sidechain_threshold, MIN_DB, 0.0);
            v.merge(c.finish());
        }

        if let Some(p) = &self.expander {
            let mut c = Validator::new("expander");
            c.range("threshold", p.threshold, MIN_DB, 0.0);
            c.at_least("ratio", p.ratio, 1.0);
            c.at_least("attack_time", p.attack_time, 0.0);
            c.at_least("release_time", p.release_time, 0.0);
            c.range("knee_width", p.knee_width, 0.0, MAX_DB);
            c.range("range", p.range, 0.0, -MIN_DB);
            v.merge(c.finish());
        }

        v.merge(self.validate_bands());
        v.finish()
    }

    fn validate_bands(&self) -> ValidationResult<()> {
        let mut c = Validator::new("bands");
        let last = self.bands.len().saturating_sub(1);
        let mut previous = 0.0;
        for (i, band) in self.bands.iter().enumerate() {
            match band.crossover {
                Some(f) if i == last => {
                    c.format("crossover", format!("top band {i} must not set a crossover ({f} Hz)"));
                }
                Some(f) => {
                    if f.is_nan() || f <= previous {
                        c.format("crossover", format!("band {i} crossover {f} Hz must rise above {previous} Hz"));
                    }
                    previous = f;
                }
                None if i != last => {
                    c.format("crossover", format!("band {i} needs a crossover frequency"));
                }
                None => {}
            }
            c.at_least("gain", band.gain, 0.0);
            if let Some(t) = band.threshold {
                c.range("threshold", t, MIN_DB, 0.0);
            }
            if let Some(r) = band.ratio {
                c.at_least("ratio", r, 1.0);
            }
            if let Some(a) = band.attack_time {
                c.at_least("attack_time", a, 0.0);
            }
            if let Some(r) = band.release_time {
                c.at_least("release_time", r, 0.0);
            }
        }
        c.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn test_defaults_validate() {
        assert_eq!(DynamicsConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_tables_from_toml() {
        let config = DynamicsConfig::from_toml(
            r#"
            type = "limiter"
            [limiter]
            ceiling = -1.0
            oversampling = false
            "#,
        )
        .unwrap();
        assert_eq!(config.compressor_type().unwrap(), CompressorType::Limiter);
        let limiter = config.limiter.unwrap();
        assert_eq!(limiter.ceiling, -1.0);
        assert!(!limiter.oversampling);
        assert_eq!(limiter.release_time, LimiterParameters::default().release_time);
        assert!(config.gate.is_none());
    }

    #[test]
    fn test_bands_fall_back_to_base() {
        let config = DynamicsConfig {
            bands: vec![
                BandConfig { crossover: Some(200.0), ratio: Some(2.0), ..BandConfig::default() },
                BandConfig { gain: 0.5, ..BandConfig::default() },
            ],
            ..DynamicsConfig::default()
        };
        let base = CompressorParameters::default();
        let mb = config.multiband_config(&base);
        assert_eq!(mb.crossover_frequencies, vec![200.0]);
        assert_eq!(mb.band_ratios, vec![2.0, base.ratio]);
        assert_eq!(mb.band_gains, vec![1.0, 0.5]);
        assert_eq!(mb.band_thresholds, vec![base.threshold; 2]);
    }

    #[test]
    fn test_bad_band_layout() {
        let config = DynamicsConfig {
            bands: vec![
                BandConfig { crossover: Some(2000.0), ..BandConfig::default() },
                BandConfig { crossover: Some(500.0), ..BandConfig::default() },
                BandConfig { crossover: Some(8000.0), ..BandConfig::default() },
            ],
            ..DynamicsConfig::default()
        };
        let errors = config.validate().unwrap_err().into_errors();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors.iter().all(|e| matches!(e, ValidationError::InvalidFormat { .. })));
    }

    #[test]
    fn test_unknown_type() {
        let config = DynamicsConfig {
            compressor_type: "opto".to_string(),
            ..DynamicsConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(matches!(
            config.build(44100.0, 512),
            Err(ConfigError::UnknownCompressorType(ref t)) if t == "opto"
        ));
    }

    #[test]
    fn test_build_applies_tables() {
        let config = DynamicsConfig {
            compressor_type: "gate".to_string(),
            gate: Some(GateParameters { hold_time: 0.25, ..GateParameters::default() }),
            bands: vec![
                BandConfig { crossover: Some(300.0), ..BandConfig::default() },
                BandConfig::default(),
            ],
            ..DynamicsConfig::default()
        };
        let processor = config.build(48000.0, 256).unwrap();
        assert_eq!(processor.compressor_type(), CompressorType::Gate);
        assert_eq!(processor.gate_parameters().hold_time, 0.25);
        assert_eq!(processor.num_band_buffers(), 2);
        assert_eq!(processor.block_size(), 256);
    }
}
