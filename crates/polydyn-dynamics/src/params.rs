//! Topology selection and per-topology parameter records.
//!
//! Levels are in dB, times in seconds. Every record has a `sanitized`
//! method that the processor applies on the way in, so out-of-range values
//! are clamped and non-finite ones fall back to the default.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use core::fmt;
use core::str::FromStr;
use polydyn_core::ParseEnumError;

#[inline]
fn finite_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() { value } else { fallback }
}

#[inline]
fn at_least(value: f32, min: f32, fallback: f32) -> f32 {
    finite_or(value, fallback).max(min)
}

#[inline]
fn within(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    finite_or(value, fallback).clamp(min, max)
}

/// Which dynamics topology [`DynamicsProcessor`](crate::DynamicsProcessor) runs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CompressorType {
    /// Feed-forward peak compressor with optional soft knee
    #[default]
    Standard,
    /// Crossover split, one compressor per band
    Multiband,
    /// Gain keyed from an external signal, with a ducking curve
    Sidechain,
    /// Dry/compressed cross-fade
    Parallel,
    /// Harmonic gain curve followed by saturation and coloration
    Vintage,
    /// RMS-blend detector with a gentler curve
    Modern,
    /// Mid/side compression with width and enhancement
    Mastering,
    /// Ceiling limiter, optionally oversampled, with dither
    Limiter,
    /// Noise gate with hold
    Gate,
    /// Downward or upward expander
    Expander,
}

impl CompressorType {
    /// Every topology, in declaration order.
    pub const ALL: [CompressorType; 10] = [
        CompressorType::Standard,
        CompressorType::Multiband,
        CompressorType::Sidechain,
        CompressorType::Parallel,
        CompressorType::Vintage,
        CompressorType::Modern,
        CompressorType::Mastering,
        CompressorType::Limiter,
        CompressorType::Gate,
        CompressorType::Expander,
    ];

    /// Lowercase configuration name.
    pub fn name(self) -> &'static str {
        match self {
            CompressorType::Standard => "standard",
            CompressorType::Multiband => "multiband",
            CompressorType::Sidechain => "sidechain",
            CompressorType::Parallel => "parallel",
            CompressorType::Vintage => "vintage",
            CompressorType::Modern => "modern",
            CompressorType::Mastering => "mastering",
            CompressorType::Limiter => "limiter",
            CompressorType::Gate => "gate",
            CompressorType::Expander => "expander",
        }
    }
}

impl fmt::Display for CompressorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CompressorType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.name() == s)
            .ok_or(ParseEnumError::new("compressor type"))
    }
}

/// Settings shared by the Standard, Sidechain, Parallel, Modern and Multiband paths.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CompressorParameters {
    /// dB
    pub threshold: f32,
    /// Input:output above threshold, at least 1
    pub ratio: f32,
    /// Seconds (stored; the gain computer is instantaneous)
    pub attack_time: f32,
    /// Seconds (stored; the gain computer is instantaneous)
    pub release_time: f32,
    /// Soft-knee width in dB
    pub knee_width: f32,
    /// dB, applied by the Standard and Parallel paths while `auto_gain` is set
    pub makeup_gain: f32,
    /// [0, 1]
    pub mix: f32,
    /// Skip processing for every topology
    pub bypass: bool,
    /// Apply `makeup_gain`
    pub auto_gain: bool,
    /// Blend the ratio across `knee_width`
    pub soft_knee: bool,
    /// Stored; no lookahead delay is applied
    pub lookahead: bool,
}

impl Default for CompressorParameters {
    fn default() -> Self {
        Self {
            threshold: -20.0,
            ratio: 4.0,
            attack_time: 0.01,
            release_time: 0.1,
            knee_width: 6.0,
            makeup_gain: 0.0,
            mix: 1.0,
            bypass: false,
            auto_gain: true,
            soft_knee: true,
            lookahead: false,
        }
    }
}

impl CompressorParameters {
    /// Copy with every field clamped into range.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            threshold: finite_or(self.threshold, d.threshold),
            ratio: at_least(self.ratio, 1.0, d.ratio),
            attack_time: at_least(self.attack_time, 0.0, d.attack_time),
            release_time: at_least(self.release_time, 0.0, d.release_time),
            knee_width: at_least(self.knee_width, 0.0, d.knee_width),
            makeup_gain: finite_or(self.makeup_gain, d.makeup_gain),
            mix: within(self.mix, 0.0, 1.0, d.mix),
            ..self
        }
    }
}

/// Vintage-style compressor settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct VintageParameters {
    /// dB before detection
    pub input_gain: f32,
    /// dB after coloration
    pub output_gain: f32,
    /// dB
    pub threshold: f32,
    /// At least 1
    pub ratio: f32,
    /// Seconds (stored)
    pub attack_time: f32,
    /// Seconds (stored)
    pub release_time: f32,
    /// dB
    pub knee_width: f32,
    /// tanh drive amount, at least 0
    pub saturation: f32,
    /// Scales the gain curve by `1 + harmonic_content * |g|`
    pub harmonic_content: f32,
    /// `x + color * x²`
    pub transformer_color: f32,
    /// `x * (1 + warmth * |x|)`
    pub tube_warmth: f32,
}

impl Default for VintageParameters {
    fn default() -> Self {
        Self {
            input_gain: 0.0,
            output_gain: 0.0,
            threshold: -20.0,
            ratio: 4.0,
            attack_time: 0.01,
            release_time: 0.1,
            knee_width: 6.0,
            saturation: 0.5,
            harmonic_content: 0.3,
            transformer_color: 0.2,
            tube_warmth: 0.4,
        }
    }
}

impl VintageParameters {
    /// Copy with every field clamped into range.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            input_gain: finite_or(self.input_gain, d.input_gain),
            output_gain: finite_or(self.output_gain, d.output_gain),
            threshold: finite_or(self.threshold, d.threshold),
            ratio: at_least(self.ratio, 1.0, d.ratio),
            attack_time: at_least(self.attack_time, 0.0, d.attack_time),
            release_time: at_least(self.release_time, 0.0, d.release_time),
            knee_width: at_least(self.knee_width, 0.0, d.knee_width),
            saturation: at_least(self.saturation, 0.0, d.saturation),
            harmonic_content: within(self.harmonic_content, 0.0, 1.0, d.harmonic_content),
            transformer_color: within(self.transformer_color, 0.0, 1.0, d.transformer_color),
            tube_warmth: within(self.tube_warmth, 0.0, 1.0, d.tube_warmth),
        }
    }
}

/// Mid/side mastering compressor settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MasteringParameters {
    /// dB
    pub threshold: f32,
    /// At least 1
    pub ratio: f32,
    /// Seconds (stored)
    pub attack_time: f32,
    /// Seconds (stored)
    pub release_time: f32,
    /// dB
    pub knee_width: f32,
    /// dB, always applied
    pub makeup_gain: f32,
    /// Side scale of the width pass (1 = unchanged)
    pub stereo_width: f32,
    /// Mid gets `balance`, side gets `1 - balance`
    pub mid_side_balance: f32,
    /// `x + enhancement * x²`
    pub harmonic_enhancement: f32,
    /// Stored only
    pub stereo_coherence: f32,
}

impl Default for MasteringParameters {
    fn default() -> Self {
        Self {
            threshold: -20.0,
            ratio: 2.0,
            attack_time: 0.005,
            release_time: 0.05,
            knee_width: 3.0,
            makeup_gain: 0.0,
            stereo_width: 1.0,
            mid_side_balance: 0.5,
            harmonic_enhancement: 0.2,
            stereo_coherence: 0.8,
        }
    }
}

impl MasteringParameters {
    /// Copy with every field clamped into range.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            threshold: finite_or(self.threshold, d.threshold),
            ratio: at_least(self.ratio, 1.0, d.ratio),
            attack_time: at_least(self.attack_time, 0.0, d.attack_time),
            release_time: at_least(self.release_time, 0.0, d.release_time),
            knee_width: at_least(self.knee_width, 0.0, d.knee_width),
            makeup_gain: finite_or(self.makeup_gain, d.makeup_gain),
            stereo_width: within(self.stereo_width, 0.0, 2.0, d.stereo_width),
            mid_side_balance: within(self.mid_side_balance, 0.0, 1.0, d.mid_side_balance),
            harmonic_enhancement: within(
                self.harmonic_enhancement,
                0.0,
                1.0,
                d.harmonic_enhancement,
            ),
            stereo_coherence: within(self.stereo_coherence, 0.0, 1.0, d.stereo_coherence),
        }
    }
}

/// Brickwall limiter settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LimiterParameters {
    /// dBFS, at most 0
    pub ceiling: f32,
    /// Seconds (stored)
    pub release_time: f32,
    /// Stored only
    pub lookahead: f32,
    /// Triangular dither peak amplitude, linear [0, 1]
    pub dither_amount: f32,
    /// Stored only; the output is always clamped to the ceiling
    pub true_peak: bool,
    /// Run the ceiling stage at 4× the host rate
    pub oversampling: bool,
}

impl Default for LimiterParameters {
    fn default() -> Self {
        Self {
            ceiling: 0.0,
            release_time: 0.01,
            lookahead: 0.0,
            dither_amount: 0.0,
            true_peak: true,
            oversampling: true,
        }
    }
}

impl LimiterParameters {
    /// Copy with every field clamped into range.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            ceiling: finite_or(self.ceiling, d.ceiling).min(0.0),
            release_time: at_least(self.release_time, 0.0, d.release_time),
            lookahead: at_least(self.lookahead, 0.0, d.lookahead),
            dither_amount: within(self.dither_amount, 0.0, 1.0, d.dither_amount),
            ..self
        }
    }
}

/// Noise gate settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GateParameters {
    /// dB
    pub threshold: f32,
    /// Downward slope below threshold, at least 1
    pub ratio: f32,
    /// Seconds (stored)
    pub attack_time: f32,
    /// Seconds (stored)
    pub release_time: f32,
    /// Seconds the gate stays open after the level drops below threshold
    pub hold_time: f32,
    /// Maximum attenuation in dB
    pub range: f32,
    /// Key the gate from the sidechain buffer
    pub sidechain: bool,
    /// dB threshold used while keyed from the sidechain
    pub sidechain_threshold: f32,
}

impl Default for GateParameters {
    fn default() -> Self {
        Self {
            threshold: -50.0,
            ratio: 20.0,
            attack_time: 0.001,
            release_time: 0.1,
            hold_time: 0.1,
            range: 80.0,
            sidechain: false,
            sidechain_threshold: -50.0,
        }
    }
}

impl GateParameters {
    /// Copy with every field clamped into range.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            threshold: finite_or(self.threshold, d.threshold),
            ratio: at_least(self.ratio, 1.0, d.ratio),
            attack_time: at_least(self.attack_time, 0.0, d.attack_time),
            release_time: at_least(self.release_time, 0.0, d.release_time),
            hold_time: at_least(self.hold_time, 0.0, d.hold_time),
            range: at_least(self.range, 0.0, d.range),
            sidechain: self.sidechain,
            sidechain_threshold: finite_or(self.sidechain_threshold, d.sidechain_threshold),
        }
    }
}

/// Expander settings.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ExpanderParameters {
    /// dB
    pub threshold: f32,
    /// Expansion slope, at least 1
    pub ratio: f32,
    /// Seconds (stored)
    pub attack_time: f32,
    /// Seconds (stored)
    pub release_time: f32,
    /// Stored only
    pub knee_width: f32,
    /// Maximum attenuation in dB
    pub range: f32,
    /// Use the gentler upward curve below threshold
    pub upward: bool,
}

impl Default for ExpanderParameters {
    fn default() -> Self {
        Self {
            threshold: -50.0,
            ratio: 2.0,
            attack_time: 0.001,
            release_time: 0.1,
            knee_width: 6.0,
            range: 40.0,
            upward: false,
        }
    }
}

impl ExpanderParameters {
    /// Copy with every field clamped into range.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        Self {
            threshold: finite_or(self.threshold, d.threshold),
            ratio: at_least(self.ratio, 1.0, d.ratio),
            attack_time: at_least(self.attack_time, 0.0, d.attack_time),
            release_time: at_least(self.release_time, 0.0, d.release_time),
            knee_width: at_least(self.knee_width, 0.0, d.knee_width),
            range: at_least(self.range, 0.0, d.range),
            upward: self.upward,
        }
    }
}

/// Crossover points and per-band compressor settings.
///
/// `N` crossover frequencies produce `N + 1` bands. Per-band vectors shorter
/// than the band count fall back to unity gain and the shared
/// [`CompressorParameters`] for the missing entries.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MultibandConfig {
    /// Hz, ascending
    pub crossover_frequencies: Vec<f32>,
    /// Linear gain per band
    pub band_gains: Vec<f32>,
    /// dB per band
    pub band_thresholds: Vec<f32>,
    /// Ratio per band
    pub band_ratios: Vec<f32>,
    /// Seconds per band
    pub band_attack_times: Vec<f32>,
    /// Seconds per band
    pub band_release_times: Vec<f32>,
}

impl MultibandConfig {
    /// Number of bands (`crossover_frequencies.len() + 1`).
    pub fn num_bands(&self) -> usize {
        self.crossover_frequencies.len() + 1
    }

    /// Linear output gain of `band`.
    pub fn band_gain(&self, band: usize) -> f32 {
        self.band_gains.get(band).copied().unwrap_or(1.0)
    }

    /// Compressor settings for `band`, derived from `base`.
    pub fn band_parameters(&self, band: usize, base: &CompressorParameters) -> CompressorParameters {
        let pick = |v: &[f32], d: f32| v.get(band).copied().unwrap_or(d);
        CompressorParameters {
            threshold: pick(&self.band_thresholds, base.threshold),
            ratio: pick(&self.band_ratios, base.ratio),
            attack_time: pick(&self.band_attack_times, base.attack_time),
            release_time: pick(&self.band_release_times, base.release_time),
            ..*base
        }
        .sanitized()
    }

    /// Copy with crossovers sorted, non-finite or non-positive entries dropped.
    pub fn sanitized(mut self) -> Self {
        self.crossover_frequencies.retain(|f| f.is_finite() && *f > 0.0);
        self.crossover_frequencies.sort_by(f32::total_cmp);
        for g in &mut self.band_gains {
            *g = finite_or(*g, 1.0).max(0.0);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_names_roundtrip() {
        for t in CompressorType::ALL {
            assert_eq!(t.name().parse::<CompressorType>(), Ok(t));
        }
        assert!("opto".parse::<CompressorType>().is_err());
    }

    #[test]
    fn test_compressor_defaults() {
        let p = CompressorParameters::default();
        assert_eq!(p.threshold, -20.0);
        assert_eq!(p.ratio, 4.0);
        assert_eq!(p.knee_width, 6.0);
        assert!(p.auto_gain && p.soft_knee && !p.bypass && !p.lookahead);
    }

    #[test]
    fn test_sanitize_clamps() {
        let p = CompressorParameters {
            ratio: 0.2,
            mix: 4.0,
            knee_width: -3.0,
            threshold: f32::NAN,
            ..CompressorParameters::default()
        }
        .sanitized();
        assert_eq!(p.ratio, 1.0);
        assert_eq!(p.mix, 1.0);
        assert_eq!(p.knee_width, 0.0);
        assert_eq!(p.threshold, -20.0, "non-finite falls back to default");

        let lim = LimiterParameters { ceiling: 3.0, ..LimiterParameters::default() }.sanitized();
        assert_eq!(lim.ceiling, 0.0, "ceiling never exceeds full scale");
    }

    #[test]
    fn test_band_parameters_fall_back() {
        let cfg = MultibandConfig {
            crossover_frequencies: vec![200.0, 2000.0],
            band_thresholds: vec![-30.0],
            band_gains: vec![0.5, 2.0],
            ..MultibandConfig::default()
        };
        let base = CompressorParameters::default();
        assert_eq!(cfg.num_bands(), 3);
        assert_eq!(cfg.band_parameters(0, &base).threshold, -30.0);
        assert_eq!(cfg.band_parameters(2, &base).threshold, base.threshold);
        assert_eq!(cfg.band_gain(1), 2.0);
        assert_eq!(cfg.band_gain(2), 1.0);
    }

    #[test]
    fn test_multiband_sanitize_sorts() {
        let cfg = MultibandConfig {
            crossover_frequencies: vec![5000.0, f32::NAN, 100.0, -1.0],
            ..MultibandConfig::default()
        }
        .sanitized();
        assert_eq!(cfg.crossover_frequencies, vec![100.0, 5000.0]);
    }
}
