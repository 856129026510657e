//! Synthesizer configuration tables.

use polydyn_synth::{
    DEFAULT_POLYPHONY, FilterType, LfoDestination, LfoWaveform, SynthParam, SynthType,
    Synthesizer, Waveform,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::validation::{ValidationResult, Validator};

/// Oscillator settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OscillatorConfig {
    /// `sine`, `square`, `saw`, `triangle` or `noise`
    pub waveform: String,
    /// Output level, 0–1
    pub mix: f32,
    /// Semitones, -1–1
    pub detune: f32,
    /// Phase offset in cycles, 0–1
    pub phase: f32,
}

impl Default for OscillatorConfig {
    fn default() -> Self {
        Self {
            waveform: "sine".to_string(),
            mix: 1.0,
            detune: 0.0,
            phase: 0.0,
        }
    }
}

/// Ladder filter and filter envelope settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// `lowpass` or `highpass`
    #[serde(rename = "type")]
    pub filter_type: String,
    /// Hz
    pub cutoff: f32,
    /// 0–1
    pub resonance: f32,
    /// 1–10
    pub drive: f32,
    /// 0–1
    pub envelope_amount: f32,
    /// Seconds
    pub envelope_attack: f32,
    /// Seconds
    pub envelope_decay: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            filter_type: "lowpass".to_string(),
            cutoff: 1000.0,
            resonance: 0.7,
            drive: 1.0,
            envelope_amount: 0.5,
            envelope_attack: 0.1,
            envelope_decay: 0.3,
        }
    }
}

/// LFO settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LfoConfig {
    /// `sine`, `square`, `saw` or `triangle`
    pub waveform: String,
    /// Hz
    pub rate: f32,
    /// 0–1
    pub depth: f32,
    /// `filter`, `amplitude` or `pitch`
    pub destination: String,
}

impl Default for LfoConfig {
    fn default() -> Self {
        Self {
            waveform: "sine".to_string(),
            rate: 5.0,
            depth: 0.1,
            destination: "pitch".to_string(),
        }
    }
}

/// Amplitude envelope rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfig {
    /// Per-block attack increment
    pub attack: f32,
    /// Per-block decay rate
    pub decay: f32,
    /// Sustain level, 0–1
    pub sustain: f32,
    /// Per-block release rate
    pub release: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            attack: 0.01,
            decay: 0.1,
            sustain: 0.7,
            release: 0.3,
        }
    }
}

/// A complete synthesizer configuration.
///
/// # TOML Format
///
/// ```toml
/// type = "subtractive"
/// volume = 0.7
/// max_voices = 8
///
/// [oscillator]
/// waveform = "saw"
/// detune = 0.1
///
/// [filter]
/// type = "lowpass"
/// cutoff = 800.0
///
/// [lfo]
/// destination = "filter"
///
/// [envelope]
/// attack = 0.05
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    /// Engine name
    #[serde(rename = "type")]
    pub synth_type: String,
    /// 0–1
    pub volume: f32,
    /// -1–1
    pub pan: f32,
    /// 1–16
    pub max_voices: usize,
    /// Oscillator table
    pub oscillator: OscillatorConfig,
    /// Filter table
    pub filter: FilterConfig,
    /// LFO table
    pub lfo: LfoConfig,
    /// Amplitude envelope table
    pub envelope: EnvelopeConfig,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        Self {
            synth_type: SynthType::Subtractive.name().to_string(),
            volume: 0.7,
            pan: 0.0,
            max_voices: DEFAULT_POLYPHONY,
            oscillator: OscillatorConfig::default(),
            filter: FilterConfig::default(),
            lfo: LfoConfig::default(),
            envelope: EnvelopeConfig::default(),
        }
    }
}

fn parse_choice<T: FromStr>(section: &str, param: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::invalid_parameter(section, param, format!("unknown value '{value}'")))
}

impl SynthesizerConfig {
    /// Load from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// The engine this configuration selects.
    pub fn synth_type(&self) -> Result<SynthType, ConfigError> {
        self.synth_type
            .parse()
            .map_err(|_| ConfigError::UnknownSynthType(self.synth_type.clone()))
    }

    /// Every value as a logical parameter, in the order they should be applied.
    pub fn parameter_values(&self) -> Result<Vec<(SynthParam, f32)>, ConfigError> {
        let waveform: Waveform = parse_choice("oscillator", "waveform", &self.oscillator.waveform)?;
        let filter_type: FilterType = parse_choice("filter", "type", &self.filter.filter_type)?;
        let lfo_waveform: LfoWaveform = parse_choice("lfo", "waveform", &self.lfo.waveform)?;
        let destination: LfoDestination =
            parse_choice("lfo", "destination", &self.lfo.destination)?;

        Ok(vec![
            (SynthParam::Volume, self.volume),
            (SynthParam::Pan, self.pan),
            (SynthParam::OscillatorType, waveform.index() as f32),
            (SynthParam::OscillatorMix, self.oscillator.mix),
            (SynthParam::OscillatorDetune, self.oscillator.detune),
            (SynthParam::OscillatorPhase, self.oscillator.phase),
            (SynthParam::FilterType, filter_type.index() as f32),
            (SynthParam::FilterCutoff, self.filter.cutoff),
            (SynthParam::FilterResonance, self.filter.resonance),
            (SynthParam::FilterDrive, self.filter.drive),
            (SynthParam::FilterEnvelopeAmount, self.filter.envelope_amount),
            (SynthParam::FilterEnvelopeAttack, self.filter.envelope_attack),
            (SynthParam::FilterEnvelopeDecay, self.filter.envelope_decay),
            (SynthParam::LfoWaveform, lfo_waveform.index() as f32),
            (SynthParam::LfoRate, self.lfo.rate),
            (SynthParam::LfoDepth, self.lfo.depth),
            (SynthParam::LfoDestination, destination.index() as f32),
            (SynthParam::EnvelopeAttack, self.envelope.attack),
            (SynthParam::EnvelopeDecay, self.envelope.decay),
            (SynthParam::EnvelopeSustain, self.envelope.sustain),
            (SynthParam::EnvelopeRelease, self.envelope.release),
        ])
    }

    /// Apply every value to an existing engine.
    ///
    /// Parameters the engine does not understand are skipped. The engine
    /// still clamps what it receives.
    pub fn apply_to(&self, synth: &mut dyn Synthesizer) -> Result<(), ConfigError> {
        for (param, value) in self.parameter_values()? {
            synth.set_parameter(param, value);
        }
        synth.core_mut().set_voice_limit(self.max_voices);
        Ok(())
    }

    /// Build and configure a fresh engine.
    pub fn build(&self, sample_rate: f32) -> Result<Box<dyn Synthesizer + Send>, ConfigError> {
        let mut synth = self.synth_type()?.build(sample_rate);
        self.apply_to(synth.as_mut())?;
        Ok(synth)
    }

    /// Check every value against the range the engine accepts.
    pub fn validate(&self) -> ValidationResult<()> {
        let mut synth = Validator::new("synth");
        synth.choice::<SynthType>("type", &self.synth_type, "subtractive");
        check(&mut synth, "volume", SynthParam::Volume, self.volume);
        check(&mut synth, "pan", SynthParam::Pan, self.pan);
        synth.range("max_voices", self.max_voices as f32, 1.0, DEFAULT_POLYPHONY as f32);

        let mut osc = Validator::new("oscillator");
        osc.choice::<Waveform>(
            "waveform",
            &self.oscillator.waveform,
            "sine, square, saw, triangle or noise",
        );
        check(&mut osc, "mix", SynthParam::OscillatorMix, self.oscillator.mix);
        check(&mut osc, "detune", SynthParam::OscillatorDetune, self.oscillator.detune);
        check(&mut osc, "phase", SynthParam::OscillatorPhase, self.oscillator.phase);

        let f = &self.filter;
        let mut filter = Validator::new("filter");
        filter.choice::<FilterType>("type", &f.filter_type, "lowpass or highpass");
        check(&mut filter, "cutoff", SynthParam::FilterCutoff, f.cutoff);
        check(&mut filter, "resonance", SynthParam::FilterResonance, f.resonance);
        check(&mut filter, "drive", SynthParam::FilterDrive, f.drive);
        check(&mut filter, "envelope_amount", SynthParam::FilterEnvelopeAmount, f.envelope_amount);
        check(&mut filter, "envelope_attack", SynthParam::FilterEnvelopeAttack, f.envelope_attack);
        check(&mut filter, "envelope_decay", SynthParam::FilterEnvelopeDecay, f.envelope_decay);

        let mut lfo = Validator::new("lfo");
        lfo.choice::<LfoWaveform>("waveform", &self.lfo.waveform, "sine, square, saw or triangle");
        lfo.choice::<LfoDestination>(
            "destination",
            &self.lfo.destination,
            "filter, amplitude or pitch",
        );
        check(&mut lfo, "rate", SynthParam::LfoRate, self.lfo.rate);
        check(&mut lfo, "depth", SynthParam::LfoDepth, self.lfo.depth);

        let e = &self.envelope;
        let mut env = Validator::new("envelope");
        check(&mut env, "attack", SynthParam::EnvelopeAttack, e.attack);
        check(&mut env, "decay", SynthParam::EnvelopeDecay, e.decay);
        check(&mut env, "sustain", SynthParam::EnvelopeSustain, e.sustain);
        check(&mut env, "release", SynthParam::EnvelopeRelease, e.release);

        for section in [osc, filter, lfo, env] {
            synth.merge(section.finish());
        }
        synth.finish()
    }
}

fn check(v: &mut Validator, name: &str, param: SynthParam, value: f32) {
    let (min, max) = param.range();
    v.range(name, value, min, max);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::ValidationError;

    #[test]
    fn test_defaults_validate() {
        assert_eq!(SynthesizerConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = SynthesizerConfig::from_toml(
            r#"
            volume = 0.5
            [filter]
            cutoff = 2500.0
            "#,
        )
        .unwrap();
        assert_eq!(config.volume, 0.5);
        assert_eq!(config.filter.cutoff, 2500.0);
        assert_eq!(config.filter.resonance, 0.7);
        assert_eq!(config.lfo.destination, "pitch");
        assert_eq!(config.max_voices, 16);
    }

    #[test]
    fn test_unknown_waveform_reported() {
        let mut config = SynthesizerConfig::default();
        config.oscillator.waveform = "pulse".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ValidationError::UnknownChoice { ref param, .. } if param == "oscillator.waveform"));
        assert!(matches!(
            config.parameter_values(),
            Err(ConfigError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_every_bad_value_reported() {
        let mut config = SynthesizerConfig::default();
        config.volume = 2.0;
        config.filter.cutoff = 5.0;
        config.envelope.sustain = -1.0;
        config.max_voices = 0;
        let errors = config.validate().unwrap_err().into_errors();
        assert_eq!(errors.len(), 4, "{errors:?}");
    }

    #[test]
    fn test_build_applies_values() {
        let mut config = SynthesizerConfig::default();
        config.filter.cutoff = 2000.0;
        config.oscillator.waveform = "saw".to_string();
        config.lfo.destination = "amplitude".to_string();
        config.max_voices = 4;
        let synth = config.build(48000.0).unwrap();
        assert_eq!(synth.parameter(SynthParam::FilterCutoff), Some(2000.0));
        assert_eq!(synth.parameter(SynthParam::OscillatorType), Some(Waveform::Saw.index() as f32));
        assert_eq!(
            synth.parameter(SynthParam::LfoDestination),
            Some(LfoDestination::Amplitude.index() as f32)
        );
        assert_eq!(synth.current_volume(), 0.7);
        assert_eq!(synth.core().voices().limit(), 4);
    }

    #[test]
    fn test_unknown_engine() {
        let config = SynthesizerConfig {
            synth_type: "fm".to_string(),
            ..SynthesizerConfig::default()
        };
        assert!(matches!(config.build(44100.0), Err(ConfigError::UnknownSynthType(ref t)) if t == "fm"));
    }
}
