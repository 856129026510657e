//! Logical synthesizer parameters, addressable by name.
//!
//! The track layer stores and forwards parameter values by [`SynthParam`]
//! rather than by string, so applying a parameter on the audio thread never
//! compares or allocates strings. Names are parsed once, on the control side.
//!
//! | Name | Range | Default | Engine |
//! |------|-------|---------|--------|
//! | `filter_cutoff` | 20–20000 Hz | 1000 | all |
//! | `filter_resonance` | 0–1 | 0.7 | all |
//! | `envelope_attack` | 0.0001–1 | 0.1 | all |
//! | `envelope_decay` | 0.0001–1 | 0.1 | all |
//! | `envelope_sustain` | 0–1 | 0.7 | all |
//! | `envelope_release` | 0.0001–1 | 0.2 | all |
//! | `lfo_rate` | 0.1–20 Hz | 5 | all |
//! | `lfo_depth` | 0–1 | 0.1 | all |
//! | `volume` | 0–1 | 1 | all |
//! | `pan` | -1–1 | 0 | all |
//! | `oscillator_type` | 0–4 | 0 | subtractive |
//! | `oscillator_mix` | 0–1 | 1 | subtractive |
//! | `oscillator_detune` | -1–1 semitones | 0 | subtractive |
//! | `oscillator_phase` | 0–1 | 0 | subtractive |
//! | `filter_type` | 0–1 | 0 | subtractive |
//! | `filter_drive` | 1–10 | 1 | subtractive |
//! | `filter_envelope_amount` | 0–1 | 0 | subtractive |
//! | `filter_envelope_attack` | ≥ 0.001 | 0.1 | subtractive |
//! | `filter_envelope_decay` | ≥ 0.001 | 0.1 | subtractive |
//! | `lfo_waveform` | 0–3 | 0 | subtractive |
//! | `lfo_destination` | 0–2 | 0 | subtractive |

use core::fmt;
use core::str::FromStr;
use polydyn_core::ParseEnumError;

/// A logical synthesizer parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[allow(missing_docs)]
pub enum SynthParam {
    FilterCutoff,
    FilterResonance,
    EnvelopeAttack,
    EnvelopeDecay,
    EnvelopeSustain,
    EnvelopeRelease,
    LfoRate,
    LfoDepth,
    Volume,
    Pan,
    OscillatorType,
    OscillatorMix,
    OscillatorDetune,
    OscillatorPhase,
    FilterType,
    FilterDrive,
    FilterEnvelopeAmount,
    FilterEnvelopeAttack,
    FilterEnvelopeDecay,
    LfoWaveform,
    LfoDestination,
}

impl SynthParam {
    /// Number of parameters.
    pub const COUNT: usize = 21;

    /// Every parameter, in index order.
    pub const ALL: [SynthParam; Self::COUNT] = [
        SynthParam::FilterCutoff,
        SynthParam::FilterResonance,
        SynthParam::EnvelopeAttack,
        SynthParam::EnvelopeDecay,
        SynthParam::EnvelopeSustain,
        SynthParam::EnvelopeRelease,
        SynthParam::LfoRate,
        SynthParam::LfoDepth,
        SynthParam::Volume,
        SynthParam::Pan,
        SynthParam::OscillatorType,
        SynthParam::OscillatorMix,
        SynthParam::OscillatorDetune,
        SynthParam::OscillatorPhase,
        SynthParam::FilterType,
        SynthParam::FilterDrive,
        SynthParam::FilterEnvelopeAmount,
        SynthParam::FilterEnvelopeAttack,
        SynthParam::FilterEnvelopeDecay,
        SynthParam::LfoWaveform,
        SynthParam::LfoDestination,
    ];

    /// Dense index of this parameter, for array-backed stores.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Snake-case name used by configuration and track layers.
    pub fn name(self) -> &'static str {
        match self {
            SynthParam::FilterCutoff => "filter_cutoff",
            SynthParam::FilterResonance => "filter_resonance",
            SynthParam::EnvelopeAttack => "envelope_attack",
            SynthParam::EnvelopeDecay => "envelope_decay",
            SynthParam::EnvelopeSustain => "envelope_sustain",
            SynthParam::EnvelopeRelease => "envelope_release",
            SynthParam::LfoRate => "lfo_rate",
            SynthParam::LfoDepth => "lfo_depth",
            SynthParam::Volume => "volume",
            SynthParam::Pan => "pan",
            SynthParam::OscillatorType => "oscillator_type",
            SynthParam::OscillatorMix => "oscillator_mix",
            SynthParam::OscillatorDetune => "oscillator_detune",
            SynthParam::OscillatorPhase => "oscillator_phase",
            SynthParam::FilterType => "filter_type",
            SynthParam::FilterDrive => "filter_drive",
            SynthParam::FilterEnvelopeAmount => "filter_envelope_amount",
            SynthParam::FilterEnvelopeAttack => "filter_envelope_attack",
            SynthParam::FilterEnvelopeDecay => "filter_envelope_decay",
            SynthParam::LfoWaveform => "lfo_waveform",
            SynthParam::LfoDestination => "lfo_destination",
        }
    }

    /// Whether only some engines understand this parameter.
    pub fn is_type_specific(self) -> bool {
        self.index() >= SynthParam::OscillatorType.index()
    }

    /// Default value of this parameter.
    pub fn default_value(self) -> f32 {
        match self {
            SynthParam::FilterCutoff => 1000.0,
            SynthParam::FilterResonance | SynthParam::EnvelopeSustain => 0.7,
            SynthParam::EnvelopeAttack
            | SynthParam::EnvelopeDecay
            | SynthParam::LfoDepth
            | SynthParam::FilterEnvelopeAttack
            | SynthParam::FilterEnvelopeDecay => 0.1,
            SynthParam::EnvelopeRelease => 0.2,
            SynthParam::LfoRate => 5.0,
            SynthParam::Volume | SynthParam::OscillatorMix | SynthParam::FilterDrive => 1.0,
            SynthParam::Pan
            | SynthParam::OscillatorType
            | SynthParam::OscillatorDetune
            | SynthParam::OscillatorPhase
            | SynthParam::FilterType
            | SynthParam::FilterEnvelopeAmount
            | SynthParam::LfoWaveform
            | SynthParam::LfoDestination => 0.0,
        }
    }

    /// Valid `(min, max)` range. Setters clamp into it.
    pub fn range(self) -> (f32, f32) {
        match self {
            SynthParam::FilterCutoff => (20.0, 20000.0),
            SynthParam::EnvelopeAttack | SynthParam::EnvelopeDecay | SynthParam::EnvelopeRelease => {
                (crate::Envelope::MIN_RATE, 1.0)
            }
            SynthParam::LfoRate => (0.1, 20.0),
            SynthParam::Pan | SynthParam::OscillatorDetune => (-1.0, 1.0),
            SynthParam::OscillatorType => (0.0, 4.0),
            SynthParam::FilterType => (0.0, 1.0),
            SynthParam::FilterDrive => (1.0, 10.0),
            SynthParam::FilterEnvelopeAttack | SynthParam::FilterEnvelopeDecay => {
                (crate::FilterEnvelope::MIN_RATE, f32::MAX)
            }
            SynthParam::LfoWaveform => (0.0, 3.0),
            SynthParam::LfoDestination => (0.0, 2.0),
            SynthParam::FilterResonance
            | SynthParam::EnvelopeSustain
            | SynthParam::LfoDepth
            | SynthParam::Volume
            | SynthParam::OscillatorMix
            | SynthParam::OscillatorPhase
            | SynthParam::FilterEnvelopeAmount => (0.0, 1.0),
        }
    }
}

impl fmt::Display for SynthParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SynthParam {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|p| p.name() == s)
            .ok_or(ParseEnumError::new("synthesizer parameter"))
    }
}
