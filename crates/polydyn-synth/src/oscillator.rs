//! Oscillator waveforms for the subtractive engine.
//!
//! All shapes are evaluated from a phase in [0, 1) and return values in
//! [-1, 1]:
//!
//! | Waveform | Formula |
//! |----------|---------|
//! | Sine | `sin(2πφ)` |
//! | Square | `φ < 0.5 ? 1 : -1` |
//! | Saw | `2φ - 1` |
//! | Triangle | `φ < 0.5 ? 4φ - 1 : 3 - 4φ` |
//! | Noise | uniform in [-1, 1], phase ignored |

use core::str::FromStr;
use polydyn_core::lfo::evaluate;
use polydyn_core::{LfoWaveform, NoiseSource, ParseEnumError};

/// Oscillator waveform.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Waveform {
    /// Pure sine
    #[default]
    Sine,
    /// Naive square
    Square,
    /// Rising saw
    Saw,
    /// Triangle
    Triangle,
    /// White noise
    Noise,
}

impl Waveform {
    /// All waveforms in index order.
    pub const ALL: [Waveform; 5] = [
        Waveform::Sine,
        Waveform::Square,
        Waveform::Saw,
        Waveform::Triangle,
        Waveform::Noise,
    ];

    /// Map a numeric parameter value to a waveform.
    ///
    /// The value is truncated toward zero and clamped to the last index, so
    /// any finite input selects a valid waveform.
    pub fn from_index(value: f32) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self::Sine;
        }
        let idx = (value as usize).min(Self::ALL.len() - 1);
        Self::ALL[idx]
    }

    /// Position of this waveform in [`Waveform::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Evaluate the waveform at `phase`, drawing from `noise` for [`Waveform::Noise`].
    #[inline]
    pub fn sample(self, phase: f32, noise: &mut NoiseSource) -> f32 {
        match self {
            Waveform::Sine => evaluate(LfoWaveform::Sine, phase),
            Waveform::Square => evaluate(LfoWaveform::Square, phase),
            Waveform::Saw => evaluate(LfoWaveform::Saw, phase),
            Waveform::Triangle => evaluate(LfoWaveform::Triangle, phase),
            Waveform::Noise => noise.next_bipolar(),
        }
    }
}

impl FromStr for Waveform {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sine" => Ok(Self::Sine),
            "square" => Ok(Self::Square),
            "saw" => Ok(Self::Saw),
            "triangle" => Ok(Self::Triangle),
            "noise" => Ok(Self::Noise),
            _ => Err(ParseEnumError::new("waveform")),
        }
    }
}
