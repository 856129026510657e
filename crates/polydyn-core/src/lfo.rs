//! Low Frequency Oscillator for modulation.
//!
//! A single phase accumulator producing bipolar values in [-1, 1]. The
//! synthesizer runs one instance at audio rate and routes it to pitch,
//! amplitude or filter cutoff.

use crate::parse::ParseEnumError;
use core::f32::consts::PI;
use core::str::FromStr;
use libm::sinf;

/// LFO waveform type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoWaveform {
    #[default]
    Sine,
    Square,
    Saw,
    Triangle,
}

impl LfoWaveform {
    /// Every waveform, in parameter-index order.
    pub const ALL: [LfoWaveform; 4] = [
        LfoWaveform::Sine,
        LfoWaveform::Square,
        LfoWaveform::Saw,
        LfoWaveform::Triangle,
    ];

    /// Waveform for a numeric parameter value, truncated and clamped into range.
    pub fn from_index(value: f32) -> Self {
        if !value.is_finite() || value <= 0.0 {
            return Self::Sine;
        }
        Self::ALL[(value as usize).min(Self::ALL.len() - 1)]
    }

    /// Position of this waveform in [`LfoWaveform::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for LfoWaveform {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sine" => Ok(Self::Sine),
            "square" => Ok(Self::Square),
            "saw" => Ok(Self::Saw),
            "triangle" => Ok(Self::Triangle),
            _ => Err(ParseEnumError::new("lfo waveform")),
        }
    }
}

/// Low Frequency Oscillator for generating modulation signals.
///
/// # Example
///
/// ```rust
/// use polydyn_core::{Lfo, LfoWaveform};
///
/// let mut lfo = Lfo::new(44100.0, 5.0);
/// lfo.set_waveform(LfoWaveform::Triangle);
///
/// let value = lfo.next();
/// assert!((-1.0..=1.0).contains(&value));
/// ```
#[derive(Debug, Clone)]
pub struct Lfo {
    /// Current phase position [0.0, 1.0)
    phase: f32,
    /// Phase increment per sample
    phase_inc: f32,
    sample_rate: f32,
    waveform: LfoWaveform,
}

impl Default for Lfo {
    fn default() -> Self {
        Self::new(44100.0, 5.0)
    }
}

impl Lfo {
    /// Create new LFO with given sample rate and frequency
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        Self {
            phase: 0.0,
            phase_inc: freq_hz / sample_rate,
            sample_rate,
            waveform: LfoWaveform::Sine,
        }
    }

    /// Set frequency in Hz
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.phase_inc = freq_hz / self.sample_rate;
    }

    /// Get current frequency in Hz
    pub fn frequency(&self) -> f32 {
        self.phase_inc * self.sample_rate
    }

    /// Set waveform
    pub fn set_waveform(&mut self, waveform: LfoWaveform) {
        self.waveform = waveform;
    }

    /// Get current waveform
    pub fn waveform(&self) -> LfoWaveform {
        self.waveform
    }

    /// Reset phase to 0
    pub fn reset(&mut self) {
        self.phase = 0.0;
    }

    /// Get current phase (0.0 - 1.0)
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Get next LFO value (-1.0 to 1.0) and advance one sample.
    #[inline]
    pub fn next(&mut self) -> f32 {
        let output = evaluate(self.waveform, self.phase);

        self.phase += self.phase_inc;
        if self.phase >= 1.0 {
            self.phase -= 1.0;
        }

        output
    }

    /// Set sample rate, keeping the frequency in Hz.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        let freq = self.frequency();
        self.sample_rate = sample_rate;
        self.set_frequency(freq);
    }
}

/// Evaluate a bipolar waveform at a phase in [0, 1).
///
/// Shared by the LFO and by audio-rate oscillators that use the same shapes.
#[inline]
pub fn evaluate(waveform: LfoWaveform, phase: f32) -> f32 {
    match waveform {
        LfoWaveform::Sine => sinf(phase * 2.0 * PI),
        LfoWaveform::Square => {
            if phase < 0.5 {
                1.0
            } else {
                -1.0
            }
        }
        LfoWaveform::Saw => 2.0 * phase - 1.0,
        LfoWaveform::Triangle => {
            if phase < 0.5 {
                4.0 * phase - 1.0
            } else {
                3.0 - 4.0 * phase
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lfo_phase_accumulation() {
        let mut lfo = Lfo::new(44100.0, 1.0);

        for _ in 0..44100 {
            lfo.next();
        }

        let phase_error = lfo.phase.min((lfo.phase - 1.0).abs());
        assert!(phase_error < 0.01, "phase drifted to {}", lfo.phase);
    }

    #[test]
    fn test_lfo_output_range() {
        let mut lfo = Lfo::new(44100.0, 5.0);

        for waveform in [
            LfoWaveform::Sine,
            LfoWaveform::Triangle,
            LfoWaveform::Saw,
            LfoWaveform::Square,
        ] {
            lfo.set_waveform(waveform);
            for _ in 0..10000 {
                let v = lfo.next();
                assert!((-1.0..=1.0).contains(&v), "{waveform:?} produced {v}");
            }
        }
    }

    #[test]
    fn test_triangle_shape() {
        assert!((evaluate(LfoWaveform::Triangle, 0.0) + 1.0).abs() < 1e-6);
        assert!((evaluate(LfoWaveform::Triangle, 0.25)).abs() < 1e-6);
        assert!((evaluate(LfoWaveform::Triangle, 0.5) - 1.0).abs() < 1e-6);
        assert!((evaluate(LfoWaveform::Triangle, 0.75)).abs() < 1e-6);
    }

    #[test]
    fn test_sample_rate_change_keeps_frequency() {
        let mut lfo = Lfo::new(44100.0, 3.0);
        lfo.set_sample_rate(96000.0);
        assert!((lfo.frequency() - 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_waveform_index_round_trip() {
        for w in LfoWaveform::ALL {
            assert_eq!(LfoWaveform::from_index(w.index() as f32), w);
        }
        assert_eq!(LfoWaveform::from_index(9.0), LfoWaveform::Triangle);
        assert_eq!(LfoWaveform::from_index(f32::NAN), LfoWaveform::Sine);
    }

    #[test]
    fn test_waveform_from_str() {
        assert_eq!("saw".parse::<LfoWaveform>(), Ok(LfoWaveform::Saw));
        assert!("wobble".parse::<LfoWaveform>().is_err());
    }
}
