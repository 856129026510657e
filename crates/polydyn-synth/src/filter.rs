//! Four-stage resonant filter and its free-running envelope.
//!
//! # Lowpass
//!
//! A Moog-style ladder where every stage saturates:
//!
//! ```text
//! s0 = tanh(in * drive - s3 * resonance)
//! s1 = tanh(s0 + s1)
//! s2 = tanh(s1 + s2)
//! s3 = tanh(s2 + s3)
//! ```
//!
//! # Highpass
//!
//! A difference cascade with no per-stage saturation:
//!
//! ```text
//! s0 = in - s3 * resonance
//! s1 = s0 - s1
//! s2 = s1 - s2
//! s3 = tanh(s2 - s3)
//! ```
//!
//! The last stage of both topologies goes through `tanh`, so the value fed
//! back into the next sample is always bounded.
//!
//! Neither topology has a cutoff coefficient. The cutoff that the
//! synthesizer computes from the filter envelope and LFO is reported but
//! does not reach the filter.

use core::str::FromStr;
use libm::tanhf;
use polydyn_core::{ParseEnumError, flush_denormal};

/// Filter topology.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FilterType {
    /// Saturating ladder
    #[default]
    Lowpass,
    /// Difference cascade
    Highpass,
}

impl FilterType {
    /// Map a numeric parameter value (0 = lowpass, 1 = highpass).
    pub fn from_index(value: f32) -> Self {
        if value >= 0.5 { Self::Highpass } else { Self::Lowpass }
    }

    /// Numeric parameter value of this topology.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for FilterType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lowpass" => Ok(Self::Lowpass),
            "highpass" => Ok(Self::Highpass),
            _ => Err(ParseEnumError::new("filter type")),
        }
    }
}

/// History of one four-stage filter.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LadderState {
    stages: [f32; 4],
}

impl LadderState {
    /// Run one sample through the filter.
    #[inline]
    pub fn process(&mut self, input: f32, mode: FilterType, resonance: f32, drive: f32) -> f32 {
        let s = &mut self.stages;
        let feedback = s[3] * resonance;
        match mode {
            FilterType::Lowpass => {
                s[0] = tanhf(input * drive - feedback);
                s[1] = tanhf(s[0] + s[1]);
                s[2] = tanhf(s[1] + s[2]);
                s[3] = tanhf(s[2] + s[3]);
            }
            FilterType::Highpass => {
                s[0] = input - feedback;
                s[1] = s[0] - s[1];
                s[2] = s[1] - s[2];
                s[3] = tanhf(s[2] - s[3]);
            }
        }

        if s.iter().any(|v| !v.is_finite()) {
            *s = [0.0; 4];
            return 0.0;
        }
        for v in s.iter_mut() {
            *v = flush_denormal(*v);
        }
        s[3]
    }

    /// Stage values, for inspection.
    pub fn stages(&self) -> [f32; 4] {
        self.stages
    }

    /// Zero the history.
    pub fn reset(&mut self) {
        self.stages = [0.0; 4];
    }
}

/// Free-running filter envelope.
///
/// Rises by `attack` while below 1.0, falls by `decay` once it reaches 1.0,
/// and is clamped to [0, 1] after every step. It has no idle state and runs
/// whether or not any voice is sounding.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterEnvelope {
    value: f32,
    /// Rise per step (minimum 0.001, default 0.1)
    attack: f32,
    /// Fall per step (minimum 0.001, default 0.1)
    decay: f32,
}

impl Default for FilterEnvelope {
    fn default() -> Self {
        Self {
            value: 0.0,
            attack: 0.1,
            decay: 0.1,
        }
    }
}

impl FilterEnvelope {
    /// Smallest accepted rate.
    pub const MIN_RATE: f32 = 0.001;

    /// Advance one step and return the new value.
    #[inline]
    pub fn advance(&mut self) -> f32 {
        if self.value < 1.0 {
            self.value += self.attack;
        } else {
            self.value -= self.decay;
        }
        self.value = self.value.clamp(0.0, 1.0);
        self.value
    }

    /// Current value [0, 1].
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Set the rise rate.
    pub fn set_attack(&mut self, attack: f32) {
        self.attack = attack.max(Self::MIN_RATE);
    }

    /// Get the rise rate.
    pub fn attack(&self) -> f32 {
        self.attack
    }

    /// Set the fall rate.
    pub fn set_decay(&mut self, decay: f32) {
        self.decay = decay.max(Self::MIN_RATE);
    }

    /// Get the fall rate.
    pub fn decay(&self) -> f32 {
        self.decay
    }

    /// Return to 0.
    pub fn reset(&mut self) {
        self.value = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lowpass_bounded_under_heavy_drive() {
        let mut state = LadderState::default();
        for i in 0..10_000 {
            let x = if i % 3 == 0 { 50.0 } else { -50.0 };
            let y = state.process(x, FilterType::Lowpass, 1.0, 10.0);
            assert!(y.abs() <= 1.0);
        }
        assert!(state.stages().iter().all(|s| s.abs() <= 1.0));
    }

    #[test]
    fn test_lowpass_stage_recurrence() {
        let mut state = LadderState::default();
        let y = state.process(0.5, FilterType::Lowpass, 0.7, 1.0);
        let s0 = tanhf(0.5);
        let s1 = tanhf(s0);
        let s2 = tanhf(s1);
        let s3 = tanhf(s2);
        assert!((y - s3).abs() < 1e-6);
    }

    #[test]
    fn test_highpass_output_bounded() {
        let mut state = LadderState::default();
        for i in 0..10_000 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            let y = state.process(x, FilterType::Highpass, 1.0, 1.0);
            assert!(y.is_finite() && y.abs() <= 1.0);
        }
    }

    #[test]
    fn test_non_finite_input_resets_state() {
        let mut state = LadderState::default();
        state.process(0.3, FilterType::Highpass, 0.5, 1.0);
        let y = state.process(f32::INFINITY, FilterType::Highpass, 0.5, 1.0);
        assert_eq!(y, 0.0);
        assert_eq!(state.stages(), [0.0; 4]);
    }

    #[test]
    fn test_filter_envelope_rises_then_falls() {
        let mut env = FilterEnvelope::default();
        let mut steps = 0;
        while env.value() < 1.0 {
            env.advance();
            steps += 1;
            assert!(steps <= 11, "attack of 0.1 reaches 1.0 in about ten steps");
        }
        let next = env.advance();
        assert!(next < 1.0, "falls once it has reached 1.0");
        for _ in 0..1000 {
            let v = env.advance();
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_filter_envelope_min_rates() {
        let mut env = FilterEnvelope::default();
        env.set_attack(0.0);
        env.set_decay(-1.0);
        assert_eq!(env.attack(), FilterEnvelope::MIN_RATE);
        assert_eq!(env.decay(), FilterEnvelope::MIN_RATE);
    }

    #[test]
    fn test_filter_type_parsing() {
        assert_eq!("highpass".parse::<FilterType>(), Ok(FilterType::Highpass));
        assert!("bandpass".parse::<FilterType>().is_err());
        assert_eq!(FilterType::from_index(1.0), FilterType::Highpass);
        assert_eq!(FilterType::from_index(0.0), FilterType::Lowpass);
    }
}
