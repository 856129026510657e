//! Rate-based ADSR envelope shared by every voice of a synthesizer.
//!
//! `attack`, `decay` and `release` are per-update rates, not durations: the
//! synthesizer calls [`Envelope::update`] once per voice per block.
//!
//! | Stage | Update | Leaves when |
//! |-------|--------|-------------|
//! | Attack | `amplitude += attack` | amplitude reaches `velocity` |
//! | Decay | `amplitude -= decay` | amplitude reaches `velocity * sustain` |
//! | Sustain | moves toward `velocity * sustain` by one attack or decay step | note off |
//! | Release | `amplitude *= 1 - release` | amplitude < 0.001 (snaps to 0) |
//!
//! Attack clamps at `velocity` and Decay clamps at the sustain level, so the
//! amplitude never overshoots either bound.

/// Amplitude below which a releasing voice is considered silent.
pub const SILENCE_THRESHOLD: f32 = 0.001;

/// Envelope stage of a single voice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EnvelopeStage {
    /// Not sounding.
    #[default]
    Idle,
    /// Rising toward velocity.
    Attack,
    /// Falling toward the sustain level.
    Decay,
    /// Holding at the sustain level.
    Sustain,
    /// Key released, decaying geometrically to silence.
    Release,
}

/// ADSR rates and sustain level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Envelope {
    /// Amplitude added per update during attack (0.0001 to 1.0, default 0.1)
    pub attack: f32,
    /// Amplitude removed per update during decay (0.0001 to 1.0, default 0.1)
    pub decay: f32,
    /// Sustain level as a fraction of velocity (0.0 to 1.0, default 0.7)
    pub sustain: f32,
    /// Fraction of amplitude removed per update during release (0.0001 to 1.0, default 0.2)
    pub release: f32,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            attack: 0.1,
            decay: 0.1,
            sustain: 0.7,
            release: 0.2,
        }
    }
}

impl Envelope {
    /// Smallest accepted rate. A zero rate would leave a voice stuck in its stage.
    pub const MIN_RATE: f32 = 0.0001;

    /// Return a copy with every field clamped into its valid range.
    ///
    /// Non-finite fields fall back to their defaults.
    pub fn clamped(self) -> Self {
        let defaults = Self::default();
        let rate = |v: f32, d: f32| if v.is_finite() { v.clamp(Self::MIN_RATE, 1.0) } else { d };
        Self {
            attack: rate(self.attack, defaults.attack),
            decay: rate(self.decay, defaults.decay),
            sustain: if self.sustain.is_finite() {
                self.sustain.clamp(0.0, 1.0)
            } else {
                defaults.sustain
            },
            release: rate(self.release, defaults.release),
        }
    }

    /// Advance one voice's envelope by one step.
    pub fn update(&self, voice: &mut crate::Voice) {
        let target = voice.velocity * self.sustain;
        match voice.stage {
            EnvelopeStage::Idle => voice.amplitude = 0.0,
            EnvelopeStage::Attack => {
                voice.amplitude += self.attack;
                if voice.amplitude >= voice.velocity {
                    voice.amplitude = voice.velocity;
                    voice.stage = EnvelopeStage::Decay;
                }
            }
            EnvelopeStage::Decay => {
                voice.amplitude -= self.decay;
                if voice.amplitude <= target {
                    voice.amplitude = target;
                    voice.stage = EnvelopeStage::Sustain;
                }
            }
            EnvelopeStage::Sustain => {
                // Follows sustain changes made while the note is held.
                if voice.amplitude > target {
                    voice.amplitude = (voice.amplitude - self.decay).max(target);
                } else if voice.amplitude < target {
                    voice.amplitude = (voice.amplitude + self.attack).min(target);
                }
            }
            EnvelopeStage::Release => {
                voice.amplitude *= 1.0 - self.release;
                if voice.amplitude < SILENCE_THRESHOLD {
                    voice.amplitude = 0.0;
                    voice.stage = EnvelopeStage::Idle;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::VoicePool;

    fn held_voice(velocity: f32) -> VoicePool<1> {
        let mut pool = VoicePool::new();
        pool.note_on(60, velocity, 0, 1.0);
        pool
    }

    #[test]
    fn test_defaults() {
        let env = Envelope::default();
        assert_eq!(env.attack, 0.1);
        assert_eq!(env.decay, 0.1);
        assert_eq!(env.sustain, 0.7);
        assert_eq!(env.release, 0.2);
    }

    #[test]
    fn test_clamped() {
        let env = Envelope {
            attack: 0.0,
            decay: 5.0,
            sustain: -1.0,
            release: f32::NAN,
        }
        .clamped();
        assert_eq!(env.attack, Envelope::MIN_RATE);
        assert_eq!(env.decay, 1.0);
        assert_eq!(env.sustain, 0.0);
        assert_eq!(env.release, 0.2);
    }

    #[test]
    fn test_full_step_attack_and_release() {
        let env = Envelope {
            attack: 1.0,
            decay: 1.0,
            sustain: 0.5,
            release: 1.0,
        };
        let mut pool = held_voice(1.0);
        let voice = &mut pool.voices_mut()[0];

        env.update(voice);
        assert_eq!(voice.amplitude(), 1.0, "full-step attack reaches velocity at once");

        voice.active = false;
        voice.stage = EnvelopeStage::Release;
        env.update(voice);
        assert_eq!(voice.amplitude(), 0.0, "full-step release silences at once");
        assert_eq!(voice.stage(), EnvelopeStage::Idle);
    }

    #[test]
    fn test_attack_then_decay_settles_at_sustain() {
        let env = Envelope {
            attack: 0.3,
            decay: 0.15,
            sustain: 0.5,
            release: 0.2,
        };
        let mut pool = held_voice(0.8);
        let voice = &mut pool.voices_mut()[0];

        let mut peak: f32 = 0.0;
        for _ in 0..50 {
            env.update(voice);
            peak = peak.max(voice.amplitude());
            assert!(voice.amplitude() <= 0.8 + 1e-6, "never exceeds velocity");
        }
        assert!((peak - 0.8).abs() < 1e-6, "attack reaches velocity");
        assert_eq!(voice.stage(), EnvelopeStage::Sustain);
        assert!((voice.amplitude() - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_sustain_follows_level_change() {
        let mut env = Envelope {
            attack: 0.5,
            decay: 0.5,
            sustain: 0.5,
            release: 0.5,
        };
        let mut pool = held_voice(1.0);
        let voice = &mut pool.voices_mut()[0];
        for _ in 0..10 {
            env.update(voice);
        }
        env.sustain = 0.9;
        env.update(voice);
        assert!((voice.amplitude() - 0.9).abs() < 1e-6);
    }

    #[test]
    fn test_release_is_monotonic() {
        let env = Envelope::default();
        let mut pool = held_voice(1.0);
        for _ in 0..30 {
            env.update(&mut pool.voices_mut()[0]);
        }
        pool.note_off(60, 0);
        let voice = &mut pool.voices_mut()[0];
        let mut last = voice.amplitude();
        let mut steps = 0;
        while voice.amplitude() > 0.0 {
            env.update(voice);
            assert!(voice.amplitude() <= last);
            last = voice.amplitude();
            steps += 1;
            assert!(steps < 1000, "release must terminate");
        }
        assert_eq!(voice.stage(), EnvelopeStage::Idle);
    }
}
