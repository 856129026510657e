//! Fixed-capacity voice pool for polyphonic synthesis.
//!
//! A [`VoicePool`] is an array of [`Voice`]s allocated once at construction.
//! `note_on` claims the first voice whose `active` flag is clear; when every
//! voice is held the note is dropped. There is no voice stealing.

use crate::envelope::EnvelopeStage;

/// Number of voices in a synthesizer's pool.
pub const DEFAULT_POLYPHONY: usize = 16;

/// Number of MIDI channels.
pub const MIDI_CHANNELS: usize = 16;

/// Per-note performance state.
///
/// A voice keeps rendering after `note_off` until its release has brought
/// `amplitude` to zero, so "sounding" and "active" are different questions:
/// see [`Voice::is_sounding`].
#[derive(Debug, Clone, Default)]
pub struct Voice {
    /// Unbent note frequency in Hz.
    pub(crate) base_frequency: f32,
    /// Current frequency in Hz (base frequency with pitch bend applied).
    pub(crate) frequency: f32,
    /// Normalized velocity [0, 1].
    pub(crate) velocity: f32,
    /// Oscillator phase [0, 1).
    pub(crate) phase: f32,
    /// Envelope output at the end of the current block.
    pub(crate) amplitude: f32,
    /// Envelope output at the start of the current block.
    pub(crate) block_start_amplitude: f32,
    pub(crate) stage: EnvelopeStage,
    pub(crate) active: bool,
    pub(crate) note: u8,
    pub(crate) channel: u8,
}

impl Voice {
    /// Current frequency in Hz.
    pub fn frequency(&self) -> f32 {
        self.frequency
    }

    /// Normalized velocity [0, 1].
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    /// Oscillator phase [0, 1).
    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Current envelope output [0, 1].
    pub fn amplitude(&self) -> f32 {
        self.amplitude
    }

    /// Current envelope stage.
    pub fn stage(&self) -> EnvelopeStage {
        self.stage
    }

    /// Whether the key for this voice is still held.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether this voice contributes sound (held, or releasing with amplitude left).
    pub fn is_sounding(&self) -> bool {
        self.active || self.amplitude > 0.0
    }

    /// MIDI note number.
    pub fn note(&self) -> u8 {
        self.note
    }

    /// MIDI channel.
    pub fn channel(&self) -> u8 {
        self.channel
    }

    /// Advance phase by `increment`, wrapping into [0, 1).
    #[inline]
    pub(crate) fn advance_phase(&mut self, increment: f32) {
        self.phase += increment;
        if self.phase >= 1.0 {
            self.phase -= libm::floorf(self.phase);
        }
    }

    /// Evaluate the linearly interpolated envelope gain for frame `i` of `frames`.
    #[inline]
    pub(crate) fn block_gain(&self, i: usize, frames: usize) -> f32 {
        let t = (i + 1) as f32 / frames.max(1) as f32;
        self.block_start_amplitude + (self.amplitude - self.block_start_amplitude) * t
    }

    fn silence(&mut self) {
        *self = Self::default();
    }
}

/// Fixed-size pool of voices.
///
/// `N` is the number of voices. A soft limit (see [`set_limit`](Self::set_limit))
/// can restrict allocation to the first voices without shrinking the array.
///
/// # Example
///
/// ```rust
/// use polydyn_synth::VoicePool;
///
/// let mut pool: VoicePool<4> = VoicePool::new();
/// for note in 60..65 {
///     pool.note_on(note, 1.0, 0, 1.0);
/// }
/// assert_eq!(pool.active_voice_count(), 4); // fifth note dropped
/// ```
#[derive(Debug, Clone)]
pub struct VoicePool<const N: usize> {
    voices: [Voice; N],
    limit: usize,
}

impl<const N: usize> Default for VoicePool<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> VoicePool<N> {
    /// Create a pool of `N` idle voices.
    pub fn new() -> Self {
        Self {
            voices: core::array::from_fn(|_| Voice::default()),
            limit: N,
        }
    }

    /// Total number of voices.
    pub fn capacity(&self) -> usize {
        N
    }

    /// Restrict allocation to the first `limit` voices, clamped to [1, N].
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.clamp(1, N);
    }

    /// Current allocation limit.
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Number of held voices.
    pub fn active_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.active).count()
    }

    /// Number of voices contributing sound (held or releasing).
    pub fn sounding_voice_count(&self) -> usize {
        self.voices.iter().filter(|v| v.is_sounding()).count()
    }

    /// Read access to all voices.
    pub fn voices(&self) -> &[Voice; N] {
        &self.voices
    }

    /// Mutable access to all voices.
    pub(crate) fn voices_mut(&mut self) -> &mut [Voice; N] {
        &mut self.voices
    }

    /// Claim the first inactive voice for `note`.
    ///
    /// `velocity` is normalized [0, 1]; `bend_ratio` scales the note's
    /// frequency. Returns the index of the claimed voice, or `None` if every
    /// voice within the limit is held.
    pub fn note_on(&mut self, note: u8, velocity: f32, channel: u8, bend_ratio: f32) -> Option<usize> {
        let index = self.voices[..self.limit].iter().position(|v| !v.active)?;
        let base = midi_to_freq(note);
        let voice = &mut self.voices[index];
        voice.base_frequency = base;
        voice.frequency = base * bend_ratio;
        voice.velocity = velocity.clamp(0.0, 1.0);
        voice.phase = 0.0;
        voice.amplitude = 0.0;
        voice.block_start_amplitude = 0.0;
        voice.stage = EnvelopeStage::Attack;
        voice.active = true;
        voice.note = note;
        voice.channel = channel;
        Some(index)
    }

    /// Release the first held voice playing `note` on `channel`.
    ///
    /// Returns the index of the released voice.
    pub fn note_off(&mut self, note: u8, channel: u8) -> Option<usize> {
        let index = self
            .voices
            .iter()
            .position(|v| v.active && v.note == note && v.channel == channel)?;
        let voice = &mut self.voices[index];
        voice.active = false;
        voice.stage = EnvelopeStage::Release;
        Some(index)
    }

    /// Set the frequency of every held voice on `channel` to `base * ratio`.
    pub fn apply_bend(&mut self, channel: u8, ratio: f32) {
        for voice in self.voices.iter_mut().filter(|v| v.active && v.channel == channel) {
            voice.frequency = voice.base_frequency * ratio;
        }
    }

    /// Silence every voice immediately.
    pub fn reset(&mut self) {
        for voice in &mut self.voices {
            voice.silence();
        }
    }
}

/// Convert MIDI note number to frequency in Hz.
///
/// Uses standard tuning: A4 (note 69) = 440 Hz.
#[inline]
pub fn midi_to_freq(note: u8) -> f32 {
    440.0 * libm::powf(2.0, (note as f32 - 69.0) / 12.0)
}

/// Convert semitones to a frequency ratio.
#[inline]
pub fn semitones_to_ratio(semitones: f32) -> f32 {
    libm::powf(2.0, semitones / 12.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midi_to_freq() {
        assert!((midi_to_freq(69) - 440.0).abs() < 0.01);
        assert!((midi_to_freq(60) - 261.63).abs() < 0.01);
        assert!((midi_to_freq(81) - 880.0).abs() < 0.01);
    }

    #[test]
    fn test_semitones_to_ratio() {
        assert!((semitones_to_ratio(12.0) - 2.0).abs() < 1e-5);
        assert!((semitones_to_ratio(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_note_on_claims_first_free_voice() {
        let mut pool: VoicePool<4> = VoicePool::new();
        assert_eq!(pool.note_on(60, 0.5, 0, 1.0), Some(0));
        assert_eq!(pool.note_on(64, 0.5, 0, 1.0), Some(1));

        let v = &pool.voices()[0];
        assert!(v.is_active());
        assert_eq!(v.note(), 60);
        assert_eq!(v.amplitude(), 0.0);
        assert_eq!(v.phase(), 0.0);
        assert_eq!(v.stage(), EnvelopeStage::Attack);
    }

    #[test]
    fn test_pool_exhaustion_drops_note() {
        let mut pool: VoicePool<DEFAULT_POLYPHONY> = VoicePool::new();
        for note in 0..16 {
            assert!(pool.note_on(40 + note, 1.0, 0, 1.0).is_some());
        }
        let before: Vec<u8> = pool.voices().iter().map(Voice::note).collect();
        assert_eq!(pool.note_on(100, 1.0, 0, 1.0), None, "17th note must be dropped");
        let after: Vec<u8> = pool.voices().iter().map(Voice::note).collect();
        assert_eq!(before, after, "dropped note must not disturb the pool");
        assert_eq!(pool.active_voice_count(), 16);
    }

    #[test]
    fn test_note_off_matches_channel() {
        let mut pool: VoicePool<4> = VoicePool::new();
        pool.note_on(60, 1.0, 0, 1.0);
        pool.note_on(60, 1.0, 1, 1.0);

        assert_eq!(pool.note_off(60, 1), Some(1));
        assert!(pool.voices()[0].is_active());
        assert!(!pool.voices()[1].is_active());
        assert_eq!(pool.voices()[1].stage(), EnvelopeStage::Release);
        assert_eq!(pool.note_off(60, 5), None);
    }

    #[test]
    fn test_released_voice_is_reusable() {
        let mut pool: VoicePool<1> = VoicePool::new();
        pool.note_on(60, 1.0, 0, 1.0);
        assert_eq!(pool.note_on(62, 1.0, 0, 1.0), None);
        pool.note_off(60, 0);
        assert_eq!(pool.note_on(62, 1.0, 0, 1.0), Some(0));
    }

    #[test]
    fn test_limit_restricts_allocation() {
        let mut pool: VoicePool<8> = VoicePool::new();
        pool.set_limit(2);
        assert!(pool.note_on(60, 1.0, 0, 1.0).is_some());
        assert!(pool.note_on(61, 1.0, 0, 1.0).is_some());
        assert!(pool.note_on(62, 1.0, 0, 1.0).is_none());
        pool.set_limit(0);
        assert_eq!(pool.limit(), 1);
        pool.set_limit(100);
        assert_eq!(pool.limit(), 8);
    }

    #[test]
    fn test_bend_is_not_cumulative() {
        let mut pool: VoicePool<2> = VoicePool::new();
        pool.note_on(69, 1.0, 3, 1.0);
        pool.apply_bend(3, 2.0);
        pool.apply_bend(3, 2.0);
        assert!((pool.voices()[0].frequency() - 880.0).abs() < 0.01);
        pool.apply_bend(3, 1.0);
        assert!((pool.voices()[0].frequency() - 440.0).abs() < 0.01);
    }

    #[test]
    fn test_phase_wraps() {
        let mut v = Voice::default();
        v.advance_phase(0.75);
        v.advance_phase(0.5);
        assert!((v.phase() - 0.25).abs() < 1e-6);
    }
}
