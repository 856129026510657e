//! The [`Synthesizer`] trait and the engine state every implementation shares.
//!
//! [`SynthCore`] owns the voice pool, the amplitude envelope, and the global
//! volume/pan/filter/LFO settings. Concrete engines embed a `SynthCore` and
//! implement [`Synthesizer::process_block`]; every note, controller and
//! setter entry point is a default method that forwards to the core.
//!
//! # MIDI controller mapping
//!
//! | CC | Target | Mapping |
//! |----|--------|---------|
//! | 1 | modulation (LFO depth) | `v / 127` |
//! | 7 | volume | `v / 127` |
//! | 10 | pan | `v / 127 * 2 - 1` |
//! | 71 | filter cutoff | `v * 20` Hz |
//! | 74 | filter resonance | `v / 127` |
//!
//! Other controller numbers are ignored.

#[cfg(not(feature = "std"))]
use alloc::boxed::Box;

use crate::envelope::Envelope;
use crate::param::SynthParam;
use crate::subtractive::SubtractiveSynthesizer;
use crate::voice::{DEFAULT_POLYPHONY, MIDI_CHANNELS, VoicePool};
use core::fmt;
use core::str::FromStr;
use polydyn_core::{ParseEnumError, clamp_or};

/// Default engine sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;

/// Shared synthesizer state.
#[derive(Debug, Clone)]
pub struct SynthCore {
    voices: VoicePool<DEFAULT_POLYPHONY>,
    envelope: Envelope,
    filter_cutoff: f32,
    filter_resonance: f32,
    lfo_rate: f32,
    lfo_depth: f32,
    volume: f32,
    pan: f32,
    /// Last pitch bend per MIDI channel, in octaves [-1, 1].
    pitch_bend: [f32; MIDI_CHANNELS],
    sample_rate: f32,
}

impl Default for SynthCore {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_RATE)
    }
}

impl SynthCore {
    /// Create engine state with default settings.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            voices: VoicePool::new(),
            envelope: Envelope::default(),
            filter_cutoff: SynthParam::FilterCutoff.default_value(),
            filter_resonance: SynthParam::FilterResonance.default_value(),
            lfo_rate: SynthParam::LfoRate.default_value(),
            lfo_depth: SynthParam::LfoDepth.default_value(),
            volume: SynthParam::Volume.default_value(),
            pan: SynthParam::Pan.default_value(),
            pitch_bend: [0.0; MIDI_CHANNELS],
            sample_rate: sanitize_rate(sample_rate),
        }
    }

    /// Start a note. Returns the claimed voice index, or `None` when the pool is full.
    ///
    /// `note` is masked to 0–127, `velocity` is clamped to 127 and scaled to
    /// [0, 1], `channel` is masked to 0–15.
    pub fn note_on(&mut self, note: u8, velocity: u8, channel: u8) -> Option<usize> {
        let channel = channel & 0x0F;
        let velocity = f32::from(velocity.min(127)) / 127.0;
        let bend = libm::powf(2.0, self.pitch_bend[channel as usize]);
        self.voices.note_on(note & 0x7F, velocity, channel, bend)
    }

    /// Release a held note. Returns the released voice index.
    pub fn note_off(&mut self, note: u8, _velocity: u8, channel: u8) -> Option<usize> {
        self.voices.note_off(note & 0x7F, channel & 0x0F)
    }

    /// Apply a MIDI continuous controller.
    pub fn set_controller(&mut self, controller: u8, value: u8, channel: u8) {
        let v = f32::from(value.min(127));
        match controller {
            1 => self.set_modulation(v / 127.0, channel),
            7 => self.set_volume(v / 127.0),
            10 => self.set_pan(v / 127.0 * 2.0 - 1.0),
            71 => self.set_filter_cutoff(v * 20.0),
            74 => self.set_filter_resonance(v / 127.0),
            _ => {}
        }
    }

    /// Set pitch bend for `channel` in octaves, clamped to [-1, 1].
    ///
    /// Every held voice on the channel is retuned to `base * 2^value`; the
    /// bend does not compound across calls. Notes started later on the same
    /// channel also receive it.
    pub fn set_pitch_bend(&mut self, value: f32, channel: u8) {
        let channel = channel & 0x0F;
        let bend = clamp_or(value, -1.0, 1.0, self.pitch_bend[channel as usize]);
        self.pitch_bend[channel as usize] = bend;
        self.voices.apply_bend(channel, libm::powf(2.0, bend));
    }

    /// Current pitch bend for `channel`.
    pub fn pitch_bend(&self, channel: u8) -> f32 {
        self.pitch_bend[(channel & 0x0F) as usize]
    }

    /// Set modulation depth, which drives the LFO depth.
    pub fn set_modulation(&mut self, value: f32, _channel: u8) {
        self.set_lfo_depth(value);
    }

    /// Set output volume, clamped to [0, 1].
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = clamp_or(volume, 0.0, 1.0, self.volume);
    }

    /// Get output volume.
    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// Set pan, clamped to [-1, 1].
    pub fn set_pan(&mut self, pan: f32) {
        self.pan = clamp_or(pan, -1.0, 1.0, self.pan);
    }

    /// Get pan.
    pub fn pan(&self) -> f32 {
        self.pan
    }

    /// Set the base filter cutoff in Hz, clamped to [20, 20000].
    pub fn set_filter_cutoff(&mut self, cutoff: f32) {
        self.filter_cutoff = clamp_or(cutoff, 20.0, 20000.0, self.filter_cutoff);
    }

    /// Get the base filter cutoff in Hz.
    pub fn filter_cutoff(&self) -> f32 {
        self.filter_cutoff
    }

    /// Set filter resonance, clamped to [0, 1].
    pub fn set_filter_resonance(&mut self, resonance: f32) {
        self.filter_resonance = clamp_or(resonance, 0.0, 1.0, self.filter_resonance);
    }

    /// Get filter resonance.
    pub fn filter_resonance(&self) -> f32 {
        self.filter_resonance
    }

    /// Set LFO rate in Hz, clamped to [0.1, 20].
    pub fn set_lfo_rate(&mut self, rate: f32) {
        self.lfo_rate = clamp_or(rate, 0.1, 20.0, self.lfo_rate);
    }

    /// Get LFO rate in Hz.
    pub fn lfo_rate(&self) -> f32 {
        self.lfo_rate
    }

    /// Set LFO depth, clamped to [0, 1].
    pub fn set_lfo_depth(&mut self, depth: f32) {
        self.lfo_depth = clamp_or(depth, 0.0, 1.0, self.lfo_depth);
    }

    /// Get LFO depth.
    pub fn lfo_depth(&self) -> f32 {
        self.lfo_depth
    }

    /// Replace the amplitude envelope. Fields are clamped (see [`Envelope::clamped`]).
    pub fn set_envelope(&mut self, envelope: Envelope) {
        self.envelope = envelope.clamped();
    }

    /// Get the amplitude envelope.
    pub fn envelope(&self) -> Envelope {
        self.envelope
    }

    /// Step every voice's envelope once, remembering where the block started.
    pub fn update_envelopes(&mut self) {
        let envelope = self.envelope;
        for voice in self.voices.voices_mut() {
            voice.block_start_amplitude = voice.amplitude;
            envelope.update(voice);
        }
    }

    /// Read access to the voice pool.
    pub fn voices(&self) -> &VoicePool<DEFAULT_POLYPHONY> {
        &self.voices
    }

    pub(crate) fn voices_mut(&mut self) -> &mut VoicePool<DEFAULT_POLYPHONY> {
        &mut self.voices
    }

    /// Limit how many voices may be allocated (1 to 16).
    pub fn set_voice_limit(&mut self, limit: usize) {
        self.voices.set_limit(limit);
    }

    /// Whether any voice is held.
    pub fn is_active(&self) -> bool {
        self.voices.active_voice_count() > 0
    }

    /// Number of held voices.
    pub fn active_voice_count(&self) -> usize {
        self.voices.active_voice_count()
    }

    /// Engine sample rate in Hz.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Set the engine sample rate. Non-positive or non-finite rates are ignored.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            self.sample_rate = sample_rate;
        }
    }

    /// Silence every voice and clear pitch bend.
    pub fn reset(&mut self) {
        self.voices.reset();
        self.pitch_bend = [0.0; MIDI_CHANNELS];
    }
}

fn sanitize_rate(sample_rate: f32) -> f32 {
    if sample_rate.is_finite() && sample_rate > 0.0 {
        sample_rate
    } else {
        DEFAULT_SAMPLE_RATE
    }
}

/// A polyphonic synthesis engine.
///
/// Implementors provide access to their [`SynthCore`] and the block renderer;
/// everything else has a default implementation. Engines with parameters of
/// their own override [`set_type_specific_parameter`](Self::set_type_specific_parameter)
/// instead of requiring callers to know the concrete type.
///
/// # Example
///
/// ```rust
/// use polydyn_synth::{SynthParam, SynthType, Synthesizer};
///
/// let mut synth = SynthType::Subtractive.build(44100.0);
/// synth.set_parameter(SynthParam::OscillatorType, 2.0); // saw
/// synth.note_on(60, 100, 0);
///
/// let mut block = vec![0.0; 512]; // 256 interleaved stereo frames
/// synth.process_block(&mut block);
/// ```
pub trait Synthesizer {
    /// Shared engine state.
    fn core(&self) -> &SynthCore;

    /// Mutable shared engine state.
    fn core_mut(&mut self) -> &mut SynthCore;

    /// Which engine this is.
    fn synth_type(&self) -> SynthType;

    /// Render interleaved stereo into `output`, overwriting it.
    ///
    /// `output.len()` counts float slots, so it holds `output.len() / 2`
    /// frames. A trailing odd slot is zeroed.
    fn process_block(&mut self, output: &mut [f32]);

    /// Apply a parameter only this engine understands.
    ///
    /// Returns `false` when the engine does not know `param`.
    fn set_type_specific_parameter(&mut self, _param: SynthParam, _value: f32) -> bool {
        false
    }

    /// Read a parameter only this engine understands.
    fn type_specific_parameter(&self, _param: SynthParam) -> Option<f32> {
        None
    }

    /// Apply any parameter. Returns `false` when the engine does not know it.
    fn set_parameter(&mut self, param: SynthParam, value: f32) -> bool {
        if param.is_type_specific() {
            return self.set_type_specific_parameter(param, value);
        }
        let core = self.core_mut();
        let mut env = core.envelope();
        match param {
            SynthParam::FilterCutoff => core.set_filter_cutoff(value),
            SynthParam::FilterResonance => core.set_filter_resonance(value),
            SynthParam::EnvelopeAttack => {
                env.attack = value;
                core.set_envelope(env);
            }
            SynthParam::EnvelopeDecay => {
                env.decay = value;
                core.set_envelope(env);
            }
            SynthParam::EnvelopeSustain => {
                env.sustain = value;
                core.set_envelope(env);
            }
            SynthParam::EnvelopeRelease => {
                env.release = value;
                core.set_envelope(env);
            }
            SynthParam::LfoRate => core.set_lfo_rate(value),
            SynthParam::LfoDepth => core.set_lfo_depth(value),
            SynthParam::Volume => core.set_volume(value),
            SynthParam::Pan => core.set_pan(value),
            _ => return false,
        }
        true
    }

    /// Read any parameter's current value.
    fn parameter(&self, param: SynthParam) -> Option<f32> {
        if param.is_type_specific() {
            return self.type_specific_parameter(param);
        }
        let core = self.core();
        let env = core.envelope();
        Some(match param {
            SynthParam::FilterCutoff => core.filter_cutoff(),
            SynthParam::FilterResonance => core.filter_resonance(),
            SynthParam::EnvelopeAttack => env.attack,
            SynthParam::EnvelopeDecay => env.decay,
            SynthParam::EnvelopeSustain => env.sustain,
            SynthParam::EnvelopeRelease => env.release,
            SynthParam::LfoRate => core.lfo_rate(),
            SynthParam::LfoDepth => core.lfo_depth(),
            SynthParam::Volume => core.volume(),
            SynthParam::Pan => core.pan(),
            _ => return None,
        })
    }

    /// Start a note. Returns `false` when the note was dropped because every voice is held.
    fn note_on(&mut self, note: u8, velocity: u8, channel: u8) -> bool {
        self.core_mut().note_on(note, velocity, channel).is_some()
    }

    /// Release a note. Returns `false` when no held voice matched.
    fn note_off(&mut self, note: u8, velocity: u8, channel: u8) -> bool {
        self.core_mut().note_off(note, velocity, channel).is_some()
    }

    /// Apply a MIDI continuous controller.
    fn set_controller(&mut self, controller: u8, value: u8, channel: u8) {
        self.core_mut().set_controller(controller, value, channel);
    }

    /// Set pitch bend in octaves [-1, 1] for a channel.
    fn set_pitch_bend(&mut self, value: f32, channel: u8) {
        self.core_mut().set_pitch_bend(value, channel);
    }

    /// Set modulation depth [0, 1].
    fn set_modulation(&mut self, value: f32, channel: u8) {
        self.core_mut().set_modulation(value, channel);
    }

    /// Set output volume [0, 1].
    fn set_volume(&mut self, volume: f32) {
        self.core_mut().set_volume(volume);
    }

    /// Set pan [-1, 1].
    fn set_pan(&mut self, pan: f32) {
        self.core_mut().set_pan(pan);
    }

    /// Set the amplitude envelope.
    fn set_envelope(&mut self, envelope: Envelope) {
        self.core_mut().set_envelope(envelope);
    }

    /// Get the amplitude envelope.
    fn envelope(&self) -> Envelope {
        self.core().envelope()
    }

    /// Set the base filter cutoff in Hz.
    fn set_filter_cutoff(&mut self, cutoff: f32) {
        self.core_mut().set_filter_cutoff(cutoff);
    }

    /// Set filter resonance [0, 1].
    fn set_filter_resonance(&mut self, resonance: f32) {
        self.core_mut().set_filter_resonance(resonance);
    }

    /// Set LFO rate in Hz.
    fn set_lfo_rate(&mut self, rate: f32) {
        self.core_mut().set_lfo_rate(rate);
    }

    /// Set LFO depth [0, 1].
    fn set_lfo_depth(&mut self, depth: f32) {
        self.core_mut().set_lfo_depth(depth);
    }

    /// Whether any voice is held.
    fn is_active(&self) -> bool {
        self.core().is_active()
    }

    /// Number of held voices.
    fn active_voice_count(&self) -> usize {
        self.core().active_voice_count()
    }

    /// Current output volume.
    fn current_volume(&self) -> f32 {
        self.core().volume()
    }

    /// Current pan.
    fn current_pan(&self) -> f32 {
        self.core().pan()
    }

    /// Change the engine sample rate.
    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.core_mut().set_sample_rate(sample_rate);
    }

    /// Silence all voices and clear engine state instantly.
    fn reset(&mut self) {
        self.core_mut().reset();
    }
}

/// Available synthesizer engines.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SynthType {
    /// Oscillator → ladder filter → LFO
    #[default]
    Subtractive,
}

impl SynthType {
    /// Configuration name of this engine.
    pub fn name(self) -> &'static str {
        match self {
            SynthType::Subtractive => "subtractive",
        }
    }

    /// Build a fresh engine of this type.
    pub fn build(self, sample_rate: f32) -> Box<dyn Synthesizer + Send> {
        match self {
            SynthType::Subtractive => Box::new(SubtractiveSynthesizer::new(sample_rate)),
        }
    }
}

impl fmt::Display for SynthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SynthType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subtractive" => Ok(SynthType::Subtractive),
            _ => Err(ParseEnumError::new("synthesizer type")),
        }
    }
}
