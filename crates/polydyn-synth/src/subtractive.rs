//! Subtractive engine: oscillator → ladder filter → LFO → volume/pan.
//!
//! Per block, every voice's amplitude envelope is stepped once
//! ([`SynthCore::update_envelopes`]) and interpolated across the block. Per
//! frame, the filter envelope and the LFO each advance once, and every
//! sounding voice renders:
//!
//! ```text
//! osc(phase + offset) * mix * env → ladder[voice] → LFO amplitude → Σ → volume → pan
//! ```
//!
//! The modulated cutoff
//! `cutoff * (1 + filter_env * amount) * (1 + lfo * depth)` (the LFO term only
//! while routed to the filter) is tracked and reported by
//! [`SubtractiveSynthesizer::effective_cutoff`], but the ladder has no cutoff
//! coefficient and only resonance and drive shape its response.

use crate::filter::{FilterEnvelope, FilterType, LadderState};
use crate::oscillator::Waveform;
use crate::param::SynthParam;
use crate::synth::{SynthCore, SynthType, Synthesizer};
use crate::voice::{DEFAULT_POLYPHONY, semitones_to_ratio};
use core::str::FromStr;
use polydyn_core::{Lfo, LfoWaveform, NoiseSource, ParseEnumError, clamp_or, pan_gains};

/// What the LFO modulates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LfoDestination {
    /// Effective filter cutoff
    #[default]
    Filter,
    /// Output level, `sample * (1 + lfo * depth)`
    Amplitude,
    /// Oscillator frequency, `freq * 2^(lfo * depth)`
    Pitch,
}

impl LfoDestination {
    /// Map a numeric parameter value (0 = filter, 1 = amplitude, 2 = pitch).
    pub fn from_index(value: f32) -> Self {
        if !value.is_finite() || value < 0.5 {
            Self::Filter
        } else if value < 1.5 {
            Self::Amplitude
        } else {
            Self::Pitch
        }
    }

    /// Numeric parameter value of this destination.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl FromStr for LfoDestination {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "filter" => Ok(Self::Filter),
            "amplitude" => Ok(Self::Amplitude),
            "pitch" => Ok(Self::Pitch),
            _ => Err(ParseEnumError::new("lfo destination")),
        }
    }
}

/// Polyphonic subtractive synthesizer.
///
/// Each voice owns its own filter history, so held notes never bleed into
/// one another through the ladder feedback. The filter envelope and the LFO
/// are shared by the whole instance and free-run even with no voice held.
///
/// # Example
///
/// ```rust
/// use polydyn_synth::{SubtractiveSynthesizer, Synthesizer, Waveform};
///
/// let mut synth = SubtractiveSynthesizer::new(48000.0);
/// synth.set_oscillator_type(Waveform::Saw);
/// synth.set_filter_drive(2.0);
/// synth.note_on(48, 110, 0);
///
/// let mut out = vec![0.0; 256];
/// synth.process_block(&mut out);
/// assert!(out.iter().all(|s| s.is_finite()));
/// ```
#[derive(Debug, Clone)]
pub struct SubtractiveSynthesizer {
    core: SynthCore,
    oscillator_type: Waveform,
    oscillator_mix: f32,
    /// Semitones
    oscillator_detune: f32,
    oscillator_phase: f32,
    filter_type: FilterType,
    filter_drive: f32,
    filter_envelope_amount: f32,
    filter_envelope: FilterEnvelope,
    filters: [LadderState; DEFAULT_POLYPHONY],
    lfo: Lfo,
    lfo_destination: LfoDestination,
    noise: NoiseSource,
    effective_cutoff: f32,
}

impl Default for SubtractiveSynthesizer {
    fn default() -> Self {
        Self::new(crate::synth::DEFAULT_SAMPLE_RATE)
    }
}

impl SubtractiveSynthesizer {
    /// Create a synthesizer at `sample_rate` with default settings.
    pub fn new(sample_rate: f32) -> Self {
        let core = SynthCore::new(sample_rate);
        let lfo = Lfo::new(core.sample_rate(), core.lfo_rate());
        let effective_cutoff = core.filter_cutoff();
        Self {
            core,
            oscillator_type: Waveform::Sine,
            oscillator_mix: 1.0,
            oscillator_detune: 0.0,
            oscillator_phase: 0.0,
            filter_type: FilterType::Lowpass,
            filter_drive: 1.0,
            filter_envelope_amount: 0.0,
            filter_envelope: FilterEnvelope::default(),
            filters: [LadderState::default(); DEFAULT_POLYPHONY],
            lfo,
            lfo_destination: LfoDestination::Filter,
            noise: NoiseSource::default(),
            effective_cutoff,
        }
    }

    /// Select the oscillator waveform.
    pub fn set_oscillator_type(&mut self, waveform: Waveform) {
        self.oscillator_type = waveform;
    }

    /// Current oscillator waveform.
    pub fn oscillator_type(&self) -> Waveform {
        self.oscillator_type
    }

    /// Set oscillator level, clamped to [0, 1].
    pub fn set_oscillator_mix(&mut self, mix: f32) {
        self.oscillator_mix = clamp_or(mix, 0.0, 1.0, self.oscillator_mix);
    }

    /// Oscillator level.
    pub fn oscillator_mix(&self) -> f32 {
        self.oscillator_mix
    }

    /// Set detune in semitones, clamped to [-1, 1].
    pub fn set_oscillator_detune(&mut self, semitones: f32) {
        self.oscillator_detune = clamp_or(semitones, -1.0, 1.0, self.oscillator_detune);
    }

    /// Detune in semitones.
    pub fn oscillator_detune(&self) -> f32 {
        self.oscillator_detune
    }

    /// Set the phase offset added when evaluating the waveform, clamped to [0, 1].
    pub fn set_oscillator_phase(&mut self, phase: f32) {
        self.oscillator_phase = clamp_or(phase, 0.0, 1.0, self.oscillator_phase);
    }

    /// Phase offset.
    pub fn oscillator_phase(&self) -> f32 {
        self.oscillator_phase
    }

    /// Select lowpass or highpass.
    pub fn set_filter_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
    }

    /// Current filter topology.
    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Set input drive of the lowpass ladder, clamped to [1, 10].
    pub fn set_filter_drive(&mut self, drive: f32) {
        self.filter_drive = clamp_or(drive, 1.0, 10.0, self.filter_drive);
    }

    /// Filter drive.
    pub fn filter_drive(&self) -> f32 {
        self.filter_drive
    }

    /// Set how far the filter envelope raises the effective cutoff, clamped to [0, 1].
    pub fn set_filter_envelope_amount(&mut self, amount: f32) {
        self.filter_envelope_amount = clamp_or(amount, 0.0, 1.0, self.filter_envelope_amount);
    }

    /// Filter envelope amount.
    pub fn filter_envelope_amount(&self) -> f32 {
        self.filter_envelope_amount
    }

    /// Set the filter envelope rise rate (minimum 0.001).
    pub fn set_filter_envelope_attack(&mut self, attack: f32) {
        if !attack.is_nan() {
            self.filter_envelope.set_attack(attack);
        }
    }

    /// Set the filter envelope fall rate (minimum 0.001).
    pub fn set_filter_envelope_decay(&mut self, decay: f32) {
        if !decay.is_nan() {
            self.filter_envelope.set_decay(decay);
        }
    }

    /// The free-running filter envelope.
    pub fn filter_envelope(&self) -> &FilterEnvelope {
        &self.filter_envelope
    }

    /// Select the LFO waveform.
    pub fn set_lfo_waveform(&mut self, waveform: LfoWaveform) {
        self.lfo.set_waveform(waveform);
    }

    /// Current LFO waveform.
    pub fn lfo_waveform(&self) -> LfoWaveform {
        self.lfo.waveform()
    }

    /// Route the LFO.
    pub fn set_lfo_destination(&mut self, destination: LfoDestination) {
        self.lfo_destination = destination;
    }

    /// Current LFO routing.
    pub fn lfo_destination(&self) -> LfoDestination {
        self.lfo_destination
    }

    /// Modulated cutoff at the last rendered frame, in Hz.
    ///
    /// Clamped to [20, 20000]. The ladder does not read it.
    pub fn effective_cutoff(&self) -> f32 {
        self.effective_cutoff
    }

    /// Filter history of one voice.
    pub fn filter_state(&self, voice: usize) -> Option<&LadderState> {
        self.filters.get(voice)
    }

    fn update_effective_cutoff(&mut self, env: f32, lfo_value: f32) {
        let mut cutoff = self.core.filter_cutoff() * (1.0 + env * self.filter_envelope_amount);
        if self.lfo_destination == LfoDestination::Filter {
            cutoff *= 1.0 + lfo_value * self.core.lfo_depth();
        }
        self.effective_cutoff = cutoff.clamp(20.0, 20000.0);
    }
}

impl Synthesizer for SubtractiveSynthesizer {
    fn core(&self) -> &SynthCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut SynthCore {
        &mut self.core
    }

    fn synth_type(&self) -> SynthType {
        SynthType::Subtractive
    }

    fn note_on(&mut self, note: u8, velocity: u8, channel: u8) -> bool {
        match self.core.note_on(note, velocity, channel) {
            Some(idx) => {
                self.filters[idx].reset();
                true
            }
            None => false,
        }
    }

    fn process_block(&mut self, output: &mut [f32]) {
        let frames = output.len() / 2;
        if output.len() % 2 == 1 {
            output[output.len() - 1] = 0.0;
        }
        if frames == 0 {
            return;
        }

        self.core.update_envelopes();
        self.lfo.set_frequency(self.core.lfo_rate());

        let sample_rate = self.core.sample_rate();
        let depth = self.core.lfo_depth();
        let resonance = self.core.filter_resonance();
        let (left_gain, right_gain) = pan_gains(self.core.pan());
        let volume = self.core.volume();
        let detune = semitones_to_ratio(self.oscillator_detune);
        let offset = self.oscillator_phase;
        let mix = self.oscillator_mix;
        let waveform = self.oscillator_type;
        let mode = self.filter_type;
        let drive = self.filter_drive;
        let destination = self.lfo_destination;

        for (i, frame) in output.chunks_exact_mut(2).enumerate() {
            let env = self.filter_envelope.advance();
            let lfo_value = self.lfo.next();
            self.update_effective_cutoff(env, lfo_value);

            let amp_mod = match destination {
                LfoDestination::Amplitude => 1.0 + lfo_value * depth,
                _ => 1.0,
            };
            let pitch_mod = match destination {
                LfoDestination::Pitch => libm::powf(2.0, lfo_value * depth),
                _ => 1.0,
            };

            let mut sum = 0.0;
            for (voice, filter) in self
                .core
                .voices_mut()
                .voices_mut()
                .iter_mut()
                .zip(self.filters.iter_mut())
            {
                if !voice.active && voice.amplitude <= 0.0 && voice.block_start_amplitude <= 0.0 {
                    continue;
                }
                let mut phase = voice.phase + offset;
                if phase >= 1.0 {
                    phase -= 1.0;
                }
                let gain = voice.block_gain(i, frames);
                let raw = waveform.sample(phase, &mut self.noise) * mix * gain;
                sum += filter.process(raw, mode, resonance, drive) * amp_mod;
                voice.advance_phase(voice.frequency * detune * pitch_mod / sample_rate);
            }

            let out = sum * volume;
            frame[0] = out * left_gain;
            frame[1] = out * right_gain;
        }
    }

    fn set_type_specific_parameter(&mut self, param: SynthParam, value: f32) -> bool {
        match param {
            SynthParam::OscillatorType => self.set_oscillator_type(Waveform::from_index(value)),
            SynthParam::OscillatorMix => self.set_oscillator_mix(value),
            SynthParam::OscillatorDetune => self.set_oscillator_detune(value),
            SynthParam::OscillatorPhase => self.set_oscillator_phase(value),
            SynthParam::FilterType => self.set_filter_type(FilterType::from_index(value)),
            SynthParam::FilterDrive => self.set_filter_drive(value),
            SynthParam::FilterEnvelopeAmount => self.set_filter_envelope_amount(value),
            SynthParam::FilterEnvelopeAttack => self.set_filter_envelope_attack(value),
            SynthParam::FilterEnvelopeDecay => self.set_filter_envelope_decay(value),
            SynthParam::LfoWaveform => self.set_lfo_waveform(LfoWaveform::from_index(value)),
            SynthParam::LfoDestination => {
                self.set_lfo_destination(LfoDestination::from_index(value));
            }
            _ => return false,
        }
        true
    }

    fn type_specific_parameter(&self, param: SynthParam) -> Option<f32> {
        Some(match param {
            SynthParam::OscillatorType => self.oscillator_type.index() as f32,
            SynthParam::OscillatorMix => self.oscillator_mix,
            SynthParam::OscillatorDetune => self.oscillator_detune,
            SynthParam::OscillatorPhase => self.oscillator_phase,
            SynthParam::FilterType => self.filter_type.index() as f32,
            SynthParam::FilterDrive => self.filter_drive,
            SynthParam::FilterEnvelopeAmount => self.filter_envelope_amount,
            SynthParam::FilterEnvelopeAttack => self.filter_envelope.attack(),
            SynthParam::FilterEnvelopeDecay => self.filter_envelope.decay(),
            SynthParam::LfoWaveform => self.lfo.waveform().index() as f32,
            SynthParam::LfoDestination => self.lfo_destination.index() as f32,
            _ => return None,
        })
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.core.set_sample_rate(sample_rate);
        self.lfo.set_sample_rate(self.core.sample_rate());
    }

    fn reset(&mut self) {
        self.core.reset();
        self.filters = [LadderState::default(); DEFAULT_POLYPHONY];
        self.filter_envelope.reset();
        self.lfo.reset();
        self.effective_cutoff = self.core.filter_cutoff();
    }
}
