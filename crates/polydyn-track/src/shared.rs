//! State shared between a track's control handle and its audio side.
//!
//! Every value the audio thread reads is an atomic. The control thread
//! writes, the audio thread reads once per block. The only lock guards
//! metadata ([`TrackInfo`]) that the audio thread never touches.

use parking_lot::RwLock;
use polydyn_synth::{SynthParam, SynthType};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU32, AtomicUsize, Ordering};

/// A thread-safe atomic parameter using bit-cast f32.
///
/// Control thread writes, audio thread reads. No locks, no allocations.
#[derive(Debug)]
pub struct AtomicParam {
    value: AtomicU32,
    min: f32,
    max: f32,
    default: f32,
}

impl AtomicParam {
    /// Create a new atomic parameter with range and default.
    pub fn new(default: f32, min: f32, max: f32) -> Self {
        Self {
            value: AtomicU32::new(default.to_bits()),
            min,
            max,
            default,
        }
    }

    /// Set the parameter value, clamped into range. NaN is ignored.
    #[inline]
    pub fn set(&self, v: f32) {
        if v.is_nan() {
            return;
        }
        let clamped = v.clamp(self.min, self.max);
        self.value.store(clamped.to_bits(), Ordering::Release);
    }

    /// Get the parameter value.
    #[inline]
    pub fn get(&self) -> f32 {
        f32::from_bits(self.value.load(Ordering::Acquire))
    }

    /// Get the default value.
    pub fn default(&self) -> f32 {
        self.default
    }

    /// Reset to default value.
    pub fn reset(&self) {
        self.set(self.default);
    }
}

/// Per-block snapshot of the track's mixer state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackState {
    /// Track gain, 0–1
    pub volume: f32,
    /// -1 (left) to 1 (right)
    pub pan: f32,
    /// Muted tracks leave the output untouched
    pub muted: bool,
    /// Stored for the mixer; the track itself ignores it
    pub solo: bool,
    /// Inactive tracks leave the output untouched
    pub active: bool,
}

/// Control-side metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackInfo {
    /// Display name
    pub name: String,
    /// Engine most recently requested through the controller
    pub synth_type: Option<SynthType>,
}

/// Parameters a fresh track re-applies to every engine it is given.
pub const REMEMBERED_BY_DEFAULT: [SynthParam; 9] = [
    SynthParam::OscillatorType,
    SynthParam::FilterCutoff,
    SynthParam::FilterResonance,
    SynthParam::EnvelopeAttack,
    SynthParam::EnvelopeDecay,
    SynthParam::EnvelopeSustain,
    SynthParam::EnvelopeRelease,
    SynthParam::LfoRate,
    SynthParam::LfoDepth,
];

/// Atomics shared by [`AudioTrack`](crate::AudioTrack) and [`TrackController`](crate::TrackController).
#[derive(Debug)]
pub struct TrackShared {
    volume: AtomicParam,
    pan: AtomicParam,
    muted: AtomicBool,
    solo: AtomicBool,
    active: AtomicBool,
    midi_enabled: AtomicBool,
    midi_channel: AtomicU8,
    /// Remembered engine parameters, indexed by [`SynthParam::index`].
    params: [AtomicParam; SynthParam::COUNT],
    /// Which of `params` are re-applied when the engine is replaced.
    remembered: [AtomicBool; SynthParam::COUNT],
    info: RwLock<TrackInfo>,
    /// Replaced engines or inserts freed on the audio thread because the retired queue was full.
    dropped_retirements: AtomicUsize,
}

impl Default for TrackShared {
    fn default() -> Self {
        Self::new()
    }
}

impl TrackShared {
    /// Unmuted, active, centered at full volume, MIDI disabled on channel 0.
    pub fn new() -> Self {
        Self {
            volume: AtomicParam::new(1.0, 0.0, 1.0),
            pan: AtomicParam::new(0.0, -1.0, 1.0),
            muted: AtomicBool::new(false),
            solo: AtomicBool::new(false),
            active: AtomicBool::new(true),
            midi_enabled: AtomicBool::new(false),
            midi_channel: AtomicU8::new(0),
            params: SynthParam::ALL.map(|p| {
                let (min, max) = p.range();
                AtomicParam::new(p.default_value(), min, max)
            }),
            remembered: SynthParam::ALL.map(|p| AtomicBool::new(REMEMBERED_BY_DEFAULT.contains(&p))),
            info: RwLock::new(TrackInfo {
                name: "Unnamed Track".to_string(),
                synth_type: None,
            }),
            dropped_retirements: AtomicUsize::new(0),
        }
    }

    /// Read the mixer state once.
    #[inline]
    pub fn snapshot(&self) -> TrackState {
        TrackState {
            volume: self.volume.get(),
            pan: self.pan.get(),
            muted: self.muted.load(Ordering::Acquire),
            solo: self.solo.load(Ordering::Acquire),
            active: self.active.load(Ordering::Acquire),
        }
    }

    /// Track volume parameter.
    pub fn volume(&self) -> &AtomicParam {
        &self.volume
    }

    /// Track pan parameter.
    pub fn pan(&self) -> &AtomicParam {
        &self.pan
    }

    /// Mute flag.
    pub fn muted(&self) -> &AtomicBool {
        &self.muted
    }

    /// Solo flag.
    pub fn solo(&self) -> &AtomicBool {
        &self.solo
    }

    /// Active flag.
    pub fn active(&self) -> &AtomicBool {
        &self.active
    }

    /// MIDI enable flag.
    pub fn midi_enabled(&self) -> &AtomicBool {
        &self.midi_enabled
    }

    /// The MIDI channel the track listens on.
    pub fn midi_channel(&self) -> u8 {
        self.midi_channel.load(Ordering::Acquire)
    }

    /// Set the MIDI channel, clamped to 0–15.
    pub fn set_midi_channel(&self, channel: u8) {
        self.midi_channel.store(channel.min(15), Ordering::Release);
    }

    /// Remembered value of an engine parameter.
    pub fn param(&self, param: SynthParam) -> &AtomicParam {
        &self.params[param.index()]
    }

    /// Store `value` for `param` and mark it for re-application.
    pub fn remember(&self, param: SynthParam, value: f32) {
        self.params[param.index()].set(value);
        self.remembered[param.index()].store(true, Ordering::Release);
    }

    /// Whether `param` is re-applied when the engine is replaced.
    pub fn is_remembered(&self, param: SynthParam) -> bool {
        self.remembered[param.index()].load(Ordering::Acquire)
    }

    /// Every remembered engine parameter with its current value.
    pub fn remembered_params(&self) -> impl Iterator<Item = (SynthParam, f32)> + '_ {
        SynthParam::ALL
            .into_iter()
            .filter(|&p| self.is_remembered(p))
            .map(|p| (p, self.params[p.index()].get()))
    }

    /// Count one replaced engine or insert the audio side had to drop itself.
    pub fn record_dropped_retirement(&self) {
        self.dropped_retirements.fetch_add(1, Ordering::Relaxed);
    }

    /// Total retirements dropped on the audio side.
    pub fn dropped_retirements(&self) -> usize {
        self.dropped_retirements.load(Ordering::Relaxed)
    }

    /// Copy of the control-side metadata.
    pub fn info(&self) -> TrackInfo {
        self.info.read().clone()
    }

    /// Update the control-side metadata.
    pub fn update_info(&self, f: impl FnOnce(&mut TrackInfo)) {
        f(&mut self.info.write());
    }
}
