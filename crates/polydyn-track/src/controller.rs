//! Control-thread handle for an [`AudioTrack`](crate::AudioTrack).

use crate::command::{Retired, TrackCommand};
use crate::error::TrackError;
use crate::shared::TrackShared;
use crate::track::pitch_bend_from_midi;
use crossbeam_channel::{Receiver, Sender};
use polydyn_dynamics::DynamicsProcessor;
use polydyn_synth::{SynthParam, SynthType, Synthesizer};
use std::sync::Arc;
use std::sync::atomic::Ordering;

/// Cloneable, `Send` handle that drives a track from outside the audio thread.
///
/// MIDI, parameter changes and engine swaps are queued and applied at the
/// start of the next block. Volume, pan and the track flags are atomics and
/// take effect on the next block without queueing. Every clone sees the same
/// state.
#[derive(Debug, Clone)]
pub struct TrackController {
    shared: Arc<TrackShared>,
    commands: Sender<TrackCommand>,
    retired: Receiver<Retired>,
    sample_rate: f32,
    block_size: usize,
}

impl TrackController {
    pub(crate) fn new(
        shared: Arc<TrackShared>,
        commands: Sender<TrackCommand>,
        retired: Receiver<Retired>,
        sample_rate: f32,
        block_size: usize,
    ) -> Self {
        Self {
            shared,
            commands,
            retired,
            sample_rate,
            block_size,
        }
    }

    fn send(&self, cmd: TrackCommand) -> Result<(), TrackError> {
        self.commands.try_send(cmd).map_err(|err| {
            let err = TrackError::from(err);
            log_dropped(&err);
            err
        })
    }

    /// Whether a MIDI event on `channel` reaches the engine.
    ///
    /// MIDI must be enabled and `channel` must match the track's channel.
    pub fn accepts(&self, channel: u8) -> bool {
        self.midi_enabled() && channel == self.midi_channel()
    }

    // ------------------------------------------------------------------
    // MIDI
    // ------------------------------------------------------------------

    /// Queue a note-on. Velocity 0 is sent as a note-off.
    ///
    /// Events the track does not accept are discarded with `Ok`.
    pub fn note_on(&self, note: u8, velocity: u8, channel: u8) -> Result<(), TrackError> {
        if !self.accepts(channel) {
            return Ok(());
        }
        if velocity == 0 {
            return self.send(TrackCommand::NoteOff { note, velocity, channel });
        }
        self.send(TrackCommand::NoteOn { note, velocity, channel })
    }

    /// Queue a note-off.
    pub fn note_off(&self, note: u8, velocity: u8, channel: u8) -> Result<(), TrackError> {
        if !self.accepts(channel) {
            return Ok(());
        }
        self.send(TrackCommand::NoteOff { note, velocity, channel })
    }

    /// Queue a continuous controller change.
    pub fn control_change(&self, controller: u8, value: u8, channel: u8) -> Result<(), TrackError> {
        if !self.accepts(channel) {
            return Ok(());
        }
        self.send(TrackCommand::ControlChange { controller, value, channel })
    }

    /// Queue a 14-bit MIDI pitch bend (8192 is centre).
    pub fn pitch_bend(&self, value: u16, channel: u8) -> Result<(), TrackError> {
        if !self.accepts(channel) {
            return Ok(());
        }
        self.send(TrackCommand::PitchBend {
            channel,
            value: pitch_bend_from_midi(value),
        })
    }

    // ------------------------------------------------------------------
    // Engine parameters
    // ------------------------------------------------------------------

    /// Set an engine parameter by name, e.g. `"filter_cutoff"`.
    ///
    /// The value is remembered and re-applied when the engine is replaced.
    pub fn set_synthesizer_parameter(&self, name: &str, value: f32) -> Result<(), TrackError> {
        let param = name.parse::<SynthParam>().map_err(|_| {
            #[cfg(feature = "tracing")]
            tracing::warn!(parameter = name, "unknown synthesizer parameter");
            TrackError::UnknownParameter(name.to_string())
        })?;
        self.set_parameter(param, value)
    }

    /// Set an engine parameter. The remembered copy is clamped to the parameter's range.
    pub fn set_parameter(&self, param: SynthParam, value: f32) -> Result<(), TrackError> {
        self.shared.remember(param, value);
        self.send(TrackCommand::SetParameter { param, value })
    }

    /// Remembered value of a parameter, by name.
    pub fn synthesizer_parameter(&self, name: &str) -> Result<f32, TrackError> {
        name.parse::<SynthParam>()
            .map(|param| self.parameter(param))
            .map_err(|_| TrackError::UnknownParameter(name.to_string()))
    }

    /// Remembered value of a parameter.
    pub fn parameter(&self, param: SynthParam) -> f32 {
        self.shared.param(param).get()
    }

    // ------------------------------------------------------------------
    // Engines
    // ------------------------------------------------------------------

    /// Replace the engine with a fresh one of the named type.
    pub fn set_synthesizer_type(&self, name: &str) -> Result<(), TrackError> {
        let synth_type = name
            .parse::<SynthType>()
            .map_err(|_| TrackError::UnknownSynthType(name.to_string()))?;
        self.set_synthesizer(synth_type.build(self.sample_rate))
    }

    /// Replace the engine.
    ///
    /// Every remembered parameter is applied to `synth` before it is queued.
    /// The old engine comes back through [`collect_garbage`](Self::collect_garbage).
    pub fn set_synthesizer(&self, mut synth: Box<dyn Synthesizer + Send>) -> Result<(), TrackError> {
        for (param, value) in self.shared.remembered_params() {
            synth.set_parameter(param, value);
        }
        let synth_type = synth.synth_type();
        self.send(TrackCommand::SetSynthesizer(synth))?;
        self.shared.update_info(|info| info.synth_type = Some(synth_type));
        #[cfg(feature = "tracing")]
        tracing::debug!(%synth_type, track = %self.name(), "synthesizer replaced");
        Ok(())
    }

    /// Engine most recently handed to the track.
    pub fn synthesizer_type(&self) -> Option<SynthType> {
        self.shared.info().synth_type
    }

    /// Install or remove the dynamics insert.
    ///
    /// The processor is prepared for the track's sample rate, block size and
    /// two channels before it is queued.
    pub fn set_dynamics(&self, dynamics: Option<DynamicsProcessor>) -> Result<(), TrackError> {
        let dynamics = dynamics.map(|mut processor| {
            processor.prepare(self.sample_rate, self.block_size, 2);
            Box::new(processor)
        });
        self.send(TrackCommand::SetDynamics(dynamics))
    }

    /// Drop everything the audio side has handed back. Returns how many items were freed.
    pub fn collect_garbage(&self) -> usize {
        let freed = self.retired.try_iter().count();
        #[cfg(feature = "tracing")]
        {
            let dropped = self.shared.dropped_retirements();
            if dropped > 0 {
                tracing::warn!(dropped, track = %self.name(), "retired items freed on the audio thread");
            }
        }
        freed
    }

    /// How many replaced engines or inserts the audio side freed itself
    /// because [`collect_garbage`](Self::collect_garbage) was not called often enough.
    pub fn dropped_retirements(&self) -> usize {
        self.shared.dropped_retirements()
    }

    // ------------------------------------------------------------------
    // Track state
    // ------------------------------------------------------------------

    /// Set track volume, clamped to [0, 1].
    pub fn set_volume(&self, volume: f32) {
        self.shared.volume().set(volume);
    }

    /// Track volume.
    pub fn volume(&self) -> f32 {
        self.shared.volume().get()
    }

    /// Set track pan, clamped to [-1, 1].
    pub fn set_pan(&self, pan: f32) {
        self.shared.pan().set(pan);
    }

    /// Track pan.
    pub fn pan(&self) -> f32 {
        self.shared.pan().get()
    }

    /// Mute or unmute.
    pub fn set_muted(&self, muted: bool) {
        self.shared.muted().store(muted, Ordering::Release);
    }

    /// Whether the track is muted.
    pub fn is_muted(&self) -> bool {
        self.shared.muted().load(Ordering::Acquire)
    }

    /// Solo or unsolo. The track itself does not act on this flag.
    pub fn set_solo(&self, solo: bool) {
        self.shared.solo().store(solo, Ordering::Release);
    }

    /// Whether the track is soloed.
    pub fn is_solo(&self) -> bool {
        self.shared.solo().load(Ordering::Acquire)
    }

    /// Activate or deactivate.
    pub fn set_active(&self, active: bool) {
        self.shared.active().store(active, Ordering::Release);
    }

    /// Whether the track renders.
    pub fn is_active(&self) -> bool {
        self.shared.active().load(Ordering::Acquire)
    }

    /// Enable or disable MIDI input.
    pub fn set_midi_enabled(&self, enabled: bool) {
        self.shared.midi_enabled().store(enabled, Ordering::Release);
    }

    /// Whether MIDI input is enabled.
    pub fn midi_enabled(&self) -> bool {
        self.shared.midi_enabled().load(Ordering::Acquire)
    }

    /// Listen on `channel`, clamped to 0–15.
    pub fn set_midi_channel(&self, channel: u8) {
        self.shared.set_midi_channel(channel);
    }

    /// The channel the track listens on.
    pub fn midi_channel(&self) -> u8 {
        self.shared.midi_channel()
    }

    /// Rename the track.
    pub fn set_name(&self, name: impl Into<String>) {
        let name = name.into();
        self.shared.update_info(|info| info.name = name);
    }

    /// Track name.
    pub fn name(&self) -> String {
        self.shared.info().name
    }

    /// Sample rate engines are built for.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }
}

#[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
fn log_dropped(err: &TrackError) {
    #[cfg(feature = "tracing")]
    tracing::warn!(error = %err, "track command dropped");
}

#[cfg(test)]
mod tests {
    use crate::AudioTrack;
    use crate::TrackError;
    use polydyn_synth::SynthParam;

    #[test]
    fn test_defaults() {
        let (_track, ctl) = AudioTrack::new(44100.0, 128);
        assert_eq!(ctl.name(), "Unnamed Track");
        assert_eq!(ctl.volume(), 1.0);
        assert_eq!(ctl.pan(), 0.0);
        assert!(ctl.is_active());
        assert!(!ctl.is_muted());
        assert!(!ctl.is_solo());
        assert!(!ctl.midi_enabled(), "MIDI starts disabled");
        assert_eq!(ctl.midi_channel(), 0);
        assert_eq!(ctl.synthesizer_type(), Some(polydyn_synth::SynthType::Subtractive));
    }

    #[test]
    fn test_midi_filtering() {
        let (_track, ctl) = AudioTrack::new(44100.0, 128);
        assert!(!ctl.accepts(0), "disabled MIDI accepts nothing");
        ctl.set_midi_enabled(true);
        ctl.set_midi_channel(3);
        assert!(ctl.accepts(3));
        assert!(!ctl.accepts(0));
    }

    #[test]
    fn test_setters_clamp() {
        let (_track, ctl) = AudioTrack::new(44100.0, 128);
        ctl.set_volume(3.0);
        ctl.set_pan(-7.0);
        assert_eq!(ctl.volume(), 1.0);
        assert_eq!(ctl.pan(), -1.0);
    }

    #[test]
    fn test_parameter_by_name() {
        let (_track, ctl) = AudioTrack::new(44100.0, 128);
        ctl.set_synthesizer_parameter("filter_cutoff", 2500.0).unwrap();
        assert_eq!(ctl.synthesizer_parameter("filter_cutoff").unwrap(), 2500.0);
        assert_eq!(ctl.parameter(SynthParam::FilterCutoff), 2500.0);

        let err = ctl.set_synthesizer_parameter("wobble", 1.0).unwrap_err();
        assert_eq!(err, TrackError::UnknownParameter("wobble".to_string()));
        assert!(ctl.synthesizer_parameter("wobble").is_err());
    }

    #[test]
    fn test_unknown_synth_type() {
        let (_track, ctl) = AudioTrack::new(44100.0, 128);
        assert_eq!(
            ctl.set_synthesizer_type("fm").unwrap_err(),
            TrackError::UnknownSynthType("fm".to_string())
        );
    }

    #[test]
    fn test_clones_share_state() {
        let (_track, ctl) = AudioTrack::new(44100.0, 128);
        let other = ctl.clone();
        other.set_name("Lead");
        other.set_muted(true);
        other.set_parameter(SynthParam::LfoRate, 9.0).unwrap();
        assert_eq!(ctl.name(), "Lead");
        assert!(ctl.is_muted());
        assert_eq!(ctl.parameter(SynthParam::LfoRate), 9.0);
    }

    #[test]
    fn test_disconnected_after_track_dropped() {
        let (track, ctl) = AudioTrack::new(44100.0, 128);
        ctl.set_midi_enabled(true);
        drop(track);
        assert_eq!(ctl.note_on(60, 100, 0).unwrap_err(), TrackError::Disconnected);
    }
}
