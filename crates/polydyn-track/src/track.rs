//! The audio-thread side of a track.

use crate::command::{Retired, TrackCommand};
use crate::controller::TrackController;
use crate::shared::TrackShared;
use crossbeam_channel::{Receiver, Sender};
use polydyn_core::{AudioBuffer, pan_gains};
use polydyn_dynamics::DynamicsProcessor;
use polydyn_synth::{MIDI_CHANNELS, SynthType, Synthesizer};
use std::sync::Arc;

/// Capacity of the control → audio command queue.
pub const COMMAND_QUEUE_CAPACITY: usize = 1024;

/// Capacity of the audio → control queue for replaced engines.
pub const RETIRED_QUEUE_CAPACITY: usize = 16;

/// Convert a 14-bit MIDI pitch-bend value to [-1, 1].
///
/// 8192 is centre. Values above 16383 are clamped.
#[inline]
pub fn pitch_bend_from_midi(value: u16) -> f32 {
    (f32::from(value.min(16383)) - 8192.0) / 8192.0
}

/// One synthesizer voice chain: engine → volume/pan → optional dynamics insert.
///
/// Owned by the audio thread. Everything the control thread changes arrives
/// through the [`TrackController`] returned by [`AudioTrack::new`], either as
/// a queued command or as an atomic read once per block.
pub struct AudioTrack {
    sample_rate: f32,
    block_size: usize,
    synth: Box<dyn Synthesizer + Send>,
    dynamics: Option<Box<DynamicsProcessor>>,
    scratch: AudioBuffer,
    shared: Arc<TrackShared>,
    commands: Receiver<TrackCommand>,
    retired: Sender<Retired>,
    /// Held notes per channel, one bit per note number
    held_notes: [u128; MIDI_CHANNELS],
    controllers: [[u8; 128]; MIDI_CHANNELS],
    pitch_bend: [f32; MIDI_CHANNELS],
}

impl core::fmt::Debug for AudioTrack {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AudioTrack")
            .field("sample_rate", &self.sample_rate)
            .field("block_size", &self.block_size)
            .field("synth", &self.synth.synth_type())
            .field("dynamics", &self.dynamics.as_ref().map(|d| d.compressor_type()))
            .finish_non_exhaustive()
    }
}

impl AudioTrack {
    /// Create a track with a subtractive engine, and its control handle.
    ///
    /// `block_size` is the largest chunk, in frames, that the dynamics insert
    /// processes at once. Longer output slices are split.
    pub fn new(sample_rate: f32, block_size: usize) -> (Self, TrackController) {
        let block_size = block_size.max(1);
        let shared = Arc::new(TrackShared::new());
        let (command_tx, command_rx) = crossbeam_channel::bounded(COMMAND_QUEUE_CAPACITY);
        let (retired_tx, retired_rx) = crossbeam_channel::bounded(RETIRED_QUEUE_CAPACITY);

        let mut synth = SynthType::Subtractive.build(sample_rate);
        for (param, value) in shared.remembered_params() {
            synth.set_parameter(param, value);
        }
        shared.update_info(|info| info.synth_type = Some(SynthType::Subtractive));

        let track = Self {
            sample_rate,
            block_size,
            synth,
            dynamics: None,
            scratch: AudioBuffer::new(2, block_size),
            shared: Arc::clone(&shared),
            commands: command_rx,
            retired: retired_tx,
            held_notes: [0; MIDI_CHANNELS],
            controllers: [[0; 128]; MIDI_CHANNELS],
            pitch_bend: [0.0; MIDI_CHANNELS],
        };
        let controller = TrackController::new(shared, command_tx, retired_rx, sample_rate, block_size);
        (track, controller)
    }

    /// Render one block of interleaved stereo into `output`.
    ///
    /// Pending commands are applied first. An inactive or muted track leaves
    /// `output` untouched.
    pub fn process_block(&mut self, output: &mut [f32]) {
        while let Ok(cmd) = self.commands.try_recv() {
            self.apply(cmd);
        }

        let state = self.shared.snapshot();
        if !state.active || state.muted {
            return;
        }

        self.synth.process_block(output);

        let (left, right) = pan_gains(state.pan);
        let (left, right) = (left * state.volume, right * state.volume);
        for frame in output.chunks_exact_mut(2) {
            frame[0] *= left;
            frame[1] *= right;
        }

        if let Some(dynamics) = self.dynamics.as_deref_mut() {
            for chunk in output.chunks_mut(self.block_size * 2) {
                let frames = chunk.len() / 2;
                if frames != self.scratch.num_frames() {
                    // Never exceeds block_size, the scratch capacity
                    self.scratch.set_num_frames(frames);
                }
                self.scratch.read_interleaved(chunk);
                dynamics.process_block(&mut self.scratch);
                self.scratch.write_interleaved(chunk);
            }
        }
    }

    fn apply(&mut self, cmd: TrackCommand) {
        match cmd {
            TrackCommand::NoteOn { note, velocity, channel } => {
                let ch = usize::from(channel.min(15));
                // A full pool drops the note, so it is not held either
                if self.synth.note_on(note, velocity, channel) {
                    self.held_notes[ch] |= 1u128 << (note & 0x7F);
                }
            }
            TrackCommand::NoteOff { note, velocity, channel } => {
                let ch = usize::from(channel.min(15));
                self.synth.note_off(note, velocity, channel);
                self.held_notes[ch] &= !(1u128 << (note & 0x7F));
            }
            TrackCommand::ControlChange { controller, value, channel } => {
                let ch = usize::from(channel.min(15));
                self.controllers[ch][usize::from(controller & 0x7F)] = value.min(127);
                self.synth.set_controller(controller, value, channel);
            }
            TrackCommand::PitchBend { channel, value } => {
                let ch = usize::from(channel.min(15));
                self.pitch_bend[ch] = value.clamp(-1.0, 1.0);
                self.synth.set_pitch_bend(value, channel);
            }
            TrackCommand::SetParameter { param, value } => {
                self.synth.set_parameter(param, value);
            }
            TrackCommand::SetSynthesizer(mut synth) => {
                synth.set_sample_rate(self.sample_rate);
                let old = core::mem::replace(&mut self.synth, synth);
                self.held_notes = [0; MIDI_CHANNELS];
                self.retire(Retired::Synthesizer(old));
            }
            TrackCommand::SetDynamics(dynamics) => {
                if let Some(old) = core::mem::replace(&mut self.dynamics, dynamics) {
                    self.retire(Retired::Dynamics(old));
                }
            }
        }
    }

    /// Hand a replaced engine or insert back to the control side.
    ///
    /// A full queue drops it here rather than blocking, and the drop is counted.
    fn retire(&self, item: Retired) {
        if self.retired.try_send(item).is_err() {
            self.shared.record_dropped_retirement();
        }
    }

    /// The current engine.
    pub fn synthesizer(&self) -> &dyn Synthesizer {
        self.synth.as_ref()
    }

    /// The dynamics insert, if any.
    pub fn dynamics(&self) -> Option<&DynamicsProcessor> {
        self.dynamics.as_deref()
    }

    /// Whether `note` is held on `channel`, as seen by the audio side.
    pub fn is_note_held(&self, note: u8, channel: u8) -> bool {
        self.held_notes[usize::from(channel.min(15))] & (1u128 << (note & 0x7F)) != 0
    }

    /// Number of held notes across all channels.
    pub fn held_note_count(&self) -> usize {
        self.held_notes.iter().map(|bits| bits.count_ones() as usize).sum()
    }

    /// Last value received for `controller` on `channel`.
    pub fn controller_value(&self, controller: u8, channel: u8) -> u8 {
        self.controllers[usize::from(channel.min(15))][usize::from(controller & 0x7F)]
    }

    /// Last pitch bend received on `channel`, in [-1, 1].
    pub fn pitch_bend(&self, channel: u8) -> f32 {
        self.pitch_bend[usize::from(channel.min(15))]
    }

    /// Sample rate the track was built for.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Largest chunk, in frames, handed to the dynamics insert.
    pub fn block_size(&self) -> usize {
        self.block_size
    }
}
