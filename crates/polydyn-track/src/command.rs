//! Messages between the control thread and the audio thread.

use polydyn_dynamics::DynamicsProcessor;
use polydyn_synth::{SynthParam, Synthesizer};

/// A request from [`TrackController`](crate::TrackController) to the audio side.
///
/// MIDI events have already been filtered by channel; the audio side applies
/// every command it receives.
pub enum TrackCommand {
    /// Start a note
    NoteOn {
        /// MIDI note number
        note: u8,
        /// Non-zero velocity
        velocity: u8,
        /// MIDI channel
        channel: u8,
    },
    /// Release a note
    NoteOff {
        /// MIDI note number
        note: u8,
        /// Release velocity
        velocity: u8,
        /// MIDI channel
        channel: u8,
    },
    /// Continuous controller
    ControlChange {
        /// Controller number
        controller: u8,
        /// Controller value, 0–127
        value: u8,
        /// MIDI channel
        channel: u8,
    },
    /// Pitch bend in [-1, 1]
    PitchBend {
        /// MIDI channel
        channel: u8,
        /// Normalized bend
        value: f32,
    },
    /// Apply one engine parameter
    SetParameter {
        /// Which parameter
        param: SynthParam,
        /// New value, clamped by the engine
        value: f32,
    },
    /// Replace the engine. The previous one comes back as [`Retired::Synthesizer`].
    SetSynthesizer(Box<dyn Synthesizer + Send>),
    /// Replace or remove the dynamics insert
    SetDynamics(Option<Box<DynamicsProcessor>>),
}

impl core::fmt::Debug for TrackCommand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoteOn { note, velocity, channel } => f
                .debug_struct("NoteOn")
                .field("note", note)
                .field("velocity", velocity)
                .field("channel", channel)
                .finish(),
            Self::NoteOff { note, velocity, channel } => f
                .debug_struct("NoteOff")
                .field("note", note)
                .field("velocity", velocity)
                .field("channel", channel)
                .finish(),
            Self::ControlChange { controller, value, channel } => f
                .debug_struct("ControlChange")
                .field("controller", controller)
                .field("value", value)
                .field("channel", channel)
                .finish(),
            Self::PitchBend { channel, value } => f
                .debug_struct("PitchBend")
                .field("channel", channel)
                .field("value", value)
                .finish(),
            Self::SetParameter { param, value } => f
                .debug_struct("SetParameter")
                .field("param", param)
                .field("value", value)
                .finish(),
            Self::SetSynthesizer(synth) => f.debug_tuple("SetSynthesizer").field(&synth.synth_type()).finish(),
            Self::SetDynamics(dynamics) => f
                .debug_tuple("SetDynamics")
                .field(&dynamics.as_ref().map(|d| d.compressor_type()))
                .finish(),
        }
    }
}

/// Something the audio side no longer owns, handed back for deallocation.
pub enum Retired {
    /// A replaced engine
    Synthesizer(Box<dyn Synthesizer + Send>),
    /// A replaced or removed dynamics insert
    Dynamics(Box<DynamicsProcessor>),
}

impl core::fmt::Debug for Retired {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Synthesizer(synth) => f.debug_tuple("Synthesizer").field(&synth.synth_type()).finish(),
            Self::Dynamics(dynamics) => f.debug_tuple("Dynamics").field(&dynamics.compressor_type()).finish(),
        }
    }
}
