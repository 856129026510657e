//! Polydyn Track - one synthesizer voice chain with a lock-free control handle
//!
//! An [`AudioTrack`] lives on the audio thread and renders interleaved stereo:
//! engine → track volume → linear pan → optional [`DynamicsProcessor`] insert.
//! Its [`TrackController`] lives anywhere else.
//!
//! # Threading
//!
//! - MIDI, parameter writes and engine swaps travel over a bounded
//!   `crossbeam-channel` queue and are applied at the start of the next block.
//! - Volume, pan and the mute/solo/active flags are atomics in [`TrackShared`],
//!   read once per block.
//! - Replaced engines and inserts travel back over a second queue and are
//!   freed by [`TrackController::collect_garbage`], never on the audio thread.
//!
//! No lock is taken inside [`AudioTrack::process_block`].
//!
//! # Example
//!
//! ```rust
//! use polydyn_track::AudioTrack;
//!
//! let (mut track, controller) = AudioTrack::new(44100.0, 256);
//! controller.set_midi_enabled(true);
//! controller.set_synthesizer_parameter("filter_cutoff", 1800.0).unwrap();
//! controller.note_on(60, 100, 0).unwrap();
//! controller.set_pan(-0.3);
//!
//! let mut block = vec![0.0; 512];
//! track.process_block(&mut block);
//! assert_eq!(track.synthesizer().active_voice_count(), 1);
//! ```

pub mod command;
mod controller;
mod error;
pub mod shared;
mod track;

pub use command::{Retired, TrackCommand};
pub use controller::TrackController;
pub use error::TrackError;
pub use shared::{AtomicParam, REMEMBERED_BY_DEFAULT, TrackInfo, TrackShared, TrackState};
pub use track::{AudioTrack, COMMAND_QUEUE_CAPACITY, RETIRED_QUEUE_CAPACITY, pitch_bend_from_midi};
pub use polydyn_core::pan_gains;

pub use polydyn_dynamics::DynamicsProcessor;
pub use polydyn_synth::{SynthParam, SynthType, Synthesizer};
