//! Polydyn Synth - Polyphonic synthesis engine for the polydyn audio stack
//!
//! # Core Components
//!
//! ## Voices
//!
//! - [`Voice`] - Per-note performance state
//! - [`VoicePool`] - Fixed-size pool; the first free voice is claimed, no stealing
//!
//! ## Envelopes
//!
//! - [`Envelope`] - ADSR rates, stepped once per block per voice
//! - [`EnvelopeStage`] - Stage tracking
//! - [`FilterEnvelope`] - Free-running rise/fall envelope for cutoff modulation
//!
//! ## Sound Generation
//!
//! - [`Waveform`] - Sine, Square, Saw, Triangle, Noise
//! - [`LadderState`] / [`FilterType`] - Four-stage saturating filter
//!
//! ## Engines
//!
//! - [`Synthesizer`] - Engine trait; notes, controllers and setters are default methods
//! - [`SynthCore`] - State every engine shares
//! - [`SubtractiveSynthesizer`] - Oscillator → ladder → LFO
//! - [`SynthType`] - Engine selection by name
//! - [`SynthParam`] - Logical parameter names
//!
//! # Real-time Behaviour
//!
//! Nothing in this crate allocates, locks or logs once an engine is built.
//! Out-of-range inputs are clamped, and notes past the voice limit are dropped.
//!
//! # Example
//!
//! ```rust
//! use polydyn_synth::{SubtractiveSynthesizer, Synthesizer, Waveform};
//!
//! let mut synth = SubtractiveSynthesizer::new(48000.0);
//! synth.set_oscillator_type(Waveform::Saw);
//! synth.set_controller(7, 100, 0); // volume
//!
//! // Play a chord
//! synth.note_on(60, 100, 0);
//! synth.note_on(64, 100, 0);
//! synth.note_on(67, 100, 0);
//!
//! let mut buffer = vec![0.0; 1024]; // 512 stereo frames
//! synth.process_block(&mut buffer);
//! assert_eq!(synth.active_voice_count(), 3);
//! ```
//!
//! # no_std Support
//!
//! ```toml
//! [dependencies]
//! polydyn-synth = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod envelope;
pub mod filter;
pub mod oscillator;
pub mod param;
pub mod subtractive;
pub mod synth;
pub mod voice;

pub use envelope::{Envelope, EnvelopeStage, SILENCE_THRESHOLD};
pub use filter::{FilterEnvelope, FilterType, LadderState};
pub use oscillator::Waveform;
pub use param::SynthParam;
pub use subtractive::{LfoDestination, SubtractiveSynthesizer};
pub use synth::{DEFAULT_SAMPLE_RATE, SynthCore, SynthType, Synthesizer};
pub use voice::{
    DEFAULT_POLYPHONY, MIDI_CHANNELS, Voice, VoicePool, midi_to_freq, semitones_to_ratio,
};

// Re-export commonly used types from polydyn-core
pub use polydyn_core::{Lfo, LfoWaveform, ParseEnumError};
