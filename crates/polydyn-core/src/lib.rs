//! Polydyn Core - DSP primitives shared by the synthesis and dynamics crates
//!
//! Everything in this crate is allocation-free on the audio path. The only
//! heap-backed type is [`AudioBuffer`], which allocates when it is created or
//! resized and never while samples are being processed.
//!
//! # Core Abstractions
//!
//! - [`Effect`] - Object-safe mono sample processor
//! - [`Oversampled`] - Runs an [`Effect`] at 2×, 4× or 8× the base rate
//!
//! ## Filters and Oscillators
//!
//! - [`Biquad`] - Second-order IIR filter with RBJ cookbook coefficients
//! - [`Lfo`] - Low-frequency oscillator (4 waveforms)
//! - [`NoiseSource`] - Xorshift white noise
//!
//! ## Buffers
//!
//! - [`AudioBuffer`] - Planar multichannel block with interleave helpers
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`soft_clip`], [`flush_denormal`],
//!   [`clamp_or`], [`pan_gains`]
//!
//! # no_std Support
//!
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! polydyn-core = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod biquad;
pub mod buffer;
pub mod effect;
pub mod lfo;
pub mod math;
pub mod noise;
pub mod oversample;
pub mod parse;

pub use biquad::{Biquad, lowpass_coefficients};
pub use buffer::AudioBuffer;
pub use effect::Effect;
pub use lfo::{Lfo, LfoWaveform};
pub use math::{clamp_or, db_to_linear, flush_denormal, linear_to_db, pan_gains, soft_clip};
pub use noise::NoiseSource;
pub use oversample::{MAX_OVERSAMPLE_FACTOR, Oversampled};
pub use parse::ParseEnumError;
