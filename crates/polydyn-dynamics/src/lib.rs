//! Polydyn Dynamics - Block-based dynamics processing for the polydyn audio stack
//!
//! # Topologies
//!
//! [`DynamicsProcessor`] runs one of ten [`CompressorType`] topologies:
//!
//! - Standard, Parallel, Modern - feed-forward compression from [`CompressorParameters`]
//! - Sidechain - gain keyed from a stored external buffer, with a ducking curve
//! - Multiband - [`Crossover`] split, per-band settings from [`MultibandConfig`]
//! - Vintage - compression plus saturation, tube and transformer color
//! - Mastering - mid/side compression, stereo width and harmonic enhancement
//! - Limiter - brickwall ceiling, optionally 4× oversampled, with triangular dither
//! - Gate - downward gate with hold, range and optional sidechain keying
//! - Expander - downward or gentler upward expansion below threshold, never above unity
//!
//! The static curves live in [`gain`] and can be used on their own.
//!
//! # Real-time Behaviour
//!
//! [`DynamicsProcessor::prepare`] allocates; [`DynamicsProcessor::process_block`]
//! does not. Parameter setters clamp their inputs, so processing never
//! produces non-finite output from finite input.
//!
//! # Example
//!
//! ```rust
//! use polydyn_core::AudioBuffer;
//! use polydyn_dynamics::{CompressorParameters, CompressorType, DynamicsProcessor};
//!
//! let mut comp = DynamicsProcessor::new();
//! comp.prepare_to_play(48000.0, 128);
//! comp.set_compressor_type(CompressorType::Standard);
//! comp.set_compressor_parameters(CompressorParameters {
//!     threshold: -12.0,
//!     ratio: 8.0,
//!     ..CompressorParameters::default()
//! });
//!
//! let mut block = AudioBuffer::from_channels(vec![vec![0.9; 128], vec![0.9; 128]]);
//! comp.process_block(&mut block);
//! assert!(block.peak() < 0.9);
//! ```
//!
//! # no_std Support
//!
//! ```toml
//! [dependencies]
//! polydyn-dynamics = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod crossover;
pub mod gain;
pub mod params;
pub mod processor;

pub use crossover::Crossover;
pub use params::{
    CompressorParameters, CompressorType, ExpanderParameters, GateParameters, LimiterParameters,
    MasteringParameters, MultibandConfig, VintageParameters,
};
pub use processor::{
    DEFAULT_BLOCK_SIZE, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE, DynamicsProcessor,
    LIMITER_OVERSAMPLE,
};

pub use polydyn_core::{AudioBuffer, ParseEnumError};
