//! Mathematical utility functions for DSP.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//! - [`pan_gains`] - Linear pan law
//!
//! Thresholds and ceilings are always stored in dB and converted through
//! [`db_to_linear`] before they are compared with a level, so a linear
//! threshold is strictly positive and every `level / threshold` ratio is
//! defined.

use libm::{expf, logf, tanhf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use polydyn_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-20.0) - 0.1).abs() < 0.001);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Input is floored at `1e-10` so that silence maps to -200 dB rather than
/// negative infinity.
///
/// # Example
/// ```rust
/// use polydyn_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.1) - (-20.0)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Soft clip using hyperbolic tangent. Output lies in (-1, 1).
#[inline]
pub fn soft_clip(x: f32) -> f32 {
    tanhf(x)
}

/// Clamp `value` into `[min, max]`, returning `fallback` when it is NaN.
///
/// Infinite values clamp to the nearest bound. Parameter setters use this so
/// that a NaN from a control surface leaves the previous value in place.
///
/// ```rust
/// use polydyn_core::clamp_or;
///
/// assert_eq!(clamp_or(5.0, 0.0, 1.0, 0.3), 1.0);
/// assert_eq!(clamp_or(f32::NAN, 0.0, 1.0, 0.3), 0.3);
/// ```
#[inline]
pub fn clamp_or(value: f32, min: f32, max: f32, fallback: f32) -> f32 {
    if value.is_nan() { fallback } else { value.clamp(min, max) }
}

/// Linear pan law: `(1 - max(0, pan), 1 + min(0, pan))`.
///
/// Centre leaves both channels at unity; hard left silences the right
/// channel and vice versa.
#[inline]
pub fn pan_gains(pan: f32) -> (f32, f32) {
    (1.0 - pan.max(0.0), 1.0 + pan.min(0.0))
}

/// Flush subnormal floats to zero.
///
/// Values below 1e-20 are replaced with zero, well before the IEEE 754
/// subnormal range. Used in the recursive filter and envelope paths where a
/// signal can decay toward zero indefinitely.
#[allow(clippy::inline_always)]
#[inline(always)]
pub fn flush_denormal(x: f32) -> f32 {
    if x.abs() < 1e-20 { 0.0 } else { x }
}
