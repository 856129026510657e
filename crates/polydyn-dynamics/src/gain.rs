//! Static gain curves.
//!
//! Each function maps an instantaneous linear level (`>= 0`) to a linear
//! gain multiplier in [0, 1]. No curve ever amplifies.
//!
//! Thresholds arrive in dB and go through [`db_to_linear`] before any
//! comparison, so a threshold is always strictly positive.

use crate::params::{
    CompressorParameters, ExpanderParameters, GateParameters, LimiterParameters,
    MasteringParameters, VintageParameters,
};
use libm::powf;
use polydyn_core::{db_to_linear, linear_to_db};

#[inline]
fn unit(g: f32) -> f32 {
    if g.is_nan() { 1.0 } else { g.clamp(0.0, 1.0) }
}

/// Hard-knee downward compression: `(level / threshold)^(1/ratio - 1)` above threshold.
#[inline]
pub fn hard_knee(level: f32, threshold_db: f32, ratio: f32) -> f32 {
    let threshold = db_to_linear(threshold_db);
    if level.is_nan() || level <= threshold {
        return 1.0;
    }
    unit(powf(level / threshold, 1.0 / ratio.max(1.0) - 1.0))
}

/// Standard compressor curve.
///
/// With `soft_knee` set and a non-zero `knee_width`, the effective ratio
/// ramps linearly from 1 to `ratio` across the dB window
/// `[threshold - knee/2, threshold + knee/2]`. The ramp only changes the
/// curve above threshold, so the result is continuous at both knee edges.
#[inline]
pub fn standard(level: f32, params: &CompressorParameters) -> f32 {
    let ratio = params.ratio.max(1.0);
    let knee = params.knee_width;
    if !params.soft_knee || knee.is_nan() || knee <= 0.0 {
        return hard_knee(level, params.threshold, ratio);
    }

    let threshold = db_to_linear(params.threshold);
    if level.is_nan() || level <= threshold {
        return 1.0;
    }
    let level_db = linear_to_db(level);
    let knee_end = params.threshold + knee * 0.5;
    if level_db >= knee_end {
        return hard_knee(level, params.threshold, ratio);
    }
    let k = (level_db - (params.threshold - knee * 0.5)) / knee;
    let soft_ratio = 1.0 + (ratio - 1.0) * k;
    unit(powf(level / threshold, 1.0 / soft_ratio - 1.0))
}

/// Vintage curve: hard-knee reduction scaled by `1 + harmonic_content * |g|`.
#[inline]
pub fn vintage(level: f32, params: &VintageParameters) -> f32 {
    let g = hard_knee(level, params.threshold, params.ratio);
    if g >= 1.0 {
        return 1.0;
    }
    unit(g * (1.0 + params.harmonic_content * g.abs()))
}

/// Mastering curve: the square root of the hard-knee reduction.
#[inline]
pub fn mastering(level: f32, params: &MasteringParameters) -> f32 {
    unit(libm::sqrtf(hard_knee(level, params.threshold, params.ratio)))
}

/// Limiter curve: `ceiling / level` above the ceiling.
#[inline]
pub fn limiter(level: f32, params: &LimiterParameters) -> f32 {
    limiter_linear(level, db_to_linear(params.ceiling.min(0.0)))
}

/// [`limiter`] with the ceiling already converted to linear.
#[inline]
pub fn limiter_linear(level: f32, ceiling: f32) -> f32 {
    if level.is_nan() || level <= ceiling {
        return 1.0;
    }
    unit(ceiling / level)
}

/// Gate curve: `(level / threshold)^(ratio - 1)` below `threshold_db`.
///
/// Takes the threshold separately so the sidechain threshold can be used.
#[inline]
pub fn gate(level: f32, threshold_db: f32, params: &GateParameters) -> f32 {
    let threshold = db_to_linear(threshold_db);
    if level >= threshold {
        return 1.0;
    }
    if level.is_nan() || level <= 0.0 {
        return 0.0;
    }
    unit(powf(level / threshold, params.ratio.max(1.0) - 1.0))
}

/// Expander curve, unity at or above threshold.
///
/// Below threshold the downward curve is `(level / threshold)^(ratio - 1)`.
/// Upward mode uses the gentler `(level / threshold)^(1 - 1/ratio)`, so
/// quiet material keeps more of its level. Both are limited by [`apply_range`].
#[inline]
pub fn expander(level: f32, params: &ExpanderParameters) -> f32 {
    let threshold = db_to_linear(params.threshold);
    if level >= threshold {
        return 1.0;
    }
    let ratio = params.ratio.max(1.0);
    let exponent = if params.upward { 1.0 - 1.0 / ratio } else { ratio - 1.0 };
    let g = if level > 0.0 { powf(level / threshold, exponent) } else { 0.0 };
    apply_range(unit(g), params.range)
}

/// Rescale a downward gain around 1 so that full attenuation stops at `range_db`.
///
/// `g' = 1 + (g - 1) * (1 - 10^(-range/20))`, so `g = 0` maps to the floor
/// `10^(-range/20)` and `g = 1` stays 1.
#[inline]
pub fn apply_range(g: f32, range_db: f32) -> f32 {
    let depth = 1.0 - db_to_linear(-range_db.max(0.0));
    unit(1.0 + (g - 1.0) * depth)
}

/// Sidechain ducking: `1 - (1 - g^1.5) * mix`.
#[inline]
pub fn ducking(g: f32, mix: f32) -> f32 {
    unit(1.0 - (1.0 - powf(g, 1.5)) * mix)
}

/// Modern shaping: `1 - (1 - g^0.7) * mix`.
#[inline]
pub fn modern(g: f32, mix: f32) -> f32 {
    unit(1.0 - (1.0 - powf(g, 0.7)) * mix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_knee_ratio() {
        // 20 dB over a -20 dB threshold at 4:1 → 15 dB reduction
        let g = hard_knee(1.0, -20.0, 4.0);
        assert!((linear_to_db(g) + 15.0).abs() < 0.01, "got {} dB", linear_to_db(g));
    }

    #[test]
    fn test_below_threshold_unity() {
        let params = CompressorParameters::default();
        assert_eq!(standard(0.01, &params), 1.0);
        assert_eq!(standard(0.0, &params), 1.0);
        assert_eq!(vintage(0.01, &VintageParameters::default()), 1.0);
        assert_eq!(mastering(0.01, &MasteringParameters::default()), 1.0);
    }

    #[test]
    fn test_soft_knee_is_gentler_inside_window() {
        let soft = CompressorParameters::default();
        let hard = CompressorParameters { soft_knee: false, ..soft };
        let level = db_to_linear(-18.0);
        assert!(standard(level, &soft) > standard(level, &hard));
        // Past the knee both agree
        let loud = db_to_linear(-6.0);
        assert!((standard(loud, &soft) - standard(loud, &hard)).abs() < 1e-6);
    }

    #[test]
    fn test_mastering_softer_than_hard() {
        let params = MasteringParameters::default();
        let g = mastering(1.0, &params);
        assert!((g - libm::sqrtf(hard_knee(1.0, -20.0, 2.0))).abs() < 1e-6);
    }

    #[test]
    fn test_limiter_curve() {
        let params = LimiterParameters { ceiling: -6.0, ..LimiterParameters::default() };
        let c = db_to_linear(-6.0);
        assert!((2.0 * limiter(2.0, &params) - c).abs() < 1e-6);
        assert_eq!(limiter(0.1, &params), 1.0);
    }

    #[test]
    fn test_gate_attenuates_below() {
        let params = GateParameters::default();
        assert_eq!(gate(0.5, params.threshold, &params), 1.0);
        let g = gate(db_to_linear(-60.0), params.threshold, &params);
        assert!(g < 1e-6, "10 dB under at 20:1 should nearly close, got {g}");
        assert_eq!(gate(0.0, params.threshold, &params), 0.0);
    }

    #[test]
    fn test_expander_range_floor() {
        let params = ExpanderParameters::default();
        let g = expander(0.0, &params);
        assert!((g - db_to_linear(-40.0)).abs() < 1e-6);
        assert_eq!(expander(0.5, &params), 1.0);
    }

    #[test]
    fn test_upward_expander_never_boosts() {
        let params = ExpanderParameters { upward: true, ..ExpanderParameters::default() };
        let down = ExpanderParameters::default();
        let quiet = db_to_linear(-60.0);
        let g = expander(quiet, &params);
        assert!(g < 1.0 && g > expander(quiet, &down), "gentler than downward, got {g}");
        assert_eq!(expander(0.1, &params), 1.0, "unity above threshold");
        assert!((expander(0.0, &params) - db_to_linear(-40.0)).abs() < 1e-6);
    }

    #[test]
    fn test_ducking_and_modern_mix_zero_is_unity() {
        assert_eq!(ducking(0.2, 0.0), 1.0);
        assert_eq!(modern(0.2, 0.0), 1.0);
        assert!((ducking(0.25, 1.0) - 0.125).abs() < 1e-6);
    }
}
