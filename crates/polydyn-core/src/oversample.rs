//! Oversampling wrapper for nonlinear per-sample stages.
//!
//! Gain stages that clip or limit create harmonics above Nyquist. Running
//! them at N× the host rate and filtering on the way down keeps those
//! harmonics out of the audible band:
//!
//! ```text
//! Input → Linear Interpolation (upsample) → Effect at N×fs → FIR Lowpass → Decimation → Output
//! ```
//!
//! Supported factors are 2, 4 and 8.

use crate::Effect;

/// Maximum supported oversampling factor.
pub const MAX_OVERSAMPLE_FACTOR: usize = 8;

/// FIR filter order for anti-aliasing (taps = ORDER + 1).
const FILTER_ORDER: usize = 15;

const FILTER_TAPS: usize = FILTER_ORDER + 1;

/// Runs an [`Effect`] at `FACTOR` times the base sample rate.
///
/// Upsampling interpolates linearly between the previous and current input.
/// Downsampling pushes every intermediate sample through a 16-tap
/// windowed-sinc FIR and keeps the last one.
///
/// The 4× and 8× kernels have only positive taps summing to about one, so a
/// wrapped stage whose output is bounded by `c` yields output bounded by
/// roughly `c` as well. Callers that need a hard guarantee still clamp after
/// decimation.
///
/// # Example
///
/// ```rust
/// use polydyn_core::{Effect, Oversampled};
///
/// struct Clip;
/// impl Effect for Clip {
///     fn process(&mut self, x: f32) -> f32 { x.clamp(-0.5, 0.5) }
///     fn set_sample_rate(&mut self, _: f32) {}
///     fn reset(&mut self) {}
/// }
///
/// let mut os = Oversampled::<4, _>::new(Clip, 48000.0);
/// let y = os.process(1.0);
/// assert!(y <= 0.51);
/// ```
#[derive(Debug, Clone)]
pub struct Oversampled<const FACTOR: usize, E: Effect> {
    effect: E,
    sample_rate: f32,
    prev_sample: f32,
    downsample_state: [f32; FILTER_TAPS],
    work_buffer: [f32; MAX_OVERSAMPLE_FACTOR],
}

impl<const FACTOR: usize, E: Effect> Oversampled<FACTOR, E> {
    /// Wrap `effect`, which will be told it runs at `sample_rate * FACTOR`.
    ///
    /// # Panics
    /// Panics if `FACTOR` is not 2, 4, or 8.
    pub fn new(mut effect: E, sample_rate: f32) -> Self {
        assert!(
            FACTOR == 2 || FACTOR == 4 || FACTOR == 8,
            "Oversample factor must be 2, 4, or 8"
        );

        effect.set_sample_rate(sample_rate * FACTOR as f32);

        Self {
            effect,
            sample_rate,
            prev_sample: 0.0,
            downsample_state: [0.0; FILTER_TAPS],
            work_buffer: [0.0; MAX_OVERSAMPLE_FACTOR],
        }
    }

    /// Get a reference to the inner effect.
    pub fn inner(&self) -> &E {
        &self.effect
    }

    /// Get a mutable reference to the inner effect.
    pub fn inner_mut(&mut self) -> &mut E {
        &mut self.effect
    }

    /// Base (host) sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Get the oversampling factor.
    pub fn factor(&self) -> usize {
        FACTOR
    }

    #[inline]
    fn coefficients(&self) -> &'static [f32; FILTER_TAPS] {
        match FACTOR {
            2 => &COEFFS_2X,
            4 => &COEFFS_4X,
            _ => &COEFFS_8X,
        }
    }

    #[inline]
    fn upsample(&mut self, input: f32) {
        let step = 1.0 / FACTOR as f32;
        for i in 0..FACTOR {
            let t = (i as f32 + 1.0) * step;
            self.work_buffer[i] = self.prev_sample + t * (input - self.prev_sample);
        }
        self.prev_sample = input;
    }

    /// Filter all intermediate samples, evaluate the sum only at the decimation point.
    #[inline]
    fn downsample(&mut self) -> f32 {
        let coeffs = self.coefficients();
        let mut output = 0.0;

        for i in 0..FACTOR {
            self.downsample_state.copy_within(0..FILTER_TAPS - 1, 1);
            self.downsample_state[0] = self.work_buffer[i];

            if i == FACTOR - 1 {
                for (state, &coeff) in self.downsample_state.iter().zip(coeffs.iter()) {
                    output += state * coeff;
                }
            }
        }

        output
    }
}

impl<const FACTOR: usize, E: Effect> Effect for Oversampled<FACTOR, E> {
    fn process(&mut self, input: f32) -> f32 {
        self.upsample(input);

        for i in 0..FACTOR {
            self.work_buffer[i] = self.effect.process(self.work_buffer[i]);
        }

        self.downsample()
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.effect.set_sample_rate(sample_rate * FACTOR as f32);
    }

    fn reset(&mut self) {
        self.prev_sample = 0.0;
        self.downsample_state = [0.0; FILTER_TAPS];
        self.work_buffer = [0.0; MAX_OVERSAMPLE_FACTOR];
        self.effect.reset();
    }

    fn latency_samples(&self) -> usize {
        // Group delay of the symmetric FIR, in base-rate samples.
        FILTER_ORDER / 2 / FACTOR + self.effect.latency_samples()
    }
}

// Windowed-sinc (Kaiser, beta ~5.6) lowpass kernels, one per factor.

/// 2×: half-band lowpass, cutoff at 0.4 × oversampled Nyquist.
#[allow(clippy::excessive_precision)]
#[rustfmt::skip]
static COEFFS_2X: [f32; FILTER_TAPS] = [
    -0.00152541,  0.00000000,  0.01309369,  0.00000000,
    -0.05738920,  0.00000000,  0.29581875,  0.50000434,
     0.29581875,  0.00000000, -0.05738920,  0.00000000,
     0.01309369,  0.00000000, -0.00152541,  0.00000000,
];

/// 4×: lowpass at 0.2 × oversampled Nyquist. All taps positive, sum ≈ 1.
#[allow(clippy::excessive_precision)]
#[rustfmt::skip]
static COEFFS_4X: [f32; FILTER_TAPS] = [
    0.0018645282, 0.0068257641, 0.0172712655, 0.0342604001,
    0.0571166576, 0.0830896230, 0.1078345458, 0.1260221675,
    0.1332946246, 0.1260221675, 0.1078345458, 0.0830896230,
    0.0571166576, 0.0342604001, 0.0172712655, 0.0068257641,
];

/// 8×: lowpass at 0.1 × oversampled Nyquist. All taps positive, sum ≈ 1.
#[allow(clippy::excessive_precision)]
#[rustfmt::skip]
static COEFFS_8X: [f32; FILTER_TAPS] = [
    0.0048323092, 0.0131400047, 0.0264623493, 0.0438249658,
    0.0634416395, 0.0828886958, 0.0994801510, 0.1107812341,
    0.1151296104, 0.1107812341, 0.0994801510, 0.0828886958,
    0.0634416395, 0.0438249658, 0.0264623493, 0.0131400047,
];
