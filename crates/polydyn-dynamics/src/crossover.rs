//! Subtractive band splitter for multiband processing.
//!
//! Each crossover `k` is a Butterworth lowpass at `f_k`. For one input
//! sample `x`:
//!
//! ```text
//! band_0 = lp_0(x)
//! band_k = lp_k(x) - (band_0 + ... + band_{k-1})
//! band_N = x       - (band_0 + ... + band_{N-1})
//! ```
//!
//! The bands always sum back to `x`, whatever the filters do.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use polydyn_core::Biquad;

/// Per-channel crossover filter bank.
#[derive(Debug, Clone, Default)]
pub struct Crossover {
    frequencies: Vec<f32>,
    /// `channels * frequencies.len()` filters, channel-major.
    filters: Vec<Biquad>,
    channels: usize,
    sample_rate: f32,
}

impl Crossover {
    /// Build filters for `channels` channels at `sample_rate`.
    ///
    /// Frequencies at or above Nyquist are pulled just below it.
    pub fn new(frequencies: &[f32], channels: usize, sample_rate: f32) -> Self {
        let nyquist = sample_rate * 0.5;
        let frequencies: Vec<f32> = frequencies
            .iter()
            .map(|f| f.clamp(1.0, nyquist * 0.99))
            .collect();
        let mut filters = Vec::with_capacity(channels * frequencies.len());
        for _ in 0..channels {
            filters.extend(frequencies.iter().map(|&f| Biquad::lowpass(f, sample_rate)));
        }
        Self {
            frequencies,
            filters,
            channels,
            sample_rate,
        }
    }

    /// Number of output bands.
    pub fn num_bands(&self) -> usize {
        self.frequencies.len() + 1
    }

    /// Number of channels the bank was built for.
    pub fn num_channels(&self) -> usize {
        self.channels
    }

    /// Crossover points in Hz, after Nyquist limiting.
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Sample rate the filters were designed for.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Split one sample of `channel` into `bands`.
    ///
    /// `bands` must hold at least [`num_bands`](Self::num_bands) entries.
    /// Channels the bank was not built for put the whole sample in the top band.
    #[inline]
    pub fn split(&mut self, channel: usize, input: f32, bands: &mut [f32]) {
        let n = self.frequencies.len();
        let top = n.min(bands.len().saturating_sub(1));
        let mut lower = 0.0;
        if channel < self.channels {
            let filters = &mut self.filters[channel * n..(channel + 1) * n];
            for (k, filter) in filters.iter_mut().enumerate().take(top) {
                let band = filter.process(input) - lower;
                bands[k] = band;
                lower += band;
            }
        } else {
            bands[..top].fill(0.0);
        }
        if let Some(last) = bands.get_mut(top) {
            *last = input - lower;
        }
    }

    /// Clear filter history.
    pub fn reset(&mut self) {
        for f in &mut self.filters {
            f.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bands_sum_to_input() {
        let mut xo = Crossover::new(&[200.0, 2000.0, 8000.0], 2, 48000.0);
        let mut bands = [0.0; 4];
        for i in 0..2000 {
            let x = libm::sinf(i as f32 * 0.37) * 0.8 + if i % 50 == 0 { 0.5 } else { 0.0 };
            xo.split(i % 2, x, &mut bands);
            let sum: f32 = bands.iter().sum();
            assert!((sum - x).abs() < 1e-5, "frame {i}: {sum} vs {x}");
        }
    }

    #[test]
    fn test_low_band_carries_dc() {
        let mut xo = Crossover::new(&[500.0], 1, 48000.0);
        let mut bands = [0.0; 2];
        for _ in 0..5000 {
            xo.split(0, 1.0, &mut bands);
        }
        assert!((bands[0] - 1.0).abs() < 1e-3, "DC should settle in the low band");
        assert!(bands[1].abs() < 1e-3);
    }

    #[test]
    fn test_no_crossovers_is_passthrough() {
        let mut xo = Crossover::new(&[], 2, 44100.0);
        let mut bands = [0.0; 1];
        xo.split(1, 0.3, &mut bands);
        assert_eq!(bands[0], 0.3);
        assert_eq!(xo.num_bands(), 1);
    }

    #[test]
    fn test_nyquist_limit() {
        let xo = Crossover::new(&[30000.0], 1, 44100.0);
        assert!(xo.frequencies()[0] < 22050.0);
    }
}
