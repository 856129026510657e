//! White noise source.

/// Xorshift32 PRNG producing uniform values in [-1, 1].
///
/// Deterministic for a given seed, which keeps rendering reproducible in
/// tests. The state is never zero, so the sequence never collapses.
#[derive(Debug, Clone)]
pub struct NoiseSource {
    state: u32,
}

impl Default for NoiseSource {
    fn default() -> Self {
        Self::new(0x1234_5678)
    }
}

impl NoiseSource {
    /// Create a noise source. A zero seed is replaced with a fixed non-zero one.
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed == 0 { 0x1234_5678 } else { seed },
        }
    }

    /// Next uniform sample in [-1, 1].
    #[inline]
    pub fn next_bipolar(&mut self) -> f32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;

        ((x as i32 as f32) / (i32::MAX as f32)).clamp(-1.0, 1.0)
    }
}
