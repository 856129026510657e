//! The [`Effect`] trait: a mono, sample-at-a-time processor.
//!
//! Dynamics stages that need anti-aliasing wrap a small nonlinear kernel in
//! this trait so that [`Oversampled`](crate::Oversampled) can run it at a
//! multiple of the host rate. The trait is object-safe, but callers on the
//! audio path use it through generics.

/// Core trait for per-sample processors.
///
/// # Example
///
/// ```rust
/// use polydyn_core::Effect;
///
/// struct Gain {
///     gain: f32,
/// }
///
/// impl Effect for Gain {
///     fn process(&mut self, input: f32) -> f32 {
///         input * self.gain
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f32) {}
///
///     fn reset(&mut self) {}
/// }
/// ```
pub trait Effect {
    /// Process a single sample, advancing any internal state by one step.
    fn process(&mut self, input: f32) -> f32;

    /// Process a block of samples in place.
    ///
    /// Default implementation calls [`process`](Effect::process) per sample.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Update the sample rate and recompute rate-dependent state.
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Clear internal state without touching parameters.
    fn reset(&mut self);

    /// Processing latency in samples (zero for most processors).
    fn latency_samples(&self) -> usize {
        0
    }
}
