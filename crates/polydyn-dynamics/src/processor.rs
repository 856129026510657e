//! The ten-topology dynamics processor.
//!
//! # Signal Flow
//!
//! ```text
//! Input → Level detect (peak across channels) → Gain curve → × every channel → Coloration/Makeup
//! ```
//!
//! Levels are read per frame as the largest absolute sample across
//! channels, so every channel of a frame receives the same gain. The
//! Sidechain topology and a sidechain-keyed Gate read the stored sidechain
//! buffer instead. Modern smooths the detector across blocks.

#[cfg(not(feature = "std"))]
use alloc::vec;
#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::crossover::Crossover;
use crate::gain;
use crate::params::{
    CompressorParameters, CompressorType, ExpanderParameters, GateParameters, LimiterParameters,
    MasteringParameters, MultibandConfig, VintageParameters,
};
use libm::{sqrtf, tanhf};
use polydyn_core::{AudioBuffer, Effect, NoiseSource, Oversampled, db_to_linear, flush_denormal};

/// Default host sample rate in Hz.
pub const DEFAULT_SAMPLE_RATE: f32 = 44100.0;
/// Default maximum block size in frames.
pub const DEFAULT_BLOCK_SIZE: usize = 512;
/// Default channel count.
pub const DEFAULT_CHANNELS: usize = 2;
/// Limiter oversampling factor.
pub const LIMITER_OVERSAMPLE: usize = 4;

/// Symmetric hard clip at a ceiling, run inside the limiter's oversampler.
#[derive(Debug, Clone, Copy)]
struct CeilingClip {
    ceiling: f32,
}

impl Effect for CeilingClip {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        input * gain::limiter_linear(input.abs(), self.ceiling)
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {}

    fn reset(&mut self) {}
}

type LimiterStage = Oversampled<LIMITER_OVERSAMPLE, CeilingClip>;

/// Block-based dynamics processor with selectable topology.
///
/// Call [`prepare_to_play`](Self::prepare_to_play) (or [`prepare`](Self::prepare))
/// from setup code before streaming: it sizes the multiband buffers and
/// limiter oversamplers. [`process_block`](Self::process_block) itself never
/// allocates. Blocks longer than the prepared size are handled in chunks.
///
/// # Example
///
/// ```rust
/// use polydyn_core::AudioBuffer;
/// use polydyn_dynamics::{CompressorType, DynamicsProcessor, LimiterParameters};
///
/// let mut dyn_proc = DynamicsProcessor::new();
/// dyn_proc.prepare_to_play(48000.0, 256);
/// dyn_proc.set_compressor_type(CompressorType::Limiter);
/// dyn_proc.set_limiter_parameters(LimiterParameters {
///     ceiling: -1.0,
///     ..LimiterParameters::default()
/// });
///
/// let mut buffer = AudioBuffer::from_channels(vec![vec![1.5; 256], vec![-1.5; 256]]);
/// dyn_proc.process_block(&mut buffer);
/// assert!(buffer.peak() <= polydyn_core::db_to_linear(-1.0) + 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct DynamicsProcessor {
    compressor_type: CompressorType,
    compressor: CompressorParameters,
    vintage: VintageParameters,
    mastering: MasteringParameters,
    limiter: LimiterParameters,
    gate: GateParameters,
    expander: ExpanderParameters,
    multiband: MultibandConfig,

    sample_rate: f32,
    block_size: usize,
    channels: usize,

    crossover: Crossover,
    /// One buffer per band, `channels × block_size`.
    band_buffers: Vec<AudioBuffer>,
    band_scratch: Vec<f32>,
    limiter_stages: Vec<LimiterStage>,

    sidechain: AudioBuffer,
    has_sidechain: bool,

    modern_envelope: f32,
    /// Samples left before the gate may close.
    gate_hold: f32,
    dither: NoiseSource,
}

impl Default for DynamicsProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicsProcessor {
    /// Create a Standard compressor prepared for 44.1 kHz stereo, 512-frame blocks.
    pub fn new() -> Self {
        let mut processor = Self {
            compressor_type: CompressorType::Standard,
            compressor: CompressorParameters::default(),
            vintage: VintageParameters::default(),
            mastering: MasteringParameters::default(),
            limiter: LimiterParameters::default(),
            gate: GateParameters::default(),
            expander: ExpanderParameters::default(),
            multiband: MultibandConfig::default(),
            sample_rate: DEFAULT_SAMPLE_RATE,
            block_size: 0,
            channels: DEFAULT_CHANNELS,
            crossover: Crossover::default(),
            band_buffers: Vec::new(),
            band_scratch: Vec::new(),
            limiter_stages: Vec::new(),
            sidechain: AudioBuffer::default(),
            has_sidechain: false,
            modern_envelope: 0.0,
            gate_hold: 0.0,
            dither: NoiseSource::default(),
        };
        processor.prepare(DEFAULT_SAMPLE_RATE, DEFAULT_BLOCK_SIZE, DEFAULT_CHANNELS);
        processor
    }

    /// Prepare for stereo streaming at `sample_rate` with blocks of up to `block_size` frames.
    pub fn prepare_to_play(&mut self, sample_rate: f32, block_size: usize) {
        self.prepare(sample_rate, block_size, DEFAULT_CHANNELS);
    }

    /// Prepare for `channels` channels. Allocates.
    ///
    /// Multiband and oversampled limiting only touch the first `channels`
    /// channels of a block; any further channels pass through the
    /// multiband path unchanged and are limited without oversampling.
    pub fn prepare(&mut self, sample_rate: f32, block_size: usize, channels: usize) {
        if sample_rate.is_finite() && sample_rate > 0.0 {
            self.sample_rate = sample_rate;
        }
        self.block_size = block_size.max(1);
        self.channels = channels.max(1);
        self.rebuild_multiband();
        self.limiter_stages = (0..self.channels)
            .map(|_| {
                LimiterStage::new(
                    CeilingClip {
                        ceiling: db_to_linear(self.limiter.ceiling),
                    },
                    self.sample_rate,
                )
            })
            .collect();
        self.reset();
    }

    /// Drop every buffer allocated by [`prepare`](Self::prepare).
    ///
    /// Until the next `prepare`, the Multiband topology passes audio through
    /// and the limiter runs without oversampling.
    pub fn release_resources(&mut self) {
        self.band_buffers = Vec::new();
        self.band_scratch = Vec::new();
        self.crossover = Crossover::default();
        self.limiter_stages = Vec::new();
        self.sidechain = AudioBuffer::default();
        self.has_sidechain = false;
        self.block_size = 0;
    }

    /// Clear detector, hold, filter and oversampler state. Parameters are kept.
    pub fn reset(&mut self) {
        self.crossover.reset();
        for band in &mut self.band_buffers {
            band.clear();
        }
        for stage in &mut self.limiter_stages {
            stage.reset();
        }
        self.modern_envelope = 0.0;
        self.gate_hold = 0.0;
    }

    fn rebuild_multiband(&mut self) {
        if self.block_size == 0 {
            return;
        }
        self.crossover = Crossover::new(
            &self.multiband.crossover_frequencies,
            self.channels,
            self.sample_rate,
        );
        let bands = self.crossover.num_bands();
        self.band_buffers = (0..bands)
            .map(|_| AudioBuffer::new(self.channels, self.block_size))
            .collect();
        self.band_scratch = vec![0.0; bands];
    }

    /// Select the topology. Detector and hold state are cleared on a change.
    pub fn set_compressor_type(&mut self, compressor_type: CompressorType) {
        if compressor_type != self.compressor_type {
            self.compressor_type = compressor_type;
            self.modern_envelope = 0.0;
            self.gate_hold = 0.0;
        }
    }

    /// Current topology.
    pub fn compressor_type(&self) -> CompressorType {
        self.compressor_type
    }

    /// Replace the crossover layout and per-band settings. Allocates.
    pub fn set_multiband_config(&mut self, config: MultibandConfig) {
        self.multiband = config.sanitized();
        self.rebuild_multiband();
    }

    /// Current multiband layout.
    pub fn multiband_config(&self) -> &MultibandConfig {
        &self.multiband
    }

    /// Number of multiband band buffers currently allocated.
    pub fn num_band_buffers(&self) -> usize {
        self.band_buffers.len()
    }

    /// Set the shared compressor settings.
    pub fn set_compressor_parameters(&mut self, params: CompressorParameters) {
        self.compressor = params.sanitized();
    }

    /// Shared compressor settings.
    pub fn compressor_parameters(&self) -> &CompressorParameters {
        &self.compressor
    }

    /// Set the Vintage settings.
    pub fn set_vintage_parameters(&mut self, params: VintageParameters) {
        self.vintage = params.sanitized();
    }

    /// Vintage settings.
    pub fn vintage_parameters(&self) -> &VintageParameters {
        &self.vintage
    }

    /// Set the Mastering settings.
    pub fn set_mastering_parameters(&mut self, params: MasteringParameters) {
        self.mastering = params.sanitized();
    }

    /// Mastering settings.
    pub fn mastering_parameters(&self) -> &MasteringParameters {
        &self.mastering
    }

    /// Set the Limiter settings.
    pub fn set_limiter_parameters(&mut self, params: LimiterParameters) {
        self.limiter = params.sanitized();
    }

    /// Limiter settings.
    pub fn limiter_parameters(&self) -> &LimiterParameters {
        &self.limiter
    }

    /// Set the Gate settings.
    pub fn set_gate_parameters(&mut self, params: GateParameters) {
        self.gate = params.sanitized();
    }

    /// Gate settings.
    pub fn gate_parameters(&self) -> &GateParameters {
        &self.gate
    }

    /// Set the Expander settings.
    pub fn set_expander_parameters(&mut self, params: ExpanderParameters) {
        self.expander = params.sanitized();
    }

    /// Expander settings.
    pub fn expander_parameters(&self) -> &ExpanderParameters {
        &self.expander
    }

    /// Store the key signal for the Sidechain topology and the sidechain-keyed gate.
    ///
    /// Frame `i` of the sidechain keys frame `i` of the next processed block.
    /// Allocates only when the shape differs from the previous sidechain.
    pub fn set_sidechain(&mut self, sidechain: &AudioBuffer) {
        if self.sidechain.num_channels() == sidechain.num_channels()
            && self.sidechain.num_frames() == sidechain.num_frames()
        {
            self.sidechain.copy_from(sidechain);
        } else {
            self.sidechain = sidechain.clone();
        }
        self.has_sidechain = true;
    }

    /// Forget the stored sidechain; the key level reads as silence.
    pub fn clear_sidechain(&mut self) {
        self.has_sidechain = false;
    }

    /// Whether a sidechain buffer is stored.
    pub fn has_sidechain(&self) -> bool {
        self.has_sidechain
    }

    /// Host sample rate.
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate
    }

    /// Prepared block size in frames (0 after [`release_resources`](Self::release_resources)).
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Delay in samples introduced by the active topology.
    pub fn latency_samples(&self) -> usize {
        match (self.compressor_type, self.limiter_stages.first()) {
            (CompressorType::Limiter, Some(stage)) if self.limiter.oversampling => {
                stage.latency_samples()
            }
            _ => 0,
        }
    }

    /// Process `buffer` in place with the active topology.
    pub fn process_block(&mut self, buffer: &mut AudioBuffer) {
        if self.compressor.bypass || buffer.is_empty() || buffer.num_channels() == 0 {
            return;
        }
        match self.compressor_type {
            CompressorType::Standard => self.process_standard(buffer),
            CompressorType::Multiband => self.process_multiband(buffer),
            CompressorType::Sidechain => self.process_sidechain(buffer),
            CompressorType::Parallel => self.process_parallel(buffer),
            CompressorType::Vintage => self.process_vintage(buffer),
            CompressorType::Modern => self.process_modern(buffer),
            CompressorType::Mastering => self.process_mastering(buffer),
            CompressorType::Limiter => self.process_limiter(buffer),
            CompressorType::Gate => self.process_gate(buffer),
            CompressorType::Expander => self.process_expander(buffer),
        }
    }

    fn standard_makeup(&self) -> f32 {
        if self.compressor.auto_gain {
            db_to_linear(self.compressor.makeup_gain)
        } else {
            1.0
        }
    }

    fn sidechain_level(&self, frame: usize) -> f32 {
        if self.has_sidechain {
            self.sidechain.frame_peak(frame)
        } else {
            0.0
        }
    }

    fn process_standard(&mut self, buffer: &mut AudioBuffer) {
        let makeup = self.standard_makeup();
        for i in 0..buffer.num_frames() {
            let g = gain::standard(buffer.frame_peak(i), &self.compressor);
            scale_frame(buffer, i, g * makeup);
        }
    }

    fn process_sidechain(&mut self, buffer: &mut AudioBuffer) {
        for i in 0..buffer.num_frames() {
            let g = gain::standard(self.sidechain_level(i), &self.compressor);
            scale_frame(buffer, i, gain::ducking(g, self.compressor.mix));
        }
    }

    fn process_parallel(&mut self, buffer: &mut AudioBuffer) {
        let makeup = self.standard_makeup();
        let mix = self.compressor.mix;
        for i in 0..buffer.num_frames() {
            let g = gain::standard(buffer.frame_peak(i), &self.compressor) * makeup;
            // dry * (1 - mix) + dry * g * mix
            scale_frame(buffer, i, (1.0 - mix) + g * mix);
        }
    }

    fn process_modern(&mut self, buffer: &mut AudioBuffer) {
        for i in 0..buffer.num_frames() {
            let peak = buffer.frame_peak(i);
            let env = sqrtf(self.modern_envelope * self.modern_envelope * 0.95 + peak * peak * 0.05);
            self.modern_envelope = flush_denormal(env);
            let g = gain::standard(self.modern_envelope, &self.compressor);
            scale_frame(buffer, i, gain::modern(g, self.compressor.mix));
        }
    }

    fn process_vintage(&mut self, buffer: &mut AudioBuffer) {
        let p = self.vintage;
        let input_gain = db_to_linear(p.input_gain);
        let output_gain = db_to_linear(p.output_gain);
        let drive = 1.0 + p.saturation;
        for i in 0..buffer.num_frames() {
            scale_frame(buffer, i, input_gain);
            let g = gain::vintage(buffer.frame_peak(i), &p);
            for ch in buffer.channels_mut() {
                let mut x = ch[i] * g;
                x = tanhf(x * drive) / drive;
                x *= 1.0 + p.tube_warmth * x.abs();
                x += p.transformer_color * x * x;
                ch[i] = x * output_gain;
            }
        }
    }

    fn process_mastering(&mut self, buffer: &mut AudioBuffer) {
        let p = self.mastering;
        let mid_gain = p.mid_side_balance;
        let side_gain = 1.0 - p.mid_side_balance;
        let makeup = db_to_linear(p.makeup_gain);
        let finish = |x: f32| (x + p.harmonic_enhancement * x * x) * makeup;

        if buffer.num_channels() < 2 {
            // Mono: the signal is all mid.
            for ch in buffer.channels_mut() {
                for x in ch.iter_mut() {
                    let mid = *x * gain::mastering(x.abs(), &p) * mid_gain;
                    *x = finish(mid);
                }
            }
            return;
        }
        let Some((left, right)) = buffer.stereo_mut() else {
            return;
        };

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let mut mid = (*l + *r) * 0.5;
            let mut side = (*l - *r) * 0.5;
            mid *= gain::mastering(mid.abs(), &p) * mid_gain;
            side *= gain::mastering(side.abs(), &p) * side_gain;

            // Recombine, then the width pass re-derives M/S from L/R.
            let (nl, nr) = (mid + side, mid - side);
            let m = (nl + nr) * 0.5;
            let s = (nl - nr) * 0.5 * p.stereo_width;
            *l = finish(m + s);
            *r = finish(m - s);
        }
    }

    fn process_limiter(&mut self, buffer: &mut AudioBuffer) {
        let p = self.limiter;
        let ceiling = db_to_linear(p.ceiling);
        for (c, ch) in buffer.channels_mut().enumerate() {
            let mut stage = if p.oversampling {
                self.limiter_stages.get_mut(c)
            } else {
                None
            };
            if let Some(stage) = stage.as_deref_mut() {
                stage.inner_mut().ceiling = ceiling;
            }
            for x in ch.iter_mut() {
                let mut y = match stage.as_deref_mut() {
                    Some(stage) => stage.process(*x),
                    None => *x * gain::limiter(x.abs(), &p),
                };
                if p.dither_amount > 0.0 {
                    // Triangular PDF from two uniform draws
                    let tpdf = (self.dither.next_bipolar() + self.dither.next_bipolar()) * 0.5;
                    y += tpdf * p.dither_amount;
                }
                *x = if y.is_nan() { 0.0 } else { y.clamp(-ceiling, ceiling) };
            }
        }
    }

    fn process_gate(&mut self, buffer: &mut AudioBuffer) {
        let p = self.gate;
        let hold_samples = p.hold_time * self.sample_rate;
        for i in 0..buffer.num_frames() {
            let (level, threshold) = if p.sidechain {
                (self.sidechain_level(i), p.sidechain_threshold)
            } else {
                (buffer.frame_peak(i), p.threshold)
            };
            let mut g = gain::gate(level, threshold, &p);
            if g >= 1.0 {
                self.gate_hold = hold_samples;
            } else if self.gate_hold > 0.0 {
                self.gate_hold -= 1.0;
                g = 1.0;
            } else {
                g = gain::apply_range(g, p.range);
            }
            scale_frame(buffer, i, g);
        }
    }

    fn process_expander(&mut self, buffer: &mut AudioBuffer) {
        for i in 0..buffer.num_frames() {
            let g = gain::expander(buffer.frame_peak(i), &self.expander);
            scale_frame(buffer, i, g);
        }
    }

    fn process_multiband(&mut self, buffer: &mut AudioBuffer) {
        let bands = self.band_buffers.len();
        if bands == 0 || bands != self.crossover.num_bands() || self.block_size == 0 {
            return;
        }
        let channels = buffer.num_channels().min(self.channels);
        let frames = buffer.num_frames();

        let mut start = 0;
        while start < frames {
            let len = self.block_size.min(frames - start);

            // Split
            for c in 0..channels {
                for i in 0..len {
                    let x = buffer.channel(c)[start + i];
                    self.crossover.split(c, x, &mut self.band_scratch);
                    for (band, &value) in self.band_buffers.iter_mut().zip(&self.band_scratch) {
                        band.channel_mut(c)[i] = value;
                    }
                }
            }

            // Compress each band
            for (b, band) in self.band_buffers.iter_mut().enumerate() {
                let params = self.multiband.band_parameters(b, &self.compressor);
                let band_gain = self.multiband.band_gain(b);
                for i in 0..len {
                    let level = (0..channels)
                        .map(|c| band.channel(c)[i].abs())
                        .fold(0.0, f32::max);
                    let g = gain::standard(level, &params) * band_gain;
                    for c in 0..channels {
                        band.channel_mut(c)[i] *= g;
                    }
                }
            }

            // Sum
            for c in 0..channels {
                for i in 0..len {
                    let sum: f32 = self
                        .band_buffers
                        .iter()
                        .map(|band| band.channel(c)[i])
                        .sum();
                    buffer.channel_mut(c)[start + i] = sum;
                }
            }

            start += len;
        }
    }
}

#[inline]
fn scale_frame(buffer: &mut AudioBuffer, frame: usize, g: f32) {
    for ch in buffer.channels_mut() {
        if let Some(x) = ch.get_mut(frame) {
            *x *= g;
        }
    }
}
