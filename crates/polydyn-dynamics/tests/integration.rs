//! Integration tests for polydyn-dynamics crate.
//!
//! Tests cover the gate hold scenario, topology switching, sidechain and
//! multiband behaviour over realistic program material, and the
//! prepare/release lifecycle.

use polydyn_core::{AudioBuffer, db_to_linear, linear_to_db};
use polydyn_dynamics::{
    CompressorParameters, CompressorType, DynamicsProcessor, GateParameters, LimiterParameters,
    MasteringParameters, MultibandConfig,
};

const SR: f32 = 44100.0;

fn sine(freq: f32, amp: f32, frames: usize) -> Vec<f32> {
    (0..frames)
        .map(|i| amp * libm::sinf(2.0 * core::f32::consts::PI * freq * i as f32 / SR))
        .collect()
}

fn stereo(samples: Vec<f32>) -> AudioBuffer {
    AudioBuffer::from_channels(vec![samples.clone(), samples])
}

fn constant(frames: usize, value: f32) -> AudioBuffer {
    stereo(vec![value; frames])
}

fn prepared(kind: CompressorType, block: usize) -> DynamicsProcessor {
    let mut p = DynamicsProcessor::new();
    p.prepare_to_play(SR, block);
    p.set_compressor_type(kind);
    p
}

fn rms(samples: &[f32]) -> f32 {
    let sum: f32 = samples.iter().map(|x| x * x).sum();
    libm::sqrtf(sum / samples.len() as f32)
}

// ---------------------------------------------------------------------------
// 1. Gate hold
// ---------------------------------------------------------------------------

#[test]
fn gate_hold_keeps_dip_open_for_4410_samples() {
    let mut gate = prepared(CompressorType::Gate, 512);
    gate.set_gate_parameters(GateParameters {
        threshold: -50.0,
        ratio: 20.0,
        hold_time: 0.1,
        ..GateParameters::default()
    });
    let quiet = db_to_linear(-60.0);

    let mut open = constant(512, db_to_linear(-10.0));
    gate.process_block(&mut open);

    // One long dip, processed as a single oversize block
    let mut dip = constant(6000, quiet);
    gate.process_block(&mut dip);
    let left = dip.channel(0);
    assert!(
        left[..4410].iter().all(|&x| (x - quiet).abs() < 1e-9),
        "held samples must pass unchanged"
    );
    assert!(left[4500] < quiet * 0.1, "gate should close after the hold");
}

#[test]
fn gate_without_hold_closes_immediately() {
    let mut gate = prepared(CompressorType::Gate, 256);
    gate.set_gate_parameters(GateParameters {
        hold_time: 0.0,
        ..GateParameters::default()
    });
    let mut dip = constant(16, db_to_linear(-60.0));
    gate.process_block(&mut dip);
    assert!(dip.peak() < db_to_linear(-60.0) * 0.1);
}

#[test]
fn gate_range_limits_attenuation() {
    let mut gate = prepared(CompressorType::Gate, 256);
    gate.set_gate_parameters(GateParameters {
        hold_time: 0.0,
        range: 12.0,
        ..GateParameters::default()
    });
    let level = db_to_linear(-70.0);
    let mut dip = constant(16, level);
    gate.process_block(&mut dip);
    let reduction = linear_to_db(dip.peak()) - linear_to_db(level);
    assert!((reduction + 12.0).abs() < 0.1, "range floor at -12 dB, got {reduction}");
}

// ---------------------------------------------------------------------------
// 2. Compression topologies
// ---------------------------------------------------------------------------

#[test]
fn standard_compression_reduces_loud_sine() {
    let mut comp = prepared(CompressorType::Standard, 512);
    let input = sine(440.0, 0.9, 4096);
    let mut block = stereo(input.clone());
    comp.process_block(&mut block);
    assert!(rms(block.channel(0)) < rms(&input) * 0.6);
}

#[test]
fn quiet_signal_passes_every_compressor_unchanged() {
    let quiet = db_to_linear(-40.0);
    for kind in [
        CompressorType::Standard,
        CompressorType::Parallel,
        CompressorType::Modern,
    ] {
        let mut comp = prepared(kind, 256);
        let mut block = constant(256, quiet);
        comp.process_block(&mut block);
        assert!(
            (block.peak() - quiet).abs() < 1e-7,
            "{kind} changed a signal below threshold"
        );
    }
}

#[test]
fn parallel_is_between_dry_and_compressed() {
    let input = sine(220.0, 0.9, 2048);

    let mut full = stereo(input.clone());
    let mut half = stereo(input.clone());

    prepared(CompressorType::Standard, 512).process_block(&mut full);
    let mut parallel = prepared(CompressorType::Parallel, 512);
    parallel.set_compressor_parameters(CompressorParameters {
        mix: 0.5,
        ..CompressorParameters::default()
    });
    parallel.process_block(&mut half);

    let (d, f, h) = (rms(&input), rms(full.channel(0)), rms(half.channel(0)));
    assert!(h < d && h > f, "parallel {h} should sit between {f} and {d}");
}

#[test]
fn sidechain_ducks_music_under_kick() {
    let mut duck = prepared(CompressorType::Sidechain, 512);
    let music = sine(330.0, 0.3, 512);

    duck.set_sidechain(&constant(512, 0.0));
    let mut open = stereo(music.clone());
    duck.process_block(&mut open);

    duck.set_sidechain(&constant(512, 0.9));
    let mut ducked = stereo(music);
    duck.process_block(&mut ducked);

    assert!(rms(ducked.channel(0)) < rms(open.channel(0)) * 0.5);
}

#[test]
fn mastering_mono_input_survives() {
    let mut master = prepared(CompressorType::Mastering, 256);
    master.set_mastering_parameters(MasteringParameters {
        harmonic_enhancement: 0.0,
        ..MasteringParameters::default()
    });
    let mut mono = AudioBuffer::from_channels(vec![vec![0.01; 64]]);
    master.process_block(&mut mono);
    // Below threshold: only the mid balance applies
    assert!((mono.peak() - 0.005).abs() < 1e-6);
}

// ---------------------------------------------------------------------------
// 3. Limiter
// ---------------------------------------------------------------------------

#[test]
fn limiter_holds_ceiling_on_hot_program() {
    for oversampling in [false, true] {
        let mut lim = prepared(CompressorType::Limiter, 512);
        lim.set_limiter_parameters(LimiterParameters {
            ceiling: -0.3,
            oversampling,
            ..LimiterParameters::default()
        });
        let mut block = stereo(sine(3000.0, 4.0, 2048));
        lim.process_block(&mut block);
        assert!(
            block.peak() <= db_to_linear(-0.3) + 1e-6,
            "oversampling {oversampling}: peak {}",
            block.peak()
        );
    }
}

// ---------------------------------------------------------------------------
// 4. Multiband
// ---------------------------------------------------------------------------

#[test]
fn multiband_compresses_only_the_loud_band() {
    let mut mb = prepared(CompressorType::Multiband, 512);
    mb.set_multiband_config(MultibandConfig {
        crossover_frequencies: vec![1000.0],
        band_thresholds: vec![-6.0, -60.0],
        band_ratios: vec![1.0, 20.0],
        ..MultibandConfig::default()
    });

    let low = sine(100.0, 0.4, 8192);
    let mut block = stereo(low.clone());
    mb.process_block(&mut block);

    // Skip the crossover settling time
    let tail = 4096..8192;
    let ratio = rms(&block.channel(0)[tail.clone()]) / rms(&low[tail]);
    assert!(ratio > 0.9, "low band should pass nearly untouched, ratio {ratio}");
}

#[test]
fn multiband_extra_channels_pass_through() {
    let mut mb = DynamicsProcessor::new();
    mb.prepare(SR, 128, 1);
    mb.set_compressor_type(CompressorType::Multiband);
    mb.set_multiband_config(MultibandConfig {
        crossover_frequencies: vec![500.0],
        band_gains: vec![0.0, 0.0],
        ..MultibandConfig::default()
    });
    let mut block = AudioBuffer::from_channels(vec![vec![0.5; 64], vec![0.5; 64]]);
    mb.process_block(&mut block);
    assert_eq!(block.channel(0)[10], 0.0);
    assert_eq!(block.channel(1)[10], 0.5, "unprepared channel is left alone");
}

// ---------------------------------------------------------------------------
// 5. Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn switching_topology_keeps_parameters() {
    let mut p = prepared(CompressorType::Standard, 256);
    p.set_compressor_parameters(CompressorParameters {
        threshold: -30.0,
        ..CompressorParameters::default()
    });
    for kind in CompressorType::ALL {
        p.set_compressor_type(kind);
        assert_eq!(p.compressor_type(), kind);
    }
    assert_eq!(p.compressor_parameters().threshold, -30.0);
}

#[test]
fn empty_block_is_a_no_op() {
    for kind in CompressorType::ALL {
        let mut p = prepared(kind, 64);
        let mut empty = AudioBuffer::new(2, 0);
        p.process_block(&mut empty);
        assert!(empty.is_empty());
    }
}

#[test]
fn prepare_after_release_restores_multiband() {
    let mut p = prepared(CompressorType::Multiband, 64);
    p.set_multiband_config(MultibandConfig {
        crossover_frequencies: vec![200.0, 2000.0],
        ..MultibandConfig::default()
    });
    p.release_resources();
    assert_eq!(p.block_size(), 0);
    p.prepare_to_play(48000.0, 64);
    assert_eq!(p.num_band_buffers(), 3);
    assert_eq!(p.sample_rate(), 48000.0);
}
