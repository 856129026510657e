//! Integration tests for polydyn-synth crate.
//!
//! Tests cover voice allocation, the envelope scenario, MIDI mapping through
//! the trait object, and stereo rendering of the subtractive engine.

use polydyn_synth::{
    Envelope, EnvelopeStage, FilterType, LfoDestination, SubtractiveSynthesizer, SynthParam,
    SynthType, Synthesizer, VoicePool, Waveform, midi_to_freq,
};

const SR: f32 = 48000.0;

fn render_blocks(synth: &mut dyn Synthesizer, blocks: usize, frames: usize) -> Vec<f32> {
    let mut out = Vec::with_capacity(blocks * frames * 2);
    let mut block = vec![0.0; frames * 2];
    for _ in 0..blocks {
        synth.process_block(&mut block);
        out.extend_from_slice(&block);
    }
    out
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

// ---------------------------------------------------------------------------
// 1. Voice allocation
// ---------------------------------------------------------------------------

#[test]
fn seventeenth_note_is_dropped() {
    let mut synth = SubtractiveSynthesizer::new(SR);
    for note in 40..56 {
        assert!(synth.note_on(note, 100, 0), "note {note} should find a voice");
    }
    assert!(!synth.note_on(56, 100, 0), "pool is full, no stealing");
    assert_eq!(synth.active_voice_count(), 16);

    let has_56 = synth.core().voices().voices().iter().any(|v| v.note() == 56);
    assert!(!has_56, "dropped note must not replace a held voice");
}

#[test]
fn released_voice_is_reused() {
    let mut synth = SubtractiveSynthesizer::new(SR);
    for note in 40..56 {
        synth.note_on(note, 100, 0);
    }
    synth.note_off(45, 0, 0);
    assert!(synth.note_on(80, 100, 0));
    assert_eq!(synth.core().voices().voices()[5].note(), 80);
}

#[test]
fn note_off_requires_matching_channel() {
    let mut synth = SubtractiveSynthesizer::new(SR);
    synth.note_on(60, 100, 3);
    assert!(!synth.note_off(60, 0, 4));
    assert!(synth.is_active());
    assert!(synth.note_off(60, 0, 3));
    assert!(!synth.is_active());
}

#[test]
fn voice_frequency_follows_equal_temperament() {
    let mut pool: VoicePool<4> = VoicePool::new();
    let idx = pool.note_on(81, 1.0, 0, 1.0).unwrap();
    assert!((pool.voices()[idx].frequency() - 880.0).abs() < 0.01);
    assert!((midi_to_freq(57) - 220.0).abs() < 0.01);
}

// ---------------------------------------------------------------------------
// 2. Envelope scenario
// ---------------------------------------------------------------------------

#[test]
fn envelope_attack_decay_sustain_release() {
    let mut synth = SubtractiveSynthesizer::new(SR);
    synth.set_envelope(Envelope {
        attack: 0.25,
        decay: 0.1,
        sustain: 0.5,
        release: 0.5,
    });
    synth.note_on(60, 127, 0);

    let mut block = vec![0.0; 64];
    let amplitude = |s: &SubtractiveSynthesizer| s.core().voices().voices()[0].amplitude();

    for _ in 0..4 {
        synth.process_block(&mut block);
    }
    assert!((amplitude(&synth) - 1.0).abs() < 1e-6, "attack reaches velocity");
    assert_eq!(synth.core().voices().voices()[0].stage(), EnvelopeStage::Decay);

    for _ in 0..10 {
        synth.process_block(&mut block);
    }
    assert!((amplitude(&synth) - 0.5).abs() < 1e-6, "decay settles at sustain");

    synth.note_off(60, 0, 0);
    let mut last = amplitude(&synth);
    for _ in 0..20 {
        synth.process_block(&mut block);
        let now = amplitude(&synth);
        assert!(now <= last, "release never rises");
        last = now;
    }
    assert_eq!(last, 0.0, "release snaps to zero");
}

// ---------------------------------------------------------------------------
// 3. Trait object dispatch
// ---------------------------------------------------------------------------

#[test]
fn built_engine_accepts_type_specific_parameters() {
    let mut synth = SynthType::Subtractive.build(SR);
    assert_eq!(synth.synth_type(), SynthType::Subtractive);
    assert!(synth.set_parameter(SynthParam::OscillatorType, 2.0));
    assert_eq!(synth.parameter(SynthParam::OscillatorType), Some(2.0));
    assert!(synth.set_parameter(SynthParam::FilterType, 1.0));
    assert_eq!(synth.parameter(SynthParam::FilterType), Some(1.0));
}

#[test]
fn controllers_through_trait_object() {
    let mut synth = SynthType::Subtractive.build(SR);
    synth.set_controller(7, 0, 0);
    assert_eq!(synth.current_volume(), 0.0);
    synth.set_controller(10, 127, 0);
    assert_eq!(synth.current_pan(), 1.0);

    synth.note_on(60, 127, 0);
    let out = render_blocks(synth.as_mut(), 4, 128);
    assert_eq!(peak(&out), 0.0, "volume 0 silences the output");
}

// ---------------------------------------------------------------------------
// 4. Rendering
// ---------------------------------------------------------------------------

#[test]
fn every_waveform_renders_finite_audio() {
    for waveform in Waveform::ALL {
        for filter in [FilterType::Lowpass, FilterType::Highpass] {
            let mut synth = SubtractiveSynthesizer::new(SR);
            synth.set_oscillator_type(waveform);
            synth.set_filter_type(filter);
            synth.set_filter_resonance(1.0);
            synth.set_filter_drive(10.0);
            synth.note_on(48, 127, 0);
            synth.note_on(55, 127, 0);
            let out = render_blocks(&mut synth, 16, 256);
            assert!(
                out.iter().all(|s| s.is_finite()),
                "{waveform:?}/{filter:?} produced non-finite output"
            );
            assert!(peak(&out) > 0.0, "{waveform:?}/{filter:?} should be audible");
        }
    }
}

#[test]
fn amplitude_lfo_modulates_level() {
    let mut synth = SubtractiveSynthesizer::new(SR);
    synth.set_oscillator_type(Waveform::Square);
    synth.set_lfo_destination(LfoDestination::Amplitude);
    synth.set_lfo_depth(1.0);
    synth.set_lfo_rate(20.0);
    synth.note_on(60, 127, 0);
    let out = render_blocks(&mut synth, 32, 256);
    assert!(out.iter().all(|s| s.is_finite()));
}

#[test]
fn centre_pan_is_symmetric() {
    let mut synth = SubtractiveSynthesizer::new(SR);
    synth.note_on(60, 100, 0);
    let out = render_blocks(&mut synth, 2, 128);
    for frame in out.chunks_exact(2) {
        assert_eq!(frame[0], frame[1]);
    }
}
