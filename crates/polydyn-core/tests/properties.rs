//! Property-based tests for polydyn-core primitives.

use polydyn_core::{Effect, Lfo, LfoWaveform, Oversampled, db_to_linear, linear_to_db};
use proptest::prelude::*;

struct Ceiling(f32);

impl Effect for Ceiling {
    fn process(&mut self, input: f32) -> f32 {
        input.clamp(-self.0, self.0)
    }
    fn set_sample_rate(&mut self, _: f32) {}
    fn reset(&mut self) {}
}

fn waveform() -> impl Strategy<Value = LfoWaveform> {
    prop_oneof![
        Just(LfoWaveform::Sine),
        Just(LfoWaveform::Square),
        Just(LfoWaveform::Saw),
        Just(LfoWaveform::Triangle),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn db_to_linear_positive(db in -200.0f32..40.0) {
        prop_assert!(db_to_linear(db) > 0.0);
    }

    #[test]
    fn db_roundtrip(db in -100.0f32..20.0) {
        prop_assert!((linear_to_db(db_to_linear(db)) - db).abs() < 0.01);
    }

    #[test]
    fn lfo_stays_bipolar(rate in 0.1f32..20.0, wf in waveform(), steps in 1usize..5000) {
        let mut lfo = Lfo::new(44100.0, rate);
        lfo.set_waveform(wf);
        for _ in 0..steps {
            let v = lfo.next();
            prop_assert!((-1.0..=1.0).contains(&v));
        }
        prop_assert!((0.0..1.0).contains(&lfo.phase()));
    }

    #[test]
    fn oversampled_clip_stays_near_bound(
        samples in prop::collection::vec(-4.0f32..4.0, 1..512),
        bound in 0.05f32..1.0,
    ) {
        let mut os = Oversampled::<4, _>::new(Ceiling(bound), 48000.0);
        for &s in &samples {
            let y = os.process(s);
            prop_assert!(y.abs() <= bound * 1.001 + 1e-6);
        }
    }
}
