//! Property-based tests for toneflow-synth.
//!
//! Tests waveform range, phase continuity across buffer splits, phase
//! wraparound (including huge angles), and control mapping clamps using proptest for randomized
//! input generation.

use proptest::prelude::*;
use std::f32::consts::TAU;
use toneflow_synth::{
    ControlMapper, ControlSnapshot, Oscillator, OscillatorState, ParamUpdate, ParameterStore,
    PreviewRenderer, WaveformKind, sample, wrap_phase,
};

fn waveform() -> impl Strategy<Value = WaveformKind> {
    prop::sample::select(WaveformKind::ALL.to_vec())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Every waveform stays inside [-1, 1] for every phase in [0, 2π).
    #[test]
    fn waveform_range(kind in waveform(), phase in 0.0f32..TAU) {
        let value = sample(kind, phase);
        prop_assert!(
            (-1.0..=1.0).contains(&value),
            "{} at phase {} produced {}", kind, phase, value
        );
    }

    /// Rendering in two buffers gives the same samples as one buffer.
    #[test]
    fn split_render_is_continuous(
        kind in waveform(),
        freq in 10.0f32..2000.0f32,
        total in 1usize..2048,
        split in 0usize..2048,
        start_phase in 0.0f32..TAU,
    ) {
        let split = split % (total + 1);
        let osc = Oscillator::new(44100.0);
        let snapshot = ControlSnapshot::new(freq, 1.0, kind);

        let mut whole_state = OscillatorState::with_phase(start_phase);
        let mut whole = vec![0.0f32; total];
        osc.advance(&mut whole_state, &snapshot, &mut whole);

        let mut parts_state = OscillatorState::with_phase(start_phase);
        let mut parts = vec![0.0f32; total];
        let (head, tail) = parts.split_at_mut(split);
        osc.advance(&mut parts_state, &snapshot, head);
        osc.advance(&mut parts_state, &snapshot, tail);

        prop_assert_eq!(whole, parts);
        prop_assert_eq!(whole_state.phase(), parts_state.phase());
    }

    /// Phase stays in [0, 2π) after spanning many cycles.
    #[test]
    fn phase_wraps(
        freq in 10.0f32..2000.0f32,
        frames in 1usize..20_000,
        sample_rate in prop::sample::select(vec![20100.0f32, 44100.0, 48000.0, 96000.0]),
    ) {
        let osc = Oscillator::new(sample_rate);
        let mut state = OscillatorState::new();
        let mut buf = vec![0.0f32; frames];
        osc.advance_with(&mut state, WaveformKind::Sine, freq, &mut buf);
        prop_assert!((0.0..TAU).contains(&state.phase()), "phase {}", state.phase());
    }

    /// Wrapping lands in [0, 2π) for any finite angle, however large.
    #[test]
    fn wrap_phase_stays_in_range(
        angle in prop_oneof![-1.0e3f32..1.0e3, -1.0e12f32..1.0e12, prop::num::f32::NORMAL],
    ) {
        let wrapped = wrap_phase(angle);
        prop_assert!((0.0..TAU).contains(&wrapped), "{} wrapped to {}", angle, wrapped);
    }

    /// Mapped values always land inside the configured ranges.
    #[test]
    fn mapper_clamps(x in -10.0f32..10.0, y in -10.0f32..10.0) {
        let mapper = ControlMapper::default();
        let (freq, amp) = mapper.map(x, y);
        prop_assert!((10.0..=2000.0).contains(&freq), "freq {}", freq);
        prop_assert!((0.0..=1.0).contains(&amp), "amp {}", amp);
    }

    /// Whatever finite values are written, the stored snapshot is in range.
    #[test]
    fn store_clamps_finite_writes(
        freq in -1.0e6f32..1.0e6,
        amp in -1.0e3f32..1.0e3,
        kind in waveform(),
    ) {
        let store = ParameterStore::default();
        let snap = store
            .set(ParamUpdate::new().frequency(freq).amplitude(amp).waveform(kind))
            .unwrap();
        prop_assert_eq!(snap, store.snapshot());
        prop_assert!((10.0..=2000.0).contains(&snap.frequency_hz));
        prop_assert!((0.0..=1.0).contains(&snap.amplitude));
        prop_assert_eq!(snap.waveform, kind);
    }

    /// The preview never leaves its box.
    #[test]
    fn preview_bounded(
        kind in waveform(),
        freq in prop_oneof![10.0f32..2000.0, 0.0f32..1.0e12, 1.0e12f32..f32::MAX],
        amp in -2.0f32..2.0,
        count in 0usize..300,
    ) {
        let points = PreviewRenderer::default().render_preview(kind, freq, amp, count);
        prop_assert_eq!(points.len(), count);
        for p in points {
            prop_assert!((0.0..=1.0).contains(&p.x));
            prop_assert!((-1.0..=1.0).contains(&p.y));
        }
    }
}
