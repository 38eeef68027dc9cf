//! Property-based tests for estela-core DSP primitives.
//!
//! Verifies delay line integrity, parameter convergence, filter stability
//! and generator determinism over randomized inputs.

use estela_core::{DcBlocker, FractionalDelay, Lcg, OnePole, SmoothedParam};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Samples written to the delay line come back exactly at integer
    /// delays (no interpolation error at whole-sample offsets).
    #[test]
    fn delay_line_integrity(
        samples in prop::collection::vec(-1.0f32..=1.0f32, 1..=64),
    ) {
        let mut delay = FractionalDelay::new(128);

        for &s in &samples {
            delay.write(s);
        }

        // Sample written k steps ago is at integer delay k
        for (k, &expected) in samples.iter().rev().enumerate() {
            let read = delay.read_integer(k);
            prop_assert!(
                (read - expected).abs() < 1e-7,
                "delay {k}: wrote {expected}, read {read}"
            );
        }
    }

    /// Fractional reads of any signal stay within the signal's bounds
    /// scaled by the Lagrange kernel's small overshoot.
    #[test]
    fn delay_fractional_read_bounded(
        samples in prop::collection::vec(-1.0f32..=1.0f32, 16..=64),
        delay_frac in 0.0f32..=10.0f32,
    ) {
        let mut delay = FractionalDelay::new(64);
        delay.set_delay(delay_frac);

        for &s in &samples {
            delay.write(s);
            let out = delay.read();
            prop_assert!(out.is_finite());
            // Third-order Lagrange overshoot is well under 2x for
            // unit-bounded input
            prop_assert!(out.abs() < 2.0, "overshoot: {out}");
        }
    }

    /// SmoothedParam converges toward its target value.
    #[test]
    fn smoothed_param_convergence(
        initial in -100.0f32..100.0f32,
        target in -100.0f32..100.0f32,
    ) {
        let mut param = SmoothedParam::with_config(initial, 48000.0, 10.0);
        param.set_target(target);

        // ~200 ms — far beyond 5 time constants
        for _ in 0..10000 {
            param.advance();
        }

        // f32 precision floor: the one-pole step stalls near
        // ULP(target)/coeff; add an absolute floor for targets near zero
        let precision_floor = target.abs() * f32::EPSILON / 0.002 + 1e-4;
        let diff = (param.get() - target).abs();
        prop_assert!(
            diff < precision_floor,
            "did not converge: target={target}, got={}, diff={diff}",
            param.get()
        );
    }

    /// OnePole output is finite and bounded for bounded input at any
    /// cutoff.
    #[test]
    fn one_pole_stability(
        freq in 20.0f32..20000.0f32,
        input in prop::collection::vec(-1.0f32..=1.0f32, 256),
    ) {
        let mut lp = OnePole::new(48000.0, freq);
        for &x in &input {
            let y = lp.process(x);
            prop_assert!(y.is_finite());
            prop_assert!(y.abs() <= 1.0 + 1e-6, "lowpass overshoot {y}");
        }
    }

    /// The DC blocker's output is finite and its long-run mean vanishes
    /// for constant input.
    #[test]
    fn dc_blocker_kills_offset(offset in -1.0f32..=1.0f32) {
        let mut blocker = DcBlocker::with_cutoff(48000.0, 10.0);
        let mut last = 0.0;
        for _ in 0..48000 {
            last = blocker.process(offset);
            prop_assert!(last.is_finite());
        }
        prop_assert!(last.abs() < 0.01, "residual DC {last} for offset {offset}");
    }

    /// Two generators with the same seed emit identical streams; the
    /// stream is invariant to when values are drawn.
    #[test]
    fn lcg_determinism(seed in any::<u32>()) {
        let mut a = Lcg::new(seed);
        let mut b = Lcg::new(seed);
        for _ in 0..64 {
            prop_assert_eq!(a.next_u32(), b.next_u32());
        }
    }
}
