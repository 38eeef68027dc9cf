//! Stress and isolation tests for the reverberation engine.
//!
//! Verifies the engine's hard promises: bounded output under hostile
//! parameter combinations, bit-exact stage bypasses, and finite output at
//! extreme sample rates.

use estela_reverb::{FdnReverb, ReverbParams, SaturationCurve, StageBypass, StereoReverb};

/// Hostile parameter set: everything that stresses the feedback loop at
/// once.
fn max_stress_params() -> ReverbParams {
    ReverbParams {
        room_size: 1.0,
        low_rt60_s: 5.0,
        high_rt60_s: 3.0,
        hf_damping_pct: 65.0,
        diffusion_pct: 80.0,
        mod_depth_pct: 15.0,
        mod_rate_hz: 0.5,
        sat_amount_pct: 50.0,
        sat_drive_db: 12.0,
        sat_curve: SaturationCurve::Warm,
        sat_tone_pct: 0.0,
        sat_asymmetry_pct: 20.0,
        ..ReverbParams::default()
    }
}

#[test]
fn fdn_survives_noise_stress() {
    let mut fdn = FdnReverb::new(44100.0, 512, 0x42424242);
    fdn.set_parameters(&max_stress_params(), &StageBypass::default());
    fdn.reset();

    // 10 seconds: 1 second of half-scale noise, then silence. The loop
    // must never emit NaN/Inf and the peak must stay under the safety
    // ceiling for the entire run.
    let mut rng_state = 0x42424242u32;
    let mut max_output = 0.0f32;

    for i in 0..(44100 * 10) {
        rng_state = rng_state.wrapping_mul(1664525).wrapping_add(1013904223);
        let noise = (rng_state as f32 / u32::MAX as f32) * 2.0 - 1.0;
        let input = if i < 44100 { noise * 0.5 } else { 0.0 };

        let (l, r) = fdn.process_sample(input, input);
        assert!(!l.is_nan() && !r.is_nan(), "NaN at sample {i}");
        assert!(!l.is_infinite() && !r.is_infinite(), "Inf at sample {i}");
        max_output = max_output.max(l.abs()).max(r.abs());
    }

    assert!(max_output < 10.0, "FDN output grew to {max_output}");
}

#[test]
fn fdn_survives_every_curve_at_full_drive() {
    for curve in [
        SaturationCurve::Soft,
        SaturationCurve::Warm,
        SaturationCurve::Tape,
        SaturationCurve::Tube,
    ] {
        let params = ReverbParams {
            sat_amount_pct: 100.0,
            sat_drive_db: 24.0,
            sat_curve: curve,
            sat_asymmetry_pct: 100.0,
            sat_tone_pct: 100.0,
            diffusion_pct: 100.0,
            mod_depth_pct: 100.0,
            mod_rate_hz: 5.0,
            ..max_stress_params()
        };

        let mut fdn = FdnReverb::new(44100.0, 512, 7);
        fdn.set_parameters(&params, &StageBypass::default());
        fdn.reset();

        let mut peak = 0.0f32;
        for i in 0..44100 {
            let x = if i < 4410 { 0.9 } else { 0.0 };
            let (l, r) = fdn.process_sample(x, -x);
            assert!(l.is_finite() && r.is_finite(), "{curve:?} blew up at {i}");
            peak = peak.max(l.abs()).max(r.abs());
        }
        assert!(peak < 10.0, "{curve:?}: peak {peak} exceeded ceiling");
    }
}

#[test]
fn saturation_bypass_matches_zero_amount() {
    // Bypass substitutes the identity; so does amount = 0. The two
    // configurations must be bit-for-bit identical.
    let base = max_stress_params();

    let mut bypassed = FdnReverb::new(44100.0, 512, 11);
    bypassed.set_parameters(
        &base,
        &StageBypass {
            saturation: true,
            ..StageBypass::default()
        },
    );
    bypassed.reset();

    let zeroed_params = ReverbParams {
        sat_amount_pct: 0.0,
        ..base
    };
    let mut zeroed = FdnReverb::new(44100.0, 512, 11);
    zeroed.set_parameters(&zeroed_params, &StageBypass::default());
    zeroed.reset();

    for i in 0..4410 {
        let x = if i == 0 { 1.0 } else { 0.0 };
        let (bl, br) = bypassed.process_sample(x, x);
        let (zl, zr) = zeroed.process_sample(x, x);
        assert_eq!(bl, zl, "left diverged at sample {i}");
        assert_eq!(br, zr, "right diverged at sample {i}");
    }
}

#[test]
fn tone_bypass_matches_flat_tone() {
    let base = ReverbParams {
        sat_tone_pct: 60.0,
        ..max_stress_params()
    };

    let mut bypassed = FdnReverb::new(44100.0, 512, 13);
    bypassed.set_parameters(
        &base,
        &StageBypass {
            tone: true,
            ..StageBypass::default()
        },
    );
    bypassed.reset();

    let flat_params = ReverbParams {
        sat_tone_pct: 0.0,
        ..base
    };
    let mut flat = FdnReverb::new(44100.0, 512, 13);
    flat.set_parameters(&flat_params, &StageBypass::default());
    flat.reset();

    for i in 0..4410 {
        let x = if i == 0 { 1.0 } else { 0.0 };
        let (bl, br) = bypassed.process_sample(x, x);
        let (fl, fr) = flat.process_sample(x, x);
        assert_eq!(bl, fl, "left diverged at sample {i}");
        assert_eq!(br, fr, "right diverged at sample {i}");
    }
}

#[test]
fn matrix_bypass_matches_zero_diffusion() {
    let base = max_stress_params();

    let mut bypassed = FdnReverb::new(44100.0, 512, 17);
    bypassed.set_parameters(
        &base,
        &StageBypass {
            matrix: true,
            ..StageBypass::default()
        },
    );
    bypassed.reset();

    let parallel_params = ReverbParams {
        diffusion_pct: 0.0,
        ..base
    };
    let mut parallel = FdnReverb::new(44100.0, 512, 17);
    parallel.set_parameters(&parallel_params, &StageBypass::default());
    parallel.reset();

    for i in 0..4410 {
        let x = if i == 0 { 1.0 } else { 0.0 };
        let (bl, br) = bypassed.process_sample(x, x);
        let (pl, pr) = parallel.process_sample(x, x);
        assert_eq!(bl, pl, "left diverged at sample {i}");
        assert_eq!(br, pr, "right diverged at sample {i}");
    }
}

#[test]
fn engine_finite_at_extreme_sample_rates() {
    for sample_rate in [8000.0, 192000.0] {
        let mut engine = StereoReverb::new(sample_rate, 128, 0xABCD);
        engine.set_parameters(&max_stress_params(), &StageBypass::default());
        engine.reset();

        let mut input = vec![0.0f32; 128];
        input[0] = 1.0;
        let mut out_l = vec![0.0f32; 128];
        let mut out_r = vec![0.0f32; 128];

        for block in 0..8 {
            engine.process_block(&input, &input, &mut out_l, &mut out_r);
            input.fill(0.0);
            for (i, (l, r)) in out_l.iter().zip(out_r.iter()).enumerate() {
                assert!(
                    l.is_finite() && r.is_finite(),
                    "non-finite output at {sample_rate} Hz, block {block}, sample {i}"
                );
            }
        }
    }
}

#[test]
fn engine_handles_varied_block_sizes() {
    // One engine, fed with every block size up to the configured maximum;
    // the velvet ring buffers must track history across the seams
    let mut engine = StereoReverb::new(44100.0, 1024, 0x600D);
    engine.set_parameters(&ReverbParams::default(), &StageBypass::default());
    engine.reset();

    for &block in &[1usize, 7, 64, 128, 333, 1024] {
        let input = vec![0.25f32; block];
        let mut out_l = vec![0.0f32; block];
        let mut out_r = vec![0.0f32; block];
        engine.process_block(&input, &input, &mut out_l, &mut out_r);
        assert!(out_l.iter().chain(out_r.iter()).all(|v| v.is_finite()));
    }
}

#[test]
fn parameter_changes_mid_stream_stay_bounded() {
    // Sweep hostile parameter changes every block while audio runs; the
    // clamps must keep the loop stable with no reconfiguration
    let mut fdn = FdnReverb::new(44100.0, 512, 23);
    fdn.reset();

    let mut peak = 0.0f32;
    for step in 0..40 {
        let t = step as f32 / 40.0;
        let params = ReverbParams {
            room_size: 0.1 + 0.9 * t,
            low_rt60_s: 12.0 * t + 0.2,
            high_rt60_s: 8.0 * (1.0 - t) + 0.1,
            hf_damping_pct: 100.0 * t,
            diffusion_pct: 100.0 * (1.0 - t),
            mod_depth_pct: 100.0 * t,
            mod_rate_hz: 0.1 + 4.9 * t,
            sat_amount_pct: 100.0 * t,
            sat_drive_db: 24.0 * t,
            sat_asymmetry_pct: 100.0 * t,
            sat_tone_pct: 200.0 * t - 100.0,
            ..ReverbParams::default()
        };
        fdn.set_parameters(&params, &StageBypass::default());

        for i in 0..1024 {
            let x = if i % 3 == 0 { 0.8 } else { -0.4 };
            let (l, r) = fdn.process_sample(x, x);
            assert!(l.is_finite() && r.is_finite());
            peak = peak.max(l.abs()).max(r.abs());
        }
    }
    assert!(peak < 12.0, "parameter sweep drove the loop to {peak}");
}
