//! First-order shelving filter for frequency-dependent decay.
//!
//! One of these sits after every FDN delay line, giving the network
//! different RT60 values in the low and high bands:
//!
//! ```text
//! H(z) = (b0 + b1*z^-1) / (1 + a1*z^-1)
//! ```
//!
//! with DC response `gain_low` and Nyquist response `gain_high`. Because
//! this filter is the only lossy element in the feedback loop, both gains
//! are hard-clamped below 1 before any coefficient is derived — the single
//! most important safety invariant in the engine. A first-order shelf with
//! positive band gains is monotone between its endpoints, so the magnitude
//! response never exceeds `max(gain_low, gain_high)` at any frequency.
//!
//! Reference: Jot & Chaigne, "Digital delay networks for designing
//! artificial reverberators" (1991); Schlecht (2018), ch. 3.

use estela_core::{Effect, flush_denormal};
use libm::{powf, tanf};

/// Hard ceiling on either per-pass gain; a loop gain of 1 or more grows
/// without bound.
const MAX_LOOP_GAIN: f32 = 0.9999;

/// Per-pass gain needed for a delay of `delay_samples` at `sample_rate` to
/// reach -60 dB after `rt60_s` seconds.
///
/// `g = 10^(-3 * d/sr / RT60)`. The decay time is floored at 50 ms so a
/// zero-length decay request cannot divide to infinity.
#[inline]
pub fn rt60_gain(delay_samples: f32, sample_rate: f32, rt60_s: f32) -> f32 {
    let delay_sec = delay_samples / sample_rate;
    powf(10.0, -3.0 * delay_sec / rt60_s.max(0.05))
}

/// First-order low/high shelving attenuation filter.
#[derive(Debug, Clone, Default)]
pub struct ShelvingAttenuation {
    b0: f32,
    b1: f32,
    a1: f32,
    /// Input one-sample memory
    x1: f32,
    /// Output one-sample memory
    y1: f32,
}

impl ShelvingAttenuation {
    /// Create a unity pass-through filter (b0 = 1).
    pub fn new() -> Self {
        Self {
            b0: 1.0,
            ..Self::default()
        }
    }

    /// Derive coefficients from per-pass band gains and a crossover.
    ///
    /// Both gains are clamped to `[0, 0.9999]` before anything else; the
    /// crossover is bounded away from DC and Nyquist so the bilinear
    /// prewarp stays finite. With `t = tan(ωc/2)`, the analog shelf
    /// `H(s) = (gH·s + gL·ω0) / (s + ω0)` maps to
    ///
    /// ```text
    /// b0 = (gH + gL·t) / (1 + t)
    /// b1 = (gL·t - gH) / (1 + t)
    /// a1 = (t - 1) / (1 + t)
    /// ```
    ///
    /// giving exactly `gain_low` at DC and `gain_high` at Nyquist, with a
    /// monotone transition between them. Equal band gains collapse to a
    /// pole/zero cancellation, i.e. a pure scalar.
    pub fn set_coefficients(
        &mut self,
        gain_low: f32,
        gain_high: f32,
        crossover_hz: f32,
        sample_rate: f32,
    ) {
        let g_low = gain_low.clamp(0.0, MAX_LOOP_GAIN);
        let g_high = gain_high.clamp(0.0, MAX_LOOP_GAIN);

        let crossover = crossover_hz.clamp(20.0, 0.49 * sample_rate);
        let wc = core::f32::consts::TAU * crossover / sample_rate;
        let t = tanf(wc * 0.5);

        let norm = 1.0 / (1.0 + t);
        self.b0 = (g_high + g_low * t) * norm;
        self.b1 = (g_low * t - g_high) * norm;
        self.a1 = (t - 1.0) * norm;
    }
}

impl Effect for ShelvingAttenuation {
    /// One-pole/one-zero recursion with denormal-flushed memories.
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 - self.a1 * self.y1;
        self.x1 = input;
        self.y1 = flush_denormal(output);
        output
    }

    fn set_sample_rate(&mut self, _sample_rate: f32) {
        // Coefficients are pushed by the owner via set_coefficients; there
        // is no stored frequency to rescale here.
    }

    fn reset(&mut self) {
        self.x1 = 0.0;
        self.y1 = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Measure steady-state magnitude response at a given frequency by
    /// driving the filter with a sine and reading the peak after settling.
    fn measure_gain(filter: &mut ShelvingAttenuation, freq: f32, sample_rate: f32) -> f32 {
        filter.reset();
        let mut peak = 0.0f32;
        for i in 0..48000 {
            let x = libm::sinf(core::f32::consts::TAU * freq * i as f32 / sample_rate);
            let y = filter.process(x);
            if i > 24000 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn dc_response_matches_gain_low() {
        let mut f = ShelvingAttenuation::new();
        f.set_coefficients(0.9, 0.5, 4000.0, 48000.0);

        // DC: feed a constant and let it settle
        let mut out = 0.0;
        for _ in 0..48000 {
            out = f.process(1.0);
        }
        assert!((out - 0.9).abs() < 0.01, "DC gain should be ~0.9, got {out}");
    }

    #[test]
    fn nyquist_response_matches_gain_high() {
        let mut f = ShelvingAttenuation::new();
        f.set_coefficients(0.9, 0.5, 4000.0, 48000.0);

        // Nyquist: alternating ±1
        let mut peak = 0.0f32;
        for i in 0..48000 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            let y = f.process(x);
            if i > 24000 {
                peak = peak.max(y.abs());
            }
        }
        assert!(
            (peak - 0.5).abs() < 0.01,
            "Nyquist gain should be ~0.5, got {peak}"
        );
    }

    #[test]
    fn magnitude_never_exceeds_band_maximum() {
        let mut f = ShelvingAttenuation::new();
        f.set_coefficients(0.95, 0.4, 2000.0, 48000.0);

        for freq in [50.0, 200.0, 1000.0, 2000.0, 5000.0, 10000.0, 20000.0] {
            let g = measure_gain(&mut f, freq, 48000.0);
            assert!(g <= 0.96, "gain {g} at {freq} Hz exceeds max band gain");
        }
    }

    #[test]
    fn response_is_monotone_between_bands() {
        let mut f = ShelvingAttenuation::new();
        f.set_coefficients(0.9, 0.3, 3000.0, 48000.0);

        let mut prev = measure_gain(&mut f, 100.0, 48000.0);
        for freq in [500.0, 1500.0, 3000.0, 6000.0, 12000.0, 20000.0] {
            let g = measure_gain(&mut f, freq, 48000.0);
            assert!(
                g <= prev + 1e-3,
                "shelf should fall monotonically toward the high band: \
                 {prev} -> {g} at {freq} Hz"
            );
            prev = g;
        }
    }

    #[test]
    fn gains_clamped_below_unity() {
        let mut f = ShelvingAttenuation::new();
        // Request unstable gains; the clamp must keep the loop lossy
        f.set_coefficients(1.5, 2.0, 4000.0, 48000.0);

        let mut out = 0.0;
        for _ in 0..100000 {
            out = f.process(1.0);
        }
        assert!(out < 1.0, "clamped filter must stay below unity, got {out}");
        assert!(out > 0.99, "clamp ceiling should be close to 1, got {out}");
    }

    #[test]
    fn equal_gains_degenerate_to_scalar() {
        let mut f = ShelvingAttenuation::new();
        f.set_coefficients(0.7, 0.7, 4000.0, 48000.0);
        // Pole/zero cancellation: the response is an immediate scalar
        assert!((f.process(1.0) - 0.7).abs() < 1e-6);
        assert!((f.process(-1.0) + 0.7).abs() < 1e-6);
    }

    #[test]
    fn crossover_clamped_at_extreme_rates() {
        // A crossover far above Nyquist must not destabilize the prewarp
        let mut f = ShelvingAttenuation::new();
        f.set_coefficients(0.9, 0.5, 20000.0, 8000.0);

        for i in 0..10000 {
            let x = if i % 2 == 0 { 1.0 } else { -1.0 };
            let y = f.process(x);
            assert!(y.is_finite() && y.abs() < 1.5, "unstable at 8 kHz: {y}");
        }
    }

    #[test]
    fn rt60_gain_known_value() {
        // d/sr = 0.1 s, RT60 = 1 s → g = 10^-0.3 ≈ 0.5012
        let g = rt60_gain(4410.0, 44100.0, 1.0);
        assert!((g - 0.50119).abs() < 1e-3, "got {g}");
    }

    #[test]
    fn rt60_gain_zero_decay_is_floored() {
        let g = rt60_gain(4410.0, 44100.0, 0.0);
        assert!(g.is_finite());
        assert!(g > 0.0);
    }

    #[test]
    fn reset_silences() {
        let mut f = ShelvingAttenuation::new();
        f.set_coefficients(0.9, 0.3, 4000.0, 48000.0);
        for _ in 0..100 {
            f.process(1.0);
        }
        f.reset();
        assert_eq!(f.process(0.0), 0.0);
    }
}
