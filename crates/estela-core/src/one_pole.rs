//! One-pole lowpass filter for tone controls and HF rolloff.
//!
//! A single-pole IIR lowpass with the difference equation:
//!
//! ```text
//! y[n] = y[n-1] + coeff * (x[n] - y[n-1])
//! ```
//!
//! The simplest possible lowpass — 6 dB/octave rolloff, zero latency, one
//! multiply per sample. Used for tone shaping and high-frequency damping in
//! delay and reverb structures.
//!
//! # Reference
//!
//! Julius O. Smith III, "Introduction to Digital Filters with Audio
//! Applications", Section: One-Pole Filter.

use crate::flush_denormal;
use libm::expf;

/// One-pole (6 dB/oct) lowpass filter.
///
/// # Invariants
///
/// - `coeff` is always in (0, 1] for stable operation
/// - `state` is flushed to zero when below 1e-20 (denormal protection)
#[derive(Debug, Clone)]
pub struct OnePole {
    state: f32,
    coeff: f32,
    sample_rate: f32,
    freq: f32,
}

impl OnePole {
    /// Create a new one-pole lowpass filter.
    ///
    /// # Arguments
    ///
    /// * `sample_rate` - Sample rate in Hz
    /// * `freq_hz` - Cutoff frequency in Hz (20.0 to sample_rate/2)
    pub fn new(sample_rate: f32, freq_hz: f32) -> Self {
        let mut filter = Self {
            state: 0.0,
            coeff: 1.0,
            sample_rate,
            freq: freq_hz,
        };
        filter.recalculate_coeff();
        filter
    }

    /// Set the cutoff frequency and recalculate the coefficient.
    pub fn set_frequency(&mut self, freq_hz: f32) {
        self.freq = freq_hz;
        self.recalculate_coeff();
    }

    /// Set the smoothing coefficient directly (0 < coeff <= 1).
    ///
    /// For callers that derive the coefficient from their own frequency
    /// mapping (e.g. `w / (1 + w)` bilinear approximations) rather than the
    /// exponential form used by [`OnePole::set_frequency`].
    pub fn set_coeff_raw(&mut self, coeff: f32) {
        self.coeff = coeff.clamp(1e-6, 1.0);
    }

    /// Process one sample through the lowpass filter.
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        self.state = flush_denormal(self.state + self.coeff * (input - self.state));
        self.state
    }

    /// Reset filter state to zero.
    pub fn reset(&mut self) {
        self.state = 0.0;
    }

    /// Update sample rate and recalculate the coefficient.
    pub fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.recalculate_coeff();
    }

    /// Recalculate the one-pole coefficient from frequency and sample rate.
    ///
    /// `coeff = 1 - exp(-2π * freq / sample_rate)`. At freq → 0 the filter
    /// holds its state (heavy smoothing); at Nyquist it tracks the input.
    fn recalculate_coeff(&mut self) {
        self.coeff = 1.0 - expf(-core::f32::consts::TAU * self.freq / self.sample_rate);
    }
}
