//! DC blocking filter for removing DC offset from audio signals.
//!
//! Uses a first-order highpass filter (Julius O. Smith's DC blocker).
//! Transfer function: H(z) = (1 - z^-1) / (1 - R*z^-1)
//!
//! where R is a coefficient close to 1.0 that controls the cutoff frequency.
//! The -3 dB cutoff is approximately `(1 - R) / (2π) * fs`.
//!
//! Reference: Julius O. Smith, "Introduction to Digital Filters with Audio
//! Applications", Chapter on DC Blocker.

use core::f32::consts::PI;

/// DC blocking filter using a first-order highpass.
///
/// Removes DC offset while preserving all audible content. Inside a
/// saturation stage the blocker's input memory can be pre-seeded with
/// [`DcBlocker::preload`] so that a statically offset nonlinearity settles
/// to zero output instantly after a reset instead of emitting a decaying DC
/// transient.
///
/// ## Example
///
/// ```rust
/// use estela_core::DcBlocker;
///
/// let mut blocker = DcBlocker::with_cutoff(48000.0, 10.0);
/// let output = blocker.process(0.5 + 0.1); // signal with DC offset
/// ```
#[derive(Debug, Clone)]
pub struct DcBlocker {
    /// R coefficient (pole position, controls cutoff frequency)
    coeff: f32,
    /// Previous input sample x[n-1]
    x_prev: f32,
    /// Previous output sample y[n-1]
    y_prev: f32,
}

impl DcBlocker {
    /// Create a DC blocker for a given cutoff frequency.
    ///
    /// `R = 1 - 2π*fc/fs`, clamped to [0.9, 0.9999].
    pub fn with_cutoff(sample_rate: f32, cutoff_hz: f32) -> Self {
        let r = 1.0 - (2.0 * PI * cutoff_hz / sample_rate);
        Self {
            coeff: r.clamp(0.9, 0.9999),
            x_prev: 0.0,
            y_prev: 0.0,
        }
    }

    /// Create a DC blocker with a specific R coefficient.
    ///
    /// Values are clamped to [0.9, 0.9999].
    pub fn with_coeff(coeff: f32) -> Self {
        Self {
            coeff: coeff.clamp(0.9, 0.9999),
            x_prev: 0.0,
            y_prev: 0.0,
        }
    }

    /// Process a single sample.
    ///
    /// Implements: y[n] = x[n] - x[n-1] + R * y[n-1]
    #[inline]
    pub fn process(&mut self, input: f32) -> f32 {
        let output = input - self.x_prev + self.coeff * self.y_prev;
        self.x_prev = input;
        self.y_prev = output;
        output
    }

    /// Reset the filter state to zero.
    pub fn reset(&mut self) {
        self.x_prev = 0.0;
        self.y_prev = 0.0;
    }

    /// Seed the input memory with a known steady-state value.
    ///
    /// After `preload(x)`, feeding the constant `x` produces exactly zero
    /// output from the first sample on. Callers that add a static offset
    /// before a nonlinearity use this to avoid a settle-in transient.
    pub fn preload(&mut self, steady_input: f32) {
        self.x_prev = steady_input;
        self.y_prev = 0.0;
    }

    /// Get the current R coefficient.
    pub fn coeff(&self) -> f32 {
        self.coeff
    }
}
