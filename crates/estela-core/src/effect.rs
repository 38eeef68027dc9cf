//! Core Effect trait.
//!
//! The [`Effect`] trait is the common contract for every processor in the
//! engine: per-sample or per-block processing, a sample-rate hook, and a
//! state reset that silences the processor without touching its parameters.
//!
//! ## Design Decisions
//!
//! - **Mono by default, stereo opt-in**: most in-loop stages (filters,
//!   saturators) are mono and shared per channel; the full engine overrides
//!   [`Effect::process_stereo`].
//!
//! - **Object-safe**: the trait supports `dyn Effect` for runtime dispatch,
//!   though static dispatch is preferred on the per-sample path.
//!
//! - **No allocations**: all methods are designed to be called in real-time
//!   audio contexts with zero heap allocations.

/// Core trait for all audio processors.
///
/// # Example
///
/// ```rust
/// use estela_core::Effect;
///
/// struct Gain {
///     gain: f32,
/// }
///
/// impl Effect for Gain {
///     fn process(&mut self, input: f32) -> f32 {
///         input * self.gain
///     }
///
///     fn set_sample_rate(&mut self, _sample_rate: f32) {}
///
///     fn reset(&mut self) {}
/// }
/// ```
pub trait Effect {
    /// Process a single sample.
    ///
    /// For effects with internal state (filters, delays) this advances the
    /// state by one sample.
    fn process(&mut self, input: f32) -> f32;

    /// Process one stereo sample pair.
    ///
    /// Default implementation runs [`Effect::process`] on each channel in
    /// turn, which is only correct for stateless processors — anything with
    /// per-channel memory must override this.
    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        (self.process(left), self.process(right))
    }

    /// Process a block of samples.
    ///
    /// Default implementation calls `process()` for each sample. Effects may
    /// override this for more efficient block processing.
    ///
    /// # Panics
    /// Default implementation debug-asserts `input.len() == output.len()`.
    fn process_block(&mut self, input: &[f32], output: &mut [f32]) {
        debug_assert_eq!(
            input.len(),
            output.len(),
            "Input and output buffers must have same length"
        );
        for (inp, out) in input.iter().zip(output.iter_mut()) {
            *out = self.process(*inp);
        }
    }

    /// Process a block of samples in-place.
    fn process_block_inplace(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.process(*sample);
        }
    }

    /// Update the sample rate.
    ///
    /// Effects recalculate any sample-rate-dependent coefficients here
    /// (filter coefficients, delay times in samples, oscillator increments).
    fn set_sample_rate(&mut self, sample_rate: f32);

    /// Reset internal state.
    ///
    /// Clears all internal state (delay lines, filter history) without
    /// changing parameters, so the processor is silent and deterministic
    /// immediately afterwards.
    fn reset(&mut self);

    /// Report processing latency in samples.
    ///
    /// Default returns 0 (no latency).
    fn latency_samples(&self) -> usize {
        0
    }
}
