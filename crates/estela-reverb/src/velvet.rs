//! Sparse velvet-noise FIR engines.
//!
//! Velvet noise — signed unit impulses at one pseudo-random position per
//! grid cell — is a perceptually smooth stand-in for dense noise at a tiny
//! fraction of the cost: convolution touches only the pulse positions.
//! Two engines share the sequence generator:
//!
//! - [`EarlyReflections`]: a short (30 ms), dense (2000 pulses/s) burst with
//!   a single exponential envelope, preserving instrument transients.
//! - [`DarkVelvetTail`]: a long (3 s) sequence whose pulses average a 1-4
//!   sample window of the input (a mild per-pulse lowpass, hence "dark")
//!   under a dual-exponential envelope — the weighted sum of a fast and a
//!   1.5x slower slope gives the non-exponential, double-slope decay that a
//!   plain FDN cannot produce.
//!
//! Every sequence carries a normalization gain that scales the envelope-
//! weighted pulses to unit energy; without it the perceived tail level
//! would drift with density and duration settings. Convolution reads the
//! input from a persistent ring buffer, so a pulse whose delay exceeds the
//! current block length still sees the previous blocks' samples.
//!
//! References: Fagerström et al., "Velvet-Noise Feedback Delay Network",
//! DAFx-20 (2020); Fagerström et al., "Non-Exponential Reverberation
//! Modeling Using Dark Velvet Noise", JAES 72(6) (2024).

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use estela_core::Lcg;
use libm::{expf, sqrtf};

/// Early-reflection sequence length in milliseconds.
const EARLY_DURATION_MS: f32 = 30.0;

/// Early-reflection pulse density in pulses per second.
const EARLY_DENSITY: f32 = 2000.0;

/// Tail sequence length in seconds.
const TAIL_DURATION_S: f32 = 3.0;

/// Tail pulse density in pulses per second.
const TAIL_DENSITY: f32 = 1800.0;

/// Widest per-pulse averaging window in the tail sequence.
const MAX_PULSE_WIDTH: usize = 4;

/// ln(10) as f32, for the -60 dB envelope rate.
const LN_10: f32 = core::f32::consts::LN_10;

/// One velvet pulse: a signed, envelope-weighted tap.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelvetPulse {
    /// Offset into the sequence in samples.
    pub position: usize,
    /// Polarity, +1 or -1.
    pub sign: f32,
    /// Number of consecutive input samples this tap averages (>= 1).
    pub width: usize,
    /// Envelope weight at this position.
    pub envelope: f32,
}

/// A generated velvet pulse train with its normalization gain.
///
/// Regenerated only when density, duration or seed change — never per
/// sample or per block.
#[derive(Debug, Clone)]
pub struct VelvetSequence {
    pulses: Vec<VelvetPulse>,
    length: usize,
    norm_gain: f32,
}

impl VelvetSequence {
    /// Generate a width-1 train with a single exponential envelope
    /// reaching -60 dB across the duration.
    pub fn exponential(sample_rate: f64, duration_ms: f32, density: f32, seed: u32) -> Self {
        let total = (sample_rate * duration_ms as f64 * 0.001) as usize;
        let mut seq = Self::raw(sample_rate, total, density, 1, seed);

        let decay_rate = -3.0 * LN_10 / total.max(1) as f32;
        for pulse in &mut seq.pulses {
            pulse.envelope = expf(decay_rate * pulse.position as f32);
        }
        seq.renormalize();
        seq
    }

    /// Generate a train with pseudo-random pulse widths of 1 to
    /// `max_width` samples and a flat envelope; callers shape it with
    /// [`VelvetSequence::set_dual_exponential`].
    pub fn wide(
        sample_rate: f64,
        duration_s: f32,
        density: f32,
        max_width: usize,
        seed: u32,
    ) -> Self {
        let total = (sample_rate * duration_s as f64) as usize;
        let mut seq = Self::raw(sample_rate, total, density, max_width, seed);
        seq.renormalize();
        seq
    }

    /// Shared generator: one pulse per grid cell at a seeded random
    /// position with a seeded random sign (and width, when `max_width > 1`).
    fn raw(
        sample_rate: f64,
        total_samples: usize,
        density: f32,
        max_width: usize,
        seed: u32,
    ) -> Self {
        let grid = ((sample_rate / density.max(1.0) as f64) as usize).max(1);
        let num_pulses = total_samples / grid;

        let mut rng = Lcg::new(seed);
        let mut pulses = Vec::with_capacity(num_pulses);

        for m in 0..num_pulses {
            let position = m * grid + rng.next_below(grid as u32) as usize;
            let sign = rng.next_sign();
            let width = if max_width > 1 {
                1 + rng.next_below(max_width as u32) as usize
            } else {
                1
            };

            if position < total_samples {
                pulses.push(VelvetPulse {
                    position,
                    sign,
                    width,
                    envelope: 1.0,
                });
            }
        }

        Self {
            pulses,
            length: total_samples,
            norm_gain: 1.0,
        }
    }

    /// Reweight with a double-slope envelope
    /// `(1-shape)·e^(-t/τ1) + shape·e^(-t/τ2)` where τ1 = rt60/6.9078 and
    /// τ2 is 1.5x longer, then renormalize.
    ///
    /// `shape` 0 gives a single exponential slope; 1 weights fully toward
    /// the slower second slope.
    pub fn set_dual_exponential(&mut self, sample_rate: f64, shape: f32, rt60_s: f32) {
        let shape = shape.clamp(0.0, 1.0);
        // -60 dB corresponds to 6.9078 time constants: ln(10^3)
        let tau1 = rt60_s.max(0.05) / 6.9078;
        let tau2 = rt60_s.max(0.05) * 1.5 / 6.9078;

        for pulse in &mut self.pulses {
            let t = pulse.position as f32 / sample_rate as f32;
            pulse.envelope =
                (1.0 - shape) * expf(-t / (tau1 + 1e-6)) + shape * expf(-t / (tau2 + 1e-6));
        }
        self.renormalize();
    }

    /// Recompute the unit-energy normalization gain.
    fn renormalize(&mut self) {
        let energy: f32 = self.pulses.iter().map(|p| p.envelope * p.envelope).sum();
        self.norm_gain = 1.0 / sqrtf(energy.max(1e-12));
    }

    /// Sequence length in samples.
    pub fn len(&self) -> usize {
        self.length
    }

    /// True when the sequence holds no pulses.
    pub fn is_empty(&self) -> bool {
        self.pulses.is_empty()
    }

    /// The generated pulse train.
    pub fn pulses(&self) -> &[VelvetPulse] {
        &self.pulses
    }

    /// Normalization gain for unit sequence energy.
    pub fn norm_gain(&self) -> f32 {
        self.norm_gain
    }
}

/// Ring-buffered sparse FIR convolver shared by both engines.
#[derive(Debug, Clone)]
struct SparseConvolver {
    ring: Vec<f32>,
    write_pos: usize,
}

impl SparseConvolver {
    /// Size the ring for cross-block reads: the furthest tap plus a block.
    fn new(max_block_size: usize, sequence_len: usize) -> Self {
        Self {
            ring: vec![0.0; max_block_size + sequence_len + MAX_PULSE_WIDTH + 16],
            write_pos: 0,
        }
    }

    /// Convolve one block against the sequence, adding
    /// `sign · envelope · norm · gain · delayed_input` per pulse.
    fn process(&mut self, seq: &VelvetSequence, input: &[f32], output: &mut [f32], gain: f32) {
        debug_assert_eq!(input.len(), output.len());
        let ring_len = self.ring.len();
        let coeff_scale = seq.norm_gain() * gain;

        for (&x, out) in input.iter().zip(output.iter_mut()) {
            self.ring[self.write_pos] = x;

            let mut sum = 0.0f32;
            for pulse in seq.pulses() {
                let mut read_idx = self.write_pos as isize - pulse.position as isize;
                if read_idx < 0 {
                    read_idx += ring_len as isize;
                }

                // Running average over the pulse width (per-pulse lowpass)
                let mut sample = 0.0f32;
                let mut idx = read_idx as usize;
                for _ in 0..pulse.width {
                    sample += self.ring[idx];
                    idx = if idx == 0 { ring_len - 1 } else { idx - 1 };
                }
                sample /= pulse.width as f32;

                sum += pulse.sign * pulse.envelope * sample;
            }

            *out = sum * coeff_scale;
            self.write_pos = (self.write_pos + 1) % ring_len;
        }
    }

    fn reset(&mut self) {
        self.ring.fill(0.0);
        self.write_pos = 0;
    }
}

/// Short dense velvet burst for early reflections.
///
/// Linear processing — no oversampling required; runs at the base rate on
/// the (optionally pre-delayed) dry signal.
#[derive(Debug, Clone)]
pub struct EarlyReflections {
    sequence: VelvetSequence,
    convolver: SparseConvolver,
}

impl EarlyReflections {
    /// Generate the 30 ms / 2000 pulses-per-second sequence for `seed`.
    pub fn new(sample_rate: f64, max_block_size: usize, seed: u32) -> Self {
        let sequence =
            VelvetSequence::exponential(sample_rate, EARLY_DURATION_MS, EARLY_DENSITY, seed);
        let convolver = SparseConvolver::new(max_block_size, sequence.len());
        Self {
            sequence,
            convolver,
        }
    }

    /// Convolve a block of input, scaled by `gain`.
    pub fn process(&mut self, input: &[f32], output: &mut [f32], gain: f32) {
        self.convolver
            .process(&self.sequence, input, output, gain);
    }

    /// Clear the input history.
    pub fn reset(&mut self) {
        self.convolver.reset();
    }

    /// The generated sequence (for inspection and tests).
    pub fn sequence(&self) -> &VelvetSequence {
        &self.sequence
    }
}

/// Long dark-velvet tail with a tunable double-slope decay.
#[derive(Debug, Clone)]
pub struct DarkVelvetTail {
    sample_rate: f64,
    sequence: VelvetSequence,
    convolver: SparseConvolver,
    // Cached settings so unchanged parameter pushes skip the envelope pass
    cached_shape: f32,
    cached_rt60: f32,
}

impl DarkVelvetTail {
    /// Generate the 3 s / 1800 pulses-per-second wide-pulse sequence.
    pub fn new(sample_rate: f64, max_block_size: usize, seed: u32) -> Self {
        let mut sequence =
            VelvetSequence::wide(sample_rate, TAIL_DURATION_S, TAIL_DENSITY, MAX_PULSE_WIDTH, seed);
        sequence.set_dual_exponential(sample_rate, 0.4, 1.8);
        let convolver = SparseConvolver::new(max_block_size, sequence.len());
        Self {
            sample_rate,
            sequence,
            convolver,
            cached_shape: 0.4,
            cached_rt60: 1.8,
        }
    }

    /// Reshape the decay envelope.
    ///
    /// * `decay_shape_pct` - 0 = single slope, 100 = fully second slope
    /// * `rt60_s` - tail decay time in seconds
    ///
    /// This touches only envelope weights, never pulse positions, so it is
    /// cheap enough for parameter automation (though still not a per-sample
    /// operation). Unchanged settings return immediately.
    pub fn set_parameters(&mut self, decay_shape_pct: f32, rt60_s: f32) {
        let shape = decay_shape_pct * 0.01;
        if (shape - self.cached_shape).abs() < 0.001 && (rt60_s - self.cached_rt60).abs() < 0.001 {
            return;
        }
        self.cached_shape = shape;
        self.cached_rt60 = rt60_s;

        self.sequence
            .set_dual_exponential(self.sample_rate, shape, rt60_s);
    }

    /// Convolve a block of input, scaled by `gain`.
    pub fn process(&mut self, input: &[f32], output: &mut [f32], gain: f32) {
        self.convolver
            .process(&self.sequence, input, output, gain);
    }

    /// Clear the input history.
    pub fn reset(&mut self) {
        self.convolver.reset();
    }

    /// The generated sequence (for inspection and tests).
    pub fn sequence(&self) -> &VelvetSequence {
        &self.sequence
    }
}
