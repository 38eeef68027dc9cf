//! 8-channel feedback delay network — the late reverberation core.
//!
//! Architecture (Signalsmith 2021 diffuser + Jot 1992 attenuation hybrid):
//!
//! ```text
//! input → diffuser (4-stage cascade) → injection into delay lines
//! feedback loop: delay → attenuation → matrix → saturation → tone → write
//! output tap: post-attenuation, even channels → L, odd → R
//! ```
//!
//! The attenuation filters sit before the mixing matrix, so decay rate is
//! independent of the diffusion amount; the output tap is taken after
//! attenuation so an impulse cannot bypass the decay shaping. Stability
//! rests on two invariants: the matrix is unitary (no energy gain) and the
//! attenuation gains are clamped strictly below 1 — together they bound the
//! loop gain below 1 at every frequency under any parameter automation.
//!
//! Delay lengths are modulated by a shared sinusoidal oscillator with
//! evenly spread per-channel phases, smearing modal resonances that would
//! otherwise ring metallically. Base lengths are mutually coprime primes
//! spanning ~25-108 ms at 44.1 kHz, similar to a Dattorro plate.

use crate::attenuation::{ShelvingAttenuation, rt60_gain};
use crate::diffuser::InputDiffuser;
use crate::matrix::{FeedbackMatrix, NUM_CHANNELS};
use crate::params::{ReverbParams, StageBypass};
use crate::saturation::Saturator;
use crate::tone::ToneShaper;
use estela_core::{Effect, FractionalDelay, flush_denormal};
use libm::{expf, sinf, sqrtf, tanhf};

/// Base delay lengths in samples at 44.1 kHz. Mutually coprime primes
/// spanning ~25 ms to ~108 ms.
const BASE_DELAYS: [usize; NUM_CHANNELS] = [1103, 1399, 1693, 2063, 2521, 3089, 3623, 4783];

/// Reference rate the base delays are expressed at.
const REFERENCE_RATE: f64 = 44100.0;

/// Maximum delay modulation excursion in samples at 100% depth.
const MAX_MOD_SAMPLES: f32 = 16.0;

/// Injection/tap scale for an 8-channel network: 1/sqrt(N/2).
const CHANNEL_SCALE: f32 = 0.5;

/// Soft safety limiter threshold; the loop is linear below this.
const LIMITER_THRESHOLD: f32 = 4.0;

/// Time constant for smoothing delay-length changes, in seconds.
const DELAY_SMOOTH_SEC: f32 = 0.025;

/// Per-channel soft limiter: identity below the threshold, saturating
/// (bounded by threshold + 1) above it. Last line of defense against
/// residual instability from extreme parameter combinations.
#[inline]
fn soft_limit(x: f32) -> f32 {
    if x.abs() <= LIMITER_THRESHOLD {
        x
    } else {
        let sign = if x >= 0.0 { 1.0 } else { -1.0 };
        sign * (LIMITER_THRESHOLD + tanhf(x.abs() - LIMITER_THRESHOLD))
    }
}

/// 8-channel FDN with input diffusion, frequency-dependent decay, in-loop
/// saturation/tone shaping, and delay modulation.
pub struct FdnReverb {
    sample_rate: f64,
    max_block_size: usize,
    seed: u32,

    delay_lines: [FractionalDelay; NUM_CHANNELS],
    matrix: FeedbackMatrix,
    attenuation: [ShelvingAttenuation; NUM_CHANNELS],
    saturators: [Saturator; NUM_CHANNELS],
    tones: [ToneShaper; NUM_CHANNELS],
    diffuser: InputDiffuser,

    /// Delay length targets (room size × base delays, rate-scaled)
    delay_targets: [f32; NUM_CHANNELS],
    /// Currently applied delay lengths, smoothed toward the targets
    delay_current: [f32; NUM_CHANNELS],
    /// One-pole coefficient for the delay-length glide
    delay_smooth_coeff: f32,

    diffusion: f32,
    mod_depth: f32,
    mod_rate: f32,
    lfo_phase: f64,

    bypass: StageBypass,
}

impl FdnReverb {
    /// Build the network for a sample rate and maximum block size.
    ///
    /// All delay lines are sized for the worst case across room-size and
    /// modulation settings; nothing reallocates after this point. `seed`
    /// drives the matrix sign randomization and the diffuser scatter.
    pub fn new(sample_rate: f64, max_block_size: usize, seed: u32) -> Self {
        let ratio = sample_rate / REFERENCE_RATE;
        // Largest base delay at full room size, rate-scaled, plus headroom
        // for modulation excursion.
        let max_delay = (BASE_DELAYS[NUM_CHANNELS - 1] as f64 * 2.0 * ratio) as usize + 128;

        let sr = sample_rate as f32;
        let mut fdn = Self {
            sample_rate,
            max_block_size,
            seed,
            delay_lines: core::array::from_fn(|_| FractionalDelay::new(max_delay)),
            matrix: FeedbackMatrix::new(seed),
            attenuation: core::array::from_fn(|_| ShelvingAttenuation::new()),
            saturators: core::array::from_fn(|_| Saturator::new(sr)),
            tones: core::array::from_fn(|_| ToneShaper::new(sr)),
            diffuser: InputDiffuser::new(sample_rate, seed ^ 0xBAAD_F00D),
            delay_targets: [0.0; NUM_CHANNELS],
            delay_current: [0.0; NUM_CHANNELS],
            delay_smooth_coeff: 1.0 - expf(-1.0 / (DELAY_SMOOTH_SEC * sr)),
            diffusion: 0.8,
            mod_depth: 0.0,
            mod_rate: 0.5,
            lfo_phase: 0.0,
            bypass: StageBypass::default(),
        };

        fdn.set_parameters(&ReverbParams::default(), &StageBypass::default());
        fdn.reset();
        fdn
    }

    /// Recompute all derived state from a parameter snapshot.
    ///
    /// Delay-length changes glide toward the new targets over ~25 ms on the
    /// processing path; everything else applies immediately (all derived
    /// gains are clamped safe before use).
    pub fn set_parameters(&mut self, params: &ReverbParams, bypass: &StageBypass) {
        self.bypass = *bypass;

        let sr = self.sample_rate as f32;
        let ratio = (self.sample_rate / REFERENCE_RATE) as f32;

        for i in 0..NUM_CHANNELS {
            self.delay_targets[i] = BASE_DELAYS[i] as f32 * params.room_size * ratio;
        }

        // Exponential crossover mapping: 0% damping → 20 kHz, 100% → 500 Hz
        let crossover_hz = 20000.0 * libm::powf(500.0 / 20000.0, params.hf_damping_pct * 0.01);

        for i in 0..NUM_CHANNELS {
            let g_low = rt60_gain(self.delay_targets[i], sr, params.low_rt60_s);
            let g_high = rt60_gain(self.delay_targets[i], sr, params.high_rt60_s);
            self.attenuation[i].set_coefficients(g_low, g_high, crossover_hz, sr);
        }

        self.diffusion = (params.diffusion_pct * 0.01).clamp(0.0, 1.0);

        for sat in &mut self.saturators {
            sat.set_parameters(
                params.sat_amount_pct,
                params.sat_drive_db,
                params.sat_curve,
                params.sat_asymmetry_pct,
            );
        }

        for tone in &mut self.tones {
            tone.set_tone(params.sat_tone_pct);
        }

        self.mod_depth = params.mod_depth_pct * 0.01;
        self.mod_rate = params.mod_rate_hz;
    }

    /// Process one stereo sample pair through the network.
    pub fn process_sample(&mut self, input_l: f32, input_r: f32) -> (f32, f32) {
        // --- 1. Diffuse the input across 8 channels ---
        let mut diffuser_input = [0.0f32; NUM_CHANNELS];
        for (i, slot) in diffuser_input.iter_mut().enumerate() {
            let side = if i % 2 == 0 { input_l } else { input_r };
            *slot = side * CHANNEL_SCALE;
        }
        let diffused = self.diffuser.process_sample(&diffuser_input);

        // --- 2. Read delay lines ---
        let mut delay_out = [0.0f32; NUM_CHANNELS];
        for (i, slot) in delay_out.iter_mut().enumerate() {
            *slot = self.delay_lines[i].read();
        }

        // --- 3. Frequency-dependent attenuation (before the matrix, so
        //        decay rate is independent of diffusion) ---
        let mut attenuated = delay_out;
        if !self.bypass.attenuation {
            for (i, slot) in attenuated.iter_mut().enumerate() {
                *slot = self.attenuation[i].process(*slot);
            }
        }

        // --- 4. Output tap, post-attenuation ---
        let mut out_l = 0.0f32;
        let mut out_r = 0.0f32;
        for (i, v) in attenuated.iter().enumerate() {
            if i % 2 == 0 {
                out_l += v;
            } else {
                out_r += v;
            }
        }
        out_l = flush_denormal(out_l * CHANNEL_SCALE);
        out_r = flush_denormal(out_r * CHANNEL_SCALE);

        // --- 5. Unitary feedback mixing, blended by the diffusion amount ---
        let feedback = if self.bypass.matrix || self.diffusion < 0.001 {
            attenuated
        } else if self.diffusion > 0.999 {
            self.matrix.process(&attenuated)
        } else {
            // A linear blend of two unitary operators is not unitary;
            // rescale the blended vector back to the input energy.
            let full_mix = self.matrix.process(&attenuated);

            let mut energy_in = 0.0f32;
            for v in &attenuated {
                energy_in += v * v;
            }

            let mut blended = [0.0f32; NUM_CHANNELS];
            for i in 0..NUM_CHANNELS {
                blended[i] =
                    (1.0 - self.diffusion) * attenuated[i] + self.diffusion * full_mix[i];
            }

            let mut energy_out = 0.0f32;
            for v in &blended {
                energy_out += v * v;
            }

            if energy_in > 1e-10 && energy_out > 1e-10 {
                let norm = sqrtf(energy_in / energy_out);
                for v in &mut blended {
                    *v *= norm;
                }
            }
            blended
        };

        // --- 6. In-loop saturation ---
        let mut processed = feedback;
        if !self.bypass.saturation {
            for (i, slot) in processed.iter_mut().enumerate() {
                *slot = self.saturators[i].process(*slot);
            }
        }

        // --- 7. In-loop tone shaping ---
        if !self.bypass.tone {
            for (i, slot) in processed.iter_mut().enumerate() {
                *slot = self.tones[i].process(*slot);
            }
        }

        // --- 8. Safety limiter ---
        for slot in &mut processed {
            *slot = soft_limit(*slot);
        }

        // --- 9/10. Delay modulation + write-back ---
        let lfo_inc = core::f64::consts::TAU * self.mod_rate as f64 / self.sample_rate;

        for i in 0..NUM_CHANNELS {
            // Glide the applied length toward its target
            self.delay_current[i] +=
                self.delay_smooth_coeff * (self.delay_targets[i] - self.delay_current[i]);

            let modulation = if self.bypass.modulation {
                0.0
            } else {
                let phase_offset =
                    core::f32::consts::TAU * i as f32 / NUM_CHANNELS as f32;
                self.mod_depth
                    * MAX_MOD_SAMPLES
                    * sinf(self.lfo_phase as f32 + phase_offset)
            };

            self.delay_lines[i].set_delay(self.delay_current[i] + modulation);

            // --- 11. Denormal-flushed write of input + feedback ---
            self.delay_lines[i].write(flush_denormal(diffused[i] + processed[i]));
        }

        if !self.bypass.modulation {
            self.lfo_phase += lfo_inc;
            if self.lfo_phase > core::f64::consts::TAU {
                self.lfo_phase -= core::f64::consts::TAU;
            }
        }

        (out_l, out_r)
    }

    /// Silence all internal state without touching parameters.
    ///
    /// Delay lengths snap to their targets (no glide), so the network is
    /// deterministic immediately afterwards.
    pub fn reset(&mut self) {
        for (i, line) in self.delay_lines.iter_mut().enumerate() {
            line.clear();
            self.delay_current[i] = self.delay_targets[i];
            line.set_delay(self.delay_current[i]);
        }
        for filter in &mut self.attenuation {
            filter.reset();
        }
        for sat in &mut self.saturators {
            sat.reset();
        }
        for tone in &mut self.tones {
            tone.reset();
        }
        self.diffuser.reset();
        self.lfo_phase = 0.0;
    }

    /// Maximum block size this instance was configured for.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }

    /// Full reconfiguration for a new sample rate. Must only be called
    /// while the processing path is quiesced; every buffer is rebuilt and
    /// parameters revert to defaults until the next `set_parameters` call.
    pub fn reconfigure(&mut self, sample_rate: f64, max_block_size: usize) {
        *self = Self::new(sample_rate, max_block_size, self.seed);
    }
}

impl Effect for FdnReverb {
    /// Mono convenience entry: feed both channels, return the mid signal.
    fn process(&mut self, input: f32) -> f32 {
        let (l, r) = self.process_sample(input, input);
        (l + r) * 0.5
    }

    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        self.process_sample(left, right)
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.reconfigure(sample_rate as f64, self.max_block_size);
    }

    fn reset(&mut self) {
        FdnReverb::reset(self);
    }
}
