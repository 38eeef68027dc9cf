//! Top-level stereo reverberation engine.
//!
//! Wires the three wet layers in parallel behind a shared pre-delay:
//!
//! ```text
//!          ┌→ early reflections (velvet burst) ─┐
//! input →  pre-delay ─→ FDN core ───────────────┼→ mixer → output
//!          └→ dark velvet tail ─────────────────┘
//! ```
//!
//! The engine is rate-agnostic: callers that want an oversampled FDN run
//! the whole engine at the oversampled rate and down-sample outside — no
//! resampling happens here. All buffers are sized in [`StereoReverb::new`];
//! a sample-rate change is a full reconfiguration performed while the
//! caller has quiesced the processing path. No allocation, locking or I/O
//! happens anywhere in `process_block`.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec;
use alloc::vec::Vec;

use crate::fdn::FdnReverb;
use crate::mixer::StreamMixer;
use crate::params::{ReverbParams, StageBypass};
use crate::velvet::{DarkVelvetTail, EarlyReflections};
use estela_core::{Effect, FractionalDelay, SmoothedParam, ms_to_samples};

/// Maximum pre-delay in milliseconds.
const MAX_PRE_DELAY_MS: f32 = 100.0;

/// Complete reverberation engine: pre-delay, early/late/tail streams, and
/// the output mixer.
///
/// # Example
///
/// ```rust
/// use estela_reverb::{ReverbParams, StageBypass, StereoReverb};
///
/// let mut reverb = StereoReverb::new(48000.0, 512, 0x5EED);
/// reverb.set_parameters(&ReverbParams::default(), &StageBypass::default());
///
/// let input = vec![0.0f32; 512];
/// let mut out_l = vec![0.0f32; 512];
/// let mut out_r = vec![0.0f32; 512];
/// reverb.process_block(&input, &input, &mut out_l, &mut out_r);
/// ```
pub struct StereoReverb {
    sample_rate: f64,
    max_block_size: usize,
    seed: u32,

    pre_delay_l: FractionalDelay,
    pre_delay_r: FractionalDelay,
    pre_delay_samples: SmoothedParam,

    early_l: EarlyReflections,
    early_r: EarlyReflections,
    fdn: FdnReverb,
    tail_l: DarkVelvetTail,
    tail_r: DarkVelvetTail,
    mixer: StreamMixer,

    bypass: StageBypass,

    // Scratch buffers, sized once for max_block_size
    pre_buf_l: Vec<f32>,
    pre_buf_r: Vec<f32>,
    early_buf_l: Vec<f32>,
    early_buf_r: Vec<f32>,
    tail_buf_l: Vec<f32>,
    tail_buf_r: Vec<f32>,
}

impl StereoReverb {
    /// Build the engine for a sample rate and maximum block size.
    ///
    /// The per-channel velvet sequences use seeds derived from `seed`, so
    /// left and right decorrelate while the whole instance stays
    /// reproducible: two engines built from the same seed are
    /// sample-identical.
    pub fn new(sample_rate: f64, max_block_size: usize, seed: u32) -> Self {
        assert!(max_block_size > 0, "Block size must be > 0");

        let sr = sample_rate as f32;
        let max_pre_delay = ms_to_samples(MAX_PRE_DELAY_MS, sr).ceil() as usize;

        let mut engine = Self {
            sample_rate,
            max_block_size,
            seed,
            pre_delay_l: FractionalDelay::new(max_pre_delay),
            pre_delay_r: FractionalDelay::new(max_pre_delay),
            pre_delay_samples: SmoothedParam::with_config(
                ms_to_samples(12.0, sr),
                sr,
                50.0,
            ),
            early_l: EarlyReflections::new(sample_rate, max_block_size, seed),
            early_r: EarlyReflections::new(sample_rate, max_block_size, seed ^ 0x9E37_79B9),
            fdn: FdnReverb::new(sample_rate, max_block_size, seed),
            tail_l: DarkVelvetTail::new(sample_rate, max_block_size, seed ^ 0x85EB_CA6B),
            tail_r: DarkVelvetTail::new(sample_rate, max_block_size, seed ^ 0xC2B2_AE35),
            mixer: StreamMixer::new(sr),
            bypass: StageBypass::default(),
            pre_buf_l: vec![0.0; max_block_size],
            pre_buf_r: vec![0.0; max_block_size],
            early_buf_l: vec![0.0; max_block_size],
            early_buf_r: vec![0.0; max_block_size],
            tail_buf_l: vec![0.0; max_block_size],
            tail_buf_r: vec![0.0; max_block_size],
        };

        engine.set_parameters(&ReverbParams::default(), &StageBypass::default());
        engine
    }

    /// Push a parameter snapshot into every stage.
    ///
    /// May be called at any rate; the engine keeps no parameter history.
    pub fn set_parameters(&mut self, params: &ReverbParams, bypass: &StageBypass) {
        self.bypass = *bypass;

        let sr = self.sample_rate as f32;
        let pre_ms = params.pre_delay_ms.clamp(0.0, MAX_PRE_DELAY_MS);
        self.pre_delay_samples.set_target(ms_to_samples(pre_ms, sr));

        self.fdn.set_parameters(params, bypass);

        self.tail_l
            .set_parameters(params.decay_shape_pct, params.low_rt60_s);
        self.tail_r
            .set_parameters(params.decay_shape_pct, params.low_rt60_s);

        self.mixer.set_parameters(
            params.dry_wet_pct,
            params.early_level_db,
            params.late_level_db,
            params.stereo_width_pct,
        );
    }

    /// Process one block of stereo audio.
    ///
    /// All four slices must share a length no greater than the configured
    /// maximum block size.
    pub fn process_block(
        &mut self,
        input_l: &[f32],
        input_r: &[f32],
        output_l: &mut [f32],
        output_r: &mut [f32],
    ) {
        let len = input_l.len();
        assert!(len <= self.max_block_size, "block exceeds configured maximum");
        assert!(
            input_r.len() == len && output_l.len() == len && output_r.len() == len,
            "channel buffers must share one length"
        );

        // Pre-delay feeds every wet layer; the dry path stays un-delayed
        for i in 0..len {
            let delay = self.pre_delay_samples.advance();
            self.pre_delay_l.set_delay(delay);
            self.pre_delay_r.set_delay(delay);
            self.pre_buf_l[i] = self.pre_delay_l.read_write(input_l[i]);
            self.pre_buf_r[i] = self.pre_delay_r.read_write(input_r[i]);
        }

        // Early reflections (sparse FIR, block-based)
        if self.bypass.early {
            self.early_buf_l[..len].fill(0.0);
            self.early_buf_r[..len].fill(0.0);
        } else {
            self.early_l
                .process(&self.pre_buf_l[..len], &mut self.early_buf_l[..len], 1.0);
            self.early_r
                .process(&self.pre_buf_r[..len], &mut self.early_buf_r[..len], 1.0);
        }

        // Dark velvet tail (sparse FIR, block-based)
        if self.bypass.tail {
            self.tail_buf_l[..len].fill(0.0);
            self.tail_buf_r[..len].fill(0.0);
        } else {
            self.tail_l
                .process(&self.pre_buf_l[..len], &mut self.tail_buf_l[..len], 1.0);
            self.tail_r
                .process(&self.pre_buf_r[..len], &mut self.tail_buf_r[..len], 1.0);
        }

        // FDN core (per-sample) + final mix
        for i in 0..len {
            let (late_l, late_r) = if self.bypass.late {
                (0.0, 0.0)
            } else {
                self.fdn.process_sample(self.pre_buf_l[i], self.pre_buf_r[i])
            };

            let (l, r) = self.mixer.process(
                input_l[i],
                input_r[i],
                self.early_buf_l[i],
                self.early_buf_r[i],
                late_l,
                late_r,
                self.tail_buf_l[i],
                self.tail_buf_r[i],
            );
            output_l[i] = l;
            output_r[i] = r;
        }
    }

    /// Silence all internal state without reconfiguring.
    pub fn reset(&mut self) {
        self.pre_delay_l.clear();
        self.pre_delay_r.clear();
        self.pre_delay_samples.snap_to_target();
        self.early_l.reset();
        self.early_r.reset();
        self.fdn.reset();
        self.tail_l.reset();
        self.tail_r.reset();
        self.mixer.reset();
    }

    /// Full reconfiguration for a new sample rate; the caller must have
    /// quiesced the processing path. Parameters revert to defaults until
    /// the next `set_parameters` call.
    pub fn reconfigure(&mut self, sample_rate: f64, max_block_size: usize) {
        *self = Self::new(sample_rate, max_block_size, self.seed);
    }

    /// The configured sample rate in Hz.
    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    /// The configured maximum block size in samples.
    pub fn max_block_size(&self) -> usize {
        self.max_block_size
    }
}

impl Effect for StereoReverb {
    /// Mono convenience entry: feed both channels, return the mid signal.
    fn process(&mut self, input: f32) -> f32 {
        let (l, r) = self.process_stereo(input, input);
        (l + r) * 0.5
    }

    fn process_stereo(&mut self, left: f32, right: f32) -> (f32, f32) {
        let mut out_l = [0.0f32];
        let mut out_r = [0.0f32];
        self.process_block(&[left], &[right], &mut out_l, &mut out_r);
        (out_l[0], out_r[0])
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.reconfigure(sample_rate as f64, self.max_block_size);
    }

    fn reset(&mut self) {
        StereoReverb::reset(self);
    }

    fn latency_samples(&self) -> usize {
        self.pre_delay_samples.get() as usize
    }
}
