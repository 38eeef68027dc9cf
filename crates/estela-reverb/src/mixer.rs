//! Final mixing of the dry, early, late and tail streams.
//!
//! Sums the three wet streams with independent early/late gains, applies
//! mid/side stereo-width scaling, blends with the dry signal, and passes
//! the result through a soft-clip safety stage. The clip polynomial
//! `x - x³/6.75` is the identity near zero and reaches ±1 at |x| = 1.5;
//! inputs beyond that are pinned to ±1. Below the knee the mixer is exactly
//! linear, so the safety net is inaudible until something actually goes
//! wrong upstream.

use estela_core::{SmoothedParam, db_to_linear, flush_denormal};

/// Four-stream stereo mixer with width control and output protection.
#[derive(Debug, Clone)]
pub struct StreamMixer {
    /// Dry fraction (1 - wet)
    dry: SmoothedParam,
    /// Wet fraction
    wet: SmoothedParam,
    /// Early-reflection stream gain (linear)
    early_gain: SmoothedParam,
    /// Late + tail stream gain (linear)
    late_gain: SmoothedParam,
    /// Side-channel scale, 0 = mono .. 1 = unchanged
    stereo_width: SmoothedParam,
}

impl StreamMixer {
    /// Create a mixer with the default balance.
    pub fn new(sample_rate: f32) -> Self {
        let cfg = |initial| SmoothedParam::with_config(initial, sample_rate, 10.0);
        Self {
            dry: cfg(0.7),
            wet: cfg(0.3),
            early_gain: cfg(db_to_linear(-3.0)),
            late_gain: cfg(db_to_linear(-6.0)),
            stereo_width: cfg(0.7),
        }
    }

    /// Update the mix balance.
    pub fn set_parameters(
        &mut self,
        dry_wet_pct: f32,
        early_level_db: f32,
        late_level_db: f32,
        stereo_width_pct: f32,
    ) {
        let wet = (dry_wet_pct * 0.01).clamp(0.0, 1.0);
        self.wet.set_target(wet);
        self.dry.set_target(1.0 - wet);
        self.early_gain.set_target(db_to_linear(early_level_db));
        self.late_gain.set_target(db_to_linear(late_level_db));
        self.stereo_width
            .set_target((stereo_width_pct * 0.01).clamp(0.0, 1.0));
    }

    /// Combine one stereo frame of all four streams.
    ///
    /// The tail is summed with the late stream before the late gain, so
    /// both halves of the late field move together.
    #[inline]
    #[allow(clippy::too_many_arguments)]
    pub fn process(
        &mut self,
        dry_l: f32,
        dry_r: f32,
        early_l: f32,
        early_r: f32,
        late_l: f32,
        late_r: f32,
        tail_l: f32,
        tail_r: f32,
    ) -> (f32, f32) {
        let dry = self.dry.advance();
        let wet = self.wet.advance();
        let early_gain = self.early_gain.advance();
        let late_gain = self.late_gain.advance();
        let width = self.stereo_width.advance();

        let mut wet_l = early_gain * early_l + late_gain * (late_l + tail_l);
        let mut wet_r = early_gain * early_r + late_gain * (late_r + tail_r);

        // Mid/side width
        let mid = (wet_l + wet_r) * 0.5;
        let side = (wet_l - wet_r) * 0.5;
        wet_l = mid + side * width;
        wet_r = mid - side * width;

        let out_l = soft_clip(dry * dry_l + wet * wet_l);
        let out_r = soft_clip(dry * dry_r + wet * wet_r);

        (flush_denormal(out_l), flush_denormal(out_r))
    }

    /// Snap all smoothed levels to their targets.
    pub fn reset(&mut self) {
        self.dry.snap_to_target();
        self.wet.snap_to_target();
        self.early_gain.snap_to_target();
        self.late_gain.snap_to_target();
        self.stereo_width.snap_to_target();
    }
}

/// Cubic soft clip: linear-ish below the knee, ±1 ceiling beyond |x| = 1.5.
#[inline]
fn soft_clip(x: f32) -> f32 {
    if x > 1.5 {
        1.0
    } else if x < -1.5 {
        -1.0
    } else {
        x - (x * x * x) / 6.75
    }
}
