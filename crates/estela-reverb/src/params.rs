//! Parameter schema for the reverberation engine.
//!
//! All callers use the same flat [`ReverbParams`] struct; the engine reads
//! plain values from it at whatever rate the caller pushes updates. There is
//! no parameter history or queueing — the last call wins.

/// Saturation transfer curve selector.
///
/// All four curves are bounded for bounded input, which is what allows the
/// saturator to sit inside the feedback loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaturationCurve {
    /// Cubic polynomial soft clip: `1.5x - 0.5x³` on input clamped to ±1.
    Soft,
    /// Hyperbolic tangent. The default recommendation.
    #[default]
    Warm,
    /// Tape-style asymmetry: `tanh(x)` positive side, `1.25·tanh(0.8x)`
    /// negative side.
    Tape,
    /// Tube-style asymmetry: `tanh(1.2x)` positive side, `tanh(0.8x)`
    /// negative side — even-order harmonics.
    Tube,
}

impl SaturationCurve {
    /// Curve from a stable index (0..=3), clamping out-of-range values.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Self::Soft,
            2 => Self::Tape,
            3 => Self::Tube,
            _ => Self::Warm,
        }
    }
}

/// Per-stage bypass switches.
///
/// Each pipeline stage can be disabled independently without reallocating
/// any state, for debugging and component isolation. In-loop stages
/// substitute an identity mapping; the stream generators (early, tail, and
/// the late FDN stream) contribute silence to the mixer instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct StageBypass {
    /// Skip the early-reflection velvet stream.
    pub early: bool,
    /// Skip the late FDN stream.
    pub late: bool,
    /// Skip the dark-velvet tail stream.
    pub tail: bool,
    /// Attenuation filters become pass-through (infinite decay guard stays
    /// off — use with care).
    pub attenuation: bool,
    /// Feedback mixing matrix becomes pass-through (parallel delay lines).
    pub matrix: bool,
    /// In-loop saturators become pass-through.
    pub saturation: bool,
    /// In-loop tone shapers become pass-through.
    pub tone: bool,
    /// Delay-length modulation is frozen at the target lengths.
    pub modulation: bool,
}

/// Flat user-facing parameter set.
///
/// Defaults follow the shipped plugin layout: a medium room with a 2.5 s
/// low-band decay, moderate damping and diffusion, subtle modulation and no
/// saturation.
#[derive(Debug, Clone, Copy)]
pub struct ReverbParams {
    /// Dry/wet mix in percent (0 = dry only, 100 = wet only).
    pub dry_wet_pct: f32,
    /// Pre-delay before any reverberation, in milliseconds (0-100).
    pub pre_delay_ms: f32,
    /// Early-reflection stream level in dB.
    pub early_level_db: f32,
    /// Late (FDN + tail) stream level in dB.
    pub late_level_db: f32,
    /// Room size scale applied to the FDN delay lengths (0.1-1.0).
    pub room_size: f32,
    /// Stereo width in percent (0 = mono, 100 = unchanged sides).
    pub stereo_width_pct: f32,
    /// Low-band RT60 in seconds.
    pub low_rt60_s: f32,
    /// High-band RT60 in seconds.
    pub high_rt60_s: f32,
    /// High-frequency damping in percent; maps exponentially to the
    /// attenuation crossover (0% → 20 kHz, 100% → 500 Hz).
    pub hf_damping_pct: f32,
    /// Feedback-matrix blend in percent (0 = parallel lines, 100 = full
    /// unitary mixing).
    pub diffusion_pct: f32,
    /// Tail decay shape in percent: 0 = single exponential slope, 100 =
    /// fully weighted toward the slower second slope.
    pub decay_shape_pct: f32,
    /// Saturation blend in percent (0 bypasses the curve entirely).
    pub sat_amount_pct: f32,
    /// Saturation drive in dB applied before the curve.
    pub sat_drive_db: f32,
    /// Saturation transfer curve.
    pub sat_curve: SaturationCurve,
    /// Post-saturation tone tilt in percent (-100 dark .. +100 bright).
    pub sat_tone_pct: f32,
    /// Saturation asymmetry in percent (0-100 → DC offset 0-0.2).
    pub sat_asymmetry_pct: f32,
    /// Delay modulation depth in percent of the maximum excursion.
    pub mod_depth_pct: f32,
    /// Delay modulation rate in Hz.
    pub mod_rate_hz: f32,
}

impl Default for ReverbParams {
    fn default() -> Self {
        Self {
            dry_wet_pct: 30.0,
            pre_delay_ms: 12.0,
            early_level_db: -3.0,
            late_level_db: -6.0,
            room_size: 0.6,
            stereo_width_pct: 70.0,
            low_rt60_s: 2.5,
            high_rt60_s: 1.4,
            hf_damping_pct: 65.0,
            diffusion_pct: 80.0,
            decay_shape_pct: 40.0,
            sat_amount_pct: 0.0,
            sat_drive_db: 6.0,
            sat_curve: SaturationCurve::Warm,
            sat_tone_pct: 0.0,
            sat_asymmetry_pct: 0.0,
            mod_depth_pct: 15.0,
            mod_rate_hz: 0.5,
        }
    }
}
