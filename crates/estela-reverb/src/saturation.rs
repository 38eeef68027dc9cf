//! In-loop saturation with four bounded transfer curves.
//!
//! Placed inside the FDN feedback path, so every curve must map bounded
//! input to bounded output. Drive is applied before the curve, an optional
//! asymmetry offset shifts the operating point (producing even harmonics),
//! and a DC blocker removes the resulting offset when asymmetry is active.
//!
//! The curve dispatch is a single match on a tagged enum per sample; the
//! channel count is fixed, so no dynamic dispatch is involved anywhere on
//! the audio path.

use crate::params::SaturationCurve;
use estela_core::{DcBlocker, Effect, db_to_linear};
use libm::tanhf;

/// DC blocker cutoff inside the saturator.
const DC_BLOCK_HZ: f32 = 10.0;

/// Memoryless bounded nonlinearity with drive, blend and asymmetry.
#[derive(Debug, Clone)]
pub struct Saturator {
    /// Wet blend, 0 = bypass .. 1 = fully processed
    amount: f32,
    /// Linear gain applied before the curve
    drive: f32,
    curve: SaturationCurve,
    /// Static DC offset added before the curve (0..0.2)
    asymmetry_offset: f32,
    dc_blocker: DcBlocker,
}

impl Saturator {
    /// Create a saturator for the given sample rate.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            amount: 0.0,
            drive: 1.0,
            curve: SaturationCurve::Warm,
            asymmetry_offset: 0.0,
            dc_blocker: DcBlocker::with_cutoff(sample_rate, DC_BLOCK_HZ),
        }
    }

    /// Update all saturation parameters.
    ///
    /// * `amount_pct` - wet blend in percent (0-100)
    /// * `drive_db` - pre-curve gain in dB
    /// * `curve` - transfer curve variant
    /// * `asymmetry_pct` - 0-100, mapped to a 0-0.2 DC offset
    pub fn set_parameters(
        &mut self,
        amount_pct: f32,
        drive_db: f32,
        curve: SaturationCurve,
        asymmetry_pct: f32,
    ) {
        self.amount = (amount_pct * 0.01).clamp(0.0, 1.0);
        self.drive = db_to_linear(drive_db);
        self.curve = curve;
        self.asymmetry_offset = asymmetry_pct * 0.002;
    }

    /// Apply the selected transfer curve. Every branch is bounded for
    /// bounded input.
    #[inline]
    fn apply_curve(&self, x: f32) -> f32 {
        match self.curve {
            SaturationCurve::Soft => {
                let clamped = x.clamp(-1.0, 1.0);
                1.5 * clamped - 0.5 * clamped * clamped * clamped
            }
            SaturationCurve::Warm => tanhf(x),
            SaturationCurve::Tape => {
                if x >= 0.0 {
                    tanhf(x)
                } else {
                    tanhf(0.8 * x) * 1.25
                }
            }
            SaturationCurve::Tube => {
                if x >= 0.0 {
                    tanhf(1.2 * x)
                } else {
                    tanhf(0.8 * x)
                }
            }
        }
    }
}

impl Effect for Saturator {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        if self.amount < 1e-6 {
            return input; // full bypass fast path
        }

        let driven = input * self.drive + self.asymmetry_offset;
        let saturated = self.apply_curve(driven);

        let result = if self.asymmetry_offset.abs() > 1e-6 {
            self.dc_blocker.process(saturated)
        } else {
            saturated
        };

        (1.0 - self.amount) * input + self.amount * result
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.dc_blocker = DcBlocker::with_cutoff(sample_rate, DC_BLOCK_HZ);
    }

    /// Clear state so zero input yields zero output immediately.
    ///
    /// The DC blocker's input memory is seeded with the curve's response to
    /// the static asymmetry offset; starting from zero instead would leak a
    /// decaying DC transient into the feedback loop after every reset.
    fn reset(&mut self) {
        let steady = self.apply_curve(self.asymmetry_offset);
        self.dc_blocker.preload(steady);
    }
}
