//! Post-saturation tone tilt filter.
//!
//! A one-pole lowpass blended into the dry path. Negative tone settings
//! crossfade toward the lowpass output (dark); positive settings subtract a
//! fraction of the lowpass output from the dry signal (bright tilt).
//!
//! Because this filter sits inside the feedback loop its magnitude response
//! must never exceed unity at any frequency:
//!
//! - dark:   `y = (1-b)·x + b·lp`  → DC gain 1, Nyquist gain 1-b
//! - bright: `y = x - 0.5·t·lp`    → DC gain 1-0.5t, Nyquist gain ~1
//!
//! Both are convex combinations whose extremes stay at or below 1, so the
//! response is bounded by 1 everywhere in between.

use estela_core::{Effect, OnePole};

/// Tone tilt filter with a -1..+1 dark/bright control.
#[derive(Debug, Clone)]
pub struct ToneShaper {
    sample_rate: f32,
    /// Signed tone amount, -1 (dark) .. +1 (bright)
    tone: f32,
    lowpass: OnePole,
    active: bool,
}

impl ToneShaper {
    /// Create a flat (inactive) tone shaper.
    pub fn new(sample_rate: f32) -> Self {
        Self {
            sample_rate,
            tone: 0.0,
            lowpass: OnePole::new(sample_rate, 8000.0),
            active: false,
        }
    }

    /// Set the tone tilt in percent, -100 (dark) to +100 (bright).
    ///
    /// The lowpass corner tracks the setting: the dark side sweeps
    /// 8 kHz down to 1 kHz, the bright side 8 kHz down to 4 kHz. Settings
    /// within 1% of flat disable the filter entirely.
    pub fn set_tone(&mut self, tone_pct: f32) {
        self.tone = (tone_pct * 0.01).clamp(-1.0, 1.0);

        if self.tone.abs() < 0.01 {
            self.active = false;
            return;
        }
        self.active = true;

        let freq = if self.tone < 0.0 {
            1000.0 + (1.0 + self.tone) * 7000.0 // 1 kHz .. 8 kHz
        } else {
            8000.0 - self.tone * 4000.0 // 8 kHz .. 4 kHz
        };

        let w = core::f32::consts::TAU * freq / self.sample_rate;
        self.lowpass.set_coeff_raw(w / (1.0 + w));
    }

    /// Current signed tone amount.
    pub fn tone(&self) -> f32 {
        self.tone
    }
}

impl Effect for ToneShaper {
    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        if !self.active {
            return input;
        }

        let lp = self.lowpass.process(input);

        if self.tone < 0.0 {
            // Dark: crossfade toward the lowpass
            let blend = -self.tone;
            (1.0 - blend) * input + blend * lp
        } else {
            // Bright: remove low-frequency weight instead of boosting highs,
            // keeping the response at or below unity everywhere
            input - 0.5 * self.tone * lp
        }
    }

    fn set_sample_rate(&mut self, sample_rate: f32) {
        self.sample_rate = sample_rate;
        self.lowpass.set_sample_rate(sample_rate);
        self.set_tone(self.tone * 100.0);
    }

    fn reset(&mut self) {
        self.lowpass.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gain_at(shaper: &mut ToneShaper, freq: f32, sample_rate: f32) -> f32 {
        shaper.reset();
        let mut peak = 0.0f32;
        for i in 0..48000 {
            let x = libm::sinf(core::f32::consts::TAU * freq * i as f32 / sample_rate);
            let y = shaper.process(x);
            if i > 24000 {
                peak = peak.max(y.abs());
            }
        }
        peak
    }

    #[test]
    fn flat_setting_is_identity() {
        let mut shaper = ToneShaper::new(48000.0);
        shaper.set_tone(0.0);
        for i in 0..100 {
            let x = (i as f32 - 50.0) / 50.0;
            assert_eq!(shaper.process(x), x);
        }
    }

    #[test]
    fn dark_attenuates_highs() {
        let mut shaper = ToneShaper::new(48000.0);
        shaper.set_tone(-100.0);

        let low = gain_at(&mut shaper, 200.0, 48000.0);
        let high = gain_at(&mut shaper, 10000.0, 48000.0);
        assert!(
            high < low * 0.7,
            "dark setting should roll off highs: low={low}, high={high}"
        );
    }

    #[test]
    fn bright_attenuates_lows() {
        let mut shaper = ToneShaper::new(48000.0);
        shaper.set_tone(100.0);

        let low = gain_at(&mut shaper, 200.0, 48000.0);
        let high = gain_at(&mut shaper, 15000.0, 48000.0);
        assert!(
            low < high,
            "bright setting should tilt toward highs: low={low}, high={high}"
        );
    }

    #[test]
    fn magnitude_never_exceeds_unity() {
        for tone in [-100.0, -50.0, -10.0, 10.0, 50.0, 100.0] {
            let mut shaper = ToneShaper::new(48000.0);
            shaper.set_tone(tone);
            for freq in [50.0, 500.0, 2000.0, 8000.0, 16000.0, 22000.0] {
                let g = gain_at(&mut shaper, freq, 48000.0);
                assert!(
                    g <= 1.001,
                    "tone {tone}%: gain {g} at {freq} Hz exceeds unity"
                );
            }
        }
    }

    #[test]
    fn reset_clears_filter_state() {
        let mut shaper = ToneShaper::new(48000.0);
        shaper.set_tone(-80.0);
        for _ in 0..100 {
            shaper.process(1.0);
        }
        shaper.reset();
        // After reset the lowpass state is zero; a zero input gives zero
        assert_eq!(shaper.process(0.0), 0.0);
    }
}
