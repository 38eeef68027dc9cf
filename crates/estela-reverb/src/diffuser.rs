//! Multi-channel input diffuser.
//!
//! Four cascaded stages, each consisting of per-channel delays with
//! distinct pseudo-random lengths, a channel shuffle with polarity flips,
//! and a Hadamard mix. A single impulse entering the cascade leaves as up
//! to 8^4 = 4096 micro-echoes, giving the reverb immediate perceptual
//! density independent of the feedback loop's own density buildup.
//!
//! Stage windows double from 5 ms to 40 ms so echoes spread instead of
//! clustering; each channel draws its delay from its own eighth of the
//! stage window to keep the scatter even.
//!
//! Reference: Geraint Luff ("Signalsmith"), "Let's Write a Reverb" (2021).

use crate::matrix::{FeedbackMatrix, NUM_CHANNELS};
use estela_core::{FractionalDelay, Lcg};

/// Number of cascaded diffusion stages.
pub const NUM_STAGES: usize = 4;

/// Per-stage delay windows in milliseconds.
const STAGE_WINDOWS_MS: [f32; NUM_STAGES] = [5.0, 10.0, 20.0, 40.0];

/// One diffusion stage: delays, shuffle, polarity, mix.
#[derive(Debug, Clone)]
struct DiffusionStage {
    delays: [FractionalDelay; NUM_CHANNELS],
    delay_samples: [usize; NUM_CHANNELS],
    /// Output channel i reads from input channel shuffle[i]
    shuffle: [usize; NUM_CHANNELS],
    flip_sign: [f32; NUM_CHANNELS],
}

/// Four-stage diffusion cascade over 8 channels.
#[derive(Debug, Clone)]
pub struct InputDiffuser {
    stages: [DiffusionStage; NUM_STAGES],
    hadamard: FeedbackMatrix,
}

impl InputDiffuser {
    /// Build the cascade for the given sample rate.
    ///
    /// Delay lengths, shuffle orders and polarity flips are all derived
    /// from `seed`; the same seed reproduces the same echo pattern.
    pub fn new(sample_rate: f64, seed: u32) -> Self {
        let mut rng = Lcg::new(seed);

        let stages = core::array::from_fn(|step| {
            let window_samples = STAGE_WINDOWS_MS[step] * 0.001 * sample_rate as f32;

            let mut delay_samples = [0usize; NUM_CHANNELS];
            for (ch, slot) in delay_samples.iter_mut().enumerate() {
                // Each channel draws from its own sub-range of the window
                let lo = window_samples * ch as f32 / NUM_CHANNELS as f32;
                let hi = window_samples * (ch + 1) as f32 / NUM_CHANNELS as f32;
                let t = rng.next_unit();
                *slot = ((lo + t * (hi - lo)) as usize).max(1);
            }

            let delays = core::array::from_fn(|ch| FractionalDelay::new(delay_samples[ch]));

            let mut shuffle = [0usize; NUM_CHANNELS];
            let mut flip_sign = [0.0f32; NUM_CHANNELS];
            for ch in 0..NUM_CHANNELS {
                shuffle[ch] = (ch + step + 1) % NUM_CHANNELS;
                flip_sign[ch] = rng.next_sign();
            }

            DiffusionStage {
                delays,
                delay_samples,
                shuffle,
                flip_sign,
            }
        });

        Self {
            stages,
            hadamard: FeedbackMatrix::plain(),
        }
    }

    /// Run one 8-channel frame through all four stages.
    #[inline]
    pub fn process_sample(&mut self, input: &[f32; NUM_CHANNELS]) -> [f32; NUM_CHANNELS] {
        let mut current = *input;

        for stage in &mut self.stages {
            // 1. Per-channel delay (fixed integer taps)
            let mut delayed = [0.0f32; NUM_CHANNELS];
            for ch in 0..NUM_CHANNELS {
                stage.delays[ch].write(current[ch]);
                delayed[ch] = stage.delays[ch].read_integer(stage.delay_samples[ch]);
            }

            // 2. Shuffle + polarity flip
            let mut shuffled = [0.0f32; NUM_CHANNELS];
            for ch in 0..NUM_CHANNELS {
                shuffled[ch] = stage.flip_sign[ch] * delayed[stage.shuffle[ch]];
            }

            // 3. Hadamard mix
            current = self.hadamard.process(&shuffled);
        }

        current
    }

    /// Zero every stage's delay memory.
    pub fn reset(&mut self) {
        for stage in &mut self.stages {
            for delay in &mut stage.delays {
                delay.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn impulse_response(diffuser: &mut InputDiffuser, len: usize) -> Vec<[f32; NUM_CHANNELS]> {
        let mut out = Vec::with_capacity(len);
        let mut frame = [0.0f32; NUM_CHANNELS];
        frame[0] = 1.0;
        out.push(diffuser.process_sample(&frame));
        for _ in 1..len {
            out.push(diffuser.process_sample(&[0.0; NUM_CHANNELS]));
        }
        out
    }

    #[test]
    fn impulse_becomes_dense() {
        let mut diffuser = InputDiffuser::new(48000.0, 0xBAADF00D);
        let response = impulse_response(&mut diffuser, 4000);

        // Count samples with any energy across the cascade's ~75 ms spread
        let active = response
            .iter()
            .filter(|frame| frame.iter().any(|v| v.abs() > 1e-6))
            .count();
        assert!(
            active > 100,
            "diffuser should densify a single impulse, only {active} active samples"
        );
    }

    #[test]
    fn energy_is_roughly_preserved() {
        // Delays, shuffles and sign flips are lossless; the Hadamard is
        // unitary, so the total impulse-response energy stays ~1
        let mut diffuser = InputDiffuser::new(48000.0, 0xBAADF00D);
        let response = impulse_response(&mut diffuser, 8000);

        let energy: f32 = response
            .iter()
            .map(|frame| frame.iter().map(|v| v * v).sum::<f32>())
            .sum();
        assert!(
            (energy - 1.0).abs() < 0.05,
            "diffusion cascade should preserve energy, got {energy}"
        );
    }

    #[test]
    fn deterministic_for_seed() {
        let mut a = InputDiffuser::new(48000.0, 1234);
        let mut b = InputDiffuser::new(48000.0, 1234);
        let ra = impulse_response(&mut a, 1000);
        let rb = impulse_response(&mut b, 1000);
        assert_eq!(ra, rb);
    }

    #[test]
    fn reset_silences() {
        let mut diffuser = InputDiffuser::new(48000.0, 99);
        for _ in 0..1000 {
            diffuser.process_sample(&[1.0; NUM_CHANNELS]);
        }
        diffuser.reset();

        for _ in 0..4000 {
            let out = diffuser.process_sample(&[0.0; NUM_CHANNELS]);
            assert!(out.iter().all(|v| v.abs() < 1e-10));
        }
    }
}
