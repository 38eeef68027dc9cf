//! Energy-preserving 8x8 mixing matrix for the feedback network.
//!
//! Built once at construction from the recursive Hadamard doubling
//!
//! ```text
//! H_1 = [1],   H_2k = [ H_k   H_k ]
//!                     [ H_k  -H_k ]
//! ```
//!
//! normalized by 1/sqrt(N) so the transformation is unitary: for any real
//! input vector the output energy equals the input energy to within
//! floating-point rounding. This is the core stability argument of the
//! engine — the feedback loop can run at gains arbitrarily close to 1
//! because the only energy loss around the loop comes from the attenuation
//! filters.
//!
//! Per-channel input/output sign randomization (seeded, deterministic)
//! decorrelates the scattering pattern between instances without affecting
//! energy: a diagonal ±1 matrix is itself unitary.
//!
//! Reference: Schlecht & Habets, "Scattering in Feedback Delay Networks",
//! IEEE/ACM TASLP (2020).

use estela_core::Lcg;

/// Number of network channels. Must be a power of two for the Hadamard
/// construction.
pub const NUM_CHANNELS: usize = 8;

/// Unitary 8x8 Hadamard mixing matrix with sign randomization.
#[derive(Debug, Clone)]
pub struct FeedbackMatrix {
    matrix: [[f32; NUM_CHANNELS]; NUM_CHANNELS],
    input_signs: [f32; NUM_CHANNELS],
    output_signs: [f32; NUM_CHANNELS],
}

impl FeedbackMatrix {
    /// Build the matrix with input/output signs drawn from `seed`.
    pub fn new(seed: u32) -> Self {
        let mut rng = Lcg::new(seed);
        let mut input_signs = [0.0; NUM_CHANNELS];
        let mut output_signs = [0.0; NUM_CHANNELS];
        for i in 0..NUM_CHANNELS {
            input_signs[i] = rng.next_sign();
            output_signs[i] = rng.next_sign();
        }

        Self {
            matrix: hadamard(),
            input_signs,
            output_signs,
        }
    }

    /// Build the matrix with all-positive signs (plain normalized Hadamard).
    ///
    /// Used by the input diffuser, where the per-stage shuffle and polarity
    /// flips already provide decorrelation.
    pub fn plain() -> Self {
        Self {
            matrix: hadamard(),
            input_signs: [1.0; NUM_CHANNELS],
            output_signs: [1.0; NUM_CHANNELS],
        }
    }

    /// Scatter an 8-channel frame through the matrix.
    ///
    /// `output[i] = outSign[i] * Σ_j m[i][j] * inSign[j] * input[j]`
    #[inline]
    pub fn process(&self, input: &[f32; NUM_CHANNELS]) -> [f32; NUM_CHANNELS] {
        let mut signed = [0.0f32; NUM_CHANNELS];
        for j in 0..NUM_CHANNELS {
            signed[j] = self.input_signs[j] * input[j];
        }

        let mut output = [0.0f32; NUM_CHANNELS];
        for i in 0..NUM_CHANNELS {
            let row = &self.matrix[i];
            let mut sum = 0.0;
            for j in 0..NUM_CHANNELS {
                sum += row[j] * signed[j];
            }
            output[i] = self.output_signs[i] * sum;
        }
        output
    }
}

/// Recursive Hadamard construction, normalized to unit row energy.
fn hadamard() -> [[f32; NUM_CHANNELS]; NUM_CHANNELS] {
    let mut h = [[0.0f32; NUM_CHANNELS]; NUM_CHANNELS];
    h[0][0] = 1.0;
    let mut size = 1;
    while size < NUM_CHANNELS {
        for i in 0..size {
            for j in 0..size {
                let val = h[i][j];
                h[i][j + size] = val;
                h[i + size][j] = val;
                h[i + size][j + size] = -val;
            }
        }
        size *= 2;
    }

    let norm = 1.0 / libm::sqrtf(NUM_CHANNELS as f32);
    for row in &mut h {
        for v in row.iter_mut() {
            *v *= norm;
        }
    }
    h
}
