//! Estela Reverb - a layered feedback-delay-network reverberation engine
//!
//! Three wet layers run in parallel behind a shared pre-delay and meet in a
//! final mixer:
//!
//! - [`EarlyReflections`] - a short, dense velvet-noise burst (sparse FIR)
//! - [`FdnReverb`] - an 8-channel feedback delay network with input
//!   diffusion, frequency-dependent decay, optional in-loop saturation and
//!   tone shaping, and modulated delay lengths
//! - [`DarkVelvetTail`] - a long dark-velvet sparse FIR with a tunable
//!   double-slope (non-exponential) decay
//!
//! [`StereoReverb`] wires the layers together; [`ReverbParams`] is the flat
//! parameter set shared by all callers, and every pipeline stage can be
//! switched off independently through [`StageBypass`].
//!
//! # Stability
//!
//! The engine is designed to run indefinitely without blow-up under
//! arbitrary parameter automation. The feedback matrix is unitary, the
//! attenuation gains are hard-clamped below 1, the in-loop nonlinearities
//! are bounded, and a soft limiter plus denormal flushing guard the loop
//! against the residue. Out-of-range parameters are clamped, never
//! reported: the only failure mode is correctly bounded but potentially
//! unmusical output.
//!
//! # Example
//!
//! ```rust
//! use estela_reverb::{ReverbParams, StageBypass, StereoReverb};
//!
//! let mut reverb = StereoReverb::new(48000.0, 512, 0x5EED);
//!
//! let params = ReverbParams {
//!     dry_wet_pct: 40.0,
//!     low_rt60_s: 3.0,
//!     ..ReverbParams::default()
//! };
//! reverb.set_parameters(&params, &StageBypass::default());
//!
//! let input = vec![0.0f32; 512];
//! let mut out_l = vec![0.0f32; 512];
//! let mut out_r = vec![0.0f32; 512];
//! reverb.process_block(&input, &input, &mut out_l, &mut out_r);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod attenuation;
pub mod diffuser;
pub mod engine;
pub mod fdn;
pub mod matrix;
pub mod mixer;
pub mod params;
pub mod saturation;
pub mod tone;
pub mod velvet;

// Re-export main types at crate root
pub use attenuation::{ShelvingAttenuation, rt60_gain};
pub use diffuser::InputDiffuser;
pub use engine::StereoReverb;
pub use fdn::FdnReverb;
pub use matrix::{FeedbackMatrix, NUM_CHANNELS};
pub use mixer::StreamMixer;
pub use params::{ReverbParams, SaturationCurve, StageBypass};
pub use saturation::Saturator;
pub use tone::ToneShaper;
pub use velvet::{DarkVelvetTail, EarlyReflections, VelvetPulse, VelvetSequence};
