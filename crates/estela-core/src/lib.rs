//! Estela Core - DSP primitives for the estela reverberation engine
//!
//! This crate provides the foundational building blocks the reverb engine is
//! assembled from, designed for real-time audio processing with zero
//! allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Effect System
//!
//! - [`Effect`] - Object-safe trait for all audio processors
//!
//! ## Parameter Smoothing
//!
//! Zipper-free parameter changes for click-free automation:
//!
//! - [`SmoothedParam`] - Exponential smoothing (RC-like response)
//!
//! ## Filters
//!
//! - [`OnePole`] - One-pole lowpass for tone controls and damping
//! - [`DcBlocker`] - First-order highpass for DC removal
//!
//! ## Delay Lines
//!
//! - [`FractionalDelay`] - Circular buffer with third-order Lagrange
//!   interpolated fractional-length reads
//!
//! ## Utilities
//!
//! - [`Lcg`] - Deterministic linear congruential generator for reproducible
//!   pseudo-random sequences (pulse trains, sign vectors, delay scattering)
//! - Math functions: [`db_to_linear`], [`linear_to_db`], [`flush_denormal`],
//!   etc.
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded audio applications.
//! Disable the default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! estela-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: No allocations in audio processing paths; buffers
//!   are sized once at construction
//! - **No dependencies on std**: Pure `no_std` with `libm` for math
//! - **Deterministic**: All pseudo-random state is explicitly seeded — two
//!   instances built from the same seed behave identically

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod dc_blocker;
pub mod delay;
pub mod effect;
pub mod math;
pub mod one_pole;
pub mod param;
pub mod rng;

// Re-export main types at crate root
pub use dc_blocker::DcBlocker;
pub use delay::FractionalDelay;
pub use effect::Effect;
pub use math::{
    db_to_linear, flush_denormal, lerp, linear_to_db, ms_to_samples, samples_to_ms, wet_dry_mix,
};
pub use one_pole::OnePole;
pub use param::SmoothedParam;
pub use rng::Lcg;
