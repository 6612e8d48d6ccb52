//! Residual coefficient bit-cost estimation for VP8 rate-distortion search.
//!
//! Given a 4x4 block of quantized coefficients in zigzag order, this crate
//! answers how many bits (in 1/256 bit units) the boolean entropy coder would
//! spend on it, starting from a given context. Mode and quantizer search call
//! this for every candidate of every block, so both the last-nonzero scan and
//! the cost walk have SIMD backends selected at runtime.
//!
//! # Features
//!
//! - `std` (default): Standard library support.
//! - `simd` (default): SSE2 backend on x86_64, selected by CPU detection.
//!
//! # Example
//!
//! ```rust
//! use zenresidual::{uniform_token_probs, CoeffType, CostBackend, LevelCosts, ResidualCoster};
//!
//! let probs = uniform_token_probs(128);
//! let costs = LevelCosts::from_probs(&probs);
//! let tables = costs.residual_tables(CoeffType::I4, &probs);
//!
//! let backend = CostBackend::global();
//! let mut levels = [0i32; 16];
//! levels[0] = 3;
//! levels[4] = -1;
//! let res = backend.residual(&levels, 0);
//! assert_eq!(res.last, 4);
//! let bits = backend.residual_cost(0, &res, &tables);
//! assert!(bits > 0);
//! ```
//!
//! # Safety
//!
//! This crate uses `#![forbid(unsafe_code)]`. With the `simd` feature the
//! kernels rely on [`archmage`] capability tokens, whose `#[arcane]` macro
//! generates the `unsafe` target-feature calls internally.
//!
//! [`archmage`]: https://docs.rs/archmage

#![cfg_attr(not(feature = "std"), no_std)]
// Forbid unsafe unless the "unchecked" feature enables it
#![cfg_attr(not(feature = "unchecked"), forbid(unsafe_code))]
#![deny(missing_docs)]

extern crate alloc;
#[cfg(all(test, not(feature = "std")))]
extern crate std;

/// Macroblock-level cost helpers
pub mod block_cost;
pub mod cost;
mod dispatch;
mod error;
/// Last-nonzero scan and residual cost
pub mod residual_cost;
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
mod simd_sse;
pub mod tables;

pub use block_cost::{cost_luma16, cost_luma4, cost_uv, BlockCostTables, NonZeroContext};
pub use cost::{
    bit_cost, token_probs_from_slice, uniform_token_probs, BandProbas, LevelCosts,
    TokenProbTables,
};
pub use dispatch::{find_last, get_residual_cost, BackendPolicy, CostBackend};
pub use error::CostError;
pub use residual_cost::{
    CoeffType, Residual, ResidualCoster, ResidualTables, ScalarCoster,
};
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
pub use simd_sse::Sse2Coster;
