//! Runtime selection of the residual cost backend.
//!
//! Detection runs once per process and the result is cached in a single
//! `AtomicU8`. Concurrent first callers may all run detection; each one
//! computes the same answer from the same CPU and stores the same byte, so
//! whichever store lands last is indistinguishable from the first. No lock is
//! taken, and a reader sees either "not yet detected" or a complete selection.

use core::fmt;
use core::str::FromStr;
use core::sync::atomic::{AtomicU8, Ordering};

use alloc::string::ToString;

use crate::error::CostError;
use crate::residual_cost::{Residual, ResidualCoster, ResidualTables, ScalarCoster};
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
use crate::simd_sse::Sse2Coster;

const UNDETECTED: u8 = 0;
const SCALAR: u8 = 1;
#[cfg_attr(not(all(feature = "simd", target_arch = "x86_64")), allow(dead_code))]
const SSE2: u8 = 2;

static SELECTED: AtomicU8 = AtomicU8::new(UNDETECTED);

/// Requirement reported when the SSE2 backend is forced but unavailable.
#[cfg(all(feature = "simd", target_arch = "x86_64"))]
const SSE2_REQUIRES: &str = "an x86-64-v3 CPU (AVX2, FMA, BMI2)";
#[cfg(not(all(feature = "simd", target_arch = "x86_64")))]
const SSE2_REQUIRES: &str = "an x86_64 build with the `simd` feature";

/// Which backend to use, as requested by configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BackendPolicy {
    /// Use the best backend the CPU supports
    #[default]
    Auto,
    /// Always use the portable backend
    Scalar,
    /// Require the SSE2 backend
    Sse2,
}

impl FromStr for BackendPolicy {
    type Err = CostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        let is = |candidates: &[&str]| candidates.iter().any(|c| name.eq_ignore_ascii_case(c));
        if name.is_empty() || is(&["auto"]) {
            Ok(Self::Auto)
        } else if is(&["scalar", "portable"]) {
            Ok(Self::Scalar)
        } else if is(&["sse2", "simd"]) {
            Ok(Self::Sse2)
        } else {
            Err(CostError::UnknownBackend(s.to_string()))
        }
    }
}

impl fmt::Display for BackendPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::Scalar => "scalar",
            Self::Sse2 => "sse2",
        })
    }
}

/// A selected residual cost backend.
///
/// Cheap to copy; pass it to the code that runs the cost loop instead of
/// looking up [`CostBackend::global`] per call.
#[derive(Debug, Clone, Copy)]
pub enum CostBackend {
    /// Portable implementation
    Scalar(ScalarCoster),
    /// SSE2 kernels (x86_64, `simd` feature)
    #[cfg(all(feature = "simd", target_arch = "x86_64"))]
    Sse2(Sse2Coster),
}

impl Default for CostBackend {
    fn default() -> Self {
        Self::global()
    }
}

impl PartialEq for CostBackend {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for CostBackend {}

impl CostBackend {
    /// The portable backend, available everywhere.
    pub const fn scalar() -> Self {
        Self::Scalar(ScalarCoster)
    }

    /// Probe the CPU for the best available backend.
    pub fn detect() -> Self {
        #[cfg(all(feature = "simd", target_arch = "x86_64"))]
        if let Some(sse2) = Sse2Coster::summon() {
            return Self::Sse2(sse2);
        }
        Self::scalar()
    }

    /// The process-wide backend, detected on first use.
    pub fn global() -> Self {
        match SELECTED.load(Ordering::Acquire) {
            UNDETECTED => {
                let backend = Self::detect();
                // Every racing initializer stores the same value
                SELECTED.store(backend.id(), Ordering::Release);
                log::debug!("residual cost backend: {}", backend.name());
                backend
            }
            id => Self::from_id(id),
        }
    }

    /// Resolve a configured policy to a backend.
    pub fn from_policy(policy: BackendPolicy) -> Result<Self, CostError> {
        match policy {
            BackendPolicy::Auto => Ok(Self::global()),
            BackendPolicy::Scalar => Ok(Self::scalar()),
            BackendPolicy::Sse2 => {
                #[cfg(all(feature = "simd", target_arch = "x86_64"))]
                if let Some(sse2) = Sse2Coster::summon() {
                    return Ok(Self::Sse2(sse2));
                }
                Err(CostError::UnsupportedBackend {
                    backend: "sse2",
                    requires: SSE2_REQUIRES,
                })
            }
        }
    }

    /// Short lowercase name, matching the [`BackendPolicy`] spelling.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Scalar(_) => "scalar",
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            Self::Sse2(_) => "sse2",
        }
    }

    /// Whether this backend uses SIMD kernels.
    pub fn is_simd(&self) -> bool {
        self.id() != SCALAR
    }

    fn id(&self) -> u8 {
        match self {
            Self::Scalar(_) => SCALAR,
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            Self::Sse2(_) => SSE2,
        }
    }

    fn from_id(id: u8) -> Self {
        match id {
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            SSE2 => Sse2Coster::summon().map_or_else(Self::scalar, Self::Sse2),
            _ => Self::scalar(),
        }
    }
}

impl ResidualCoster for CostBackend {
    #[inline]
    fn find_last(&self, coeffs: &[i32; 16]) -> i32 {
        match self {
            Self::Scalar(s) => s.find_last(coeffs),
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            Self::Sse2(s) => s.find_last(coeffs),
        }
    }

    #[inline]
    fn residual_cost(&self, ctx0: usize, res: &Residual, tables: &ResidualTables) -> u32 {
        match self {
            Self::Scalar(s) => s.residual_cost(ctx0, res, tables),
            #[cfg(all(feature = "simd", target_arch = "x86_64"))]
            Self::Sse2(s) => s.residual_cost(ctx0, res, tables),
        }
    }
}

/// Find the last non-zero coefficient with the process-wide backend.
#[inline]
pub fn find_last(coeffs: &[i32; 16]) -> i32 {
    CostBackend::global().find_last(coeffs)
}

/// Cost of `res` with initial context `ctx0`, using the process-wide backend.
#[inline]
pub fn get_residual_cost(ctx0: usize, res: &Residual, tables: &ResidualTables) -> u32 {
    CostBackend::global().residual_cost(ctx0, res, tables)
}
