//! Errors for backend configuration and table ingestion.
//!
//! The cost computation itself never fails; these only surface when a caller
//! hands over externally produced tables or asks for a specific backend.

use alloc::string::String;
use thiserror::Error;

/// Error that can occur while configuring the estimator or loading tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CostError {
    /// A flat table slice did not have the expected number of entries
    #[error("invalid {what} table length: expected {expected}, got {actual}")]
    InvalidTableLength {
        /// Which table was being loaded
        what: &'static str,
        /// Required number of entries
        expected: usize,
        /// Number of entries supplied
        actual: usize,
    },

    /// A backend was forced that this CPU or build cannot run
    #[error("residual cost backend `{backend}` requires {requires}")]
    UnsupportedBackend {
        /// Name of the requested backend
        backend: &'static str,
        /// What the CPU or build lacks
        requires: &'static str,
    },

    /// A backend policy string could not be parsed
    #[error("unknown residual cost backend `{0}` (expected auto, scalar or sse2)")]
    UnknownBackend(String),
}
