//! Error types for the simulation kernel.
//!
//! Two kinds of "failure" exist in the kernel and only one of them is an
//! error. A component that cannot complete a propagation phase yet (its
//! neighbors have not produced this cycle's values) simply reports `false`
//! from the phase and is retried on the next tick. Everything in this
//! module is the other kind: malformed configuration, lookups that miss,
//! cycles that never converge, and invariant violations mid-run. These
//! bubble up to the caller; the kernel never catches and retries them.

use thiserror::Error;

use crate::types::CycleNum;

/// Errors surfaced by the simulation kernel.
#[derive(Error, Debug)]
pub enum SimError {
    /// Malformed or unsupported network configuration discovered while
    /// building the simulation objects.
    #[error("configuration error: {0}")]
    Config(String),

    /// A lookup by identifier found nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// An index (e.g. a virtual-channel number) addressed beyond the
    /// configured range.
    #[error("out of range: {0}")]
    OutOfRange(String),

    /// The tick loop exceeded its budget without all components
    /// converging. The run is considered failed; the simulator is left
    /// inspectable but not resumable.
    #[error("unable to converge after {ticks} ticks for cycle {cycle}")]
    Divergence {
        /// The cycle that failed to converge.
        cycle: CycleNum,
        /// Number of ticks executed before giving up.
        ticks: u64,
    },

    /// An invariant was violated mid-run, e.g. the routing table named an
    /// output port the router does not have. Non-recoverable.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type used throughout the kernel.
pub type SimResult<T> = Result<T, SimError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_divergence_message() {
        let err = SimError::Divergence { cycle: 4, ticks: 16 };
        assert_eq!(
            err.to_string(),
            "unable to converge after 16 ticks for cycle 4"
        );
    }

    #[test]
    fn test_error_kinds_are_distinct() {
        let not_found = SimError::NotFound("component 3".to_string());
        let internal = SimError::Internal("bad output index".to_string());

        assert!(matches!(not_found, SimError::NotFound(_)));
        assert!(matches!(internal, SimError::Internal(_)));
    }
}
