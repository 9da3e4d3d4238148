//! Phit definitions for the simulation kernel.
//!
//! A phit (physical transfer unit) is the quantum of data that crosses a
//! connection in one cycle. Two phit flavors exist:
//!
//! - [`DataPhit`]: payload traveling source→sink on a forward channel,
//!   tagged with its virtual channel and destination index.
//! - [`MetadataPhit`]: credit updates traveling sink→source on the
//!   per-VC reverse channels.
//!
//! Both are wrapped in [`TimedPhit`], which stamps the simulation cycle
//! the value was produced in. The stamp is what makes the fixed-point
//! tick loop safe: a component may consume a neighbor's phit only when
//! the stamp equals the current cycle, so stale values from the previous
//! cycle are never observed as fresh ones.

use serde::{Deserialize, Serialize};

use crate::types::CycleNum;

/// A data phit carried on a forward channel.
///
/// An invalid phit is a *bubble*: it occupies the channel for the cycle
/// without transferring data.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPhit {
    /// Payload word.
    pub data: u64,
    /// Whether this phit carries data (`false` marks a bubble).
    pub valid: bool,
    /// Virtual channel the phit travels on.
    pub vc: usize,
    /// Index of the destination endpoint, consumed by routing lookups.
    pub destination_index: usize,
}

impl DataPhit {
    /// Creates a valid data phit.
    pub fn new(data: u64, vc: usize, destination_index: usize) -> Self {
        Self {
            data,
            valid: true,
            vc,
            destination_index,
        }
    }
}

/// A metadata phit carried on a reverse channel.
///
/// When valid, `data` is the number of credits being returned upstream
/// for the channel's virtual channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataPhit {
    /// Credit delta (number of freed buffer slots).
    pub data: u64,
    /// Whether this phit carries a credit update (`false` marks a bubble).
    pub valid: bool,
}

/// A phit stamped with the cycle it was produced in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimedPhit<T> {
    /// Cycle in which `phit` was written.
    pub cycle: CycleNum,
    /// The phit value.
    pub phit: T,
}

impl<T> TimedPhit<T> {
    /// Creates a timed phit.
    pub fn new(cycle: CycleNum, phit: T) -> Self {
        Self { cycle, phit }
    }
}

impl<T: Default> TimedPhit<T> {
    /// Creates a bubble stamped with `cycle`.
    pub fn bubble(cycle: CycleNum) -> Self {
        Self {
            cycle,
            phit: T::default(),
        }
    }
}

/// A timed data phit (forward channels).
pub type TimedDataPhit = TimedPhit<DataPhit>;

/// A timed metadata phit (reverse channels).
pub type TimedMetadataPhit = TimedPhit<MetadataPhit>;

/// A credit update captured from a reverse channel.
///
/// Updates received during one cycle's reverse propagation are folded
/// into the live credit counters at the start of the next cycle's
/// forward propagation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditState {
    /// Cycle the update was captured in.
    pub cycle: CycleNum,
    /// Number of credits to add.
    pub credit: u64,
}

impl CreditState {
    /// Creates a credit update.
    pub fn new(cycle: CycleNum, credit: u64) -> Self {
        Self { cycle, credit }
    }
}
