//! Core type definitions for the simulation kernel.
//!
//! This module defines the handle types used to refer to entities of the
//! network graph. Handles are opaque: they support equality, hashing and
//! ordering so they can key maps, but carry no arithmetic. They are minted
//! by [`NetworkManager`](crate::network::NetworkManager) and remain valid
//! for the lifetime of the manager that produced them.

use serde::{Deserialize, Serialize};

/// Simulation cycle number.
///
/// Cycles are signed so that "before the first cycle" is representable:
/// a freshly constructed simulator sits at cycle -1 and the first call to
/// [`run_cycle`](crate::simulator::NocSimulator::run_cycle) executes
/// cycle 0.
pub type CycleNum = i64;

/// Handle to a network within a [`NetworkManager`](crate::network::NetworkManager).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NetworkId(pub(crate) usize);

/// Handle to a network component (source, sink, link or router).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub(crate) usize);

/// Handle to a port on a network component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PortId(pub(crate) usize);

/// Handle to a connection between an output port and an input port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConnectionId(pub(crate) usize);

impl NetworkId {
    /// Returns the raw arena index of this handle.
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl ComponentId {
    /// Returns the raw arena index of this handle.
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl PortId {
    /// Returns the raw arena index of this handle.
    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl ConnectionId {
    /// Returns the raw arena index of this handle.
    pub fn as_usize(self) -> usize {
        self.0
    }
}
