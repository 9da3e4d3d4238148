//! Routing lookups consumed by routers during arbitration.
//!
//! The kernel does not compute routes; it asks a [`RoutingTable`] where a
//! phit sitting at a given input port and virtual channel should go,
//! identified by the phit's destination index. The answer names an
//! *output port index* and the virtual channel to continue on. Lookups
//! must be pure and deterministic: the same query always yields the same
//! answer within a run.
//!
//! [`StaticRoutingTable`] is the bundled implementation: an explicit map
//! filled in ahead of the run, one entry per (router, input port, input
//! VC, destination) combination.

use std::collections::HashMap;

use crate::error::{SimError, SimResult};
use crate::types::ComponentId;

/// An output port index paired with the virtual channel to use on it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortAndVc {
    /// Index into the router's ordered output ports.
    pub port: usize,
    /// Virtual channel on that output port.
    pub vc: usize,
}

impl PortAndVc {
    /// Creates a port/VC pair.
    pub fn new(port: usize, vc: usize) -> Self {
        Self { port, vc }
    }
}

/// Route query interface.
pub trait RoutingTable {
    /// Returns the output port index and VC a phit should take.
    ///
    /// # Arguments
    /// * `router` - The router performing the lookup
    /// * `input_port` - Index of the input port holding the phit
    /// * `input_vc` - Virtual channel the phit arrived on
    /// * `destination_index` - The phit's destination endpoint index
    ///
    /// # Errors
    /// [`SimError::NotFound`] if the table has no route for the query.
    fn route(
        &self,
        router: ComponentId,
        input_port: usize,
        input_vc: usize,
        destination_index: usize,
    ) -> SimResult<PortAndVc>;
}

/// A routing table backed by an explicit map.
///
/// # Example
///
/// ```
/// use nocsim::routing::{PortAndVc, RoutingTable, StaticRoutingTable};
/// # use nocsim::network::{ComponentKind, NetworkManager};
/// # let mut net = NetworkManager::new();
/// # let network = net.add_network();
/// # let router = net.add_component(network, ComponentKind::Router).unwrap();
///
/// let mut table = StaticRoutingTable::new();
/// table.add_route(router, 0, 0, 7, PortAndVc::new(1, 0));
///
/// assert_eq!(table.route(router, 0, 0, 7).unwrap(), PortAndVc::new(1, 0));
/// assert!(table.route(router, 0, 0, 8).is_err());
/// ```
#[derive(Clone, Debug, Default)]
pub struct StaticRoutingTable {
    routes: HashMap<(ComponentId, usize, usize, usize), PortAndVc>,
}

impl StaticRoutingTable {
    /// Creates an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or replaces) a route.
    pub fn add_route(
        &mut self,
        router: ComponentId,
        input_port: usize,
        input_vc: usize,
        destination_index: usize,
        output: PortAndVc,
    ) {
        self.routes
            .insert((router, input_port, input_vc, destination_index), output);
    }
}

impl RoutingTable for StaticRoutingTable {
    fn route(
        &self,
        router: ComponentId,
        input_port: usize,
        input_vc: usize,
        destination_index: usize,
    ) -> SimResult<PortAndVc> {
        self.routes
            .get(&(router, input_port, input_vc, destination_index))
            .copied()
            .ok_or_else(|| {
                SimError::NotFound(format!(
                    "route for router {:?} input port {} vc {} destination {}",
                    router, input_port, input_vc, destination_index
                ))
            })
    }
}
