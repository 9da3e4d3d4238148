//! The simulation driver.
//!
//! [`NocSimulator`] owns everything that changes during a run: the
//! per-connection channel state and the per-component simulation
//! objects. Components refer to connections by plain indices into the
//! simulator's table — no back-pointers — so the whole simulation is a
//! flat, arena-shaped structure that one `&mut` walks per tick.
//!
//! Time advances one cycle per [`run_cycle`](NocSimulator::run_cycle)
//! call. Within a cycle the driver repeatedly [`tick`](NocSimulator::tick)s
//! every component until all of them report that both their forward and
//! reverse propagation completed — the fixed point that defines the end
//! of the cycle. Components are visited sources → links → routers →
//! sinks; correctness does not depend on this order (every phase guards
//! on its neighbors' cycle stamps) but determinism of arbitration does,
//! so the order is part of the contract.

use std::collections::HashMap;

use log::{debug, trace};
use serde::{Deserialize, Serialize};

use crate::components::{
    CycleContext, SimComponent, SimInputBufferedVCRouter, SimLink, SimNetworkInterfaceSink,
    SimNetworkInterfaceSrc,
};
use crate::error::{SimError, SimResult};
use crate::network::{ComponentKind, NetworkManager};
use crate::parameters::NocParameters;
use crate::phit::{TimedDataPhit, TimedMetadataPhit, TimedPhit};
use crate::routing::RoutingTable;
use crate::types::{ComponentId, ConnectionId, CycleNum, NetworkId};

/// Channel state of one connection.
///
/// A connection carries one forward lane (data phits, with VCs
/// multiplexed via the phit's `vc` field) and one reverse lane per VC
/// (credit phits). After a cycle converges, every lane's stamp equals
/// the current cycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SimConnectionState {
    /// The connection this state belongs to.
    pub id: ConnectionId,
    /// The forward (data) lane.
    pub forward_channels: TimedDataPhit,
    /// The reverse (credit) lanes, one per VC of the driving port.
    pub reverse_channels: Vec<TimedMetadataPhit>,
}

/// Counters accumulated across a run.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct SimulatorStats {
    /// Cycles that ran to convergence.
    pub cycles_executed: u64,
    /// Ticks executed across all cycles.
    pub ticks_executed: u64,
    /// Largest number of ticks any single cycle needed.
    pub max_ticks_per_cycle: u64,
}

/// Cycle-accurate simulator for one network.
pub struct NocSimulator {
    network: NetworkManager,
    parameters: NocParameters,
    routing: Box<dyn RoutingTable>,
    cycle: CycleNum,
    connections: Vec<SimConnectionState>,
    connection_index: HashMap<ConnectionId, usize>,
    sources: Vec<SimNetworkInterfaceSrc>,
    links: Vec<SimLink>,
    routers: Vec<SimInputBufferedVCRouter>,
    sinks: Vec<SimNetworkInterfaceSink>,
    source_index: HashMap<ComponentId, usize>,
    sink_index: HashMap<ComponentId, usize>,
    stats: SimulatorStats,
}

impl NocSimulator {
    /// Creates a simulator over the given graph, parameters and routing.
    ///
    /// The simulator starts at cycle -1; call
    /// [`create_simulation_objects`](Self::create_simulation_objects)
    /// before the first [`run_cycle`](Self::run_cycle).
    pub fn new(
        network: NetworkManager,
        parameters: NocParameters,
        routing: Box<dyn RoutingTable>,
    ) -> Self {
        Self {
            network,
            parameters,
            routing,
            cycle: -1,
            connections: Vec::new(),
            connection_index: HashMap::new(),
            sources: Vec::new(),
            links: Vec::new(),
            routers: Vec::new(),
            sinks: Vec::new(),
            source_index: HashMap::new(),
            sink_index: HashMap::new(),
            stats: SimulatorStats::default(),
        }
    }

    /// Builds the simulation state for every connection and component of
    /// `network`.
    ///
    /// # Errors
    /// [`SimError::Config`] when a component kind is unsupported, a port
    /// is left dangling or a required parameter is missing.
    pub fn create_simulation_objects(&mut self, network: NetworkId) -> SimResult<()> {
        let connection_ids: Vec<ConnectionId> =
            self.network.network(network)?.connection_ids().to_vec();
        for id in connection_ids {
            self.create_connection(id)?;
        }

        let component_ids: Vec<ComponentId> =
            self.network.network(network)?.component_ids().to_vec();
        for id in component_ids {
            self.create_component(id)?;
        }

        Ok(())
    }

    fn create_connection(&mut self, id: ConnectionId) -> SimResult<()> {
        let connection = self.network.connection(id)?;
        let src_port = connection.src_port();
        let port_param = self
            .parameters
            .port_param(src_port)
            .map_err(|err| SimError::Config(format!("connection {:?}: {}", id, err)))?;

        // A port with no configured VCs still owns one credit lane.
        let vc_count = port_param.vc_count().max(1);

        let index = self.connections.len();
        self.connections.push(SimConnectionState {
            id,
            forward_channels: TimedPhit::bubble(self.cycle),
            reverse_channels: vec![TimedPhit::bubble(self.cycle); vc_count],
        });
        self.connection_index.insert(id, index);
        Ok(())
    }

    fn create_component(&mut self, id: ComponentId) -> SimResult<()> {
        match self.network.component(id)?.kind() {
            ComponentKind::NISrc => {
                let source = SimNetworkInterfaceSrc::create(
                    id,
                    &self.network,
                    &self.parameters,
                    &self.connection_index,
                    self.cycle,
                )?;
                self.source_index.insert(id, self.sources.len());
                self.sources.push(source);
            }
            ComponentKind::NISink => {
                let sink = SimNetworkInterfaceSink::create(
                    id,
                    &self.network,
                    &self.parameters,
                    &self.connection_index,
                    &self.connections,
                    self.cycle,
                )?;
                self.sink_index.insert(id, self.sinks.len());
                self.sinks.push(sink);
            }
            ComponentKind::Link => {
                let link = SimLink::create(
                    id,
                    &self.network,
                    &self.parameters,
                    &self.connection_index,
                    &self.connections,
                    self.cycle,
                )?;
                self.links.push(link);
            }
            ComponentKind::Router => {
                let router = SimInputBufferedVCRouter::create(
                    id,
                    &self.network,
                    &self.parameters,
                    &self.connection_index,
                    &self.connections,
                    self.cycle,
                )?;
                self.routers.push(router);
            }
            ComponentKind::None => {
                return Err(SimError::Config(format!(
                    "unsupported component kind for {:?}",
                    id
                )))
            }
        }
        Ok(())
    }

    /// Runs the next cycle to convergence.
    ///
    /// The cycle counter is incremented first, then the tick loop runs
    /// until every component converges. If `max_ticks` ticks pass
    /// without convergence the cycle fails with
    /// [`SimError::Divergence`]; the counter is not rolled back and the
    /// simulator should be discarded.
    pub fn run_cycle(&mut self, max_ticks: u64) -> SimResult<()> {
        self.cycle += 1;
        debug!("*** cycle {}", self.cycle);

        let mut ticks: u64 = 0;
        loop {
            if ticks >= max_ticks {
                return Err(SimError::Divergence {
                    cycle: self.cycle,
                    ticks,
                });
            }
            trace!("tick {}", ticks);
            let converged = self.tick()?;
            ticks += 1;
            if converged {
                break;
            }
        }

        self.stats.cycles_executed += 1;
        self.stats.ticks_executed += ticks;
        self.stats.max_ticks_per_cycle = self.stats.max_ticks_per_cycle.max(ticks);

        self.dump_connections();
        Ok(())
    }

    /// Runs one tick over every component and reports whether all of
    /// them have converged for the current cycle.
    ///
    /// Exposed so harnesses can check tick idempotence; normal use goes
    /// through [`run_cycle`](Self::run_cycle). Calling this again after
    /// convergence is a no-op that returns `Ok(true)`.
    pub fn tick(&mut self) -> SimResult<bool> {
        let mut ctx = CycleContext {
            cycle: self.cycle,
            connections: &mut self.connections,
            routing: self.routing.as_ref(),
        };

        let mut converged = true;
        for source in &mut self.sources {
            converged &= source.tick(&mut ctx)?;
        }
        for link in &mut self.links {
            converged &= link.tick(&mut ctx)?;
        }
        for router in &mut self.routers {
            converged &= router.tick(&mut ctx)?;
        }
        for sink in &mut self.sinks {
            converged &= sink.tick(&mut ctx)?;
        }
        Ok(converged)
    }

    /// Returns the current cycle (-1 before the first
    /// [`run_cycle`](Self::run_cycle)).
    pub fn current_cycle(&self) -> CycleNum {
        self.cycle
    }

    /// Returns the connection state table.
    pub fn connections(&self) -> &[SimConnectionState] {
        &self.connections
    }

    /// Returns the table index of a connection's state.
    pub fn get_connection_index(&self, id: ConnectionId) -> SimResult<usize> {
        self.connection_index
            .get(&id)
            .copied()
            .ok_or_else(|| SimError::NotFound(format!("simulation state for connection {:?}", id)))
    }

    /// Returns the simulation object for a source interface.
    pub fn get_sim_network_interface_src(
        &mut self,
        id: ComponentId,
    ) -> SimResult<&mut SimNetworkInterfaceSrc> {
        match self.source_index.get(&id) {
            Some(&index) => Ok(&mut self.sources[index]),
            None => Err(SimError::NotFound(format!(
                "simulation object for source interface {:?}",
                id
            ))),
        }
    }

    /// Returns the simulation object for a sink interface.
    pub fn get_sim_network_interface_sink(
        &self,
        id: ComponentId,
    ) -> SimResult<&SimNetworkInterfaceSink> {
        match self.sink_index.get(&id) {
            Some(&index) => Ok(&self.sinks[index]),
            None => Err(SimError::NotFound(format!(
                "simulation object for sink interface {:?}",
                id
            ))),
        }
    }

    /// Returns the source simulation objects in creation order.
    pub fn sources(&self) -> &[SimNetworkInterfaceSrc] {
        &self.sources
    }

    /// Returns the link simulation objects in creation order.
    pub fn links(&self) -> &[SimLink] {
        &self.links
    }

    /// Returns the router simulation objects in creation order.
    pub fn routers(&self) -> &[SimInputBufferedVCRouter] {
        &self.routers
    }

    /// Returns the sink simulation objects in creation order.
    pub fn sinks(&self) -> &[SimNetworkInterfaceSink] {
        &self.sinks
    }

    /// Returns the run counters.
    pub fn stats(&self) -> &SimulatorStats {
        &self.stats
    }

    /// Exports the run counters and per-sink delivery totals.
    pub fn export_stats(&self) -> serde_json::Value {
        let mut sinks = serde_json::Map::new();
        for sink in &self.sinks {
            sinks.insert(
                sink.id().as_usize().to_string(),
                serde_json::json!(sink.received_traffic().len()),
            );
        }

        serde_json::json!({
            "simulator": {
                "current_cycle": self.cycle,
                "cycles_executed": self.stats.cycles_executed,
                "ticks_executed": self.stats.ticks_executed,
                "max_ticks_per_cycle": self.stats.max_ticks_per_cycle,
                "connection_count": self.connections.len(),
                "component_count": self.sources.len()
                    + self.links.len()
                    + self.routers.len()
                    + self.sinks.len(),
            },
            "phits_received": sinks,
        })
    }

    fn dump_connections(&self) {
        for (index, connection) in self.connections.iter().enumerate() {
            debug!(
                "connection {} ({:?}) fwd cycle {} data {:#x} vc {} valid {}",
                index,
                connection.id,
                connection.forward_channels.cycle,
                connection.forward_channels.phit.data,
                connection.forward_channels.phit.vc,
                connection.forward_channels.phit.valid
            );
            for (vc, lane) in connection.reverse_channels.iter().enumerate() {
                debug!(
                    "  rev {} cycle {} data {} valid {}",
                    vc, lane.cycle, lane.phit.data, lane.phit.valid
                );
            }
        }
    }
}
