//! Traffic-receiving network interface.
//!
//! The sink drains every valid phit it is offered and immediately
//! returns one credit on the phit's VC; it never back-pressures. At
//! cycle 0 it broadcasts a full-depth credit grant on every VC, which is
//! what arms the upstream credit counters before any data flows.

use std::collections::HashMap;

use log::trace;

use crate::components::{CycleContext, PropagationState, SimComponent, VcBuffer};
use crate::error::{SimError, SimResult};
use crate::network::NetworkManager;
use crate::parameters::{ComponentParam, NocParameters};
use crate::phit::{MetadataPhit, TimedDataPhit, TimedPhit};
use crate::simulator::SimConnectionState;
use crate::types::{ComponentId, ConnectionId, CycleNum};

/// Simulation object for a [`ComponentKind::NISink`](crate::network::ComponentKind::NISink).
#[derive(Clone, Debug)]
pub struct SimNetworkInterfaceSink {
    id: ComponentId,
    propagation: PropagationState,
    /// Per-VC buffers; their depths size the initial credit grant.
    input_buffers: Vec<VcBuffer>,
    /// Every phit received, in arrival order.
    received_traffic: Vec<TimedDataPhit>,
    /// Index of the upstream connection in the simulator's table.
    src_connection: usize,
}

impl SimNetworkInterfaceSink {
    pub(crate) fn create(
        id: ComponentId,
        network: &NetworkManager,
        parameters: &NocParameters,
        connection_index: &HashMap<ConnectionId, usize>,
        connections: &[SimConnectionState],
        cycle: CycleNum,
    ) -> SimResult<Self> {
        let param = match parameters.component_param(id)? {
            ComponentParam::NetworkInterfaceSink(param) => param,
            other => {
                return Err(SimError::Config(format!(
                    "component {:?} is not configured as a sink interface: {:?}",
                    id, other
                )))
            }
        };

        let component = network.component(id)?;
        let port = component.input_ports().first().copied().ok_or_else(|| {
            SimError::Config(format!("sink interface {:?} has no input port", id))
        })?;
        let connection = network.port_connection(port)?;
        let src_connection = *connection_index.get(&connection).ok_or_else(|| {
            SimError::Config(format!(
                "connection {:?} has no simulation state",
                connection
            ))
        })?;

        let input_buffers: Vec<VcBuffer> = param
            .port
            .virtual_channels
            .iter()
            .map(|vc| VcBuffer::new(vc.depth))
            .collect();
        if connections[src_connection].reverse_channels.len() != input_buffers.len().max(1) {
            return Err(SimError::Config(format!(
                "sink interface {:?} disagrees with its upstream on virtual \
                 channel count ({} vs {})",
                id,
                input_buffers.len(),
                connections[src_connection].reverse_channels.len()
            )));
        }

        Ok(Self {
            id,
            propagation: PropagationState::new(cycle),
            input_buffers,
            received_traffic: Vec::new(),
            src_connection,
        })
    }

    /// Returns every phit received so far, in arrival order, stamped
    /// with the cycle it arrived in.
    pub fn received_traffic(&self) -> &[TimedDataPhit] {
        &self.received_traffic
    }
}

impl SimComponent for SimNetworkInterfaceSink {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn propagation(&self) -> &PropagationState {
        &self.propagation
    }

    fn propagation_mut(&mut self) -> &mut PropagationState {
        &mut self.propagation
    }

    fn try_forward_propagation(&mut self, ctx: &mut CycleContext<'_>) -> SimResult<bool> {
        let cycle = ctx.cycle;
        let src = &mut ctx.connections[self.src_connection];

        if src.forward_channels.cycle != cycle {
            return Ok(false);
        }

        if src.forward_channels.phit.valid {
            let phit = src.forward_channels.phit;
            self.received_traffic.push(TimedPhit::new(cycle, phit));

            // The sink always drains, so the buffer itself stays empty;
            // one credit goes straight back on the phit's VC.
            match src.reverse_channels.get_mut(phit.vc) {
                Some(lane) => {
                    *lane = TimedPhit::new(cycle, MetadataPhit { data: 1, valid: true })
                }
                None => {
                    return Err(SimError::Internal(format!(
                        "sink {:?} received a phit on unconfigured vc {}",
                        self.id, phit.vc
                    )))
                }
            }
            trace!(
                "sink {:?} received data {:#x} on vc {} cycle {}",
                self.id,
                phit.data,
                phit.vc,
                cycle
            );
        }

        if cycle == 0 {
            // Initial full credit grant on every VC.
            for (vc, lane) in src.reverse_channels.iter_mut().enumerate() {
                let depth = self
                    .input_buffers
                    .get(vc)
                    .map(VcBuffer::max_queue_size)
                    .unwrap_or(0) as u64;
                *lane = TimedPhit::new(
                    cycle,
                    MetadataPhit {
                        data: depth,
                        valid: true,
                    },
                );
                trace!("sink {:?} granted {} credits on vc {}", self.id, depth, vc);
            }
        } else {
            for lane in src.reverse_channels.iter_mut() {
                if lane.cycle != cycle {
                    *lane = TimedPhit::bubble(cycle);
                }
            }
        }

        Ok(true)
    }

    /// The sink's credit return happens in the forward phase; there is
    /// nothing left to do in reverse.
    fn try_reverse_propagation(&mut self, _ctx: &mut CycleContext<'_>) -> SimResult<bool> {
        Ok(true)
    }
}
