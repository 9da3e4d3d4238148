//! Input-buffered virtual-channel router.
//!
//! The router buffers arriving phits per input port and virtual channel,
//! then arbitrates them onto its output connections with a fixed
//! `(vc, input port)` priority: lower VC numbers beat higher ones, and
//! within a VC lower input-port indices win. Fixed priority keeps runs
//! reproducible; fairness is left to the routing policy and upstream
//! traffic shaping.
//!
//! There are no output buffers. A phit moves only when three things hold
//! at once: the routing lookup names an output, that output holds a
//! credit on the phit's target VC, and no other input has claimed the
//! output connection this cycle. A phit that loses any of these stays in
//! its input buffer for a later cycle.
//!
//! Arbitration is deterministic only because it starts after *all* input
//! connections carry the current cycle's stamp; until then the forward
//! phase reports "not yet".

use std::collections::HashMap;

use log::trace;

use crate::components::{CycleContext, PropagationState, SimComponent, VcBuffer};
use crate::error::{SimError, SimResult};
use crate::network::NetworkManager;
use crate::parameters::{NocParameters, PortParam, VirtualChannelParam};
use crate::phit::{CreditState, MetadataPhit, TimedPhit};
use crate::simulator::SimConnectionState;
use crate::types::{ComponentId, ConnectionId, CycleNum};

/// Returns the VC list of a port, promoting a VC-less port to a single
/// channel of zero depth so every port owns at least one credit lane.
fn effective_virtual_channels(param: &PortParam) -> Vec<VirtualChannelParam> {
    if param.virtual_channels.is_empty() {
        vec![VirtualChannelParam::new(0)]
    } else {
        param.virtual_channels.clone()
    }
}

/// Simulation object for a [`ComponentKind::Router`](crate::network::ComponentKind::Router).
#[derive(Clone, Debug)]
pub struct SimInputBufferedVCRouter {
    id: ComponentId,
    propagation: PropagationState,
    /// Last cycle for which pending credit updates were applied.
    internal_propagated_cycle: CycleNum,
    /// Connection table indices, one per input port.
    input_connections: Vec<usize>,
    /// Connection table indices, one per output port.
    output_connections: Vec<usize>,
    /// `input_buffers[i][vc]`: phits waiting at input `i` on `vc`.
    input_buffers: Vec<Vec<VcBuffer>>,
    /// Credits to return upstream this cycle, per input port and VC.
    input_credit_to_send: Vec<Vec<u64>>,
    /// Live downstream credits, per output port and VC.
    credit: Vec<Vec<u64>>,
    /// Credit updates captured during the previous reverse pass.
    credit_update: Vec<Vec<CreditState>>,
    /// Largest VC count across the input ports.
    max_vc: usize,
}

impl SimInputBufferedVCRouter {
    pub(crate) fn create(
        id: ComponentId,
        network: &NetworkManager,
        parameters: &NocParameters,
        connection_index: &HashMap<ConnectionId, usize>,
        connections: &[SimConnectionState],
        cycle: CycleNum,
    ) -> SimResult<Self> {
        let component = network.component(id)?;

        let resolve = |port| -> SimResult<usize> {
            let connection = network.port_connection(port)?;
            connection_index.get(&connection).copied().ok_or_else(|| {
                SimError::Config(format!(
                    "connection {:?} has no simulation state",
                    connection
                ))
            })
        };

        let mut input_connections = Vec::with_capacity(component.input_ports().len());
        let mut input_buffers = Vec::with_capacity(component.input_ports().len());
        let mut input_credit_to_send = Vec::with_capacity(component.input_ports().len());
        let mut max_vc = 0;
        for (i, &port) in component.input_ports().iter().enumerate() {
            let index = resolve(port)?;
            let vcs = effective_virtual_channels(parameters.port_param(port)?);
            if connections[index].reverse_channels.len() != vcs.len() {
                return Err(SimError::Config(format!(
                    "router {:?} input port {} disagrees with its upstream on \
                     virtual channel count ({} vs {})",
                    id,
                    i,
                    vcs.len(),
                    connections[index].reverse_channels.len()
                )));
            }
            max_vc = max_vc.max(vcs.len());
            input_buffers.push(
                vcs.iter()
                    .map(|vc| VcBuffer::new(vc.depth))
                    .collect::<Vec<_>>(),
            );
            input_credit_to_send.push(vec![0; vcs.len()]);
            input_connections.push(index);
        }

        let mut output_connections = Vec::with_capacity(component.output_ports().len());
        let mut credit = Vec::with_capacity(component.output_ports().len());
        let mut credit_update = Vec::with_capacity(component.output_ports().len());
        for (o, &port) in component.output_ports().iter().enumerate() {
            let index = resolve(port)?;
            let vcs = effective_virtual_channels(parameters.port_param(port)?);
            if connections[index].reverse_channels.len() != vcs.len() {
                return Err(SimError::Config(format!(
                    "router {:?} output port {} disagrees with its downstream on \
                     virtual channel count ({} vs {})",
                    id,
                    o,
                    vcs.len(),
                    connections[index].reverse_channels.len()
                )));
            }
            credit.push(vec![0; vcs.len()]);
            credit_update.push(vec![CreditState::new(cycle, 0); vcs.len()]);
            output_connections.push(index);
        }

        Ok(Self {
            id,
            propagation: PropagationState::new(cycle),
            internal_propagated_cycle: cycle,
            input_connections,
            output_connections,
            input_buffers,
            input_credit_to_send,
            credit,
            credit_update,
            max_vc,
        })
    }

    /// Returns the live downstream credit counters, indexed by output
    /// port then VC.
    pub fn credit_counts(&self) -> &[Vec<u64>] {
        &self.credit
    }

    /// Returns the number of phits currently held in the input buffers.
    pub fn buffered_phit_count(&self) -> usize {
        self.input_buffers
            .iter()
            .flat_map(|port| port.iter())
            .map(VcBuffer::len)
            .sum()
    }
}

impl SimComponent for SimInputBufferedVCRouter {
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

        // Fold in the credit updates captured last cycle. Guarded by its
        // own stamp because this phase may be attempted several ticks in
        // a row before the input gate below passes.
        if self.internal_propagated_cycle != cycle {
            for (o, updates) in self.credit_update.iter().enumerate() {
                for (vc, update) in updates.iter().enumerate() {
                    if update.credit > 0 {
                        self.credit[o][vc] += update.credit;
                        trace!(
                            "router {:?} output port {} vc {} added {} credits, now {}",
                            self.id,
                            o,
                            vc,
                            update.credit,
                            self.credit[o][vc]
                        );
                    }
                }
            }
            self.internal_propagated_cycle = cycle;
        }

        // Arbitration is deterministic only with every input visible.
        for &index in &self.input_connections {
            if ctx.connections[index].forward_channels.cycle != cycle {
                return Ok(false);
            }
        }

        for credits in self.input_credit_to_send.iter_mut() {
            credits.iter_mut().for_each(|credit| *credit = 0);
        }

        // Ingest this cycle's arrivals. Phits can be routed out again in
        // the same cycle (input bypass).
        for (i, &index) in self.input_connections.iter().enumerate() {
            let forward = ctx.connections[index].forward_channels;
            if forward.phit.valid {
                let vc = forward.phit.vc;
                match self.input_buffers[i].get_mut(vc) {
                    Some(buffer) => buffer.push_back(forward.phit),
                    None => {
                        return Err(SimError::Internal(format!(
                            "router {:?} received a phit on unconfigured vc {} at input {}",
                            self.id, vc, i
                        )))
                    }
                }
                trace!(
                    "router {:?} received data {:#x} on input {} vc {}",
                    self.id,
                    forward.phit.data,
                    i,
                    vc
                );
            }
        }

        // Fixed-priority arbitration: lowest VC first, then lowest input.
        for vc in 0..self.max_vc {
            for i in 0..self.input_buffers.len() {
                if vc >= self.input_buffers[i].len() {
                    continue;
                }
                let phit = match self.input_buffers[i][vc].front() {
                    Some(phit) => *phit,
                    None => continue,
                };

                let output = ctx
                    .routing
                    .route(self.id, i, vc, phit.destination_index)
                    .map_err(|err| {
                        SimError::Internal(format!(
                            "routing lookup failed at router {:?} input {} vc {}: {}",
                            self.id, i, vc, err
                        ))
                    })?;
                let credit_slot = self
                    .credit
                    .get(output.port)
                    .and_then(|port| port.get(output.vc))
                    .copied()
                    .ok_or_else(|| {
                        SimError::Internal(format!(
                            "routing table sent router {:?} input {} vc {} to nonexistent \
                             output port {} vc {}",
                            self.id, i, vc, output.port, output.vc
                        ))
                    })?;

                if credit_slot == 0 {
                    trace!(
                        "router {:?} holding data {:#x}, no credit on output {} vc {}",
                        self.id,
                        phit.data,
                        output.port,
                        output.vc
                    );
                    continue;
                }

                // No output buffering: first claimant per cycle wins.
                let output_state = &mut ctx.connections[self.output_connections[output.port]];
                if output_state.forward_channels.cycle == cycle {
                    continue;
                }

                output_state.forward_channels.phit = phit;
                output_state.forward_channels.phit.valid = true;
                output_state.forward_channels.phit.vc = output.vc;
                output_state.forward_channels.cycle = cycle;

                self.credit[output.port][output.vc] -= 1;
                self.input_credit_to_send[i][vc] += 1;
                self.input_buffers[i][vc].pop_front();

                trace!(
                    "router {:?} sent data {:#x} from input {} vc {} to output {} vc {}, \
                     credit now {}",
                    self.id,
                    phit.data,
                    i,
                    vc,
                    output.port,
                    output.vc,
                    self.credit[output.port][output.vc]
                );
            }
        }

        // Bubbles on the outputs nobody claimed.
        for &index in &self.output_connections {
            let output = &mut ctx.connections[index];
            if output.forward_channels.cycle != cycle {
                output.forward_channels = TimedPhit::bubble(cycle);
            }
        }

        Ok(true)
    }

    /// Publishes credits upstream and captures credits from downstream.
    ///
    /// Runs only after this cycle's forward phase: the credits returned
    /// upstream are exactly the buffer slots freed by this cycle's
    /// arbitration (or the full buffer depth at cycle 0, the initial
    /// grant).
    fn try_reverse_propagation(&mut self, ctx: &mut CycleContext<'_>) -> SimResult<bool> {
        let cycle = ctx.cycle;
        if self.propagation.forward != cycle {
            return Ok(false);
        }

        for (i, &index) in self.input_connections.iter().enumerate() {
            let input = &mut ctx.connections[index];
            for vc in 0..input.reverse_channels.len() {
                let data = if cycle == 0 {
                    self.input_buffers[i][vc].max_queue_size() as u64
                } else {
                    self.input_credit_to_send[i][vc]
                };
                input.reverse_channels[vc] = TimedPhit::new(
                    cycle,
                    MetadataPhit { data, valid: true },
                );
            }
        }

        let mut num_propagated = 0;
        let mut possible_propagation = 0;
        for (o, &index) in self.output_connections.iter().enumerate() {
            let output = &ctx.connections[index];
            for vc in 0..self.credit_update[o].len() {
                let possible_credit = output.reverse_channels[vc];
                if possible_credit.cycle == cycle {
                    if self.credit_update[o][vc].cycle != cycle {
                        let credit = if possible_credit.phit.valid {
                            possible_credit.phit.data
                        } else {
                            0
                        };
                        self.credit_update[o][vc] = CreditState::new(cycle, credit);
                        trace!(
                            "router {:?} received {} credits for output {} vc {}",
                            self.id,
                            credit,
                            o,
                            vc
                        );
                    }
                    num_propagated += 1;
                } else {
                    trace!(
                        "router {:?} waiting for credits on output {} vc {}",
                        self.id,
                        o,
                        vc
                    );
                }
                possible_propagation += 1;
            }
        }

        Ok(num_propagated == possible_propagation)
    }
}
