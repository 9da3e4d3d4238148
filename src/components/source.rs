//! Traffic-injecting network interface.
//!
//! The source owns one send queue per virtual channel. Harnesses fill
//! the queues ahead of (or during) a run with
//! [`send_phit_at_time`](SimNetworkInterfaceSrc::send_phit_at_time);
//! each cycle the source transmits at most one phit, picked from the
//! lowest-numbered VC that both has a phit due and holds a credit.
//!
//! A freshly created source holds zero credits on every VC, so nothing
//! is transmitted until the downstream component's initial full-depth
//! credit grant (sent during cycle 0's reverse pass) has been applied.

use std::collections::{HashMap, VecDeque};

use log::trace;

use crate::components::{CycleContext, PropagationState, SimComponent};
use crate::error::{SimError, SimResult};
use crate::network::NetworkManager;
use crate::parameters::{ComponentParam, NocParameters};
use crate::phit::{CreditState, TimedDataPhit, TimedPhit};
use crate::types::{ComponentId, ConnectionId, CycleNum};

/// Simulation object for a [`ComponentKind::NISrc`](crate::network::ComponentKind::NISrc).
#[derive(Clone, Debug)]
pub struct SimNetworkInterfaceSrc {
    id: ComponentId,
    propagation: PropagationState,
    /// Send queue per virtual channel.
    data_to_send: Vec<VecDeque<TimedDataPhit>>,
    /// Live credit count per virtual channel.
    credit: Vec<u64>,
    /// Credit update captured during the previous reverse pass.
    credit_update: Vec<CreditState>,
    /// Index of the downstream connection in the simulator's table.
    sink_connection: usize,
}

impl SimNetworkInterfaceSrc {
    pub(crate) fn create(
        id: ComponentId,
        network: &NetworkManager,
        parameters: &NocParameters,
        connection_index: &HashMap<ConnectionId, usize>,
        cycle: CycleNum,
    ) -> SimResult<Self> {
        let param = match parameters.component_param(id)? {
            ComponentParam::NetworkInterfaceSrc(param) => param,
            other => {
                return Err(SimError::Config(format!(
                    "component {:?} is not configured as a source interface: {:?}",
                    id, other
                )))
            }
        };
        let vc_count = param.port.vc_count();

        let component = network.component(id)?;
        let port = component.output_ports().first().copied().ok_or_else(|| {
            SimError::Config(format!("source interface {:?} has no output port", id))
        })?;
        let connection = network.port_connection(port)?;
        let sink_connection = *connection_index.get(&connection).ok_or_else(|| {
            SimError::Config(format!(
                "connection {:?} has no simulation state",
                connection
            ))
        })?;

        Ok(Self {
            id,
            propagation: PropagationState::new(cycle),
            data_to_send: vec![VecDeque::new(); vc_count],
            credit: vec![0; vc_count],
            credit_update: vec![CreditState::new(cycle, 0); vc_count],
            sink_connection,
        })
    }

    /// Queues a phit for transmission.
    ///
    /// The phit joins the send queue of the VC named by its `vc` field
    /// and becomes eligible for transmission once the simulation reaches
    /// the phit's `cycle`. Actual transmission may be later: each VC
    /// drains in order, one phit per cycle across the whole interface,
    /// and only when a credit is available.
    ///
    /// # Errors
    /// [`SimError::OutOfRange`] if the phit's VC index is not configured
    /// on this interface.
    pub fn send_phit_at_time(&mut self, phit: TimedDataPhit) -> SimResult<()> {
        let vc = phit.phit.vc;
        match self.data_to_send.get_mut(vc) {
            Some(queue) => {
                queue.push_back(phit);
                Ok(())
            }
            None => Err(SimError::OutOfRange(format!(
                "unable to queue phit on vc {}, interface {:?} has {} virtual channels",
                vc,
                self.id,
                self.data_to_send.len()
            ))),
        }
    }

    /// Returns the number of phits still waiting in the send queues.
    pub fn pending_phit_count(&self) -> usize {
        self.data_to_send.iter().map(VecDeque::len).sum()
    }

    /// Returns the live credit counters, indexed by VC.
    pub fn credits(&self) -> &[u64] {
        &self.credit
    }
}

impl SimComponent for SimNetworkInterfaceSrc {
    fn id(&self) -> ComponentId {
        self.id
    }

    fn propagation(&self) -> &PropagationState {
        &self.propagation
    }

    fn propagation_mut(&mut self) -> &mut PropagationState {
        &mut self.propagation
    }

    /// Always succeeds within the tick it is first attempted.
    ///
    /// Sequence per cycle: credits captured during the previous cycle's
    /// reverse pass are folded into the live counters, then at most one
    /// queued phit is transmitted, otherwise a bubble is driven.
    fn try_forward_propagation(&mut self, ctx: &mut CycleContext<'_>) -> SimResult<bool> {
        let cycle = ctx.cycle;
        let sink = &mut ctx.connections[self.sink_connection];

        for (vc, update) in self.credit_update.iter().enumerate() {
            if update.credit > 0 {
                self.credit[vc] += update.credit;
                trace!(
                    "source {:?} vc {} added {} credits, now {}",
                    self.id,
                    vc,
                    update.credit,
                    self.credit[vc]
                );
            }
        }

        let mut did_send_phit = false;
        for (vc, queue) in self.data_to_send.iter_mut().enumerate() {
            let due = matches!(queue.front(), Some(head) if head.cycle <= cycle);
            if !due {
                continue;
            }
            if self.credit[vc] == 0 {
                trace!("source {:?} vc {} stalled, no credit", self.id, vc);
                continue;
            }
            if let Some(head) = queue.pop_front() {
                sink.forward_channels.phit = head.phit;
                sink.forward_channels.phit.vc = vc;
                sink.forward_channels.phit.valid = true;
                sink.forward_channels.cycle = cycle;
                self.credit[vc] -= 1;
                did_send_phit = true;
                trace!(
                    "source {:?} sent data {:#x} vc {} credit now {}",
                    self.id,
                    sink.forward_channels.phit.data,
                    vc,
                    self.credit[vc]
                );
                break;
            }
        }

        if !did_send_phit {
            sink.forward_channels = TimedPhit::bubble(cycle);
        }

        Ok(true)
    }

    /// Captures this cycle's credit update from every VC's reverse
    /// channel; succeeds once all VCs have been captured.
    fn try_reverse_propagation(&mut self, ctx: &mut CycleContext<'_>) -> SimResult<bool> {
        let cycle = ctx.cycle;
        let sink = &ctx.connections[self.sink_connection];

        let vc_count = self.credit_update.len();
        let mut num_propagated = 0;
        for vc in 0..vc_count {
            let possible_credit = sink.reverse_channels[vc];
            if possible_credit.cycle == cycle {
                if self.credit_update[vc].cycle != cycle {
                    let credit = if possible_credit.phit.valid {
                        possible_credit.phit.data
                    } else {
                        0
                    };
                    self.credit_update[vc] = CreditState::new(cycle, credit);
                    trace!(
                        "source {:?} received {} credits on vc {}",
                        self.id,
                        credit,
                        vc
                    );
                }
                num_propagated += 1;
            }
        }

        Ok(num_propagated == vc_count)
    }
}
