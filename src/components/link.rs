//! Pipelined point-to-point link.
//!
//! A link joins two connections: the one attached to its input port
//! (upstream) and the one attached to its output port (downstream). The
//! forward direction carries data phits through a
//! [`SimplePipeline`](crate::components::SimplePipeline) of
//! `source_to_sink_pipeline_stages` stages; the reverse direction carries
//! credits through one pipeline per virtual channel with
//! `sink_to_source_pipeline_stages` stages.

use std::collections::HashMap;

use log::trace;

use crate::components::{CycleContext, PropagationState, SimComponent, SimplePipeline};
use crate::error::{SimError, SimResult};
use crate::network::NetworkManager;
use crate::parameters::{ComponentParam, NocParameters};
use crate::phit::{DataPhit, MetadataPhit};
use crate::simulator::SimConnectionState;
use crate::types::{ComponentId, ConnectionId, CycleNum};

/// Simulation object for a [`ComponentKind::Link`](crate::network::ComponentKind::Link).
#[derive(Clone, Debug)]
pub struct SimLink {
    id: ComponentId,
    propagation: PropagationState,
    forward_pipeline: SimplePipeline<DataPhit>,
    /// One credit pipeline per virtual channel.
    reverse_pipelines: Vec<SimplePipeline<MetadataPhit>>,
    phit_data_bit_width: usize,
    /// Index of the upstream connection in the simulator's table.
    src_connection: usize,
    /// Index of the downstream connection in the simulator's table.
    sink_connection: usize,
}

impl SimLink {
    pub(crate) fn create(
        id: ComponentId,
        network: &NetworkManager,
        parameters: &NocParameters,
        connection_index: &HashMap<ConnectionId, usize>,
        connections: &[SimConnectionState],
        cycle: CycleNum,
    ) -> SimResult<Self> {
        let param = match parameters.component_param(id)? {
            ComponentParam::Link(param) => *param,
            other => {
                return Err(SimError::Config(format!(
                    "component {:?} is not configured as a link: {:?}",
                    id, other
                )))
            }
        };

        let component = network.component(id)?;
        let input_port = component
            .input_ports()
            .first()
            .copied()
            .ok_or_else(|| SimError::Config(format!("link {:?} has no input port", id)))?;
        let output_port = component
            .output_ports()
            .first()
            .copied()
            .ok_or_else(|| SimError::Config(format!("link {:?} has no output port", id)))?;

        let resolve = |port| -> SimResult<usize> {
            let connection = network.port_connection(port)?;
            connection_index.get(&connection).copied().ok_or_else(|| {
                SimError::Config(format!(
                    "connection {:?} has no simulation state",
                    connection
                ))
            })
        };
        let src_connection = resolve(input_port)?;
        let sink_connection = resolve(output_port)?;

        // One reverse lane per VC on the downstream side; the upstream
        // side must agree or credits would have nowhere to land.
        let vc_count = connections[sink_connection].reverse_channels.len();
        if connections[src_connection].reverse_channels.len() != vc_count {
            return Err(SimError::Config(format!(
                "link {:?} endpoints disagree on virtual channel count ({} vs {})",
                id,
                connections[src_connection].reverse_channels.len(),
                vc_count
            )));
        }

        Ok(Self {
            id,
            propagation: PropagationState::new(cycle),
            forward_pipeline: SimplePipeline::new(param.source_to_sink_pipeline_stages),
            reverse_pipelines: (0..vc_count)
                .map(|_| SimplePipeline::new(param.sink_to_source_pipeline_stages))
                .collect(),
            phit_data_bit_width: param.phit_data_bit_width,
            src_connection,
            sink_connection,
        })
    }

    /// Returns the forward pipeline depth.
    pub fn forward_stage_count(&self) -> usize {
        self.forward_pipeline.stage_count()
    }

    /// Returns the reverse (credit) pipeline depth.
    pub fn reverse_stage_count(&self) -> usize {
        self.reverse_pipelines
            .first()
            .map(SimplePipeline::stage_count)
            .unwrap_or(0)
    }

    /// Returns the phit data width in bits.
    pub fn phit_data_bit_width(&self) -> usize {
        self.phit_data_bit_width
    }
}

impl SimComponent for SimLink {
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
        let from = ctx.connections[self.src_connection].forward_channels;
        let to = &mut ctx.connections[self.sink_connection].forward_channels;

        let did_propagate = self.forward_pipeline.try_propagation(ctx.cycle, from, to);
        if did_propagate {
            trace!(
                "link {:?} forward propagated, downstream data {:#x} valid {}",
                self.id,
                to.phit.data,
                to.phit.valid
            );
        }
        Ok(did_propagate)
    }

    fn try_reverse_propagation(&mut self, ctx: &mut CycleContext<'_>) -> SimResult<bool> {
        let cycle = ctx.cycle;
        let vc_count = self.reverse_pipelines.len();

        let mut num_propagated = 0;
        for (vc, pipeline) in self.reverse_pipelines.iter_mut().enumerate() {
            let from = ctx.connections[self.sink_connection].reverse_channels[vc];
            let to = &mut ctx.connections[self.src_connection].reverse_channels[vc];
            if pipeline.try_propagation(cycle, from, to) {
                num_propagated += 1;
            }
        }

        if num_propagated == vc_count {
            trace!("link {:?} reverse propagated on all vcs", self.id);
            Ok(true)
        } else {
            Ok(false)
        }
    }
}
