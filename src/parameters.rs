//! Per-component and per-port configuration consumed by the simulator.
//!
//! Parameters are kept apart from the network graph: the graph says what
//! is wired to what, the parameters say how deep the buffers are, how
//! many virtual channels a port multiplexes and how many pipeline stages
//! a link inserts. [`NocParameters`] is the store the simulator queries
//! during simulation-object creation; missing entries surface as
//! [`SimError::NotFound`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::types::{ComponentId, PortId};

/// Configuration of a single virtual channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualChannelParam {
    /// Buffer depth (in phits) at the receiving side of the channel.
    pub depth: usize,
}

impl VirtualChannelParam {
    /// Creates a virtual-channel parameter with the given buffer depth.
    pub fn new(depth: usize) -> Self {
        Self { depth }
    }
}

/// Configuration of a port: the virtual channels multiplexed onto it.
///
/// # Example
///
/// ```
/// use nocsim::parameters::PortParam;
///
/// // Two VCs, four phits of buffering each.
/// let port = PortParam::uniform(2, 4);
/// assert_eq!(port.vc_count(), 2);
/// assert_eq!(port.virtual_channels[1].depth, 4);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortParam {
    /// Per-VC configuration, indexed by VC number.
    pub virtual_channels: Vec<VirtualChannelParam>,
}

impl PortParam {
    /// Creates a port parameter from explicit VC configurations.
    pub fn new(virtual_channels: Vec<VirtualChannelParam>) -> Self {
        Self { virtual_channels }
    }

    /// Creates `vc_count` virtual channels all with the same `depth`.
    pub fn uniform(vc_count: usize, depth: usize) -> Self {
        Self {
            virtual_channels: vec![VirtualChannelParam::new(depth); vc_count],
        }
    }

    /// Returns the number of configured virtual channels.
    pub fn vc_count(&self) -> usize {
        self.virtual_channels.len()
    }
}

/// Configuration of a traffic-injecting network interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterfaceSrcParam {
    /// The interface's single output port.
    pub port: PortParam,
}

/// Configuration of a traffic-receiving network interface.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkInterfaceSinkParam {
    /// The interface's single input port.
    pub port: PortParam,
}

/// Configuration of a pipelined link.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkParam {
    /// Pipeline stages on the forward (source→sink) direction.
    pub source_to_sink_pipeline_stages: usize,
    /// Pipeline stages on the reverse (sink→source) credit direction.
    pub sink_to_source_pipeline_stages: usize,
    /// Width of the phit data word in bits.
    pub phit_data_bit_width: usize,
}

/// Configuration of a router.
///
/// Router behavior is currently derived entirely from its port
/// parameters; this struct reserves the slot in [`ComponentParam`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterParam {}

/// Tagged per-component configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentParam {
    /// Parameters for a [`ComponentKind::NISrc`](crate::network::ComponentKind::NISrc).
    NetworkInterfaceSrc(NetworkInterfaceSrcParam),
    /// Parameters for a [`ComponentKind::NISink`](crate::network::ComponentKind::NISink).
    NetworkInterfaceSink(NetworkInterfaceSinkParam),
    /// Parameters for a [`ComponentKind::Link`](crate::network::ComponentKind::Link).
    Link(LinkParam),
    /// Parameters for a [`ComponentKind::Router`](crate::network::ComponentKind::Router).
    Router(RouterParam),
}

/// Store of component and port parameters for one simulation.
#[derive(Clone, Debug, Default)]
pub struct NocParameters {
    component_params: HashMap<ComponentId, ComponentParam>,
    port_params: HashMap<PortId, PortParam>,
}

impl NocParameters {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the parameters for a component, replacing any previous
    /// entry.
    pub fn set_component_param(&mut self, id: ComponentId, param: ComponentParam) {
        self.component_params.insert(id, param);
    }

    /// Registers the parameters for a port, replacing any previous entry.
    pub fn set_port_param(&mut self, id: PortId, param: PortParam) {
        self.port_params.insert(id, param);
    }

    /// Returns the parameters registered for `id`.
    pub fn component_param(&self, id: ComponentId) -> SimResult<&ComponentParam> {
        self.component_params
            .get(&id)
            .ok_or_else(|| SimError::NotFound(format!("parameters for component {:?}", id)))
    }

    /// Returns the parameters registered for `id`.
    pub fn port_param(&self, id: PortId) -> SimResult<&PortParam> {
        self.port_params
            .get(&id)
            .ok_or_else(|| SimError::NotFound(format!("parameters for port {:?}", id)))
    }
}
