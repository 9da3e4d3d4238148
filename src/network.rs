//! Typed network graph consumed by the simulator.
//!
//! The [`NetworkManager`] owns arenas of networks, components, ports and
//! connections and hands out opaque handles into them. The simulator only
//! reads the graph: it iterates a network's connections and components,
//! resolves each component's ordered input/output ports, and follows a
//! port to the connection attached to it. Construction happens up front
//! through the builder methods; the graph does not change during a run.
//!
//! # Example
//!
//! ```
//! use nocsim::network::{ComponentKind, NetworkManager, PortDirection};
//!
//! let mut net = NetworkManager::new();
//! let network = net.add_network();
//! let src = net.add_component(network, ComponentKind::NISrc).unwrap();
//! let sink = net.add_component(network, ComponentKind::NISink).unwrap();
//! let src_out = net.add_port(src, PortDirection::Output).unwrap();
//! let sink_in = net.add_port(sink, PortDirection::Input).unwrap();
//! let conn = net.connect(src_out, sink_in).unwrap();
//!
//! assert_eq!(net.connection(conn).unwrap().src_port(), src_out);
//! assert_eq!(net.network(network).unwrap().connection_ids().len(), 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};
use crate::types::{ComponentId, ConnectionId, NetworkId, PortId};

/// The kind of a network component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    /// Traffic-injecting network interface.
    NISrc,
    /// Traffic-receiving network interface.
    NISink,
    /// Pipelined point-to-point link.
    Link,
    /// Input-buffered virtual-channel router.
    Router,
    /// Placeholder kind; simulation-object creation rejects it.
    None,
}

/// Direction of a port relative to its component.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortDirection {
    /// The component consumes phits through this port.
    Input,
    /// The component produces phits through this port.
    Output,
}

/// A network: a set of components wired together by connections.
#[derive(Clone, Debug)]
pub struct Network {
    id: NetworkId,
    components: Vec<ComponentId>,
    connections: Vec<ConnectionId>,
}

impl Network {
    /// Returns this network's handle.
    pub fn id(&self) -> NetworkId {
        self.id
    }

    /// Returns the component handles in creation order.
    pub fn component_ids(&self) -> &[ComponentId] {
        &self.components
    }

    /// Returns the connection handles in creation order.
    pub fn connection_ids(&self) -> &[ConnectionId] {
        &self.connections
    }
}

/// A component of a network.
#[derive(Clone, Debug)]
pub struct NetworkComponent {
    id: ComponentId,
    network: NetworkId,
    kind: ComponentKind,
    input_ports: Vec<PortId>,
    output_ports: Vec<PortId>,
}

impl NetworkComponent {
    /// Returns this component's handle.
    pub fn id(&self) -> ComponentId {
        self.id
    }

    /// Returns the network this component belongs to.
    pub fn network(&self) -> NetworkId {
        self.network
    }

    /// Returns the component kind.
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// Returns the input ports in creation order.
    ///
    /// The position of a port in this list is its *input port index*,
    /// the index routing tables and routers arbitrate over.
    pub fn input_ports(&self) -> &[PortId] {
        &self.input_ports
    }

    /// Returns the output ports in creation order.
    pub fn output_ports(&self) -> &[PortId] {
        &self.output_ports
    }
}

/// A port on a network component.
#[derive(Clone, Debug)]
pub struct Port {
    id: PortId,
    component: ComponentId,
    direction: PortDirection,
    connection: Option<ConnectionId>,
}

impl Port {
    /// Returns this port's handle.
    pub fn id(&self) -> PortId {
        self.id
    }

    /// Returns the component this port belongs to.
    pub fn component(&self) -> ComponentId {
        self.component
    }

    /// Returns the port direction.
    pub fn direction(&self) -> PortDirection {
        self.direction
    }

    /// Returns the connection attached to this port, if any.
    pub fn connection(&self) -> Option<ConnectionId> {
        self.connection
    }
}

/// A connection from an output port to an input port.
#[derive(Clone, Debug)]
pub struct Connection {
    id: ConnectionId,
    network: NetworkId,
    src_port: PortId,
    sink_port: PortId,
}

impl Connection {
    /// Returns this connection's handle.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Returns the network this connection belongs to.
    pub fn network(&self) -> NetworkId {
        self.network
    }

    /// Returns the driving (output) port.
    pub fn src_port(&self) -> PortId {
        self.src_port
    }

    /// Returns the receiving (input) port.
    pub fn sink_port(&self) -> PortId {
        self.sink_port
    }
}

/// Owner of the network graph.
///
/// All entities live in flat arenas; handles are indices into them. The
/// builder methods validate wiring as it is made: a connection must go
/// from an output port to an input port, both unconnected, within the
/// same network.
#[derive(Clone, Debug, Default)]
pub struct NetworkManager {
    networks: Vec<Network>,
    components: Vec<NetworkComponent>,
    ports: Vec<Port>,
    connections: Vec<Connection>,
}

impl NetworkManager {
    /// Creates an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new network.
    pub fn add_network(&mut self) -> NetworkId {
        let id = NetworkId(self.networks.len());
        self.networks.push(Network {
            id,
            components: Vec::new(),
            connections: Vec::new(),
        });
        id
    }

    /// Creates a new component of the given kind inside `network`.
    pub fn add_component(
        &mut self,
        network: NetworkId,
        kind: ComponentKind,
    ) -> SimResult<ComponentId> {
        if network.0 >= self.networks.len() {
            return Err(SimError::NotFound(format!("network {:?}", network)));
        }
        let id = ComponentId(self.components.len());
        self.components.push(NetworkComponent {
            id,
            network,
            kind,
            input_ports: Vec::new(),
            output_ports: Vec::new(),
        });
        self.networks[network.0].components.push(id);
        Ok(id)
    }

    /// Creates a new port on `component`.
    pub fn add_port(
        &mut self,
        component: ComponentId,
        direction: PortDirection,
    ) -> SimResult<PortId> {
        if component.0 >= self.components.len() {
            return Err(SimError::NotFound(format!("component {:?}", component)));
        }
        let id = PortId(self.ports.len());
        self.ports.push(Port {
            id,
            component,
            direction,
            connection: None,
        });
        let comp = &mut self.components[component.0];
        match direction {
            PortDirection::Input => comp.input_ports.push(id),
            PortDirection::Output => comp.output_ports.push(id),
        }
        Ok(id)
    }

    /// Connects an output port to an input port.
    ///
    /// Both ports must be unconnected and belong to components of the
    /// same network.
    pub fn connect(&mut self, src_port: PortId, sink_port: PortId) -> SimResult<ConnectionId> {
        let src = self.port(src_port)?;
        let sink = self.port(sink_port)?;

        if src.direction != PortDirection::Output {
            return Err(SimError::Config(format!(
                "connection source {:?} is not an output port",
                src_port
            )));
        }
        if sink.direction != PortDirection::Input {
            return Err(SimError::Config(format!(
                "connection sink {:?} is not an input port",
                sink_port
            )));
        }
        if src.connection.is_some() || sink.connection.is_some() {
            return Err(SimError::Config(format!(
                "port {:?} or {:?} is already connected",
                src_port, sink_port
            )));
        }

        let network = self.component(src.component)?.network;
        if self.component(sink.component)?.network != network {
            return Err(SimError::Config(format!(
                "ports {:?} and {:?} belong to different networks",
                src_port, sink_port
            )));
        }

        let id = ConnectionId(self.connections.len());
        self.connections.push(Connection {
            id,
            network,
            src_port,
            sink_port,
        });
        self.ports[src_port.0].connection = Some(id);
        self.ports[sink_port.0].connection = Some(id);
        self.networks[network.0].connections.push(id);
        Ok(id)
    }

    /// Looks up a network by handle.
    pub fn network(&self, id: NetworkId) -> SimResult<&Network> {
        self.networks
            .get(id.0)
            .ok_or_else(|| SimError::NotFound(format!("network {:?}", id)))
    }

    /// Looks up a component by handle.
    pub fn component(&self, id: ComponentId) -> SimResult<&NetworkComponent> {
        self.components
            .get(id.0)
            .ok_or_else(|| SimError::NotFound(format!("component {:?}", id)))
    }

    /// Looks up a port by handle.
    pub fn port(&self, id: PortId) -> SimResult<&Port> {
        self.ports
            .get(id.0)
            .ok_or_else(|| SimError::NotFound(format!("port {:?}", id)))
    }

    /// Looks up a connection by handle.
    pub fn connection(&self, id: ConnectionId) -> SimResult<&Connection> {
        self.connections
            .get(id.0)
            .ok_or_else(|| SimError::NotFound(format!("connection {:?}", id)))
    }

    /// Returns the connection attached to `port`, failing if the port is
    /// left dangling.
    pub fn port_connection(&self, port: PortId) -> SimResult<ConnectionId> {
        self.port(port)?.connection.ok_or_else(|| {
            SimError::Config(format!("port {:?} has no connection attached", port))
        })
    }
}
