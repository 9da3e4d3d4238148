//! # Nocsim — cycle-accurate NoC simulation kernel
//!
//! A fixed-point, cycle-accurate simulator for networks-on-chip built
//! from traffic sources, pipelined links, input-buffered virtual-channel
//! routers and traffic sinks, all under credit-based flow control.
//!
//! ## Design Principles
//!
//! - **Tick-until-converged**: every cycle is evaluated by repeatedly
//!   ticking all components until each reports that its forward (data)
//!   and reverse (credit) propagation completed. The tick loop *is* the
//!   scheduler — there is no executor and no threads.
//! - **Arena and indices**: the simulator owns flat tables of connection
//!   states and component objects; components address connections by
//!   integer index, never by pointer.
//! - **Credit flow control**: a phit moves only against a credit; credits
//!   travel back on per-VC reverse channels with the same cycle-stamped
//!   discipline as data.
//! - **Deterministic**: fixed-priority arbitration plus a fixed component
//!   visit order make runs with identical inputs byte-identical.
//!
//! ## Example
//!
//! A source feeding a sink through a one-stage link:
//!
//! ```
//! use nocsim::network::{ComponentKind, NetworkManager, PortDirection};
//! use nocsim::parameters::{
//!     ComponentParam, LinkParam, NetworkInterfaceSinkParam, NetworkInterfaceSrcParam,
//!     NocParameters, PortParam,
//! };
//! use nocsim::phit::{DataPhit, TimedPhit};
//! use nocsim::routing::StaticRoutingTable;
//! use nocsim::simulator::NocSimulator;
//!
//! let mut net = NetworkManager::new();
//! let network = net.add_network();
//! let src = net.add_component(network, ComponentKind::NISrc)?;
//! let link = net.add_component(network, ComponentKind::Link)?;
//! let sink = net.add_component(network, ComponentKind::NISink)?;
//! let src_out = net.add_port(src, PortDirection::Output)?;
//! let link_in = net.add_port(link, PortDirection::Input)?;
//! let link_out = net.add_port(link, PortDirection::Output)?;
//! let sink_in = net.add_port(sink, PortDirection::Input)?;
//! net.connect(src_out, link_in)?;
//! net.connect(link_out, sink_in)?;
//!
//! // One virtual channel, two phits of buffering at the sink.
//! let port = PortParam::uniform(1, 2);
//! let mut params = NocParameters::new();
//! params.set_port_param(src_out, port.clone());
//! params.set_port_param(link_out, port.clone());
//! params.set_port_param(sink_in, port.clone());
//! params.set_component_param(
//!     src,
//!     ComponentParam::NetworkInterfaceSrc(NetworkInterfaceSrcParam { port: port.clone() }),
//! );
//! params.set_component_param(
//!     link,
//!     ComponentParam::Link(LinkParam {
//!         source_to_sink_pipeline_stages: 1,
//!         sink_to_source_pipeline_stages: 0,
//!         phit_data_bit_width: 64,
//!     }),
//! );
//! params.set_component_param(
//!     sink,
//!     ComponentParam::NetworkInterfaceSink(NetworkInterfaceSinkParam { port }),
//! );
//!
//! let mut simulator = NocSimulator::new(net, params, Box::new(StaticRoutingTable::new()));
//! simulator.create_simulation_objects(network)?;
//!
//! // Inject one phit, due at cycle 1.
//! simulator
//!     .get_sim_network_interface_src(src)?
//!     .send_phit_at_time(TimedPhit::new(1, DataPhit::new(0xAB, 0, 0)))?;
//!
//! // Cycle 0 distributes the initial credit grants; the phit is
//! // transmitted at cycle 1 and emerges from the link at cycle 2.
//! for _ in 0..3 {
//!     simulator.run_cycle(16)?;
//! }
//!
//! let received = simulator.get_sim_network_interface_sink(sink)?.received_traffic();
//! assert_eq!(received.len(), 1);
//! assert_eq!(received[0].cycle, 2);
//! assert_eq!(received[0].phit.data, 0xAB);
//! # Ok::<(), nocsim::error::SimError>(())
//! ```

pub mod components;
pub mod error;
pub mod network;
pub mod parameters;
pub mod phit;
pub mod routing;
pub mod simulator;
pub mod types;

// Re-export commonly used types
pub use components::{
    SimComponent, SimInputBufferedVCRouter, SimLink, SimNetworkInterfaceSink,
    SimNetworkInterfaceSrc,
};
pub use error::{SimError, SimResult};
pub use network::{ComponentKind, NetworkManager, PortDirection};
pub use parameters::{
    ComponentParam, LinkParam, NetworkInterfaceSinkParam, NetworkInterfaceSrcParam, NocParameters,
    PortParam, RouterParam, VirtualChannelParam,
};
pub use phit::{
    CreditState, DataPhit, MetadataPhit, TimedDataPhit, TimedMetadataPhit, TimedPhit,
};
pub use routing::{PortAndVc, RoutingTable, StaticRoutingTable};
pub use simulator::{NocSimulator, SimConnectionState, SimulatorStats};
pub use types::{ComponentId, ConnectionId, CycleNum, NetworkId, PortId};
