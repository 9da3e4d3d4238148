//! End-to-end tests for a source feeding a sink through one link.
//!
//! These cover the visible timing of the credit protocol: the initial
//! full-depth grant at cycle 0, per-phit credit recycling, starvation
//! under a depth-1 buffer, and the latency contribution of the link's
//! forward and reverse pipeline stages.

use nocsim::network::{ComponentKind, NetworkManager, PortDirection};
use nocsim::parameters::{
    ComponentParam, LinkParam, NetworkInterfaceSinkParam, NetworkInterfaceSrcParam, NocParameters,
    PortParam,
};
use nocsim::phit::{DataPhit, TimedPhit};
use nocsim::routing::StaticRoutingTable;
use nocsim::simulator::NocSimulator;
use nocsim::types::{ComponentId, ConnectionId};
use nocsim::SimError;

const MAX_TICKS: u64 = 32;

// ============================================================================
// Harness
// ============================================================================

struct SingleHop {
    simulator: NocSimulator,
    src: ComponentId,
    sink: ComponentId,
    src_to_link: ConnectionId,
    link_to_sink: ConnectionId,
}

/// Builds `source → link → sink` with one VC of the given sink depth.
fn build_single_hop(sink_depth: usize, forward_stages: usize, reverse_stages: usize) -> SingleHop {
    let mut net = NetworkManager::new();
    let network = net.add_network();
    let src = net.add_component(network, ComponentKind::NISrc).unwrap();
    let link = net.add_component(network, ComponentKind::Link).unwrap();
    let sink = net.add_component(network, ComponentKind::NISink).unwrap();

    let src_out = net.add_port(src, PortDirection::Output).unwrap();
    let link_in = net.add_port(link, PortDirection::Input).unwrap();
    let link_out = net.add_port(link, PortDirection::Output).unwrap();
    let sink_in = net.add_port(sink, PortDirection::Input).unwrap();
    let src_to_link = net.connect(src_out, link_in).unwrap();
    let link_to_sink = net.connect(link_out, sink_in).unwrap();

    let port = PortParam::uniform(1, sink_depth);
    let mut params = NocParameters::new();
    params.set_port_param(src_out, port.clone());
    params.set_port_param(link_out, port.clone());
    params.set_port_param(sink_in, port.clone());
    params.set_component_param(
        src,
        ComponentParam::NetworkInterfaceSrc(NetworkInterfaceSrcParam { port: port.clone() }),
    );
    params.set_component_param(
        link,
        ComponentParam::Link(LinkParam {
            source_to_sink_pipeline_stages: forward_stages,
            sink_to_source_pipeline_stages: reverse_stages,
            phit_data_bit_width: 64,
        }),
    );
    params.set_component_param(
        sink,
        ComponentParam::NetworkInterfaceSink(NetworkInterfaceSinkParam { port }),
    );

    let mut simulator = NocSimulator::new(net, params, Box::new(StaticRoutingTable::new()));
    simulator.create_simulation_objects(network).unwrap();

    SingleHop {
        simulator,
        src,
        sink,
        src_to_link,
        link_to_sink,
    }
}

fn inject(harness: &mut SingleHop, data: u64, vc: usize, cycle: i64) {
    harness
        .simulator
        .get_sim_network_interface_src(harness.src)
        .unwrap()
        .send_phit_at_time(TimedPhit::new(cycle, DataPhit::new(data, vc, 0)))
        .unwrap();
}

fn received(harness: &SingleHop) -> Vec<(i64, u64)> {
    harness
        .simulator
        .get_sim_network_interface_sink(harness.sink)
        .unwrap()
        .received_traffic()
        .iter()
        .map(|phit| (phit.cycle, phit.phit.data))
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_three_phits_through_one_stage_link() {
    let mut harness = build_single_hop(2, 1, 1);
    inject(&mut harness, 0xA, 0, 1);
    inject(&mut harness, 0xB, 0, 2);
    inject(&mut harness, 0xC, 0, 3);

    // Credit grant reaches the source during cycle 1 and is applied at
    // cycle 2, so the first two phits go out back to back at cycles 2
    // and 3 and land at 3 and 4. The third phit waits for the credit
    // freed by the first: returned at cycle 3, it crosses the reverse
    // stage at 4, is applied at 5, and the phit lands at 6.
    for _ in 0..=6 {
        harness.simulator.run_cycle(MAX_TICKS).unwrap();
    }

    assert_eq!(received(&harness), vec![(3, 0xA), (4, 0xB), (6, 0xC)]);
}

#[test]
fn test_depth_one_sink_starves_source_to_every_other_cycle() {
    let mut harness = build_single_hop(1, 1, 0);
    for i in 0..4 {
        inject(&mut harness, 0x10 + i, 0, 1);
    }

    let src_to_link = harness
        .simulator
        .get_connection_index(harness.src_to_link)
        .unwrap();

    // With a single downstream buffer slot the source can only transmit
    // once per credit round trip: one cycle outbound, one cycle for the
    // credit to come back.
    let mut transmit_cycles = Vec::new();
    for cycle in 0..=8 {
        harness.simulator.run_cycle(MAX_TICKS).unwrap();
        let forward = harness.simulator.connections()[src_to_link].forward_channels;
        if forward.phit.valid {
            transmit_cycles.push(cycle);
        }
    }

    assert_eq!(transmit_cycles, vec![1, 3, 5, 7]);
    assert_eq!(
        received(&harness),
        vec![(2, 0x10), (4, 0x11), (6, 0x12), (8, 0x13)]
    );
}

#[test]
fn test_zero_stage_link_still_costs_one_cycle_end_to_end() {
    let mut harness = build_single_hop(2, 0, 1);
    inject(&mut harness, 0x55, 0, 1);

    let link_to_sink = harness
        .simulator
        .get_connection_index(harness.link_to_sink)
        .unwrap();

    // The forward pipeline is empty, so the phit crosses the link in the
    // same cycle it is transmitted. The cycle of latency comes from the
    // credit path: the initial grant crosses the reverse stage during
    // cycle 1 and is usable at cycle 2.
    let mut observed_cycle = None;
    for cycle in 0..=3 {
        harness.simulator.run_cycle(MAX_TICKS).unwrap();
        let forward = harness.simulator.connections()[link_to_sink].forward_channels;
        if forward.phit.valid && observed_cycle.is_none() {
            observed_cycle = Some((cycle, forward.phit.data));
        }
    }

    assert_eq!(observed_cycle, Some((2, 0x55)));
    assert_eq!(received(&harness), vec![(2, 0x55)]);
}

#[test]
fn test_zero_depth_vc_blocks_source_indefinitely() {
    let mut harness = build_single_hop(0, 1, 1);
    inject(&mut harness, 0x77, 0, 1);

    for _ in 0..8 {
        harness.simulator.run_cycle(MAX_TICKS).unwrap();
    }

    assert!(received(&harness).is_empty());
    let source = harness
        .simulator
        .get_sim_network_interface_src(harness.src)
        .unwrap();
    assert_eq!(source.pending_phit_count(), 1);
    assert_eq!(source.credits(), &[0]);
}

#[test]
fn test_injection_on_unknown_vc_is_out_of_range() {
    let mut harness = build_single_hop(2, 1, 1);
    let source = harness
        .simulator
        .get_sim_network_interface_src(harness.src)
        .unwrap();

    let err = source
        .send_phit_at_time(TimedPhit::new(1, DataPhit::new(0x1, 3, 0)))
        .unwrap_err();
    assert!(matches!(err, SimError::OutOfRange(_)));

    // The queue for the valid VC is untouched.
    assert_eq!(source.pending_phit_count(), 0);
}

#[test]
fn test_source_drains_lowest_vc_first() {
    // Two VCs directly from source to sink; both phits are due at cycle
    // 1, so the VC scan order decides who goes first.
    let mut net = NetworkManager::new();
    let network = net.add_network();
    let src = net.add_component(network, ComponentKind::NISrc).unwrap();
    let sink = net.add_component(network, ComponentKind::NISink).unwrap();
    let src_out = net.add_port(src, PortDirection::Output).unwrap();
    let sink_in = net.add_port(sink, PortDirection::Input).unwrap();
    net.connect(src_out, sink_in).unwrap();

    let port = PortParam::uniform(2, 2);
    let mut params = NocParameters::new();
    params.set_port_param(src_out, port.clone());
    params.set_port_param(sink_in, port.clone());
    params.set_component_param(
        src,
        ComponentParam::NetworkInterfaceSrc(NetworkInterfaceSrcParam { port: port.clone() }),
    );
    params.set_component_param(
        sink,
        ComponentParam::NetworkInterfaceSink(NetworkInterfaceSinkParam { port }),
    );

    let mut simulator = NocSimulator::new(net, params, Box::new(StaticRoutingTable::new()));
    simulator.create_simulation_objects(network).unwrap();

    let source = simulator.get_sim_network_interface_src(src).unwrap();
    source
        .send_phit_at_time(TimedPhit::new(1, DataPhit::new(0xB1, 1, 0)))
        .unwrap();
    source
        .send_phit_at_time(TimedPhit::new(1, DataPhit::new(0xA0, 0, 0)))
        .unwrap();

    for _ in 0..3 {
        simulator.run_cycle(MAX_TICKS).unwrap();
    }

    let log: Vec<(i64, u64, usize)> = simulator
        .get_sim_network_interface_sink(sink)
        .unwrap()
        .received_traffic()
        .iter()
        .map(|phit| (phit.cycle, phit.phit.data, phit.phit.vc))
        .collect();
    assert_eq!(log, vec![(1, 0xA0, 0), (2, 0xB1, 1)]);
}
