//! Performance benchmarks for the simulation kernel.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use nocsim::network::{ComponentKind, NetworkManager, PortDirection};
use nocsim::parameters::{
    ComponentParam, LinkParam, NetworkInterfaceSinkParam, NetworkInterfaceSrcParam, NocParameters,
    PortParam,
};
use nocsim::phit::{DataPhit, TimedPhit};
use nocsim::routing::{PortAndVc, StaticRoutingTable};
use nocsim::simulator::NocSimulator;
use nocsim::types::ComponentId;

const MAX_TICKS: u64 = 64;

// ============================================================================
// Builders
// ============================================================================

/// `source → link → sink`, one VC, depth 4.
fn build_single_hop() -> (NocSimulator, ComponentId) {
    let mut net = NetworkManager::new();
    let network = net.add_network();
    let src = net.add_component(network, ComponentKind::NISrc).unwrap();
    let link = net.add_component(network, ComponentKind::Link).unwrap();
    let sink = net.add_component(network, ComponentKind::NISink).unwrap();

    let src_out = net.add_port(src, PortDirection::Output).unwrap();
    let link_in = net.add_port(link, PortDirection::Input).unwrap();
    let link_out = net.add_port(link, PortDirection::Output).unwrap();
    let sink_in = net.add_port(sink, PortDirection::Input).unwrap();
    net.connect(src_out, link_in).unwrap();
    net.connect(link_out, sink_in).unwrap();

    let port = PortParam::uniform(1, 4);
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
            source_to_sink_pipeline_stages: 1,
            sink_to_source_pipeline_stages: 1,
            phit_data_bit_width: 64,
        }),
    );
    params.set_component_param(
        sink,
        ComponentParam::NetworkInterfaceSink(NetworkInterfaceSinkParam { port }),
    );

    let mut simulator = NocSimulator::new(net, params, Box::new(StaticRoutingTable::new()));
    simulator.create_simulation_objects(network).unwrap();
    (simulator, src)
}

/// `n` sources fanned into one router feeding one sink.
fn build_fan_in(n: usize) -> (NocSimulator, Vec<ComponentId>) {
    let mut net = NetworkManager::new();
    let network = net.add_network();
    let router = net.add_component(network, ComponentKind::Router).unwrap();
    let sink = net.add_component(network, ComponentKind::NISink).unwrap();

    let port = PortParam::uniform(1, 4);
    let mut params = NocParameters::new();
    let mut table = StaticRoutingTable::new();
    let mut sources = Vec::new();

    for i in 0..n {
        let src = net.add_component(network, ComponentKind::NISrc).unwrap();
        let src_out = net.add_port(src, PortDirection::Output).unwrap();
        let router_in = net.add_port(router, PortDirection::Input).unwrap();
        net.connect(src_out, router_in).unwrap();
        params.set_port_param(src_out, port.clone());
        params.set_port_param(router_in, port.clone());
        params.set_component_param(
            src,
            ComponentParam::NetworkInterfaceSrc(NetworkInterfaceSrcParam { port: port.clone() }),
        );
        table.add_route(router, i, 0, 0, PortAndVc::new(0, 0));
        sources.push(src);
    }

    let router_out = net.add_port(router, PortDirection::Output).unwrap();
    let sink_in = net.add_port(sink, PortDirection::Input).unwrap();
    net.connect(router_out, sink_in).unwrap();
    params.set_port_param(router_out, port.clone());
    params.set_port_param(sink_in, port.clone());
    params.set_component_param(
        sink,
        ComponentParam::NetworkInterfaceSink(NetworkInterfaceSinkParam { port }),
    );

    let mut simulator = NocSimulator::new(net, params, Box::new(table));
    simulator.create_simulation_objects(network).unwrap();
    (simulator, sources)
}

// ============================================================================
// Benchmarks
// ============================================================================

fn bench_single_hop(c: &mut Criterion) {
    let cycles: u64 = 256;
    let mut group = c.benchmark_group("single_hop");
    group.throughput(Throughput::Elements(cycles));
    group.bench_function("run_cycles", |b| {
        b.iter(|| {
            let (mut simulator, src) = build_single_hop();
            let source = simulator.get_sim_network_interface_src(src).unwrap();
            for i in 0..cycles {
                source
                    .send_phit_at_time(TimedPhit::new(
                        (i + 1) as i64,
                        DataPhit::new(i, 0, 0),
                    ))
                    .unwrap();
            }
            for _ in 0..cycles {
                simulator.run_cycle(MAX_TICKS).unwrap();
            }
            black_box(simulator.current_cycle())
        })
    });
    group.finish();
}

fn bench_router_fan_in(c: &mut Criterion) {
    let cycles: u64 = 128;
    let mut group = c.benchmark_group("router_fan_in");
    for n in [2usize, 4, 8] {
        group.throughput(Throughput::Elements(cycles));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| {
                let (mut simulator, sources) = build_fan_in(n);
                for (s, &src) in sources.iter().enumerate() {
                    let source = simulator.get_sim_network_interface_src(src).unwrap();
                    for i in 0..cycles / 4 {
                        source
                            .send_phit_at_time(TimedPhit::new(
                                (i + 1) as i64,
                                DataPhit::new((s as u64) << 32 | i, 0, 0),
                            ))
                            .unwrap();
                    }
                }
                for _ in 0..cycles {
                    simulator.run_cycle(MAX_TICKS).unwrap();
                }
                black_box(simulator.current_cycle())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_single_hop, bench_router_fan_in);
criterion_main!(benches);
