use criterion::{black_box, criterion_group, criterion_main, Criterion};

use starweave_core::generation::generate_galaxy;
use starweave_core::prelude::*;
use starweave_logic::allocator::{satisfy_demands, DemandNode, FlowNetwork, Link, Producer};
use starweave_logic::topology::calculate_visible_systems;

use rand::rngs::StdRng;
use rand::SeedableRng;

fn large_config() -> SimConfig {
    let mut config = SimConfig::default().with_seed(7);
    config.galaxy.system_count = 200;
    config
}

fn bench_generate_galaxy(c: &mut Criterion) {
    let config = large_config();
    c.bench_function("generate_galaxy_200", |b| {
        b.iter(|| {
            let mut rng = StdRng::seed_from_u64(7);
            generate_galaxy(black_box(&config.galaxy), &mut rng)
        })
    });
}

fn bench_visibility(c: &mut Criterion) {
    let config = large_config();
    let mut rng = StdRng::seed_from_u64(7);
    let (galaxy, home) = generate_galaxy(&config.galaxy, &mut rng);
    c.bench_function("visibility_200", |b| {
        b.iter(|| calculate_visible_systems(black_box(&galaxy), Some(home)))
    });
}

fn bench_satisfy_demands(c: &mut Criterion) {
    // 20 producers each linked to every one of 100 consumers
    let mut network = FlowNetwork::default();
    for p in 0..20u32 {
        network.producers.push(Producer { id: p, supply: 50.0 });
    }
    for q in 100..200u32 {
        network.consumers.push(DemandNode { id: q, demand: 15.0 });
        for p in 0..20u32 {
            network.links.push(Link { from: p, to: q, bandwidth: 5.0 });
        }
    }
    c.bench_function("satisfy_demands_20x100", |b| {
        b.iter(|| satisfy_demands(black_box(&network)))
    });
}

fn bench_tick(c: &mut Criterion) {
    let mut sim = Simulation::new(large_config(), MemoryStore::new());
    sim.new_game(0);
    sim.start(0);
    let mut now = 0;
    c.bench_function("tick_200_systems", |b| {
        b.iter(|| {
            now += 100;
            sim.tick(black_box(now))
        })
    });
}

criterion_group!(
    benches,
    bench_generate_galaxy,
    bench_visibility,
    bench_satisfy_demands,
    bench_tick,
);
criterion_main!(benches);
