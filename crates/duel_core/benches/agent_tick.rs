//! Agent tick benchmarks for duel_core.
//!
//! Run with: `cargo bench -p duel_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use duel_core::prelude::*;
use duel_core::sensing::SensorArray;
use glam::Vec3;

fn arena() -> ColliderSet {
    let mut set = ColliderSet::with_ground()
        .wall(Aabb::new(Vec3::new(-10.5, 0.0, -10.5), Vec3::new(10.5, 3.0, -10.0)))
        .wall(Aabb::new(Vec3::new(-10.5, 0.0, 10.0), Vec3::new(10.5, 3.0, 10.5)))
        .wall(Aabb::new(Vec3::new(-10.5, 0.0, -10.5), Vec3::new(-10.0, 3.0, 10.5)))
        .wall(Aabb::new(Vec3::new(10.0, 0.0, -10.5), Vec3::new(10.5, 3.0, 10.5)))
        .wall(Aabb::from_center(Vec3::new(0.0, 1.0, 0.0), Vec3::new(1.5, 1.0, 1.5)));
    set.set_agent(AgentId(1), Cylinder::new(Vec3::new(0.0, 0.0, -6.0), 0.5, 1.8));
    set.set_agent(AgentId(2), Cylinder::new(Vec3::new(0.0, 0.0, 6.0), 0.5, 1.8));
    set
}

fn registry() -> RoleRegistry {
    let mut registry = RoleRegistry::new();
    registry.register(
        0,
        OpponentSnapshot::new(AgentId(1), Pose::new(Vec3::new(0.0, 0.0, -6.0), Vec3::Z), 0.5),
    );
    registry.register(
        1,
        OpponentSnapshot::new(AgentId(2), Pose::new(Vec3::new(0.0, 0.0, 6.0), -Vec3::Z), 0.5),
    );
    registry
}

/// Single-agent tick cost with a static opponent.
pub fn tick_benchmark(c: &mut Criterion) {
    let world = arena();
    let roster = registry();
    let env = Environment::new(&world, &roster);

    c.bench_function("agent_tick", |b| {
        let mut agent = Agent::new(
            AgentId(1),
            Pose::new(Vec3::new(0.0, 0.0, -6.0), Vec3::Z),
            AgentConfig::default(),
            RewardConfig::default(),
        );
        let mut body = FreeBody::default();
        b.iter(|| black_box(agent.tick(black_box(0.02), &env, &mut body, None)));
    });
}

/// Combat fan cost against ray count.
pub fn sensing_benchmark(c: &mut Criterion) {
    let world = arena();
    let opponent = OpponentSnapshot::new(AgentId(2), Pose::new(Vec3::new(0.0, 0.0, 6.0), -Vec3::Z), 0.5);
    let pose = Pose::new(Vec3::new(0.0, 0.0, -6.0), Vec3::Z);

    let mut group = c.benchmark_group("sensing");
    for rays in [8usize, 16, 32] {
        let mut config = AgentConfig::default().sensing;
        config.ray_count = rays;
        let sensor = SensorArray::new(AgentId(1), config);
        group.bench_with_input(BenchmarkId::from_parameter(rays), &rays, |b, _| {
            b.iter(|| black_box(sensor.sense(&pose, Some(&opponent), &world)));
        });
    }
    group.finish();
}

criterion_group!(benches, tick_benchmark, sensing_benchmark);
criterion_main!(benches);
