use bridge_core::{Bridge, BridgeConfig, MemorySink, SandboxWorld};
use bridge_runtime::parse_args;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};

const COMMANDS: &[&str] = &[
    "status",
    "inventory",
    "scan radius=20",
    "find_resources",
    "walk north",
    "craft iron-gear-wheel,1",
    "take iron-plate,3,3,5",
    "fly away",
];

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_args", |b| {
        b.iter(|| parse_args("a,b=1,c=true,d=-2.5,e,f=x y,,g=false"))
    });
}

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    for command in COMMANDS {
        group.bench_with_input(BenchmarkId::from_parameter(command), command, |b, line| {
            let config = BridgeConfig {
                flush_on_dispatch: false,
                ..BridgeConfig::default()
            };
            b.iter_batched(
                || {
                    let mut world = SandboxWorld::with_starter_area();
                    world.give("iron-plate", 100);
                    let bridge = Bridge::new(&config, MemorySink::new()).unwrap();
                    (bridge, world)
                },
                |(mut bridge, mut world)| bridge.dispatch(&mut world, line),
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("step");
    for queued in [0usize, 16, 256] {
        group.bench_with_input(BenchmarkId::new("queued", queued), &queued, |b, &queued| {
            let config = BridgeConfig {
                flush_on_dispatch: false,
                snapshot_cadence: 1,
                ..BridgeConfig::default()
            };
            b.iter_batched(
                || {
                    let mut world = SandboxWorld::with_starter_area();
                    let mut bridge = Bridge::new(&config, MemorySink::new()).unwrap();
                    bridge.dispatch(&mut world, "walk east");
                    for _ in 0..queued {
                        bridge.dispatch(&mut world, "status");
                    }
                    (bridge, world)
                },
                |(mut bridge, mut world)| {
                    world.advance();
                    bridge.step(&mut world).unwrap()
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(dispatch_benches, bench_parse, bench_dispatch, bench_step);
criterion_main!(dispatch_benches);
