//! Benchmark for the per-refresh tick.
//!
//! TARGET: one tick (effects, gated updates, render submission) under 1ms,
//! so a 60 Hz host keeps more than 90% of its frame budget
//!
//! Run with: cargo bench --package cablesight_rendering --bench tick_benchmark

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use cablesight_rendering::{effect_parameters, Engine, HeadlessBackend, HostContainer};
use cablesight_shared::{EngineConfig, FaultMode};

fn benchmark_effect_parameters(c: &mut Criterion) {
    c.bench_function("effect_parameters_all_modes", |b| {
        let mut t = 0.0f32;
        b.iter(|| {
            t += 1.0 / 60.0;
            for mode in FaultMode::ALL {
                black_box(effect_parameters(black_box(mode), black_box(t)));
            }
        });
    });
}

fn benchmark_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_tick");
    group.sample_size(50);

    for mode in [FaultMode::Baseline, FaultMode::ElectricalTreeing, FaultMode::JointOverheat] {
        let config = EngineConfig {
            texture_seed: Some(1),
            ..EngineConfig::default()
        };
        let mut engine = match Engine::new(HeadlessBackend::new(), HostContainer::new(1280, 720), config) {
            Ok(engine) => engine,
            Err(err) => panic!("engine setup failed: {err}"),
        };
        engine.inputs().update(|i| {
            i.fault_mode = mode;
            i.is_scanning = true;
        });
        if let Err(err) = engine.mount() {
            panic!("mount failed: {err}");
        }

        let mut now = 0.0f64;
        group.bench_function(mode.name(), |b| {
            b.iter(|| {
                now += 1.0 / 60.0;
                black_box(engine.on_display_refresh(black_box(now)))
            });
        });
        engine.unmount();
    }

    group.finish();
}

fn benchmark_mount(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_mount");
    group.sample_size(10);

    group.bench_function("mount_unmount_default_textures", |b| {
        let config = EngineConfig {
            texture_seed: Some(2),
            ..EngineConfig::default()
        };
        let mut engine = match Engine::new(HeadlessBackend::new(), HostContainer::new(1280, 720), config) {
            Ok(engine) => engine,
            Err(err) => panic!("engine setup failed: {err}"),
        };
        b.iter(|| {
            let _ = black_box(engine.mount());
            engine.unmount();
        });
    });

    group.finish();
}

criterion_group!(benches, benchmark_effect_parameters, benchmark_tick, benchmark_mount);
criterion_main!(benches);
