//! Benchmarks for the per-frame simulation step, software rendering and
//! sprite batch recording.
//!
//! Run with: `cargo bench`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use std::sync::Arc;

use lumina::modes::{RUNES, SNOWFLAKES};
use lumina::prelude::*;
use lumina::{DrawList, FontSet, GlyphAtlas, SpriteBatch};

const STEP_MS: f64 = 16.0;

fn simulation(mode: Mode, count: u32) -> Simulation {
    Simulation::builder()
        .with_config(Config {
            particle_count: count,
            ..Config::default().with_mode(mode)
        })
        .with_canvas(800.0, 600.0)
        .with_seed(42)
        .build()
}

fn bench_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("update");

    for mode in [Mode::Swarm, Mode::Heart, Mode::Duel, Mode::BlackHole, Mode::Tnt] {
        for count in [1500u32, 4000] {
            group.bench_with_input(
                BenchmarkId::new(mode.name(), count),
                &count,
                |b, &count| {
                    let mut sim = simulation(mode, count);
                    let mut clock = FrameClock::fixed(STEP_MS);
                    b.iter(|| sim.update(black_box(clock.tick())))
                },
            );
        }
    }

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    group.sample_size(20);

    for (mode, glow) in [(Mode::Swarm, 0u32), (Mode::Swarm, 15), (Mode::Snow, 5), (Mode::Angel, 25)] {
        let id = format!("{}_glow{}", mode.name(), glow);
        group.bench_function(&id, |b| {
            let mut sim = Simulation::builder()
                .with_config(Config {
                    particle_count: 1500,
                    glow_intensity: glow,
                    ..Config::default().with_mode(mode)
                })
                .with_canvas(800.0, 600.0)
                .with_seed(42)
                .build();
            sim.update(STEP_MS);
            let mut canvas = Framebuffer::new(800, 600);
            b.iter(|| sim.render(black_box(&mut canvas)))
        });
    }

    group.bench_function("draw_list_1500", |b| {
        let mut sim = simulation(Mode::Galaxy, 1500);
        sim.update(STEP_MS);
        let mut list = DrawList::new(800.0, 600.0);
        b.iter(|| {
            list.clear();
            sim.render(&mut list);
            black_box(list.len())
        })
    });

    let atlas = Arc::new(GlyphAtlas::build(
        &FontSet::embedded(),
        RUNES.iter().chain(SNOWFLAKES).copied(),
    ));
    for mode in [Mode::Galaxy, Mode::Sorcerer, Mode::Snow] {
        let id = format!("sprite_batch_{}_4000", mode.name());
        group.bench_function(&id, |b| {
            let mut sim = simulation(mode, 4000);
            sim.update(STEP_MS);
            let mut batch = SpriteBatch::new(800.0, 600.0, atlas.clone());
            b.iter(|| {
                batch.clear();
                sim.render(&mut batch);
                black_box(batch.len())
            })
        });
    }

    group.finish();
}

fn bench_supernova(c: &mut Criterion) {
    c.bench_function("supernova_cycle_4000", |b| {
        b.iter(|| {
            let mut sim = simulation(Mode::Galaxy, 4000);
            let mut clock = FrameClock::fixed(STEP_MS);
            sim.update(clock.tick());
            sim.trigger_supernova(1);
            while sim.state() != AnimationState::Normal {
                sim.update(clock.tick());
            }
            black_box(sim.frames())
        })
    });
}

criterion_group!(benches, bench_update, bench_render, bench_supernova);
criterion_main!(benches);
