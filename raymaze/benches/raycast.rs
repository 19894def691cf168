use std::f64::consts::PI;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use raymaze::game::maze::DEFAULT_MAZE_SIZE;
use raymaze::game::raycast::DepthBuffer;
use raymaze::{AssetStore, GameState, PlayerId, RenderConfig, Renderer};

fn bench_depth_buffer(c: &mut Criterion) {
    let state = GameState::generate(PlayerId::from("bench0"), DEFAULT_MAZE_SIZE, DEFAULT_MAZE_SIZE, 42)
        .expect("maze generation");
    let mut depth = DepthBuffer::new();

    c.bench_function("depth_buffer_800_columns", |b| {
        b.iter(|| {
            depth.fill(
                &state.grid,
                black_box(state.player.position),
                black_box(state.player.angle),
                800,
                PI / 3.0,
            );
            black_box(depth.len())
        })
    });
}

fn bench_render_frame(c: &mut Criterion) {
    let state = GameState::generate(PlayerId::from("bench0"), DEFAULT_MAZE_SIZE, DEFAULT_MAZE_SIZE, 42)
        .expect("maze generation");
    let assets = AssetStore::procedural();
    let mut renderer = Renderer::new(RenderConfig::default());

    c.bench_function("render_frame_800x600", |b| {
        b.iter(|| black_box(renderer.render_frame(&state, &assets).pixels().len()))
    });
}

criterion_group!(benches, bench_depth_buffer, bench_render_frame);
criterion_main!(benches);
