//! Criterion benchmarks for stimulus generation.
//!
//! Run with:
//!   cargo bench -p vision_games
//!
//! Results are saved to target/criterion/

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use vision_games::color::ColorBoard;
use vision_games::gabor::{patch_count, GaborBoard, Layout};
use vision_games::{Prng, Viewport};

/// Gabor boards across patch sizes; small patches mean dense grids.
fn bench_gabor_boards(c: &mut Criterion) {
    let mut group = c.benchmark_group("gabor_board");
    let viewport = Viewport::new(1280.0, 720.0);

    for size in [30.0_f64, 60.0, 120.0].iter() {
        for layout in [Layout::Grid, Layout::Random] {
            let patches = patch_count(viewport, *size, layout);
            group.throughput(Throughput::Elements(patches as u64));
            group.bench_with_input(
                BenchmarkId::new(layout.label(), *size as u32),
                size,
                |b, &size| {
                    let mut rng = Prng::new(42);
                    b.iter(|| black_box(GaborBoard::generate(viewport, size, layout, &mut rng)));
                },
            );
        }
    }

    group.finish();
}

fn bench_color_boards(c: &mut Criterion) {
    let mut group = c.benchmark_group("color_board");

    for level in [1_u32, 10, 30].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(level), level, |b, &level| {
            let mut rng = Prng::new(7);
            b.iter(|| {
                let board = ColorBoard::generate(level, &mut rng);
                black_box((0..board.tile_count()).map(|i| board.tile_css(i)).count())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_gabor_boards, bench_color_boards);
criterion_main!(benches);
