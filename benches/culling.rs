// SPDX-License-Identifier: MPL-2.0
use criterion::{criterion_group, criterion_main, Criterion};
use plan_canvas::culler::{CullItem, CullerConfig, ViewportCuller};
use plan_canvas::geometry::Rect;
use std::hint::black_box;

fn fixture_items(count: u64) -> Vec<CullItem> {
    // Deterministic scatter over a 4000x4000 world.
    (0..count)
        .map(|id| {
            let x = ((id * 97) % 4_000) as f32;
            let y = ((id * 57) % 4_000) as f32;
            match id % 3 {
                0 => CullItem::point(id, x, y),
                1 => CullItem::circle(id, x, y, 20.0),
                _ => CullItem::rect(id, x, y, 40.0, 30.0),
            }
        })
        .collect()
}

fn culling_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("culling");
    let viewport = Rect::new(1_000.0, 1_000.0, 800.0, 600.0);

    group.bench_function("indexed_2000_items", |b| {
        let mut culler = ViewportCuller::default();
        let mut items = fixture_items(2_000);
        // Warm the spatial index once; queries then reuse it.
        let _ = culler.cull(&mut items, viewport, 1.0);
        b.iter(|| {
            let visible = culler.cull(black_box(&mut items), viewport, 1.0);
            black_box(visible)
        });
    });

    group.bench_function("fallback_scan_2000_items", |b| {
        let config = CullerConfig {
            enabled: false,
            ..CullerConfig::default()
        };
        let mut culler = ViewportCuller::new(config);
        let mut items = fixture_items(2_000);
        b.iter(|| {
            let visible = culler.cull(black_box(&mut items), viewport, 1.0);
            black_box(visible)
        });
    });

    group.finish();
}

criterion_group!(benches, culling_benchmark);
criterion_main!(benches);
