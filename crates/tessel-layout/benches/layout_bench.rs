//! Benchmarks for the geometry solve and the drag hot path.
//!
//! Run with: cargo bench -p tessel-layout

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use tessel_core::{Point, PointerEvent, Rect, View};
use tessel_layout::{
    LayoutEngine, LayoutMetrics, Orientation, PaneId, PaneTree, PreviewOverlay, Workspace,
    WorkspaceConfig, compute_geometry, compute_geometry_with, hit_test,
};

/// Balanced-ish tree of `leaves` panes built by repeatedly splitting the
/// newest leaf, alternating orientation.
fn make_tree(leaves: u64) -> PaneTree {
    let area = Rect::from_size(400, 200);
    let mut engine = LayoutEngine::new(
        PaneTree::singleton(View::page(1, "root")),
        area,
        LayoutMetrics::default(),
    )
    .expect("engine");
    let mut target = engine.tree().root();
    for view in 2..=leaves {
        let orientation = if view % 2 == 0 {
            Orientation::Horizontal
        } else {
            Orientation::Vertical
        };
        let split = engine
            .split(target, orientation, View::label(view, "x"), false)
            .expect("split");
        target = engine.tree().split(split).expect("split node").second;
    }
    engine.tree().clone()
}

fn bench_compute_geometry(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/compute_geometry");
    let area = Rect::from_size(400, 200);
    let metrics = LayoutMetrics::default();

    for n in [2, 8, 32, 128] {
        let tree = make_tree(n);
        group.bench_with_input(BenchmarkId::new("chain", n), &tree, |b, tree| {
            b.iter(|| black_box(compute_geometry(tree, area, &metrics)))
        });
    }

    group.finish();
}

fn bench_preview_ratio(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout/preview_ratio");
    let area = Rect::from_size(400, 200);
    let metrics = LayoutMetrics::default();

    for n in [8, 64] {
        let tree = make_tree(n);
        let overlay = PreviewOverlay::Ratio {
            split: tree.root(),
            ratio: 0.3,
        };
        group.bench_with_input(BenchmarkId::new("root", n), &tree, |b, tree| {
            b.iter(|| black_box(compute_geometry_with(tree, area, &metrics, Some(&overlay))))
        });
    }

    group.finish();
}

fn bench_hit_test(c: &mut Criterion) {
    let tree = make_tree(64);
    let layout =
        compute_geometry(&tree, Rect::from_size(400, 200), &LayoutMetrics::default()).expect("solve");
    c.bench_function("layout/hit_test_64", |b| {
        b.iter(|| {
            for y in (0..200).step_by(7) {
                for x in (0..400).step_by(13) {
                    black_box(hit_test(&layout, Point::new(x, y), 0));
                }
            }
        })
    });
}

fn bench_divider_gesture(c: &mut Criterion) {
    c.bench_function("drag/divider_gesture", |b| {
        b.iter_batched(
            || {
                let tree = PaneTree::singleton(View::page(1, "left"));
                let mut ws =
                    Workspace::new(tree, Rect::from_size(201, 60), WorkspaceConfig::default())
                        .expect("workspace");
                let split = ws
                    .split(
                        PaneId::MIN,
                        Orientation::Horizontal,
                        View::page(2, "right"),
                        false,
                    )
                    .expect("split");
                let x = ws.geometry().divider(split).map_or(100, |d| i32::from(d.rect.x));
                (ws, x)
            },
            |(mut ws, x)| {
                let _ = ws.handle_pointer(PointerEvent::Down(Point::new(x, 10)));
                for step in 1..40 {
                    let _ = ws.handle_pointer(PointerEvent::Move(Point::new(x - step, 10)));
                }
                black_box(ws.handle_pointer(PointerEvent::Up(Point::new(x - 40, 10))))
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(
    benches,
    bench_compute_geometry,
    bench_preview_ratio,
    bench_hit_test,
    bench_divider_gesture
);
criterion_main!(benches);
