//! Benchmarks for depthmap-mesh operations.
//!
//! Run with: cargo bench -p depthmap-mesh
//!
//! To compare against baseline:
//! 1. First run: cargo bench -p depthmap-mesh -- --save-baseline main
//! 2. After changes: cargo bench -p depthmap-mesh -- --baseline main

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use depthmap_mesh::{CameraModel, Depthmap, DepthmapParams, ImageFrame, Intrinsics, PackedRgb};
use nalgebra::{Matrix4, Point3};

// =============================================================================
// Test Data Generation
// =============================================================================

const SIZES: [(u32, u32); 3] = [(64, 48), (160, 120), (320, 240)];

fn pixel_camera() -> CameraModel {
    CameraModel::new(
        Matrix4::identity(),
        Matrix4::identity(),
        Intrinsics::new(1.0, 1.0, 0.5, 0.5),
    )
}

/// A gently curved surface, one point per pixel.
fn create_cloud(width: u32, height: u32) -> Vec<Point3<f64>> {
    (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let (u, v) = (x as f64 / width as f64, y as f64 / height as f64);
                let z = 1.0 + 0.05 * (u * 6.0).sin() * (v * 4.0).cos();
                Point3::new(x as f64 * z, y as f64 * z, z)
            })
        })
        .collect()
}

fn create_depthmap(width: u32, height: u32) -> Depthmap {
    let data = vec![128u8; (width * height * 4) as usize];
    let frame = ImageFrame::new(width, height, &data).unwrap();
    let points = create_cloud(width, height);
    Depthmap::build(&frame, &points, &pixel_camera(), &PackedRgb, &DepthmapParams::default())
        .unwrap()
}

// =============================================================================
// Benchmarks
// =============================================================================

fn bench_projection(c: &mut Criterion) {
    let mut group = c.benchmark_group("projection");

    for (width, height) in SIZES {
        let data = vec![128u8; (width * height * 4) as usize];
        let points = create_cloud(width, height);
        let name = format!("{width}x{height}");

        group.throughput(Throughput::Elements(points.len() as u64));
        group.bench_with_input(BenchmarkId::new("build", &name), &points, |b, points| {
            let frame = ImageFrame::new(width, height, &data).unwrap();
            let camera = pixel_camera();
            let params = DepthmapParams::default();
            b.iter(|| {
                Depthmap::build(black_box(&frame), black_box(points), &camera, &PackedRgb, &params)
            })
        });
    }

    group.finish();
}

fn bench_make_surface(c: &mut Criterion) {
    let mut group = c.benchmark_group("make_surface");

    for (width, height) in SIZES {
        let depthmap = create_depthmap(width, height);
        let name = format!("{width}x{height}");

        group.throughput(Throughput::Elements((width * height) as u64));
        group.bench_with_input(BenchmarkId::new("margin_0", &name), &depthmap, |b, dm| {
            b.iter_batched(
                || dm.clone(),
                |mut dm| {
                    dm.make_surface(0);
                    dm
                },
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_join(c: &mut Criterion) {
    let mut group = c.benchmark_group("join");

    let mut depthmap = create_depthmap(160, 120);
    depthmap.make_surface(0);

    for size in [4usize, 16, 64] {
        group.bench_with_input(BenchmarkId::new("region", size), &depthmap, |b, dm| {
            b.iter_batched(
                || dm.clone(),
                |mut dm| dm.join(8, 8, 8 + size, 8 + size),
                criterion::BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("smooth_surface");
    group.sample_size(20);

    let mut depthmap = create_depthmap(160, 120);
    depthmap.make_surface(0);

    for iterations in [1usize, 3] {
        group.bench_with_input(
            BenchmarkId::new("iterations", iterations),
            &depthmap,
            |b, dm| {
                b.iter_batched(
                    || dm.clone(),
                    |mut dm| {
                        dm.smooth_surface(iterations);
                        dm
                    },
                    criterion::BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_export(c: &mut Criterion) {
    let mut depthmap = create_depthmap(320, 240);
    depthmap.make_surface(0);

    c.bench_function("to_mesh_320x240", |b| {
        b.iter(|| black_box(&depthmap).to_mesh(&PackedRgb))
    });
}

criterion_group!(
    benches,
    bench_projection,
    bench_make_surface,
    bench_join,
    bench_smoothing,
    bench_export,
);

criterion_main!(benches);
