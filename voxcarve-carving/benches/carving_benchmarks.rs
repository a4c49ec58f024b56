//! Benchmarks for point voxelization and silhouette carving

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use voxcarve_carving::{voxelize_points, SilhouetteCarver, VoxelGrid};
use voxcarve_core::{BoundingBox, CameraView, Matrix3, Point3f, PointCloud, SilhouetteMask, Vector3};

fn cube_bounds() -> BoundingBox {
    BoundingBox {
        min: Point3f::new(-1.0, -1.0, -1.0),
        max: Point3f::new(1.0, 1.0, 1.0),
    }
}

fn ring_cameras(count: usize) -> Vec<CameraView> {
    (0..count)
        .map(|i| {
            let (s, c) = (i as f32 * std::f32::consts::TAU / count as f32).sin_cos();
            let rotation = Matrix3::new(c, 0.0, -s, 0.0, 1.0, 0.0, s, 0.0, c);
            CameraView::new(rotation, Vector3::new(0.0, 0.0, -5.0), 800.0, 600.0, 0.75)
        })
        .collect()
}

fn disc_mask(width: usize, height: usize) -> SilhouetteMask {
    let (cx, cy) = (width as f32 / 2.0, height as f32 / 2.0);
    let r = height as f32 / 6.0;
    SilhouetteMask::from_fn(width, height, |x, y| {
        let (dx, dy) = (x as f32 - cx, y as f32 - cy);
        dx * dx + dy * dy <= r * r
    })
    .unwrap()
}

fn bench_silhouette_carving(c: &mut Criterion) {
    let cameras = ring_cameras(8);
    let masks = vec![disc_mask(800, 600); cameras.len()];

    let mut group = c.benchmark_group("silhouette_carving");
    group.sample_size(10);
    for &resolution in &[32usize, 64, 128] {
        group.bench_with_input(BenchmarkId::from_parameter(resolution), &resolution, |b, &n| {
            let mut grid = VoxelGrid::new(&cube_bounds(), n).unwrap();
            let mut carver = SilhouetteCarver::default();
            b.iter(|| {
                let report = carver.carve(&mut grid, black_box(&cameras), &masks).unwrap();
                black_box(report);
            });
        });
    }
    group.finish();
}

fn bench_point_occupancy(c: &mut Criterion) {
    let mut group = c.benchmark_group("point_occupancy");
    for &count in &[10_000usize, 100_000] {
        let cloud: PointCloud<Point3f> = (0..count)
            .map(|i| {
                let t = i as f32 / count as f32;
                let theta = t * 97.0;
                Point3f::new(theta.cos() * 0.9, t * 1.8 - 0.9, theta.sin() * 0.9)
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &cloud, |b, cloud| {
            let mut grid = VoxelGrid::new(&cube_bounds(), 128).unwrap();
            b.iter(|| {
                let stats = voxelize_points(&mut grid, black_box(cloud)).unwrap();
                black_box(stats);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_silhouette_carving, bench_point_occupancy);
criterion_main!(benches);
