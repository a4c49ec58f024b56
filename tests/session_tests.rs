//! End-to-end tests for the session facade
//!
//! Each test writes a small synthetic scene to a temporary directory: a point
//! cloud sampled on a sphere, a two-camera Bundler rig and disc-shaped masks.

use image::{GrayImage, Luma};
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};
use tempfile::TempDir;
use voxcarve::prelude::*;

const IMAGE_SIZE: u32 = 200;
const FOCAL: f32 = 200.0;
const RADIUS: f32 = 0.5;
const RESOLUTION: usize = 16;

fn sphere_ply() -> String {
    let mut points = vec![[-1.0f32, -1.0, -1.0], [1.0, 1.0, 1.0]];
    let golden = (1.0 + 5.0f32.sqrt()) / 2.0;
    let n = 300;
    for i in 0..n {
        let theta = std::f32::consts::TAU * i as f32 / golden;
        let z = 1.0 - 2.0 * (i as f32 + 0.5) / n as f32;
        let r = (1.0 - z * z).sqrt();
        points.push([RADIUS * r * theta.cos(), RADIUS * r * theta.sin(), RADIUS * z]);
    }

    let mut ply = format!(
        "ply\nformat ascii 1.0\nelement vertex {}\n\
         property float x\nproperty float y\nproperty float z\n\
         property float nx\nproperty float ny\nproperty float nz\n\
         property uchar diffuse_red\nproperty uchar diffuse_green\nproperty uchar diffuse_blue\n\
         end_header\n",
        points.len()
    );
    for p in &points {
        writeln!(ply, "{} {} {} 0 0 1 200 120 40", p[0], p[1], p[2]).unwrap();
    }
    ply
}

/// Cameras five units out on the +z and +x axes, both looking at the origin
fn bundle() -> String {
    format!(
        "# Bundle file v0.3\n2 302\n\
         {f} 0 0\n1 0 0\n0 1 0\n0 0 1\n0 0 -5\n\
         {f} 0 0\n0 0 -1\n0 1 0\n1 0 0\n0 0 -5\n",
        f = FOCAL
    )
}

fn disc_mask() -> GrayImage {
    let radius_px = FOCAL * (RADIUS / 5.0f32).asin().tan() + 0.5;
    let center = IMAGE_SIZE as f32 / 2.0;
    GrayImage::from_fn(IMAGE_SIZE, IMAGE_SIZE, |x, y| {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        if (dx * dx + dy * dy).sqrt() <= radius_px {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

struct Scene {
    dir: TempDir,
}

impl Scene {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("points.ply"), sphere_ply()).unwrap();
        std::fs::write(dir.path().join("bundle.out"), bundle()).unwrap();
        std::fs::create_dir(dir.path().join("masks")).unwrap();
        for view in 0..2 {
            disc_mask()
                .save(dir.path().join("masks").join(format!("mask_{}.png", view)))
                .unwrap();
        }
        std::fs::write(
            dir.path().join("session.txt"),
            format!("points.ply\nbundle.out\nmasks\n{}\n{}\n", IMAGE_SIZE, RESOLUTION),
        )
        .unwrap();
        Self { dir }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn config_path(&self) -> PathBuf {
        self.path().join("session.txt")
    }

    fn config(&self) -> SessionConfig {
        SessionConfig::from_file(self.config_path()).unwrap()
    }

    fn load(&self) -> Session {
        Session::load(self.config()).unwrap()
    }
}

fn center_voxel(grid: &VoxelGrid) -> bool {
    let mid = grid.resolution() / 2;
    grid.occupancy(mid, mid, mid).unwrap()
}

#[test]
fn test_load_builds_full_grid() {
    let scene = Scene::new();
    let session = scene.load();

    assert_eq!(session.point_cloud().len(), 302);
    assert_eq!(session.cameras().len(), 2);
    assert_eq!(session.bounds().min, Point3f::new(-1.0, -1.0, -1.0));

    let grid = session.grid();
    assert_eq!(grid.resolution(), RESOLUTION);
    assert_eq!(grid.occupied_count(), RESOLUTION.pow(3));
}

#[test]
fn test_point_occupancy_is_idempotent() {
    let scene = Scene::new();
    let session = scene.load();

    let stats = session.run_point_occupancy().unwrap();
    assert_eq!(stats.points, 302);
    // the (1, 1, 1) corner sits on the far face of the grid
    assert_eq!(stats.skipped, 1);
    let first = session.grid_snapshot();
    assert!(!center_voxel(&first));
    assert!(first.occupied_count() > 0);

    session.run_point_occupancy().unwrap();
    assert_eq!(session.grid_snapshot(), first);
}

#[test]
fn test_silhouette_carve_keeps_sphere() {
    let scene = Scene::new();
    let session = scene.load();

    let report = session.run_silhouette_carve().unwrap();
    assert_eq!(report.applied(), 2);

    let grid = session.grid();
    assert!(center_voxel(&grid));
    assert!(!grid.occupancy(0, 0, 0).unwrap());
    assert!(!grid.occupancy(RESOLUTION - 1, RESOLUTION - 1, RESOLUTION - 1).unwrap());
    assert_eq!(grid.occupied_count(), report.occupied);
}

#[test]
fn test_missing_mask_abort_and_skip() {
    let scene = Scene::new();
    std::fs::remove_file(scene.path().join("masks").join("mask_1.png")).unwrap();

    let aborting = scene.load();
    match aborting.run_silhouette_carve() {
        Err(Error::Mask { view, .. }) => assert_eq!(view, 1),
        other => panic!("expected a mask error, got {:?}", other),
    }

    let skipping = Session::load(scene.config().with_missing_mask(MissingMaskPolicy::Skip)).unwrap();
    let report = skipping.run_silhouette_carve().unwrap();
    assert_eq!(report.applied(), 1);
    assert_eq!(report.skipped(), 1);

    // the abort left the grid at the last complete view
    assert_eq!(aborting.grid_snapshot(), skipping.grid_snapshot());
}

#[test]
fn test_background_carve() {
    let scene = Scene::new();
    let session = Arc::new(scene.load());
    let grid = session.shared_grid();

    let (tx, rx) = mpsc::channel();
    let handle = session
        .spawn_silhouette_carve(move |result| {
            tx.send(result.map(|report| report.occupied)).unwrap();
        })
        .unwrap();
    handle.join().unwrap();

    let occupied = rx.recv().unwrap().unwrap();
    assert_eq!(grid.read().unwrap().occupied_count(), occupied);
    assert!(occupied < RESOLUTION.pow(3));
}

#[test]
fn test_create_grid_resets_occupancy() {
    let scene = Scene::new();
    let session = scene.load();
    session.run_silhouette_carve().unwrap();

    session.create_grid(8).unwrap();
    assert_eq!(session.grid().resolution(), 8);
    assert_eq!(session.grid().occupied_count(), 512);

    assert!(matches!(session.create_grid(0), Err(Error::InvalidData(_))));
    assert_eq!(session.grid().resolution(), 8);
}

#[test]
fn test_export_occupied_centers() {
    let scene = Scene::new();
    let session = scene.load();
    session.run_silhouette_carve().unwrap();

    let out = scene.path().join("hull.ply");
    let written = session.export_occupied(&out).unwrap();
    assert_eq!(written, session.grid().occupied_count());

    let text = std::fs::read_to_string(&out).unwrap();
    assert!(text.starts_with("ply"));
    assert!(text.contains(&format!("element vertex {}", written)));
}

#[test]
fn test_set_aspect_updates_every_camera() {
    let scene = Scene::new();
    let session = scene.load();
    session.set_aspect(0.75);
    assert!(session.cameras().iter().all(|c| c.aspect() == 0.75));
}

#[test]
fn test_load_failures_surface() {
    let scene = Scene::new();

    std::fs::write(scene.path().join("bundle.out"), "# Bundle file v0.2\n0 0\n").unwrap();
    assert!(matches!(Session::load(scene.config()), Err(Error::Format(_))));

    std::fs::write(
        scene.path().join("points.ply"),
        "ply\nformat ascii 1.0\nelement vertex 0\nend_header\n",
    )
    .unwrap();
    assert!(matches!(Session::load(scene.config()), Err(Error::NumericDegeneracy(_))));

    std::fs::remove_file(scene.path().join("points.ply")).unwrap();
    assert!(matches!(Session::load(scene.config()), Err(Error::Io(_))));
}

#[test]
fn test_camera_lookup_is_bounds_checked() {
    let scene = Scene::new();
    let session = scene.load();
    let camera = session.camera(1).unwrap();
    assert!((camera.center() - Point3f::new(5.0, 0.0, 0.0)).norm() < 1e-5);
    assert!(matches!(session.camera(2), Err(Error::IndexOutOfRange(_))));
}
