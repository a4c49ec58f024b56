//! Voxel occupancy for voxcarve
//!
//! This crate owns the cubic voxel grid and the two ways of filling it:
//! marking the voxels hit by a scene point cloud, and carving the visual hull
//! out of a fully occupied grid using calibrated silhouettes.

pub mod grid;
pub mod occupancy;
pub mod parallel;
pub mod silhouette;

pub use grid::{GridGeometry, VoxelGrid, EMPTY, MAX_RESOLUTION, OCCUPIED};
pub use occupancy::{occupancy_cells, point_cells, voxelize_points, OccupancyStats};
pub use parallel::{init_thread_pool, ThreadPoolConfig};
pub use silhouette::{
    carve_silhouettes, carve_view, classify, AspectSource, CarveOptions, CarveReport,
    MissingMaskPolicy, SilhouetteCarver, ViewOutcome, Visibility, MIN_CLIP_DEPTH,
};
