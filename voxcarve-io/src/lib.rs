//! I/O operations for the carving pipeline
//!
//! This crate reads the inputs of a carving session (ASCII PLY point clouds,
//! Bundler calibrations, per-view silhouette images and the session file that
//! ties them together) and writes voxel centers back out as PLY.

pub mod bundle;
pub mod config;
pub mod mask;
pub mod ply;

pub use bundle::{BundleReader, RigOptions, BUNDLE_MAGIC};
pub use config::{SessionFiles, DEFAULT_RESOLUTION};
pub use mask::{load_mask, mask_from_image, MaskDirectory, MaskNaming, FOREGROUND_VALUE};
pub use ply::{PlyReader, PlyWriter};

use std::path::Path;
use voxcarve_core::{CameraView, ColoredPointCloud3f, Point3f, PointCloud, Result};

/// Trait for reading point clouds from files
pub trait PointCloudReader {
    fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<ColoredPointCloud3f>;
}

/// Trait for writing point clouds to files
pub trait PointCloudWriter {
    fn write_point_cloud<P: AsRef<Path>>(cloud: &PointCloud<Point3f>, path: P) -> Result<()>;
}

/// Trait for reading calibrated camera rigs from files
pub trait CameraRigReader {
    fn read_cameras<P: AsRef<Path>>(path: P, options: &RigOptions) -> Result<Vec<CameraView>>;
}

/// Read a scene point cloud
pub fn read_point_cloud<P: AsRef<Path>>(path: P) -> Result<ColoredPointCloud3f> {
    PlyReader::read_point_cloud(path)
}

/// Read a calibrated camera rig
pub fn read_cameras<P: AsRef<Path>>(path: P, options: &RigOptions) -> Result<Vec<CameraView>> {
    BundleReader::read_cameras(path, options)
}

/// Write bare positions (e.g. occupied voxel centers) as PLY
pub fn write_point_cloud<P: AsRef<Path>>(cloud: &PointCloud<Point3f>, path: P) -> Result<()> {
    PlyWriter::write_point_cloud(cloud, path)
}
