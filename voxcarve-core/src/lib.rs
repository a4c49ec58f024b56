//! Core data structures and traits for voxcarve
//!
//! This crate provides the shared vocabulary of the carving pipeline: colored
//! points and point clouds with their bounding box, calibrated camera views,
//! silhouette masks, and the error type every other crate reports through.

pub mod camera;
pub mod error;
pub mod mask;
pub mod point;
pub mod point_cloud;
pub mod traits;
pub mod transform;

pub use camera::*;
pub use error::*;
pub use mask::*;
pub use point::*;
pub use point_cloud::*;
pub use traits::*;
pub use transform::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};
