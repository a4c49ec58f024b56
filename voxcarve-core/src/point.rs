//! Point types and related functionality

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

use crate::traits::Positioned;

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A point loaded from a scanned cloud: position, color and source row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColoredPoint3f {
    pub position: Point3f,
    /// RGB in [0, 1], rescaled from the 0-255 values stored on disk
    pub color: [f32; 3],
    /// Zero-based order of the row this point was read from
    pub row: usize,
}

impl ColoredPoint3f {
    /// Build a point from 8-bit color channels
    pub fn from_rgb8(position: Point3f, rgb: [f32; 3], row: usize) -> Self {
        Self {
            position,
            color: [rgb[0] / 255.0, rgb[1] / 255.0, rgb[2] / 255.0],
            row,
        }
    }
}

impl Default for ColoredPoint3f {
    fn default() -> Self {
        Self {
            position: Point3f::origin(),
            color: [1.0, 1.0, 1.0],
            row: 0,
        }
    }
}

impl Positioned for ColoredPoint3f {
    fn position(&self) -> Point3f {
        self.position
    }
}

impl Positioned for Point3f {
    fn position(&self) -> Point3f {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_rgb8_rescaling() {
        let p = ColoredPoint3f::from_rgb8(Point3f::new(1.0, 2.0, 3.0), [255.0, 0.0, 51.0], 4);
        assert_relative_eq!(p.color[0], 1.0);
        assert_relative_eq!(p.color[1], 0.0);
        assert_relative_eq!(p.color[2], 0.2);
        assert_eq!(p.row, 4);
    }
}
