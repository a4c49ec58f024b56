//! Rigid world-to-camera transforms

use nalgebra::{Matrix3, Matrix4, Vector3};
use serde::{Deserialize, Serialize};

/// A homogeneous 3D transformation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f32>,
}

impl Transform3D {
    /// Assemble `[R | t]` with a final `(0, 0, 0, 1)` row
    pub fn from_rotation_translation(rotation: &Matrix3<f32>, translation: &Vector3<f32>) -> Self {
        let mut matrix = rotation.to_homogeneous();
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
        Self { matrix }
    }

    /// Upper-left 3x3 block
    pub fn rotation(&self) -> Matrix3<f32> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    /// Last column without the homogeneous coordinate
    pub fn translation(&self) -> Vector3<f32> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }
}
