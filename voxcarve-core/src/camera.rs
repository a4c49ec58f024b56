//! Calibrated camera views.
//!
//! A [`CameraView`] bundles the world-to-camera transform recovered by the
//! structure-from-motion calibration with a symmetric-frustum perspective
//! projection. Cameras look down their local `-z` axis, so a point in front of
//! the camera ends up with a positive clip-space `z`.

use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};
use serde::{Deserialize, Serialize};

use crate::transform::Transform3D;

/// Near clip distance of every camera projection
pub const NEAR_PLANE: f32 = 0.01;
/// Far clip distance of every camera projection
pub const FAR_PLANE: f32 = 100.0;

/// Vertical field of view of a pinhole camera, in radians
pub fn vertical_fov(image_height: f32, focal_length: f32) -> f32 {
    2.0 * (image_height / (2.0 * focal_length)).atan()
}

/// Symmetric-frustum perspective projection.
///
/// `aspect` scales the horizontal axis relative to the vertical one
/// (`x_scale = y_scale * aspect`), so passing `height / width` of the target
/// raster keeps pixels square. Depth is mapped into the normalized clip range
/// and `w = -z`.
pub fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Matrix4<f32> {
    let y_scale = 1.0 / (fov_y / 2.0).tan();
    let x_scale = y_scale * aspect;
    Matrix4::new(
        x_scale, 0.0, 0.0, 0.0,
        0.0, y_scale, 0.0, 0.0,
        0.0, 0.0, (near + far) / (near - far), (2.0 * far * near) / (near - far),
        0.0, 0.0, -1.0, 0.0,
    )
}

/// One calibrated view of the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraView {
    /// World-to-camera transform
    pub extrinsic: Transform3D,
    /// Focal length in pixels, 0 for views the calibration could not register
    pub focal_length: f32,
    /// Vertical field of view in radians
    pub fov_y: f32,
    aspect: f32,
    projection: Matrix4<f32>,
}

impl CameraView {
    pub fn new(
        rotation: Matrix3<f32>,
        translation: Vector3<f32>,
        focal_length: f32,
        image_height: f32,
        aspect: f32,
    ) -> Self {
        let fov_y = vertical_fov(image_height, focal_length);
        Self {
            extrinsic: Transform3D::from_rotation_translation(&rotation, &translation),
            focal_length,
            fov_y,
            aspect,
            projection: perspective(fov_y, aspect, NEAR_PLANE, FAR_PLANE),
        }
    }

    pub fn rotation(&self) -> Matrix3<f32> {
        self.extrinsic.rotation()
    }

    pub fn translation(&self) -> Vector3<f32> {
        self.extrinsic.translation()
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn projection(&self) -> &Matrix4<f32> {
        &self.projection
    }

    /// Rebuild the projection for a new viewport or raster shape
    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.projection = perspective(self.fov_y, aspect, NEAR_PLANE, FAR_PLANE);
    }

    /// Copy of this view projected for a different aspect ratio
    pub fn with_aspect(&self, aspect: f32) -> Self {
        let mut view = self.clone();
        view.set_aspect(aspect);
        view
    }

    /// `projection * extrinsic`
    pub fn view_projection(&self) -> Matrix4<f32> {
        self.projection * self.extrinsic.matrix
    }

    /// Projects a world point to homogeneous clip coordinates
    pub fn project(&self, point: &Point3<f32>) -> Vector4<f32> {
        self.view_projection() * point.to_homogeneous()
    }

    /// Camera position in world coordinates (`-R^T t`)
    pub fn center(&self) -> Point3<f32> {
        Point3::from(-(self.rotation().transpose() * self.translation()))
    }

    /// Bundler writes an all-zero camera for images it failed to register
    pub fn is_registered(&self) -> bool {
        self.focal_length > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fov_from_focal() {
        // a focal length of half the image height gives a 90 degree fov
        assert_relative_eq!(vertical_fov(1000.0, 500.0), std::f32::consts::FRAC_PI_2);
    }

    #[test]
    fn test_perspective_layout() {
        let m = perspective(std::f32::consts::FRAC_PI_2, 0.5, NEAR_PLANE, FAR_PLANE);
        assert_relative_eq!(m[(0, 0)], 0.5, epsilon = 1e-6);
        assert_relative_eq!(m[(1, 1)], 1.0, epsilon = 1e-6);
        assert_relative_eq!(m[(2, 2)], (0.01 + 100.0) / (0.01 - 100.0), epsilon = 1e-6);
        assert_relative_eq!(m[(2, 3)], (2.0 * 100.0 * 0.01) / (0.01 - 100.0), epsilon = 1e-6);
        assert_eq!(m[(3, 2)], -1.0);
        assert_eq!(m[(3, 3)], 0.0);
    }

    #[test]
    fn test_point_in_front_has_positive_depth() {
        let cam = CameraView::new(Matrix3::identity(), Vector3::zeros(), 500.0, 1000.0, 1.0);
        let clip = cam.project(&Point3::new(0.0, 0.0, -5.0));
        assert!(clip.z > 0.0);
        assert_relative_eq!(clip.w, 5.0);

        let behind = cam.project(&Point3::new(0.0, 0.0, 5.0));
        assert!(behind.z < 0.0);
    }

    #[test]
    fn test_center_inverts_extrinsic() {
        let r = Matrix3::new(0.0, 1.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.0, 1.0);
        let t = Vector3::new(0.5, -2.0, 3.0);
        let cam = CameraView::new(r, t, 800.0, 600.0, 0.75);
        let c = cam.center();
        let back = Point3::from(r * c.coords + t);
        assert_relative_eq!(back, Point3::origin(), epsilon = 1e-5);
    }

    #[test]
    fn test_set_aspect_only_touches_x_scale() {
        let mut cam = CameraView::new(Matrix3::identity(), Vector3::zeros(), 500.0, 1000.0, 1.0);
        let before = *cam.projection();
        cam.set_aspect(0.75);
        assert_relative_eq!(cam.projection()[(0, 0)], before[(0, 0)] * 0.75);
        assert_eq!(cam.projection()[(1, 1)], before[(1, 1)]);
        assert!(!CameraView::new(Matrix3::identity(), Vector3::zeros(), 0.0, 1000.0, 1.0).is_registered());
    }
}
