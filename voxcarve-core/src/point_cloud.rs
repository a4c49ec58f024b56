//! Point cloud data structures and functionality

use crate::point::*;
use crate::traits::{Drawable, Positioned};
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// Axis-aligned bounding box, `min <= max` component-wise
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Point3f,
    pub max: Point3f,
}

impl BoundingBox {
    /// A zero-extent box around a single point
    pub fn from_point(point: Point3f) -> Self {
        Self { min: point, max: point }
    }

    /// Grow the box so it contains `point`
    pub fn expand(&mut self, point: &Point3f) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);

        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Per-axis size of the box
    pub fn extent(&self) -> Vector3f {
        self.max - self.min
    }

    /// Largest extent among the three axes
    pub fn max_extent(&self) -> f32 {
        self.extent().max()
    }

    pub fn center(&self) -> Point3f {
        nalgebra::center(&self.min, &self.max)
    }
}

/// A generic point cloud container.
///
/// The bounding box is updated on every push, so loaders get it in a single
/// pass without traversing the points again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointCloud<T> {
    points: Vec<T>,
    bounds: Option<BoundingBox>,
}

/// The point cloud produced by the scene loader
pub type ColoredPointCloud3f = PointCloud<ColoredPoint3f>;

impl<T> PointCloud<T> {
    /// Create a new empty point cloud
    pub fn new() -> Self {
        Self {
            points: Vec::new(),
            bounds: None,
        }
    }

    /// Create a new point cloud with specified capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            points: Vec::with_capacity(capacity),
            bounds: None,
        }
    }

    /// Get the number of points in the cloud
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get an iterator over the points
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.points.iter()
    }

    /// Borrow the points as a slice
    pub fn as_slice(&self) -> &[T] {
        &self.points
    }

    /// Bounding box of every point pushed so far
    pub fn bounds(&self) -> Option<BoundingBox> {
        self.bounds
    }
}

impl<T: Positioned> PointCloud<T> {
    /// Create a point cloud from a vector of points
    pub fn from_points(points: Vec<T>) -> Self {
        let mut bounds: Option<BoundingBox> = None;
        for point in &points {
            let position = point.position();
            match bounds.as_mut() {
                Some(b) => b.expand(&position),
                None => bounds = Some(BoundingBox::from_point(position)),
            }
        }
        Self { points, bounds }
    }

    /// Add a point to the cloud
    pub fn push(&mut self, point: T) {
        let position = point.position();
        match self.bounds.as_mut() {
            Some(b) => b.expand(&position),
            None => self.bounds = Some(BoundingBox::from_point(position)),
        }
        self.points.push(point);
    }
}

impl<T> Default for PointCloud<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for PointCloud<T> {
    type Output = T;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}

impl<'a, T> IntoIterator for &'a PointCloud<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

impl<T: Positioned> FromIterator<T> for PointCloud<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut cloud = Self::new();
        for point in iter {
            cloud.push(point);
        }
        cloud
    }
}

impl<T> Drawable for PointCloud<T> {
    fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_track_pushes() {
        let mut cloud = PointCloud::new();
        assert!(cloud.bounds().is_none());

        cloud.push(Point3f::new(1.0, -2.0, 3.0));
        cloud.push(Point3f::new(-1.0, 4.0, 0.5));
        cloud.push(Point3f::new(0.0, 0.0, 5.0));

        let b = cloud.bounds().unwrap();
        assert_eq!(b.min, Point3f::new(-1.0, -2.0, 0.5));
        assert_eq!(b.max, Point3f::new(1.0, 4.0, 5.0));
        assert_eq!(b.max_extent(), 6.0);
    }

    #[test]
    fn test_from_points_matches_push() {
        let pts = vec![
            Point3f::new(0.0, 0.0, 0.0),
            Point3f::new(2.0, 1.0, -1.0),
        ];
        let a = PointCloud::from_points(pts.clone());
        let b: PointCloud<Point3f> = pts.into_iter().collect();
        assert_eq!(a.bounds(), b.bounds());
        assert_eq!(a.center(), Some(Point3f::new(1.0, 0.5, -0.5)));
    }
}
