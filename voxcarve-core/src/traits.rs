//! Core traits for voxcarve

use crate::{mask::SilhouetteMask, point::Point3f, point_cloud::BoundingBox, Result};

/// Anything with a position in world space
pub trait Positioned {
    fn position(&self) -> Point3f;
}

/// Trait for objects with a spatial extent
pub trait Drawable {
    /// Get the bounding box of the object, `None` when it is empty
    fn bounding_box(&self) -> Option<BoundingBox>;

    /// Get the center point of the object
    fn center(&self) -> Option<Point3f> {
        self.bounding_box().map(|b| b.center())
    }
}

/// Supplies the binary silhouette of each camera view on demand.
///
/// Masks are requested once per view per carve pass and dropped afterwards,
/// so implementations should not cache decoded images.
pub trait SilhouetteSource: Sync {
    fn silhouette(&self, view: usize) -> Result<SilhouetteMask>;
}

impl SilhouetteSource for [SilhouetteMask] {
    fn silhouette(&self, view: usize) -> Result<SilhouetteMask> {
        self.get(view).cloned().ok_or_else(|| crate::Error::Mask {
            view,
            message: format!("no mask among {} in-memory silhouettes", self.len()),
        })
    }
}

impl SilhouetteSource for Vec<SilhouetteMask> {
    fn silhouette(&self, view: usize) -> Result<SilhouetteMask> {
        self.as_slice().silhouette(view)
    }
}
