//! Silhouette carving
//!
//! Every voxel starts occupied. For each registered camera the voxel center is
//! projected into that view's mask and the voxel is cleared when it lands
//! behind the camera, outside the image or on a background pixel. The result
//! is the intersection of all silhouette cones, so adding views can only
//! remove voxels.
//!
//! Views are applied one after another to a private scratch buffer. Within a
//! view all voxels are classified in parallel, and the scratch buffer is
//! committed once the view is complete, so observers never see a half-applied
//! view.

use crate::grid::{GridGeometry, VoxelGrid, EMPTY, OCCUPIED};
use crate::parallel::{execute_parallel, should_parallelize};
use log::{debug, info, warn};
use nalgebra::Matrix4;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Instant;
use voxcarve_core::{CameraView, Error, Point3f, Result, SilhouetteMask, SilhouetteSource};

/// Clip-space depth at or below which a point counts as behind the camera
pub const MIN_CLIP_DEPTH: f32 = 1e-6;

/// What to do when a view has no readable mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingMaskPolicy {
    /// Stop carving and report the error
    #[default]
    Abort,
    /// Treat the view as unconstrained and continue
    Skip,
}

/// Where each view's projection aspect comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectSource {
    /// `height / width` of the mask being sampled
    #[default]
    Mask,
    /// Whatever aspect the camera was last given
    Camera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CarveOptions {
    pub missing_mask: MissingMaskPolicy,
    pub aspect: AspectSource,
}

/// Where a voxel center lands in one view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Behind,
    OffScreen,
    Background,
    Foreground,
}

impl Visibility {
    pub fn is_kept(self) -> bool {
        self == Visibility::Foreground
    }
}

/// Project `point` with `view_projection` and look it up in `mask`
pub fn classify(view_projection: &Matrix4<f32>, point: &Point3f, mask: &SilhouetteMask) -> Visibility {
    let clip = view_projection * point.to_homogeneous();
    if !(clip.z > MIN_CLIP_DEPTH) {
        return Visibility::Behind;
    }

    let ndc_x = clip.x / clip.z;
    let ndc_y = clip.y / -clip.z;
    if !(ndc_x.abs() < 1.0 && ndc_y.abs() < 1.0) {
        return Visibility::OffScreen;
    }

    let (width, height) = (mask.width(), mask.height());
    if width == 0 || height == 0 {
        return Visibility::OffScreen;
    }
    let px = ((((ndc_x + 1.0) / 2.0) * width as f32).floor() as usize).min(width - 1);
    let py = ((((ndc_y + 1.0) / 2.0) * height as f32).floor() as usize).min(height - 1);

    if mask.is_foreground(px, py) {
        Visibility::Foreground
    } else {
        Visibility::Background
    }
}

/// Apply one view to `cells`, clearing every occupied voxel the view rejects.
///
/// Returns the number of voxels cleared. Cells are only ever cleared, never set.
pub fn carve_view(
    geometry: &GridGeometry,
    view_projection: &Matrix4<f32>,
    mask: &SilhouetteMask,
    cells: &mut [u8],
) -> usize {
    let carve = |(index, cell): (usize, &mut u8)| -> usize {
        if *cell != OCCUPIED {
            return 0;
        }
        let center = geometry.center_of(index);
        if classify(view_projection, &center, mask).is_kept() {
            0
        } else {
            *cell = EMPTY;
            1
        }
    };

    if should_parallelize(cells.len()) {
        execute_parallel(|| cells.par_iter_mut().enumerate().map(carve).sum())
    } else {
        cells.iter_mut().enumerate().map(carve).sum()
    }
}

/// Per-view record of a carve pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewOutcome {
    Carved { removed: usize },
    Unregistered,
    MissingMask(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CarveReport {
    pub views: Vec<ViewOutcome>,
    /// Occupied voxels after the last committed view
    pub occupied: usize,
}

impl CarveReport {
    pub fn applied(&self) -> usize {
        self.views
            .iter()
            .filter(|v| matches!(v, ViewOutcome::Carved { .. }))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.views.len() - self.applied()
    }
}

/// Runs carve passes, reusing one scratch buffer across them
#[derive(Debug, Default)]
pub struct SilhouetteCarver {
    options: CarveOptions,
    scratch: Vec<u8>,
}

impl SilhouetteCarver {
    pub fn new(options: CarveOptions) -> Self {
        Self {
            options,
            scratch: Vec::new(),
        }
    }

    pub fn options(&self) -> &CarveOptions {
        &self.options
    }

    /// Carve all `cameras` over `geometry`, handing the scratch cells to
    /// `commit` after every applied view.
    ///
    /// `commit` is called at least once, even when no view applies, so the
    /// receiver always ends with the full intersection. A missing mask under
    /// [`MissingMaskPolicy::Abort`] returns the error after the views already
    /// committed.
    pub fn carve_with<S, F>(
        &mut self,
        geometry: &GridGeometry,
        cameras: &[CameraView],
        source: &S,
        mut commit: F,
    ) -> Result<CarveReport>
    where
        S: SilhouetteSource + ?Sized,
        F: FnMut(&[u8]) -> Result<()>,
    {
        let started = Instant::now();
        self.scratch.clear();
        self.scratch.resize(geometry.cell_count(), OCCUPIED);

        let mut report = CarveReport::default();
        let mut committed = false;

        for (view, camera) in cameras.iter().enumerate() {
            if !camera.is_registered() {
                warn!("view {}: camera not registered, skipping", view);
                report.views.push(ViewOutcome::Unregistered);
                continue;
            }

            let mask = match source.silhouette(view) {
                Ok(mask) => mask,
                Err(e) => match self.options.missing_mask {
                    MissingMaskPolicy::Abort => return Err(e),
                    MissingMaskPolicy::Skip => {
                        warn!("view {}: {}, skipping", view, e);
                        report.views.push(ViewOutcome::MissingMask(e.to_string()));
                        continue;
                    }
                },
            };

            let view_projection = match self.options.aspect {
                AspectSource::Mask => camera.with_aspect(mask.aspect()).view_projection(),
                AspectSource::Camera => camera.view_projection(),
            };

            let removed = carve_view(geometry, &view_projection, &mask, &mut self.scratch);
            commit(&self.scratch)?;
            committed = true;
            debug!("view {}: cleared {} voxels", view, removed);
            report.views.push(ViewOutcome::Carved { removed });
        }

        if !committed {
            commit(&self.scratch)?;
        }

        report.occupied = self.scratch.iter().filter(|&&c| c == OCCUPIED).count();
        info!(
            "carved {} of {} views in {:.2?}: {} of {} voxels remain",
            report.applied(),
            cameras.len(),
            started.elapsed(),
            report.occupied,
            self.scratch.len()
        );
        Ok(report)
    }

    /// Carve directly into `grid`
    pub fn carve<S>(&mut self, grid: &mut VoxelGrid, cameras: &[CameraView], source: &S) -> Result<CarveReport>
    where
        S: SilhouetteSource + ?Sized,
    {
        let geometry = *grid.geometry();
        self.carve_with(&geometry, cameras, source, |cells| grid.commit(cells))
    }
}

/// Single-shot carve with default options
pub fn carve_silhouettes<S>(grid: &mut VoxelGrid, cameras: &[CameraView], source: &S) -> Result<CarveReport>
where
    S: SilhouetteSource + ?Sized,
{
    SilhouetteCarver::default().carve(grid, cameras, source)
}

impl From<MissingMaskPolicy> for CarveOptions {
    fn from(missing_mask: MissingMaskPolicy) -> Self {
        Self {
            missing_mask,
            ..Self::default()
        }
    }
}

impl std::str::FromStr for MissingMaskPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "abort" => Ok(Self::Abort),
            "skip" => Ok(Self::Skip),
            other => Err(Error::Config(format!("unknown missing-mask policy '{}'", other))),
        }
    }
}

impl std::str::FromStr for AspectSource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mask" => Ok(Self::Mask),
            "camera" => Ok(Self::Camera),
            other => Err(Error::Config(format!("unknown aspect source '{}'", other))),
        }
    }
}
