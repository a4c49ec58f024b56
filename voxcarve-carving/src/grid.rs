//! Uniform cubic occupancy grid
//!
//! The grid is a cube anchored at the minimum corner of the scene bounding box
//! whose edge equals the largest bounding-box extent. Cells are single-byte
//! flags stored at `i * N^2 + j * N + k`.

use serde::{Deserialize, Serialize};
use voxcarve_core::{BoundingBox, Error, Point3f, PointCloud, Result};

/// Flag value of an occupied cell
pub const OCCUPIED: u8 = 1;
/// Flag value of an empty cell
pub const EMPTY: u8 = 0;
/// Largest accepted number of voxels per axis
pub const MAX_RESOLUTION: usize = 1024;

/// Placement and resolution of a grid, without its cells
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridGeometry {
    /// Minimum corner of the scene bounding box
    pub origin: Point3f,
    /// Edge length of the cube
    pub space_size: f32,
    /// Voxels per axis
    pub resolution: usize,
}

impl GridGeometry {
    pub fn new(bounds: &BoundingBox, resolution: usize) -> Result<Self> {
        let space_size = bounds.max_extent();
        if !space_size.is_finite() || space_size <= 0.0 {
            return Err(Error::NumericDegeneracy(format!(
                "bounding box has no extent (largest side {})",
                space_size
            )));
        }
        Self {
            origin: bounds.min,
            space_size,
            resolution: 0,
        }
        .with_resolution(resolution)
    }

    /// Same placement at another resolution
    pub fn with_resolution(&self, resolution: usize) -> Result<Self> {
        if resolution == 0 || resolution > MAX_RESOLUTION {
            return Err(Error::InvalidData(format!(
                "grid resolution must be in 1..={}, got {}",
                MAX_RESOLUTION, resolution
            )));
        }
        Ok(Self {
            resolution,
            ..*self
        })
    }

    pub fn voxel_size(&self) -> f32 {
        self.space_size / self.resolution as f32
    }

    /// `N^3`
    pub fn cell_count(&self) -> usize {
        self.resolution * self.resolution * self.resolution
    }

    pub fn contains_index(&self, i: usize, j: usize, k: usize) -> bool {
        i < self.resolution && j < self.resolution && k < self.resolution
    }

    /// Flat offset of cell `(i, j, k)`
    pub fn linear_index(&self, i: usize, j: usize, k: usize) -> Result<usize> {
        if !self.contains_index(i, j, k) {
            return Err(Error::IndexOutOfRange(format!(
                "voxel ({}, {}, {}) outside a {}^3 grid",
                i, j, k, self.resolution
            )));
        }
        let n = self.resolution;
        Ok(i * n * n + j * n + k)
    }

    /// Inverse of [`linear_index`](Self::linear_index); `index` must be below `cell_count()`
    pub fn unflatten(&self, index: usize) -> [usize; 3] {
        let n = self.resolution;
        [index / (n * n), (index / n) % n, index % n]
    }

    /// Center of cell `(i, j, k)`, the single point that stands for the whole voxel
    pub fn voxel_center(&self, i: usize, j: usize, k: usize) -> Point3f {
        let size = self.voxel_size();
        Point3f::new(
            self.origin.x + (i as f32 + 0.5) * size,
            self.origin.y + (j as f32 + 0.5) * size,
            self.origin.z + (k as f32 + 0.5) * size,
        )
    }

    /// Center of the cell at flat offset `index`
    pub fn center_of(&self, index: usize) -> Point3f {
        let [i, j, k] = self.unflatten(index);
        self.voxel_center(i, j, k)
    }

    /// Flat offset of the cell containing `point`, `None` outside the grid
    pub fn cell_of(&self, point: &Point3f) -> Option<usize> {
        let size = self.voxel_size();
        let mut ijk = [0usize; 3];
        for (axis, slot) in ijk.iter_mut().enumerate() {
            let v = ((point[axis] - self.origin[axis]) / size).floor();
            if !(v >= 0.0 && v < self.resolution as f32) {
                return None;
            }
            *slot = v as usize;
        }
        self.linear_index(ijk[0], ijk[1], ijk[2]).ok()
    }
}

/// Occupancy flags over a [`GridGeometry`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoxelGrid {
    geometry: GridGeometry,
    cells: Vec<u8>,
}

impl VoxelGrid {
    /// Grid over `bounds` with every cell occupied
    pub fn new(bounds: &BoundingBox, resolution: usize) -> Result<Self> {
        Ok(Self::from_geometry(GridGeometry::new(bounds, resolution)?))
    }

    pub fn from_geometry(geometry: GridGeometry) -> Self {
        Self {
            cells: vec![OCCUPIED; geometry.cell_count()],
            geometry,
        }
    }

    /// Reallocate at a new resolution, every cell occupied again.
    ///
    /// Prior occupancy is discarded, not resampled.
    pub fn resize(&mut self, resolution: usize) -> Result<()> {
        let geometry = self.geometry.with_resolution(resolution)?;
        *self = Self::from_geometry(geometry);
        Ok(())
    }

    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    pub fn resolution(&self) -> usize {
        self.geometry.resolution
    }

    pub fn voxel_size(&self) -> f32 {
        self.geometry.voxel_size()
    }

    pub fn origin(&self) -> Point3f {
        self.geometry.origin
    }

    pub fn occupancy(&self, i: usize, j: usize, k: usize) -> Result<bool> {
        let index = self.geometry.linear_index(i, j, k)?;
        Ok(self.cells[index] == OCCUPIED)
    }

    pub fn set_occupancy(&mut self, i: usize, j: usize, k: usize, occupied: bool) -> Result<()> {
        let index = self.geometry.linear_index(i, j, k)?;
        self.cells[index] = if occupied { OCCUPIED } else { EMPTY };
        Ok(())
    }

    /// Bounds-checked [`GridGeometry::voxel_center`]
    pub fn voxel_center(&self, i: usize, j: usize, k: usize) -> Result<Point3f> {
        self.geometry.linear_index(i, j, k)?;
        Ok(self.geometry.voxel_center(i, j, k))
    }

    pub fn fill(&mut self, occupied: bool) {
        self.cells.fill(if occupied { OCCUPIED } else { EMPTY });
    }

    pub fn cells(&self) -> &[u8] {
        &self.cells
    }

    /// Replace every cell with `cells`, which must match the grid size
    pub fn commit(&mut self, cells: &[u8]) -> Result<()> {
        if cells.len() != self.cells.len() {
            return Err(Error::InvalidData(format!(
                "cannot commit {} cells into a grid of {}",
                cells.len(),
                self.cells.len()
            )));
        }
        self.cells.copy_from_slice(cells);
        Ok(())
    }

    pub fn occupied_count(&self) -> usize {
        self.cells.iter().filter(|&&c| c == OCCUPIED).count()
    }

    pub fn occupied_centers(&self) -> impl Iterator<Item = Point3f> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, &c)| c == OCCUPIED)
            .map(|(index, _)| self.geometry.center_of(index))
    }

    /// Occupied voxel centers as a point cloud, e.g. for export
    pub fn to_point_cloud(&self) -> PointCloud<Point3f> {
        self.occupied_centers().collect()
    }

    /// True when every occupied cell of `self` is occupied in `other`
    pub fn is_subset_of(&self, other: &VoxelGrid) -> bool {
        self.geometry == other.geometry
            && self
                .cells
                .iter()
                .zip(&other.cells)
                .all(|(&a, &b)| a != OCCUPIED || b == OCCUPIED)
    }
}
