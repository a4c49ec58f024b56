//! Point-driven occupancy
//!
//! The grid is cleared and every voxel containing at least one scene point is
//! marked occupied. The result depends only on the point set and the grid
//! geometry, so repeating the pass is idempotent.

use crate::grid::{GridGeometry, VoxelGrid, EMPTY, OCCUPIED};
use crate::parallel::{execute_parallel, should_parallelize};
use log::{debug, warn};
use rayon::prelude::*;
use voxcarve_core::{PointCloud, Positioned, Result};

/// Outcome of one occupancy pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OccupancyStats {
    /// Points considered
    pub points: usize,
    /// Points whose cell fell outside the grid
    pub skipped: usize,
    /// Occupied cells afterwards
    pub occupied: usize,
}

/// Flat cell offset of every point that lands inside the grid
pub fn point_cells<T>(geometry: &GridGeometry, points: &[T]) -> Vec<usize>
where
    T: Positioned + Sync,
{
    if should_parallelize(points.len()) {
        execute_parallel(|| {
            points
                .par_iter()
                .filter_map(|p| geometry.cell_of(&p.position()))
                .collect()
        })
    } else {
        points
            .iter()
            .filter_map(|p| geometry.cell_of(&p.position()))
            .collect()
    }
}

/// Occupancy cells for `cloud` over `geometry`, without touching any grid
pub fn occupancy_cells<T>(geometry: &GridGeometry, cloud: &PointCloud<T>) -> (Vec<u8>, OccupancyStats)
where
    T: Positioned + Sync,
{
    let mut cells = vec![EMPTY; geometry.cell_count()];
    let hits = point_cells(geometry, cloud.as_slice());
    let skipped = cloud.len() - hits.len();
    for index in hits {
        cells[index] = OCCUPIED;
    }

    if skipped > 0 {
        warn!("{} of {} points fall outside the grid", skipped, cloud.len());
    }
    let occupied = cells.iter().filter(|&&c| c == OCCUPIED).count();
    debug!(
        "point occupancy: {} points -> {} of {} voxels",
        cloud.len(),
        occupied,
        cells.len()
    );

    (
        cells,
        OccupancyStats {
            points: cloud.len(),
            skipped,
            occupied,
        },
    )
}

/// Replace the grid contents with the voxels hit by `cloud`
pub fn voxelize_points<T>(grid: &mut VoxelGrid, cloud: &PointCloud<T>) -> Result<OccupancyStats>
where
    T: Positioned + Sync,
{
    let (cells, stats) = occupancy_cells(grid.geometry(), cloud);
    grid.commit(&cells)?;
    Ok(stats)
}
