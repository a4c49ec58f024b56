//! Loaded scene plus the occupancy grid built over it
//!
//! A [`Session`] is what a front end holds on to. The point cloud and camera rig
//! are loaded once; the grid is shared behind an `RwLock` so a renderer can
//! read it while a carve runs on another thread. All mutating operations are
//! serialized through a single mutex that also owns the carve scratch buffer,
//! and a carve publishes its progress one complete view at a time.

use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};
use voxcarve_carving::{
    init_thread_pool, occupancy_cells, AspectSource, CarveOptions, CarveReport, MissingMaskPolicy,
    OccupancyStats, SilhouetteCarver, ThreadPoolConfig, VoxelGrid,
};
use voxcarve_core::{BoundingBox, CameraView, ColoredPointCloud3f, Error, Result};
use voxcarve_io::{read_cameras, read_point_cloud, write_point_cloud, MaskDirectory, MaskNaming, RigOptions, SessionFiles};

const CARVE_THREAD_NAME: &str = "voxcarve-carve";

/// Everything needed to open a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub files: SessionFiles,
    #[serde(default)]
    pub missing_mask: MissingMaskPolicy,
    #[serde(default)]
    pub mask_naming: MaskNaming,
    /// RGBA channel compared against the foreground value
    #[serde(default)]
    pub mask_channel: usize,
    #[serde(default)]
    pub aspect: AspectSource,
    /// Worker threads, all hardware threads when unset
    #[serde(default)]
    pub threads: Option<usize>,
}

impl SessionConfig {
    pub fn new(files: SessionFiles) -> Self {
        Self {
            files,
            missing_mask: MissingMaskPolicy::default(),
            mask_naming: MaskNaming::default(),
            mask_channel: 0,
            aspect: AspectSource::default(),
            threads: None,
        }
    }

    /// Parse a session file with default knobs
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Ok(Self::new(SessionFiles::from_file(path)?))
    }

    pub fn with_missing_mask(mut self, policy: MissingMaskPolicy) -> Self {
        self.missing_mask = policy;
        self
    }

    pub fn with_mask_naming(mut self, naming: MaskNaming) -> Self {
        self.mask_naming = naming;
        self
    }

    pub fn with_mask_channel(mut self, channel: usize) -> Self {
        self.mask_channel = channel;
        self
    }

    pub fn with_aspect(mut self, aspect: AspectSource) -> Self {
        self.aspect = aspect;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn with_resolution(mut self, resolution: usize) -> Self {
        self.files.resolution = resolution;
        self
    }

    pub fn carve_options(&self) -> CarveOptions {
        CarveOptions {
            missing_mask: self.missing_mask,
            aspect: self.aspect,
        }
    }

    pub fn mask_source(&self) -> MaskDirectory {
        MaskDirectory::new(&self.files.mask_dir)
            .with_naming(self.mask_naming.clone())
            .with_channel(self.mask_channel)
    }
}

/// A loaded scene and its shared occupancy grid
pub struct Session {
    config: SessionConfig,
    point_cloud: ColoredPointCloud3f,
    bounds: BoundingBox,
    cameras: RwLock<Vec<CameraView>>,
    masks: MaskDirectory,
    grid: Arc<RwLock<VoxelGrid>>,
    engine: Mutex<SilhouetteCarver>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("points", &self.point_cloud.len())
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Load the point cloud and camera rig named by `config` and allocate a
    /// fully occupied grid at the configured resolution.
    ///
    /// Any failure here is fatal to the session; nothing is partially loaded.
    pub fn load(config: SessionConfig) -> Result<Self> {
        if let Some(threads) = config.threads {
            init_thread_pool(ThreadPoolConfig::default().with_threads(threads))?;
        }

        let files = &config.files;
        let point_cloud = read_point_cloud(&files.point_cloud)?;
        let bounds = point_cloud
            .bounds()
            .ok_or_else(|| Error::NumericDegeneracy("point cloud is empty".to_string()))?;
        let cameras = read_cameras(&files.calibration, &RigOptions::new(files.image_height as f32))?;
        let grid = VoxelGrid::new(&bounds, files.resolution)?;

        info!(
            "session loaded: {} points, {} cameras, {}^3 grid of {:.4} voxels",
            point_cloud.len(),
            cameras.len(),
            grid.resolution(),
            grid.voxel_size()
        );

        Ok(Self {
            masks: config.mask_source(),
            engine: Mutex::new(SilhouetteCarver::new(config.carve_options())),
            config,
            point_cloud,
            bounds,
            cameras: RwLock::new(cameras),
            grid: Arc::new(RwLock::new(grid)),
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn point_cloud(&self) -> &ColoredPointCloud3f {
        &self.point_cloud
    }

    pub fn bounds(&self) -> &BoundingBox {
        &self.bounds
    }

    /// Read access to the camera list
    pub fn cameras(&self) -> RwLockReadGuard<'_, Vec<CameraView>> {
        self.cameras.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of camera `view`
    pub fn camera(&self, view: usize) -> Result<CameraView> {
        let cameras = self.cameras();
        match cameras.get(view) {
            Some(camera) => Ok(camera.clone()),
            None => Err(Error::IndexOutOfRange(format!("camera {} of {}", view, cameras.len()))),
        }
    }

    /// Recompute every camera projection for a new viewport aspect (`height / width`)
    pub fn set_aspect(&self, aspect: f32) {
        let mut cameras = self.cameras.write().unwrap_or_else(PoisonError::into_inner);
        for camera in cameras.iter_mut() {
            camera.set_aspect(aspect);
        }
    }

    /// Read access to the current grid
    pub fn grid(&self) -> RwLockReadGuard<'_, VoxelGrid> {
        self.grid.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle to the grid for readers that outlive a borrow of the session
    pub fn shared_grid(&self) -> Arc<RwLock<VoxelGrid>> {
        Arc::clone(&self.grid)
    }

    pub fn grid_snapshot(&self) -> VoxelGrid {
        self.grid().clone()
    }

    fn grid_mut(&self) -> RwLockWriteGuard<'_, VoxelGrid> {
        self.grid.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn engine(&self) -> MutexGuard<'_, SilhouetteCarver> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the grid with a fully occupied one at `resolution`
    pub fn create_grid(&self, resolution: usize) -> Result<()> {
        let _engine = self.engine();
        let grid = VoxelGrid::new(&self.bounds, resolution)?;
        *self.grid_mut() = grid;
        info!("grid recreated at {}^3", resolution);
        Ok(())
    }

    /// Mark exactly the voxels that contain a scene point
    pub fn run_point_occupancy(&self) -> Result<OccupancyStats> {
        let _engine = self.engine();
        let geometry = *self.grid().geometry();
        let (cells, stats) = occupancy_cells(&geometry, &self.point_cloud);
        self.grid_mut().commit(&cells)?;
        info!(
            "point occupancy: {} of {} voxels occupied",
            stats.occupied,
            geometry.cell_count()
        );
        Ok(stats)
    }

    /// Carve the visual hull of the silhouettes into the grid.
    ///
    /// Readers see the grid after each complete view. If a mask is missing
    /// under [`MissingMaskPolicy::Abort`] the error is returned and the grid
    /// stays at the last committed view.
    pub fn run_silhouette_carve(&self) -> Result<CarveReport> {
        let mut engine = self.engine();
        let geometry = *self.grid().geometry();
        let cameras = self.cameras().clone();
        engine.carve_with(&geometry, &cameras, &self.masks, |cells| {
            self.grid_mut().commit(cells)
        })
    }

    /// Run [`run_silhouette_carve`](Self::run_silhouette_carve) on a named
    /// background thread and hand the outcome to `callback`
    pub fn spawn_silhouette_carve<F>(self: &Arc<Self>, callback: F) -> Result<JoinHandle<()>>
    where
        F: FnOnce(Result<CarveReport>) + Send + 'static,
    {
        let session = Arc::clone(self);
        let handle = thread::Builder::new()
            .name(CARVE_THREAD_NAME.to_string())
            .spawn(move || callback(session.run_silhouette_carve()))?;
        Ok(handle)
    }

    /// Write the occupied voxel centers as a PLY point cloud, returning how many were written
    pub fn export_occupied<P: AsRef<Path>>(&self, path: P) -> Result<usize> {
        let cloud = self.grid().to_point_cloud();
        write_point_cloud(&cloud, path)?;
        Ok(cloud.len())
    }
}
