//! # voxcarve
//!
//! Visual hull carving and point cloud voxelization from a calibrated camera rig.
//!
//! This is the umbrella crate: it re-exports the workspace crates and adds the
//! [`Session`] facade, which loads a scene once and then runs either occupancy
//! algorithm on demand against a grid that other threads may read at any time.
//!
//! ## Quick Start
//!
//! ```no_run
//! use voxcarve::prelude::*;
//!
//! # fn main() -> voxcarve::Result<()> {
//! let config = SessionConfig::from_file("scene/session.txt")?
//!     .with_missing_mask(MissingMaskPolicy::Skip);
//! let session = Session::load(config)?;
//!
//! let report = session.run_silhouette_carve()?;
//! println!("{} voxels remain after {} views", report.occupied, report.applied());
//!
//! session.export_occupied("hull.ply")?;
//! # Ok(())
//! # }
//! ```

pub mod session;

// Re-export core functionality
pub use voxcarve_core::*;

pub use voxcarve_carving as carving;
pub use voxcarve_io as io;

pub use session::{Session, SessionConfig};

/// Convenient imports for common use cases
pub mod prelude {
    pub use crate::session::{Session, SessionConfig};
    pub use voxcarve_carving::{
        AspectSource, CarveOptions, CarveReport, MissingMaskPolicy, OccupancyStats, VoxelGrid,
    };
    pub use voxcarve_core::*;
    pub use voxcarve_io::{MaskDirectory, MaskNaming, SessionFiles};
}
