//! Session configuration files
//!
//! A session file is plain text, one value per line:
//!
//! ```text
//! scene/points.ply
//! scene/bundle.out
//! scene/masks
//! 2128
//! 64
//! ```
//!
//! i.e. point cloud, calibration, mask directory, photograph height in pixels
//! and an optional voxel resolution. Relative paths are taken relative to the
//! directory holding the session file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use voxcarve_core::{Error, Result};

/// Voxels per axis when the session file does not name a resolution
pub const DEFAULT_RESOLUTION: usize = 32;

/// Inputs named by a session file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFiles {
    pub point_cloud: PathBuf,
    pub calibration: PathBuf,
    pub mask_dir: PathBuf,
    pub image_height: u32,
    pub resolution: usize,
}

impl SessionFiles {
    /// Read and parse a session file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&text, base)
    }

    /// Parse session text, resolving relative paths against `base`
    pub fn parse(text: &str, base: &Path) -> Result<Self> {
        let lines: Vec<&str> = text.lines().map(str::trim).collect();

        let image_height = field(&lines, 3, "image height")?;
        let image_height: u32 = image_height
            .parse()
            .ok()
            .filter(|&h| h > 0)
            .ok_or_else(|| Error::Config(format!("line 4: invalid image height '{}'", image_height)))?;

        let resolution = match lines.get(4).filter(|line| !line.is_empty()) {
            Some(line) => line
                .parse()
                .ok()
                .filter(|&n: &usize| n > 0)
                .ok_or_else(|| Error::Config(format!("line 5: invalid resolution '{}'", line)))?,
            None => DEFAULT_RESOLUTION,
        };

        Ok(Self {
            point_cloud: base.join(field(&lines, 0, "point cloud path")?),
            calibration: base.join(field(&lines, 1, "calibration path")?),
            mask_dir: base.join(field(&lines, 2, "mask directory")?),
            image_height,
            resolution,
        })
    }
}

fn field<'a>(lines: &[&'a str], index: usize, name: &str) -> Result<&'a str> {
    match lines.get(index) {
        Some(line) if !line.is_empty() => Ok(*line),
        _ => Err(Error::Config(format!("line {}: missing {}", index + 1, name))),
    }
}
