//! Silhouette masks stored as raster images

use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use voxcarve_core::{Error, Result, SilhouetteMask, SilhouetteSource};

/// Channel value that marks a foreground pixel
pub const FOREGROUND_VALUE: u8 = 255;

/// How mask files are named inside the mask directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskNaming {
    pub prefix: String,
    pub extension: String,
}

impl Default for MaskNaming {
    fn default() -> Self {
        Self {
            prefix: "mask_".to_string(),
            extension: "png".to_string(),
        }
    }
}

impl MaskNaming {
    /// `mask_<view>.png` with the default naming
    pub fn file_name(&self, view: usize) -> String {
        format!("{}{}.{}", self.prefix, view, self.extension)
    }
}

/// Convert a decoded image into a mask; `channel` indexes RGBA
pub fn mask_from_image(image: &image::DynamicImage, channel: usize) -> Result<SilhouetteMask> {
    if channel > 3 {
        return Err(Error::InvalidData(format!(
            "mask channel must be 0..=3, got {}",
            channel
        )));
    }
    let rgba = image.to_rgba8();
    let foreground = rgba
        .pixels()
        .map(|pixel| pixel.0[channel] == FOREGROUND_VALUE)
        .collect();
    SilhouetteMask::new(rgba.width() as usize, rgba.height() as usize, foreground)
}

/// Decode a mask image from disk
pub fn load_mask<P: AsRef<Path>>(path: P, channel: usize) -> Result<SilhouetteMask> {
    let path = path.as_ref();
    let image = image::open(path)
        .map_err(|e| Error::InvalidData(format!("{}: {}", path.display(), e)))?;
    mask_from_image(&image, channel)
}

/// A directory holding one mask per camera view
#[derive(Debug, Clone)]
pub struct MaskDirectory {
    dir: PathBuf,
    naming: MaskNaming,
    channel: usize,
}

impl MaskDirectory {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        Self {
            dir: dir.into(),
            naming: MaskNaming::default(),
            channel: 0,
        }
    }

    pub fn with_naming(mut self, naming: MaskNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_channel(mut self, channel: usize) -> Self {
        self.channel = channel;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, view: usize) -> PathBuf {
        self.dir.join(self.naming.file_name(view))
    }
}

impl SilhouetteSource for MaskDirectory {
    fn silhouette(&self, view: usize) -> Result<SilhouetteMask> {
        let path = self.path_for(view);
        if !path.is_file() {
            return Err(Error::Mask {
                view,
                message: format!("{} not found", path.display()),
            });
        }
        let mask = load_mask(&path, self.channel).map_err(|e| Error::Mask {
            view,
            message: e.to_string(),
        })?;
        debug!(
            "loaded {}x{} mask for view {} ({} foreground pixels)",
            mask.width(),
            mask.height(),
            view,
            mask.foreground_count()
        );
        Ok(mask)
    }
}
