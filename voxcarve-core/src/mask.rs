//! Binary silhouette masks

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Per-view foreground/background image, row-major with row 0 at the top
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilhouetteMask {
    width: usize,
    height: usize,
    foreground: Vec<bool>,
}

impl SilhouetteMask {
    pub fn new(width: usize, height: usize, foreground: Vec<bool>) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidData(format!(
                "silhouette mask must not be empty, got {}x{}",
                width, height
            )));
        }
        if foreground.len() != width * height {
            return Err(Error::InvalidData(format!(
                "silhouette mask {}x{} needs {} pixels, got {}",
                width,
                height,
                width * height,
                foreground.len()
            )));
        }
        Ok(Self {
            width,
            height,
            foreground,
        })
    }

    /// Build a mask by evaluating `f(x, y)` for every pixel
    pub fn from_fn(width: usize, height: usize, f: impl Fn(usize, usize) -> bool) -> Result<Self> {
        let foreground = (0..height)
            .flat_map(|y| (0..width).map(move |x| (x, y)))
            .map(|(x, y)| f(x, y))
            .collect();
        Self::new(width, height, foreground)
    }

    /// A mask whose every pixel has the same label
    pub fn filled(width: usize, height: usize, foreground: bool) -> Result<Self> {
        Self::new(width, height, vec![foreground; width * height])
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// `height / width`, the aspect that keeps the projection's pixels square
    pub fn aspect(&self) -> f32 {
        self.height as f32 / self.width as f32
    }

    /// Pixels outside the raster are background
    pub fn is_foreground(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.foreground[y * self.width + x]
    }

    pub fn foreground_count(&self) -> usize {
        self.foreground.iter().filter(|&&f| f).count()
    }
}
