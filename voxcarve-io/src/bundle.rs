//! Bundler v0.3 calibration files
//!
//! Layout: a magic comment line, a line whose first token is the camera count,
//! then five lines per camera (focal length, three rotation rows, translation).
//! Extra tokens on any of those lines (radial distortion, point count) are
//! ignored, as is everything after the last camera.

use crate::CameraRigReader;
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;
use voxcarve_core::{CameraView, Error, Matrix3, Result, Vector3};

/// First line of a Bundler calibration file
pub const BUNDLE_MAGIC: &str = "# Bundle file v0.3";
/// Upper bound on cameras reserved up front from the count line
const MAX_RESERVED_CAMERAS: usize = 1 << 16;

/// Parameters the calibration file itself does not carry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigOptions {
    /// Height in pixels of the photographs the rig was calibrated on
    pub image_height: f32,
    /// Initial projection aspect (`height / width` of the target raster)
    pub aspect: f32,
}

impl RigOptions {
    pub fn new(image_height: f32) -> Self {
        Self {
            image_height,
            aspect: 1.0,
        }
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }
}

pub struct BundleReader;

impl CameraRigReader for BundleReader {
    fn read_cameras<P: AsRef<Path>>(path: P, options: &RigOptions) -> Result<Vec<CameraView>> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let cameras = parse_bundle(BufReader::new(file), options)?;
        debug!("read {} cameras from {}", cameras.len(), path.display());
        Ok(cameras)
    }
}

struct LineCursor<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> LineCursor<R> {
    fn next_line(&mut self) -> Result<Option<String>> {
        let line = self.lines.next().transpose()?;
        if line.is_some() {
            self.line_no += 1;
        }
        Ok(line)
    }

    /// Parse the first `N` tokens of the next line
    fn next_values<const N: usize>(&mut self, expected: usize, found: usize) -> Result<[f32; N]> {
        let line = self
            .next_line()?
            .ok_or(Error::BrokenFile { expected, found })?;
        let mut values = [0.0f32; N];
        let mut tokens = line.split_whitespace();
        for (i, slot) in values.iter_mut().enumerate() {
            let token = tokens.next().ok_or_else(|| {
                Error::format_at(self.line_no, format!("expected {} values, found {}", N, i))
            })?;
            *slot = token.parse().map_err(|_| {
                Error::format_at(self.line_no, format!("invalid number '{}'", token))
            })?;
        }
        Ok(values)
    }
}

/// Parse a Bundler calibration into cameras in file order.
///
/// Nothing is returned unless every camera parsed: a malformed number is an
/// [`Error::Format`] and input ending mid-rig an [`Error::BrokenFile`] that
/// counts complete cameras.
pub fn parse_bundle<R: BufRead>(reader: R, options: &RigOptions) -> Result<Vec<CameraView>> {
    let mut cursor = LineCursor {
        lines: reader.lines(),
        line_no: 0,
    };

    match cursor.next_line()? {
        Some(line) if line.trim_end() == BUNDLE_MAGIC => {}
        _ => return Err(Error::Format("not a bundle file".to_string())),
    }

    let count_line = cursor
        .next_line()?
        .ok_or_else(|| Error::Format("missing camera count".to_string()))?;
    let count_token = count_line.split_whitespace().next().unwrap_or_default();
    let count: usize = count_token
        .parse()
        .map_err(|_| Error::format_at(2, format!("invalid camera count '{}'", count_token)))?;

    let mut cameras = Vec::with_capacity(count.min(MAX_RESERVED_CAMERAS));
    for i in 0..count {
        let [focal] = cursor.next_values::<1>(count, i)?;

        let mut rows = [[0.0f32; 3]; 3];
        for row in rows.iter_mut() {
            *row = cursor.next_values::<3>(count, i)?;
        }
        let rotation = Matrix3::new(
            rows[0][0], rows[0][1], rows[0][2],
            rows[1][0], rows[1][1], rows[1][2],
            rows[2][0], rows[2][1], rows[2][2],
        );

        let [tx, ty, tz] = cursor.next_values::<3>(count, i)?;

        cameras.push(CameraView::new(
            rotation,
            Vector3::new(tx, ty, tz),
            focal,
            options.image_height,
            options.aspect,
        ));
    }

    Ok(cameras)
}
