//! Command-line front end: load a session, fill the grid, export the result

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use std::path::PathBuf;
use voxcarve::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Occupy the voxels that contain a scene point
    Points,
    /// Carve the visual hull of the silhouettes
    Carve,
}

/// Build a voxel occupancy grid from a calibrated camera rig
#[derive(Debug, Parser)]
#[command(name = "voxcarve", version, about)]
struct Args {
    /// Session file naming the point cloud, calibration, mask directory and image height
    config: PathBuf,

    /// Occupancy algorithm to run
    #[arg(short, long, value_enum, default_value_t = Mode::Carve)]
    mode: Mode,

    /// Voxels per axis, overrides the session file
    #[arg(short, long)]
    resolution: Option<usize>,

    /// Where to write the occupied voxel centers as PLY
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// What to do when a view has no mask: abort or skip
    #[arg(long)]
    missing_mask: Option<MissingMaskPolicy>,

    /// Projection aspect source: mask or camera
    #[arg(long)]
    aspect_from: Option<AspectSource>,

    /// Mask file name prefix
    #[arg(long)]
    mask_prefix: Option<String>,

    /// Mask file extension
    #[arg(long)]
    mask_ext: Option<String>,

    /// RGBA channel holding the silhouette
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=3))]
    channel: Option<u8>,

    /// Worker threads, defaults to every hardware thread
    #[arg(short = 'j', long)]
    threads: Option<usize>,
}

impl Args {
    fn session_config(&self) -> Result<SessionConfig> {
        let mut config = SessionConfig::from_file(&self.config)
            .with_context(|| format!("failed to read session file {}", self.config.display()))?;

        if let Some(resolution) = self.resolution {
            config = config.with_resolution(resolution);
        }
        if let Some(policy) = self.missing_mask {
            config = config.with_missing_mask(policy);
        }
        if let Some(aspect) = self.aspect_from {
            config = config.with_aspect(aspect);
        }
        if let Some(prefix) = &self.mask_prefix {
            config.mask_naming.prefix = prefix.clone();
        }
        if let Some(extension) = &self.mask_ext {
            config.mask_naming.extension = extension.trim_start_matches('.').to_string();
        }
        if let Some(channel) = self.channel {
            config = config.with_mask_channel(channel as usize);
        }
        if let Some(threads) = self.threads {
            config = config.with_threads(threads);
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = args.session_config()?;
    let session = Session::load(config).context("failed to load session")?;

    match args.mode {
        Mode::Points => {
            let stats = session.run_point_occupancy()?;
            println!(
                "{} points -> {} occupied voxels ({} outside the grid)",
                stats.points, stats.occupied, stats.skipped
            );
        }
        Mode::Carve => {
            let report = session.run_silhouette_carve().context("silhouette carving failed")?;
            println!(
                "{} views carved, {} skipped -> {} occupied voxels",
                report.applied(),
                report.skipped(),
                report.occupied
            );
        }
    }

    if let Some(output) = &args.output {
        let written = session
            .export_occupied(output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!("wrote {} voxel centers to {}", written, output.display());
    }

    Ok(())
}
