//! Run configuration
//!
//! [`RunConfig`] collects everything one pyramid run needs. The persistent
//! user configuration (`~/.vectile/config.ini`) lives in [`file`]; command
//! line layers sit on top, so precedence is flags, then file, then the
//! defaults here.

pub mod file;

pub use file::{
    config_directory, config_file_path, BatchSettings, ConfigFile, ConfigFileError,
    OutputSettings, RenderSettings,
};

use std::path::PathBuf;

use thiserror::Error;

use crate::batch::DEFAULT_WORKERS;
use crate::format::TileFormat;
use crate::plan::{MAX_ZOOM, MIN_ZOOM};

/// Default zoom depth: levels 0 through 4.
pub const DEFAULT_MAX_ZOOM: u8 = 5;

/// Default output tile edge length in pixels.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default per-invocation rasterizer time limit, in seconds.
pub const DEFAULT_RASTERIZER_TIMEOUT_SECS: u64 = 120;

/// Errors produced by run configuration validation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Zoom depth is outside the supported range.
    #[error("invalid zoom depth {0}: must be between 1 and 12 levels")]
    InvalidZoom(u8),

    /// Tile pixel size was zero.
    #[error("invalid tile size: must be a positive number of pixels")]
    InvalidTileSize,

    /// Worker count was zero.
    #[error("invalid worker count: must be at least one")]
    InvalidWorkers,
}

/// Everything one pyramid run needs.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    /// Vector source file to slice.
    pub source: PathBuf,

    /// Pyramid root directory; created if missing.
    pub directory: PathBuf,

    /// Number of zoom levels to generate, `0..max_zoom`.
    pub max_zoom: u8,

    /// Format of the final tile files.
    pub format: TileFormat,

    /// Output tile edge length in pixels.
    pub tile_size: u32,

    /// Drop fully transparent tiles instead of writing them.
    pub ignore_transparent: bool,

    /// Accepted but not implemented: rendering proceeds over all layers
    /// combined. Kept so existing invocations keep working.
    pub split_layers: bool,

    /// Worker thread count.
    pub workers: usize,
}

impl RunConfig {
    /// Creates a config with defaults for everything but the paths.
    pub fn new(source: impl Into<PathBuf>, directory: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            directory: directory.into(),
            max_zoom: DEFAULT_MAX_ZOOM,
            format: TileFormat::default(),
            tile_size: DEFAULT_TILE_SIZE,
            ignore_transparent: true,
            split_layers: false,
            workers: DEFAULT_WORKERS,
        }
    }

    /// Sets the zoom depth.
    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    /// Sets the output format.
    pub fn with_format(mut self, format: TileFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets the tile edge length in pixels.
    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Sets whether fully transparent tiles are dropped.
    pub fn with_ignore_transparent(mut self, ignore: bool) -> Self {
        self.ignore_transparent = ignore;
        self
    }

    /// Sets the inert split-layers switch.
    pub fn with_split_layers(mut self, split: bool) -> Self {
        self.split_layers = split;
        self
    }

    /// Sets the worker thread count.
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Checks the numeric surface before a run starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&self.max_zoom) {
            return Err(ConfigError::InvalidZoom(self.max_zoom));
        }
        if self.tile_size == 0 {
            return Err(ConfigError::InvalidTileSize);
        }
        if self.workers == 0 {
            return Err(ConfigError::InvalidWorkers);
        }
        Ok(())
    }
}
