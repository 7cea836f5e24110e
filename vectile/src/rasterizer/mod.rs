//! Rasterizer abstraction
//!
//! Rendering a tile's region of the source into pixels is delegated to a
//! [`Rasterizer`]. The default implementation shells out to an
//! Inkscape-compatible command line tool; an in-process backend built on
//! resvg is available behind the `native-raster` feature.
//!
//! Every implementation honours the same contract: on success a PNG file
//! exists at the requested output path, sized exactly to the requested
//! pixel dimensions and covering exactly the requested source region.

mod command;
#[cfg(feature = "native-raster")]
mod resvg;

pub use command::{CommandRasterizer, DEFAULT_PROGRAM, MINIMUM_VERSION};
#[cfg(feature = "native-raster")]
pub use resvg::ResvgRasterizer;

use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::tile::Region;

/// Errors produced by rasterizer implementations.
#[derive(Debug, Error)]
pub enum RasterizerError {
    /// The rasterizer process could not be started.
    #[error("failed to launch rasterizer '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    /// The rasterizer process ran but reported failure.
    #[error("rasterizer exited with {status}: {stderr}")]
    CommandFailed { status: ExitStatus, stderr: String },

    /// The rasterizer exceeded its invocation time limit and was killed.
    #[error("rasterizer timed out after {0:?}")]
    TimedOut(Duration),

    /// The rasterizer reported success but left no file behind.
    #[error("rasterizer produced no output at {0}")]
    MissingOutput(PathBuf),

    /// The rasterizer's version could not be determined.
    #[error("could not determine rasterizer version: {0}")]
    VersionProbe(String),

    /// The installed rasterizer predates the supported command line surface.
    #[error("rasterizer version {found} is too old: {minimum} or newer is required")]
    UnsupportedVersion {
        found: semver::Version,
        minimum: semver::Version,
    },

    /// The vector source could not be loaded.
    #[error("failed to load vector source {path}: {message}")]
    Source { path: PathBuf, message: String },

    /// In-process rendering failed.
    #[error("rendering failed: {0}")]
    Render(String),
}

/// One rasterization job: a region of the source, scaled to a pixel
/// rectangle, written as PNG to the output path.
#[derive(Debug, Clone)]
pub struct RasterizeRequest<'a> {
    source: &'a Path,
    region: Region,
    width: u32,
    height: u32,
    output: &'a Path,
}

impl<'a> RasterizeRequest<'a> {
    /// Creates a request.
    ///
    /// # Arguments
    ///
    /// * `source` - Vector source file to render from
    /// * `region` - Portion of the source canvas to export
    /// * `width` - Output width in pixels
    /// * `height` - Output height in pixels
    /// * `output` - Destination path; the result is always PNG
    pub fn new(source: &'a Path, region: Region, width: u32, height: u32, output: &'a Path) -> Self {
        Self {
            source,
            region,
            width,
            height,
            output,
        }
    }

    #[inline]
    pub fn source(&self) -> &Path {
        self.source
    }

    #[inline]
    pub fn region(&self) -> Region {
        self.region
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn output(&self) -> &Path {
        self.output
    }
}

/// Renders regions of a vector source into PNG files.
///
/// Implementations must be safe to call from multiple worker threads at
/// once; requests never share an output path.
pub trait Rasterizer: Send + Sync {
    /// Rasterizes one request, leaving a PNG at its output path.
    fn rasterize(&self, request: &RasterizeRequest<'_>) -> Result<(), RasterizerError>;

    /// Returns the backend's name for logging and diagnostics.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: ?Sized + Send + Sync>() {}

    #[test]
    fn test_rasterizer_trait_is_send_sync() {
        assert_send_sync::<dyn Rasterizer>();
    }

    #[test]
    fn test_request_accessors() {
        let source = Path::new("art.svg");
        let output = Path::new("out/0/0/0.png");
        let region = Region::new(0.0, 0.0, 100.0, 100.0);
        let request = RasterizeRequest::new(source, region, 256, 256, output);

        assert_eq!(request.source(), source);
        assert_eq!(request.region(), region);
        assert_eq!(request.width(), 256);
        assert_eq!(request.height(), 256);
        assert_eq!(request.output(), output);
    }
}
