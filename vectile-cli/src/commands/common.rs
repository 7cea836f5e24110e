//! Common types and utilities shared across CLI commands.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use clap::ValueEnum;

use vectile::config::RenderSettings;
use vectile::format::TileFormat;
use vectile::rasterizer::{CommandRasterizer, Rasterizer};

use crate::error::CliError;

/// Output format selection for CLI arguments.
#[derive(Debug, Clone, Copy, PartialEq, ValueEnum)]
pub enum FormatArg {
    /// PNG, kept exactly as the rasterizer produced it
    Png,
    /// WebP
    Webp,
    /// JPEG (alpha is flattened)
    Jpg,
    /// GIF
    Gif,
    /// BMP
    Bmp,
    /// TIFF
    Tif,
}

impl From<FormatArg> for TileFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => TileFormat::Png,
            FormatArg::Webp => TileFormat::Webp,
            FormatArg::Jpg => TileFormat::Jpeg,
            FormatArg::Gif => TileFormat::Gif,
            FormatArg::Bmp => TileFormat::Bmp,
            FormatArg::Tif => TileFormat::Tiff,
        }
    }
}

/// Rasterizer selection shared by every command that renders or probes.
#[derive(Debug, clap::Args)]
pub struct RasterizerArgs {
    /// Rasterizer command (overrides the config file)
    #[arg(long)]
    pub rasterizer: Option<String>,

    /// Per-invocation rasterizer timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Render in-process with resvg instead of an external command
    #[cfg(feature = "native-raster")]
    #[arg(long)]
    pub native: bool,
}

impl RasterizerArgs {
    /// The external command to invoke, flags taking precedence over the
    /// config file.
    pub fn command<'a>(&'a self, render: &'a RenderSettings) -> &'a str {
        self.rasterizer.as_deref().unwrap_or(&render.command)
    }

    /// The per-invocation time limit, flags taking precedence over the
    /// config file.
    pub fn timeout(&self, render: &RenderSettings) -> Duration {
        Duration::from_secs(self.timeout.unwrap_or(render.timeout))
    }
}

/// Build the rasterizer backend a render run will use.
///
/// The external command is verified up front so a missing or outdated
/// install fails before any tile is attempted.
#[cfg_attr(not(feature = "native-raster"), allow(unused_variables))]
pub fn build_rasterizer(
    args: &RasterizerArgs,
    render: &RenderSettings,
    source: &Path,
) -> Result<Arc<dyn Rasterizer>, CliError> {
    #[cfg(feature = "native-raster")]
    if args.native {
        let backend =
            vectile::rasterizer::ResvgRasterizer::from_file(source).map_err(CliError::Rasterizer)?;
        tracing::info!("rendering in-process with resvg");
        return Ok(Arc::new(backend));
    }

    let rasterizer =
        CommandRasterizer::new(args.command(render)).with_timeout(args.timeout(render));
    let version = rasterizer.ensure_available().map_err(CliError::Rasterizer)?;
    tracing::info!("rendering with {} {}", rasterizer.program(), version);
    Ok(Arc::new(rasterizer))
}
