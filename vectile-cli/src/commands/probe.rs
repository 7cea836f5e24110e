//! Check a source and the rasterizer environment before a real run.

use std::path::PathBuf;

use vectile::config::ConfigFile;
use vectile::geometry::Geometry;
use vectile::rasterizer::CommandRasterizer;
use vectile::svg::SvgInfo;

use crate::commands::common::RasterizerArgs;
use crate::error::CliError;

/// Arguments for `vectile probe`.
#[derive(Debug, clap::Args)]
pub struct Args {
    /// SVG source file to inspect
    pub source: PathBuf,

    #[command(flatten)]
    pub rasterizer: RasterizerArgs,
}

/// Run the probe command.
pub fn run(args: Args) -> Result<(), CliError> {
    let file = ConfigFile::load().map_err(CliError::ConfigFile)?;

    let svg = SvgInfo::probe(&args.source).map_err(CliError::Probe)?;
    let geometry =
        Geometry::from_dimensions(svg.width(), svg.height()).map_err(CliError::Geometry)?;

    println!("Source: {}", args.source.display());
    println!("  size:   {} x {}", svg.width(), svg.height());
    println!("  extent: {}", geometry.extent());
    println!(
        "  origin: ({}, {})",
        geometry.x_origin(),
        geometry.y_origin()
    );
    println!();

    #[cfg(feature = "native-raster")]
    if args.rasterizer.native {
        // Parsing the full document is the probe.
        let _backend = vectile::rasterizer::ResvgRasterizer::from_file(&args.source)
            .map_err(CliError::Rasterizer)?;
        println!("Rasterizer: resvg (in-process), source parsed OK");
        return Ok(());
    }

    let command = CommandRasterizer::new(args.rasterizer.command(&file.render));
    let version = command.ensure_available().map_err(CliError::Rasterizer)?;
    println!("Rasterizer: {} {}", command.program(), version);

    Ok(())
}
