//! Show the tile plan for a source without rendering anything.

use std::path::PathBuf;

use vectile::config::ConfigFile;
use vectile::geometry::Geometry;
use vectile::plan::TilePlan;
use vectile::svg::SvgInfo;

use crate::error::CliError;

/// Arguments for `vectile plan`.
#[derive(Debug, clap::Args)]
pub struct Args {
    /// SVG source file to plan for
    pub source: PathBuf,

    /// Number of zoom levels to plan
    #[arg(long)]
    pub zoom: Option<u8>,

    /// Tile edge length in pixels
    #[arg(long)]
    pub tilesize: Option<u32>,
}

/// Run the plan command.
pub fn run(args: Args) -> Result<(), CliError> {
    let file = ConfigFile::load().map_err(CliError::ConfigFile)?;
    let max_zoom = args.zoom.unwrap_or(file.output.zoom);
    let tile_size = args.tilesize.unwrap_or(file.output.tilesize);

    let svg = SvgInfo::probe(&args.source).map_err(CliError::Probe)?;
    let geometry =
        Geometry::from_dimensions(svg.width(), svg.height()).map_err(CliError::Geometry)?;
    let plan = TilePlan::generate(&geometry, max_zoom, tile_size).map_err(CliError::Plan)?;

    println!("Source: {}", args.source.display());
    println!("  size:   {} x {}", svg.width(), svg.height());
    println!("  extent: {}", geometry.extent());
    println!(
        "  origin: ({}, {})",
        geometry.x_origin(),
        geometry.y_origin()
    );
    println!();
    println!(
        "Plan: {} levels, {} tiles of {} px",
        max_zoom,
        plan.len(),
        tile_size
    );
    for z in 0..max_zoom {
        println!(
            "  level {:>2}: {:>8} tiles ({} per axis)",
            z,
            TilePlan::level_count(z),
            1u64 << z
        );
    }

    Ok(())
}
