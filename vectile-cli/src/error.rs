//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use vectile::config::ConfigFileError;
use vectile::geometry::GeometryError;
use vectile::plan::PlanError;
use vectile::pyramid::PyramidError;
use vectile::rasterizer::RasterizerError;
use vectile::svg::SvgError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to read or write the configuration file
    ConfigFile(ConfigFileError),
    /// Failed to inspect the vector source
    Probe(SvgError),
    /// Source dimensions could not be resolved
    Geometry(GeometryError),
    /// Tile plan generation failed
    Plan(PlanError),
    /// Rasterizer is missing, too old, or broken
    Rasterizer(RasterizerError),
    /// Pyramid build aborted during setup
    Build(PyramidError),
    /// The build finished but some tiles failed
    TilesFailed { failed: usize, total: usize },
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        // Print additional help for specific errors
        match self {
            CliError::Rasterizer(
                RasterizerError::Spawn { .. } | RasterizerError::UnsupportedVersion { .. },
            ) => {
                eprintln!();
                eprintln!("Make sure a compatible rasterizer is available:");
                eprintln!("  1. Install Inkscape 1.0 or newer: https://inkscape.org");
                eprintln!("  2. Or pass --rasterizer with a compatible command");
                eprintln!("  3. Or set command in the [render] section of config.ini");
            }
            CliError::TilesFailed { .. } => {
                eprintln!();
                eprintln!("Tiles that succeeded are kept in the output directory.");
                eprintln!("Failure details are in the log; re-running the same command is safe.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "Configuration file error: {}", e),
            CliError::Probe(e) => write!(f, "Failed to inspect source: {}", e),
            CliError::Geometry(e) => write!(f, "Could not resolve source geometry: {}", e),
            CliError::Plan(e) => write!(f, "Could not generate tile plan: {}", e),
            CliError::Rasterizer(e) => write!(f, "Rasterizer unavailable: {}", e),
            CliError::Build(e) => write!(f, "Pyramid build failed: {}", e),
            CliError::TilesFailed { failed, total } => {
                write!(f, "{} of {} tiles failed to render", failed, total)
            }
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Probe(e) => Some(e),
            CliError::Geometry(e) => Some(e),
            CliError::Plan(e) => Some(e),
            CliError::Rasterizer(e) => Some(e),
            CliError::Build(e) => Some(e),
            _ => None,
        }
    }
}
