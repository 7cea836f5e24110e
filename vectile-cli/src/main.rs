//! Vectile CLI - command line interface
//!
//! This binary provides a command-line interface to the Vectile library.

mod commands;
mod error;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "vectile")]
#[command(version = vectile::VERSION)]
#[command(about = "Slice large SVG artwork into raster tile pyramids", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a full tile pyramid from an SVG source
    Slice(commands::slice::Args),

    /// Show the tile plan for a source without rendering
    Plan(commands::plan::Args),

    /// Check a source and the rasterizer environment
    Probe(commands::probe::Args),

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: commands::config::ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Slice(args) => commands::slice::run(args),
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Probe(args) => commands::probe::run(args),
        Commands::Config { command } => commands::config::run(command),
    };

    if let Err(error) = result {
        error.exit();
    }
}
