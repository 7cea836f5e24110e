//! Configuration management CLI commands.
//!
//! Provides `config init`, `config list`, and `config path` commands for
//! creating and inspecting the configuration file from the command line.

use clap::Subcommand;

use vectile::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Create the configuration file with defaults if it doesn't exist
    Init,

    /// List all configuration settings
    List,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init => run_init(),
        ConfigCommands::List => run_list(),
        ConfigCommands::Path => run_path(),
    }
}

/// Create the config file if missing and print where it lives.
fn run_init() -> Result<(), CliError> {
    let path = ConfigFile::ensure_exists().map_err(CliError::ConfigFile)?;
    println!("{}", path.display());
    Ok(())
}

/// List the effective configuration, defaults included.
fn run_list() -> Result<(), CliError> {
    let config = ConfigFile::load().map_err(CliError::ConfigFile)?;

    println!("[output]");
    println!("filetype = {}", config.output.filetype);
    println!("tilesize = {}", config.output.tilesize);
    println!("zoom = {}", config.output.zoom);
    println!();
    println!("[render]");
    println!("command = {}", config.render.command);
    println!("timeout = {}", config.render.timeout);
    println!("ignore_transparent = {}", config.render.ignore_transparent);
    println!();
    println!("[batch]");
    println!("workers = {}", config.batch.workers);

    Ok(())
}

/// Show the configuration file path.
fn run_path() -> Result<(), CliError> {
    println!("{}", config_file_path().display());
    Ok(())
}
