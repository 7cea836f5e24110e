//! Configuration file handling for ~/.vectile/config.ini.
//!
//! Loads and saves user configuration with sensible defaults. Parsing
//! starts from [`ConfigFile::default`] and overlays any values found in
//! the INI, so a partial file is fine.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::Ini;
use thiserror::Error;

use super::{DEFAULT_MAX_ZOOM, DEFAULT_RASTERIZER_TIMEOUT_SECS, DEFAULT_TILE_SIZE, RunConfig};
use crate::batch::DEFAULT_WORKERS;
use crate::format::TileFormat;
use crate::rasterizer::DEFAULT_PROGRAM;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

/// Settings for the `[output]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSettings {
    /// Final tile format.
    pub filetype: TileFormat,
    /// Tile edge length in pixels.
    pub tilesize: u32,
    /// Number of zoom levels to generate.
    pub zoom: u8,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            filetype: TileFormat::default(),
            tilesize: DEFAULT_TILE_SIZE,
            zoom: DEFAULT_MAX_ZOOM,
        }
    }
}

/// Settings for the `[render]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    /// Rasterizer command to invoke.
    pub command: String,
    /// Timeout in seconds for a single rasterizer invocation.
    pub timeout: u64,
    /// Drop tiles that come back fully transparent.
    pub ignore_transparent: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            command: DEFAULT_PROGRAM.to_string(),
            timeout: DEFAULT_RASTERIZER_TIMEOUT_SECS,
            ignore_transparent: true,
        }
    }
}

/// Settings for the `[batch]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchSettings {
    /// Worker threads rendering tiles in parallel.
    pub workers: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
        }
    }
}

/// User configuration persisted at ~/.vectile/config.ini.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub output: OutputSettings,
    pub render: RenderSettings,
    pub batch: BatchSettings,
}

impl ConfigFile {
    /// Load configuration from the default path (~/.vectile/config.ini).
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        let path = config_file_path();
        Self::load_from(&path)
    }

    /// Load configuration from a specific path.
    ///
    /// If the file doesn't exist, returns defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        parse_ini(&ini)
    }

    /// Save configuration to the default path (~/.vectile/config.ini).
    pub fn save(&self) -> Result<(), ConfigFileError> {
        let path = config_file_path();
        self.save_to(&path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Create the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            let config = Self::default();
            config.save_to(&path)?;
        }
        Ok(path)
    }

    /// Seed a [`RunConfig`] for the given paths from these settings.
    ///
    /// Command line flags are expected to overlay the result.
    pub fn to_run_config(
        &self,
        source: impl Into<PathBuf>,
        directory: impl Into<PathBuf>,
    ) -> RunConfig {
        RunConfig::new(source, directory)
            .with_max_zoom(self.output.zoom)
            .with_format(self.output.filetype)
            .with_tile_size(self.output.tilesize)
            .with_ignore_transparent(self.render.ignore_transparent)
            .with_workers(self.batch.workers)
    }
}

/// Get the path to the config directory (~/.vectile).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".vectile")
}

/// Get the path to the config file (~/.vectile/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

/// Parse a typed value out of one INI entry, mapping failures to
/// [`ConfigFileError::InvalidValue`].
fn parse_value<T: FromStr>(
    section: &str,
    key: &str,
    value: &str,
    reason: &str,
) -> Result<T, ConfigFileError> {
    value.parse().map_err(|_| ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    })
}

/// Parse an `Ini` object into a `ConfigFile`.
fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [output] section
    if let Some(section) = ini.section(Some("output")) {
        if let Some(v) = section.get("filetype") {
            config.output.filetype = parse_value(
                "output",
                "filetype",
                v,
                "must be one of: png, webp, jpg, gif, bmp, tif",
            )?;
        }
        if let Some(v) = section.get("tilesize") {
            config.output.tilesize =
                parse_value("output", "tilesize", v, "must be a positive integer (pixels)")?;
        }
        if let Some(v) = section.get("zoom") {
            config.output.zoom =
                parse_value("output", "zoom", v, "must be an integer between 1 and 12")?;
        }
    }

    // [render] section
    if let Some(section) = ini.section(Some("render")) {
        if let Some(v) = section.get("command") {
            let v = v.trim();
            if !v.is_empty() {
                config.render.command = v.to_string();
            }
        }
        if let Some(v) = section.get("timeout") {
            config.render.timeout =
                parse_value("render", "timeout", v, "must be a positive integer (seconds)")?;
        }
        if let Some(v) = section.get("ignore_transparent") {
            config.render.ignore_transparent =
                parse_value("render", "ignore_transparent", v, "must be 'true' or 'false'")?;
        }
    }

    // [batch] section
    if let Some(section) = ini.section(Some("batch")) {
        if let Some(v) = section.get("workers") {
            config.batch.workers =
                parse_value("batch", "workers", v, "must be a positive integer")?;
        }
    }

    Ok(config)
}

/// Convert a `ConfigFile` to a commented INI string for saving.
fn to_config_string(config: &ConfigFile) -> String {
    let ignore_transparent = if config.render.ignore_transparent {
        "true"
    } else {
        "false"
    };

    format!(
        r#"[output]
; Final tile format: png, webp, jpg, gif, bmp, or tif
; png keeps the rasterizer output as-is with no re-encode step
filetype = {}
; Tile edge length in pixels (default: 256)
tilesize = {}
; Number of zoom levels to generate (default: 5, maximum: 12)
; Level z holds 4^z tiles, so each extra level quadruples the work
zoom = {}

[render]
; Rasterizer command (default: inkscape)
; Must accept Inkscape 1.x export flags; version 1.0.0 or newer is required
command = {}
; Timeout in seconds for a single rasterizer invocation (default: 120)
timeout = {}
; Drop tiles that come back fully transparent (default: true)
ignore_transparent = {}

[batch]
; Worker threads rendering tiles in parallel (default: 4)
workers = {}
"#,
        config.output.filetype,
        config.output.tilesize,
        config.output.zoom,
        config.render.command,
        config.render.timeout,
        ignore_transparent,
        config.batch.workers,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert_eq!(config.output.filetype, TileFormat::Webp);
        assert_eq!(config.output.tilesize, DEFAULT_TILE_SIZE);
        assert_eq!(config.output.zoom, DEFAULT_MAX_ZOOM);
        assert_eq!(config.render.command, "inkscape");
        assert_eq!(config.render.timeout, DEFAULT_RASTERIZER_TIMEOUT_SECS);
        assert!(config.render.ignore_transparent);
        assert_eq!(config.batch.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.ini");

        let config = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.output.filetype = TileFormat::Png;
        config.output.tilesize = 512;
        config.output.zoom = 7;
        config.render.command = "inkscape-custom".to_string();
        config.render.timeout = 30;
        config.render.ignore_transparent = false;
        config.batch.workers = 12;

        config.save_to(&config_path).unwrap();
        let loaded = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_saved_file_is_commented() {
        let config = ConfigFile::default();
        let content = to_config_string(&config);

        assert!(content.contains("[output]"));
        assert!(content.contains("[render]"));
        assert!(content.contains("[batch]"));
        assert!(content.contains("; Timeout in seconds"));
        assert!(content.contains("filetype = webp"));
    }

    #[test]
    fn test_partial_file_overlays_defaults() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, "[output]\nfiletype = png\n").unwrap();

        let config = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(config.output.filetype, TileFormat::Png);
        assert_eq!(config.output.tilesize, DEFAULT_TILE_SIZE);
        assert_eq!(config.batch.workers, DEFAULT_WORKERS);
    }

    #[test]
    fn test_invalid_zoom_reports_section_and_key() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, "[output]\nzoom = banana\n").unwrap();

        let error = ConfigFile::load_from(&config_path).unwrap_err();

        match error {
            ConfigFileError::InvalidValue {
                section,
                key,
                value,
                ..
            } => {
                assert_eq!(section, "output");
                assert_eq!(key, "zoom");
                assert_eq!(value, "banana");
            }
            other => panic!("expected InvalidValue, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_bool_rejected() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, "[render]\nignore_transparent = sometimes\n").unwrap();

        assert!(ConfigFile::load_from(&config_path).is_err());
    }

    #[test]
    fn test_blank_command_keeps_default() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.ini");
        std::fs::write(&config_path, "[render]\ncommand =   \n").unwrap();

        let config = ConfigFile::load_from(&config_path).unwrap();

        assert_eq!(config.render.command, "inkscape");
    }

    #[test]
    fn test_to_run_config_maps_fields() {
        let mut file = ConfigFile::default();
        file.output.zoom = 6;
        file.output.filetype = TileFormat::Jpeg;
        file.output.tilesize = 128;
        file.render.ignore_transparent = false;
        file.batch.workers = 2;

        let run = file.to_run_config("art.svg", "tiles");

        assert_eq!(run.max_zoom, 6);
        assert_eq!(run.format, TileFormat::Jpeg);
        assert_eq!(run.tile_size, 128);
        assert!(!run.ignore_transparent);
        assert_eq!(run.workers, 2);
        assert_eq!(run.source, PathBuf::from("art.svg"));
        assert_eq!(run.directory, PathBuf::from("tiles"));
    }
}
