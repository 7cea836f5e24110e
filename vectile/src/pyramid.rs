//! Pyramid generation
//!
//! [`build_pyramid`] is the top of the stack: it probes the vector source,
//! resolves its geometry, generates the tile plan, runs the batch and
//! finishes by writing a `metadata.json` next to the tiles describing what
//! was produced. Everything underneath is reusable on its own; this module
//! just wires it together in the right order.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::batch::{BatchReport, BatchRunner, CancelFlag, ProgressCallback};
use crate::config::{ConfigError, RunConfig};
use crate::geometry::{Geometry, GeometryError};
use crate::plan::{PlanError, TilePlan};
use crate::rasterizer::Rasterizer;
use crate::render::TileRenderer;
use crate::svg::{SvgError, SvgInfo};

/// File written to the pyramid root after every run.
pub const METADATA_FILE: &str = "metadata.json";

/// Errors that can occur while building a pyramid.
#[derive(Debug, Error)]
pub enum PyramidError {
    /// Run configuration failed validation
    #[error("invalid run configuration: {0}")]
    Config(#[from] ConfigError),

    /// The vector source could not be inspected
    #[error("failed to inspect vector source: {0}")]
    Svg(#[from] SvgError),

    /// The source dimensions could not be resolved into a frame
    #[error("could not resolve source geometry: {0}")]
    Geometry(#[from] GeometryError),

    /// The tile plan could not be generated
    #[error("could not generate tile plan: {0}")]
    Plan(#[from] PlanError),

    /// The pyramid root directory could not be created
    #[error("failed to create pyramid root {path}: {source}")]
    CreateRoot {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The metadata file could not be written
    #[error("failed to write {path}: {source}")]
    MetadataIo {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The metadata could not be encoded
    #[error("failed to encode pyramid metadata: {0}")]
    MetadataJson(#[from] serde_json::Error),
}

/// Description of a finished run, persisted as `metadata.json` in the
/// pyramid root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidMetadata {
    /// Tool and version that produced the pyramid.
    pub generator: String,
    /// Vector source the tiles were cut from.
    pub source: String,
    /// RFC 3339 timestamp of the run.
    pub created: String,
    /// Number of zoom levels, `0..max_zoom`.
    pub max_zoom: u8,
    /// Tile edge length in pixels.
    pub tile_size: u32,
    /// File extension of the tiles.
    pub format: String,
    /// Side length of the square frame in source units.
    pub extent: f64,
    /// Tiles the plan called for.
    pub tiles_planned: usize,
    /// Tiles written to disk.
    pub tiles_written: usize,
    /// Fully transparent tiles dropped.
    pub tiles_discarded: usize,
    /// Tiles whose rendering failed.
    pub tiles_failed: usize,
}

/// Everything [`build_pyramid`] hands back to the caller.
#[derive(Debug)]
pub struct PyramidSummary {
    /// Tiles the plan called for.
    pub planned: usize,
    /// Resolved source frame.
    pub geometry: Geometry,
    /// Outcome tally from the batch run.
    pub report: BatchReport,
    /// Where `metadata.json` was written.
    pub metadata_path: PathBuf,
}

/// Builds a complete tile pyramid for one run configuration.
///
/// The run is driven to completion even when individual tiles fail; only
/// setup problems abort it. `metadata.json` is written regardless of
/// per-tile failures or cancellation so a partial pyramid still describes
/// itself.
///
/// # Arguments
///
/// * `config` - Validated per the numeric bounds before anything starts
/// * `rasterizer` - Backend shared across all workers
/// * `cancel` - Checked between tiles; flip it to stop the run early
/// * `progress` - Invoked after every attempted tile with (done, total)
pub fn build_pyramid(
    config: &RunConfig,
    rasterizer: Arc<dyn Rasterizer>,
    cancel: CancelFlag,
    progress: Option<ProgressCallback>,
) -> Result<PyramidSummary, PyramidError> {
    config.validate()?;

    if config.split_layers {
        warn!("layer splitting is not implemented; rendering all layers combined");
    }

    let svg = SvgInfo::probe(&config.source)?;
    let geometry = Geometry::from_dimensions(svg.width(), svg.height())?;
    let plan = TilePlan::generate(&geometry, config.max_zoom, config.tile_size)?;

    std::fs::create_dir_all(&config.directory).map_err(|source| PyramidError::CreateRoot {
        path: config.directory.clone(),
        source,
    })?;

    info!(
        source = %config.source.display(),
        width = svg.width(),
        height = svg.height(),
        extent = geometry.extent(),
        levels = config.max_zoom,
        tiles = plan.len(),
        workers = config.workers,
        backend = rasterizer.name(),
        "starting pyramid build"
    );

    let renderer = TileRenderer::new(
        rasterizer,
        config.source.clone(),
        config.directory.clone(),
        config.format,
    )
    .with_discard_transparent(config.ignore_transparent);

    let mut runner = BatchRunner::new(renderer, config.workers).with_cancel_flag(cancel);
    if let Some(callback) = progress {
        runner = runner.with_progress(callback);
    }

    let report = runner.run(&plan);

    // Written even for cancelled or partly failed runs, so the directory
    // always records what it holds.
    let metadata = PyramidMetadata {
        generator: format!("vectile {}", crate::VERSION),
        source: config.source.display().to_string(),
        created: chrono::Utc::now().to_rfc3339(),
        max_zoom: config.max_zoom,
        tile_size: config.tile_size,
        format: config.format.extension().to_string(),
        extent: geometry.extent(),
        tiles_planned: plan.len(),
        tiles_written: report.written,
        tiles_discarded: report.discarded,
        tiles_failed: report.failed.len(),
    };
    let metadata_path = config.directory.join(METADATA_FILE);
    write_metadata(&metadata, &metadata_path)?;

    info!(
        written = report.written,
        discarded = report.discarded,
        failed = report.failed.len(),
        cancelled = report.cancelled,
        elapsed_secs = report.elapsed.as_secs_f64(),
        "pyramid build finished"
    );

    Ok(PyramidSummary {
        planned: plan.len(),
        geometry,
        report,
        metadata_path,
    })
}

fn write_metadata(metadata: &PyramidMetadata, path: &Path) -> Result<(), PyramidError> {
    let json = serde_json::to_string_pretty(metadata)?;
    std::fs::write(path, json).map_err(|source| PyramidError::MetadataIo {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_metadata() -> PyramidMetadata {
        PyramidMetadata {
            generator: format!("vectile {}", crate::VERSION),
            source: "art.svg".to_string(),
            created: "2026-01-10T12:00:00+00:00".to_string(),
            max_zoom: 3,
            tile_size: 256,
            format: "webp".to_string(),
            extent: 100.0,
            tiles_planned: 21,
            tiles_written: 18,
            tiles_discarded: 3,
            tiles_failed: 0,
        }
    }

    #[test]
    fn test_metadata_json_round_trip() {
        let metadata = sample_metadata();
        let json = serde_json::to_string_pretty(&metadata).unwrap();
        let parsed: PyramidMetadata = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed, metadata);
    }

    #[test]
    fn test_metadata_json_field_names() {
        let json = serde_json::to_string(&sample_metadata()).unwrap();

        assert!(json.contains("\"generator\""));
        assert!(json.contains("\"max_zoom\""));
        assert!(json.contains("\"tiles_discarded\""));
    }

    #[test]
    fn test_write_metadata_creates_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join(METADATA_FILE);

        write_metadata(&sample_metadata(), &path).unwrap();

        let parsed: PyramidMetadata =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.tiles_planned, 21);
    }

    #[test]
    fn test_invalid_config_rejected_before_any_io() {
        let config = RunConfig::new("missing.svg", "out").with_max_zoom(0);
        let rasterizer: Arc<dyn Rasterizer> = Arc::new(FailingRasterizer);

        let error = build_pyramid(&config, rasterizer, CancelFlag::new(), None).unwrap_err();

        assert!(matches!(
            error,
            PyramidError::Config(ConfigError::InvalidZoom(0))
        ));
    }

    #[test]
    fn test_missing_source_reported() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let config = RunConfig::new(
            temp_dir.path().join("missing.svg"),
            temp_dir.path().join("out"),
        );
        let rasterizer: Arc<dyn Rasterizer> = Arc::new(FailingRasterizer);

        let error = build_pyramid(&config, rasterizer, CancelFlag::new(), None).unwrap_err();

        assert!(matches!(error, PyramidError::Svg(_)));
    }

    struct FailingRasterizer;

    impl Rasterizer for FailingRasterizer {
        fn rasterize(
            &self,
            _request: &crate::rasterizer::RasterizeRequest<'_>,
        ) -> Result<(), crate::rasterizer::RasterizerError> {
            Err(crate::rasterizer::RasterizerError::Render(
                "not expected to run".to_string(),
            ))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }
}
