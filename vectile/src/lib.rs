//! Vectile - tile pyramid generation for vector artwork
//!
//! This library slices one large SVG into a quadtree of raster tiles laid
//! out as `{z}/{x}/{y}.{ext}`, the directory scheme slippy-map viewers
//! expect. Rasterization is delegated to an external Inkscape-compatible
//! command, or to the in-process resvg backend behind the `native-raster`
//! feature.
//!
//! # High-Level API
//!
//! For most use cases, [`pyramid::build_pyramid`] drives a whole run:
//!
//! ```ignore
//! use std::sync::Arc;
//! use vectile::batch::CancelFlag;
//! use vectile::config::RunConfig;
//! use vectile::pyramid::build_pyramid;
//! use vectile::rasterizer::{CommandRasterizer, Rasterizer};
//!
//! let config = RunConfig::new("drawing.svg", "tiles").with_max_zoom(6);
//! let rasterizer: Arc<dyn Rasterizer> = Arc::new(CommandRasterizer::new("inkscape"));
//!
//! let summary = build_pyramid(&config, rasterizer, CancelFlag::new(), None)?;
//! println!("wrote {} tiles", summary.report.written);
//! ```

pub mod batch;
pub mod config;
pub mod format;
pub mod geometry;
pub mod logging;
pub mod plan;
pub mod pyramid;
pub mod rasterizer;
pub mod render;
pub mod svg;
pub mod tile;

/// Version of the Vectile library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
