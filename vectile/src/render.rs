//! Tile rendering pipeline
//!
//! [`TileRenderer`] turns one planned tile into a file under the pyramid
//! root. Each render walks the same stages:
//!
//! 1. ensure the tile's `{z}/{x}/` directory exists (idempotent, safe when
//!    sibling workers race on the same level)
//! 2. drive the rasterizer into a PNG intermediate at `{z}/{x}/{y}.png`
//! 3. decode the intermediate and discard it when fully transparent
//! 4. re-encode to the pyramid's format when that format is not PNG
//!
//! PNG pyramids skip stage 4 entirely: the intermediate already occupies the
//! final path, so there is nothing to convert and nothing to delete.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::{DynamicImage, GenericImageView};
use thiserror::Error;
use tracing::debug;

use crate::format::TileFormat;
use crate::rasterizer::{RasterizeRequest, Rasterizer, RasterizerError};
use crate::tile::Tile;

// ============================================================================
// Errors
// ============================================================================

/// Errors produced while rendering a single tile. Every variant names the
/// tile so batch reporting can attribute failures.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The tile's output directory could not be created.
    #[error("tile {tile}: failed to create directory {path}: {source}")]
    CreateDir {
        tile: Tile,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The rasterizer failed or produced nothing.
    #[error("tile {tile}: {source}")]
    Rasterize {
        tile: Tile,
        #[source]
        source: RasterizerError,
    },

    /// The PNG intermediate could not be decoded.
    #[error("tile {tile}: failed to decode intermediate {path}: {source}")]
    Decode {
        tile: Tile,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Re-encoding to the final format failed.
    #[error("tile {tile}: failed to encode {path}: {source}")]
    Encode {
        tile: Tile,
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// A spent intermediate could not be removed.
    #[error("tile {tile}: failed to remove intermediate {path}: {source}")]
    Cleanup {
        tile: Tile,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    /// The tile this error belongs to.
    pub fn tile(&self) -> Tile {
        match self {
            RenderError::CreateDir { tile, .. }
            | RenderError::Rasterize { tile, .. }
            | RenderError::Decode { tile, .. }
            | RenderError::Encode { tile, .. }
            | RenderError::Cleanup { tile, .. } => *tile,
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// What became of one rendered tile.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderOutcome {
    /// The tile file exists at the contained path.
    Written(PathBuf),
    /// The tile was fully transparent and intentionally dropped.
    Discarded,
}

// ============================================================================
// Renderer
// ============================================================================

/// Renders tiles of one pyramid run.
///
/// Holds the injected rasterizer plus everything that is constant across
/// tiles. Safe to share across worker threads; the only mutable state is
/// the output tree, and no two tiles share a path.
pub struct TileRenderer {
    rasterizer: Arc<dyn Rasterizer>,
    source: PathBuf,
    output_root: PathBuf,
    format: TileFormat,
    discard_transparent: bool,
}

impl TileRenderer {
    /// Creates a renderer that discards fully transparent tiles.
    ///
    /// # Arguments
    ///
    /// * `rasterizer` - Backend producing PNG intermediates
    /// * `source` - Vector source file
    /// * `output_root` - Pyramid root directory
    /// * `format` - Format of the final tile files
    pub fn new(
        rasterizer: Arc<dyn Rasterizer>,
        source: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        format: TileFormat,
    ) -> Self {
        Self {
            rasterizer,
            source: source.into(),
            output_root: output_root.into(),
            format,
            discard_transparent: true,
        }
    }

    /// Sets whether fully transparent tiles are dropped instead of written.
    pub fn with_discard_transparent(mut self, discard: bool) -> Self {
        self.discard_transparent = discard;
        self
    }

    /// Format of the final tile files.
    pub fn format(&self) -> TileFormat {
        self.format
    }

    /// Pyramid root directory.
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Renders one tile to its place in the pyramid.
    ///
    /// # Returns
    ///
    /// [`RenderOutcome::Written`] with the final path, or
    /// [`RenderOutcome::Discarded`] when the tile was fully transparent and
    /// discarding is enabled.
    pub fn render(&self, tile: &Tile) -> Result<RenderOutcome, RenderError> {
        let intermediate = self.output_root.join(tile.relative_path("png"));

        if let Some(directory) = intermediate.parent() {
            fs::create_dir_all(directory).map_err(|source| RenderError::CreateDir {
                tile: *tile,
                path: directory.to_path_buf(),
                source,
            })?;
        }

        let request = RasterizeRequest::new(
            &self.source,
            tile.region(),
            tile.size(),
            tile.size(),
            &intermediate,
        );
        self.rasterizer
            .rasterize(&request)
            .map_err(|source| RenderError::Rasterize {
                tile: *tile,
                source,
            })?;

        let decoded = image::open(&intermediate).map_err(|source| RenderError::Decode {
            tile: *tile,
            path: intermediate.clone(),
            source,
        })?;

        if self.discard_transparent && is_fully_transparent(&decoded) {
            fs::remove_file(&intermediate).map_err(|source| RenderError::Cleanup {
                tile: *tile,
                path: intermediate.clone(),
                source,
            })?;
            debug!("discarded transparent tile {}", tile);
            return Ok(RenderOutcome::Discarded);
        }

        if self.format.is_png() {
            // The intermediate is the final file; removing it here would
            // destroy the only copy
            debug!("wrote tile {} at {}", tile, intermediate.display());
            return Ok(RenderOutcome::Written(intermediate));
        }

        let final_path = self
            .output_root
            .join(tile.relative_path(self.format.extension()));

        let encoded = if self.format.supports_alpha() {
            decoded.save_with_format(&final_path, self.format.image_format())
        } else {
            // JPEG carries no alpha; flatten before encoding
            DynamicImage::ImageRgb8(decoded.to_rgb8())
                .save_with_format(&final_path, self.format.image_format())
        };
        encoded.map_err(|source| RenderError::Encode {
            tile: *tile,
            path: final_path.clone(),
            source,
        })?;

        fs::remove_file(&intermediate).map_err(|source| RenderError::Cleanup {
            tile: *tile,
            path: intermediate.clone(),
            source,
        })?;

        debug!("wrote tile {} at {}", tile, final_path.display());
        Ok(RenderOutcome::Written(final_path))
    }
}

/// True when the image has an alpha channel and every alpha sample is zero.
/// Images without alpha can never be fully transparent.
fn is_fully_transparent(image: &DynamicImage) -> bool {
    if !image.color().has_alpha() {
        return false;
    }
    image.pixels().all(|(_, _, pixel)| pixel.0[3] == 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Region;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    /// Stand-in rasterizer painting deterministic pixels, or misbehaving on
    /// demand.
    enum StubBehaviour {
        /// Solid RGBA fill with the given alpha.
        Solid { alpha: u8 },
        /// Solid RGB fill with no alpha channel at all.
        SolidRgb,
        /// Write bytes that are not a PNG.
        Garbage,
        /// Fail without touching the output path.
        Fail,
    }

    struct StubRasterizer {
        behaviour: StubBehaviour,
    }

    impl StubRasterizer {
        fn solid(alpha: u8) -> Arc<Self> {
            Arc::new(Self {
                behaviour: StubBehaviour::Solid { alpha },
            })
        }

        fn with(behaviour: StubBehaviour) -> Arc<Self> {
            Arc::new(Self { behaviour })
        }
    }

    impl Rasterizer for StubRasterizer {
        fn rasterize(&self, request: &RasterizeRequest<'_>) -> Result<(), RasterizerError> {
            match &self.behaviour {
                StubBehaviour::Solid { alpha } => {
                    let pixel = Rgba([0u8, 128, 255, *alpha]);
                    RgbaImage::from_pixel(request.width(), request.height(), pixel)
                        .save(request.output())
                        .map_err(|e| RasterizerError::Render(e.to_string()))
                }
                StubBehaviour::SolidRgb => {
                    RgbImage::from_pixel(request.width(), request.height(), Rgb([0u8, 0, 0]))
                        .save(request.output())
                        .map_err(|e| RasterizerError::Render(e.to_string()))
                }
                StubBehaviour::Garbage => fs::write(request.output(), b"not a png")
                    .map_err(|e| RasterizerError::Render(e.to_string())),
                StubBehaviour::Fail => Err(RasterizerError::Render("stub failure".to_string())),
            }
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn sample_tile() -> Tile {
        Tile::new(1, 2, 3, 64, Region::new(0.0, 0.0, 10.0, 10.0))
    }

    fn renderer(
        root: &Path,
        format: TileFormat,
        rasterizer: Arc<StubRasterizer>,
    ) -> TileRenderer {
        TileRenderer::new(rasterizer, "art.svg", root, format)
    }

    #[test]
    fn test_png_tile_written_at_final_path() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path(), TileFormat::Png, StubRasterizer::solid(255));

        let outcome = r.render(&sample_tile()).unwrap();

        let expected = dir.path().join("3/1/2.png");
        assert_eq!(outcome, RenderOutcome::Written(expected.clone()));
        assert!(expected.exists(), "png tile should stay at the final path");
    }

    #[test]
    fn test_non_png_reencodes_and_removes_intermediate() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path(), TileFormat::Webp, StubRasterizer::solid(255));

        let outcome = r.render(&sample_tile()).unwrap();

        let final_path = dir.path().join("3/1/2.webp");
        assert_eq!(outcome, RenderOutcome::Written(final_path.clone()));
        assert!(final_path.exists());
        assert!(
            !dir.path().join("3/1/2.png").exists(),
            "intermediate must be cleaned up after re-encoding"
        );
    }

    #[test]
    fn test_reencoded_tile_keeps_pixel_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path(), TileFormat::Webp, StubRasterizer::solid(255));

        r.render(&sample_tile()).unwrap();

        let reloaded = image::open(dir.path().join("3/1/2.webp")).unwrap();
        assert_eq!(reloaded.dimensions(), (64, 64));
    }

    #[test]
    fn test_transparent_tile_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path(), TileFormat::Webp, StubRasterizer::solid(0));

        let outcome = r.render(&sample_tile()).unwrap();

        assert_eq!(outcome, RenderOutcome::Discarded);
        assert!(!dir.path().join("3/1/2.webp").exists());
        assert!(
            !dir.path().join("3/1/2.png").exists(),
            "discarded intermediate must not linger"
        );
    }

    #[test]
    fn test_transparent_tile_kept_when_discard_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path(), TileFormat::Png, StubRasterizer::solid(0))
            .with_discard_transparent(false);

        let outcome = r.render(&sample_tile()).unwrap();

        assert_eq!(
            outcome,
            RenderOutcome::Written(dir.path().join("3/1/2.png"))
        );
        assert!(dir.path().join("3/1/2.png").exists());
    }

    #[test]
    fn test_partially_opaque_tile_never_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path(), TileFormat::Png, StubRasterizer::solid(1));

        let outcome = r.render(&sample_tile()).unwrap();
        assert!(matches!(outcome, RenderOutcome::Written(_)));
    }

    #[test]
    fn test_image_without_alpha_never_discarded() {
        // An all-black RGB intermediate looks empty, but with no alpha
        // channel it still counts as opaque
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(
            dir.path(),
            TileFormat::Png,
            StubRasterizer::with(StubBehaviour::SolidRgb),
        );

        let outcome = r.render(&sample_tile()).unwrap();
        assert!(matches!(outcome, RenderOutcome::Written(_)));
    }

    #[test]
    fn test_jpeg_output_flattens_alpha() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path(), TileFormat::Jpeg, StubRasterizer::solid(255));

        let outcome = r.render(&sample_tile()).unwrap();

        let final_path = dir.path().join("3/1/2.jpg");
        assert_eq!(outcome, RenderOutcome::Written(final_path.clone()));

        let reloaded = image::open(&final_path).unwrap();
        assert_eq!(reloaded.dimensions(), (64, 64));
        assert!(!reloaded.color().has_alpha());
    }

    #[test]
    fn test_sibling_tiles_share_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(dir.path(), TileFormat::Png, StubRasterizer::solid(255));

        let first = Tile::new(1, 0, 3, 64, Region::new(0.0, 0.0, 10.0, 10.0));
        let second = Tile::new(1, 1, 3, 64, Region::new(0.0, 10.0, 10.0, 20.0));

        r.render(&first).unwrap();
        r.render(&second).unwrap();

        assert!(dir.path().join("3/1/0.png").exists());
        assert!(dir.path().join("3/1/1.png").exists());
    }

    #[test]
    fn test_rasterizer_failure_identifies_tile() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(
            dir.path(),
            TileFormat::Png,
            StubRasterizer::with(StubBehaviour::Fail),
        );

        let error = r.render(&sample_tile()).unwrap_err();

        assert!(matches!(error, RenderError::Rasterize { .. }));
        assert_eq!(error.tile(), sample_tile());
        assert!(error.to_string().contains("3/1/2"));
    }

    #[test]
    fn test_unreadable_intermediate_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        let r = renderer(
            dir.path(),
            TileFormat::Webp,
            StubRasterizer::with(StubBehaviour::Garbage),
        );

        let error = r.render(&sample_tile()).unwrap_err();
        assert!(matches!(error, RenderError::Decode { .. }));
    }

    #[test]
    fn test_directory_collision_is_a_create_dir_error() {
        let dir = tempfile::tempdir().unwrap();
        // A file squatting on the level directory's name
        fs::write(dir.path().join("3"), b"in the way").unwrap();

        let r = renderer(dir.path(), TileFormat::Png, StubRasterizer::solid(255));
        let error = r.render(&sample_tile()).unwrap_err();

        assert!(matches!(error, RenderError::CreateDir { .. }));
    }
}
