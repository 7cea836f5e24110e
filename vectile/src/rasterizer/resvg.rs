//! In-process rasterizer backend
//!
//! Renders tiles with resvg instead of shelling out, trading Inkscape's
//! fuller SVG coverage for zero subprocess overhead. The source document is
//! parsed once at construction and shared read-only across workers.

use std::fs;
use std::path::{Path, PathBuf};

use resvg::{tiny_skia, usvg};
use tracing::trace;

use super::{RasterizeRequest, Rasterizer, RasterizerError};

/// [`Rasterizer`] rendering through resvg.
///
/// The source file is fixed at construction; the per-request source path is
/// ignored. Requests map their region onto the parsed tree's user-unit
/// coordinate space, so regions outside the canvas come out transparent,
/// matching the command line backend's export behaviour.
pub struct ResvgRasterizer {
    source: PathBuf,
    tree: usvg::Tree,
}

impl ResvgRasterizer {
    /// Reads and parses the vector source.
    pub fn from_file(source: &Path) -> Result<Self, RasterizerError> {
        let data = fs::read(source).map_err(|error| RasterizerError::Source {
            path: source.to_path_buf(),
            message: error.to_string(),
        })?;

        let mut options = usvg::Options::default();
        options.fontdb_mut().load_system_fonts();

        let tree = usvg::Tree::from_data(&data, &options).map_err(|error| {
            RasterizerError::Source {
                path: source.to_path_buf(),
                message: error.to_string(),
            }
        })?;

        Ok(Self {
            source: source.to_path_buf(),
            tree,
        })
    }

    /// Path of the parsed source document.
    pub fn source(&self) -> &Path {
        &self.source
    }
}

impl Rasterizer for ResvgRasterizer {
    fn rasterize(&self, request: &RasterizeRequest<'_>) -> Result<(), RasterizerError> {
        let region = request.region();

        let mut pixmap =
            tiny_skia::Pixmap::new(request.width(), request.height()).ok_or_else(|| {
                RasterizerError::Render(format!(
                    "cannot allocate {}x{} pixmap",
                    request.width(),
                    request.height()
                ))
            })?;

        // Map the region onto the pixel square: shift its corner to the
        // origin, then scale user units to pixels
        let scale_x = request.width() as f32 / region.width() as f32;
        let scale_y = request.height() as f32 / region.height() as f32;
        let transform = tiny_skia::Transform::from_scale(scale_x, scale_y)
            .pre_translate(-region.left() as f32, -region.top() as f32);

        trace!(
            "rendering area {} at {}x{} px",
            region.export_area(),
            request.width(),
            request.height()
        );

        resvg::render(&self.tree, transform, &mut pixmap.as_mut());

        pixmap.save_png(request.output()).map_err(|error| {
            RasterizerError::Render(format!(
                "failed to write {}: {error}",
                request.output().display()
            ))
        })
    }

    fn name(&self) -> &str {
        "resvg"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::Region;

    const RED_SQUARE: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="100">
  <rect x="0" y="0" width="100" height="100" fill="#ff0000"/>
</svg>"##;

    fn write_source(dir: &Path) -> PathBuf {
        let path = dir.join("art.svg");
        fs::write(&path, RED_SQUARE).unwrap();
        path
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_rasterizer_is_shareable_across_workers() {
        assert_send_sync::<ResvgRasterizer>();
    }

    #[test]
    fn test_renders_canvas_region_opaque() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path());
        let output = dir.path().join("tile.png");

        let rasterizer = ResvgRasterizer::from_file(&source).unwrap();
        let request =
            RasterizeRequest::new(&source, Region::new(0.0, 0.0, 100.0, 100.0), 64, 64, &output);
        rasterizer.rasterize(&request).unwrap();

        let rendered = image::open(&output).unwrap().into_rgba8();
        assert_eq!(rendered.dimensions(), (64, 64));

        let center = rendered.get_pixel(32, 32);
        assert_eq!(center.0, [255, 0, 0, 255], "canvas should render solid red");
    }

    #[test]
    fn test_region_outside_canvas_is_transparent() {
        let dir = tempfile::tempdir().unwrap();
        let source = write_source(dir.path());
        let output = dir.path().join("tile.png");

        let rasterizer = ResvgRasterizer::from_file(&source).unwrap();
        let request = RasterizeRequest::new(
            &source,
            Region::new(200.0, 200.0, 300.0, 300.0),
            64,
            64,
            &output,
        );
        rasterizer.rasterize(&request).unwrap();

        let rendered = image::open(&output).unwrap().into_rgba8();
        assert!(
            rendered.pixels().all(|pixel| pixel.0[3] == 0),
            "area beyond the canvas should be fully transparent"
        );
    }

    #[test]
    fn test_unreadable_source_is_a_source_error() {
        let result = ResvgRasterizer::from_file(Path::new("/nonexistent/art.svg"));
        assert!(matches!(result, Err(RasterizerError::Source { .. })));
    }
}
