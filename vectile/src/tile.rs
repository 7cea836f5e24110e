//! Tile value types
//!
//! A [`Tile`] identifies one square cell of the output pyramid: its grid
//! position and zoom level, the pixel size it renders at, and the [`Region`]
//! of the source canvas it covers. Tiles are plain values; once built by the
//! planner they are never mutated.

use std::fmt;
use std::path::PathBuf;

/// Axis-aligned rectangle on the source canvas, in source viewport units.
///
/// `right >= left` and `bottom >= top`; the y axis grows downward, matching
/// SVG viewport coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Region {
    left: f64,
    top: f64,
    right: f64,
    bottom: f64,
}

impl Region {
    /// Creates a region from its two corners.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    #[inline]
    pub fn left(&self) -> f64 {
        self.left
    }

    #[inline]
    pub fn top(&self) -> f64 {
        self.top
    }

    #[inline]
    pub fn right(&self) -> f64 {
        self.right
    }

    #[inline]
    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Formats the region as the rasterizer's export-area argument,
    /// `left:top:right:bottom`.
    pub fn export_area(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}:{}", self.left, self.top, self.right, self.bottom)
    }
}

/// One cell of the tile pyramid.
///
/// `x` and `y` index the `2^z × 2^z` grid of zoom level `z` from zero;
/// `x` selects the column (left to right), `y` the row (top to bottom).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tile {
    x: u32,
    y: u32,
    z: u8,
    size: u32,
    region: Region,
}

impl Tile {
    /// Creates a tile.
    ///
    /// # Arguments
    ///
    /// * `x` - Column within the zoom level, `0..2^z`
    /// * `y` - Row within the zoom level, `0..2^z`
    /// * `z` - Zoom level
    /// * `size` - Output edge length in pixels
    /// * `region` - Portion of the source canvas this tile covers
    pub fn new(x: u32, y: u32, z: u8, size: u32, region: Region) -> Self {
        Self {
            x,
            y,
            z,
            size,
            region,
        }
    }

    #[inline]
    pub fn x(&self) -> u32 {
        self.x
    }

    #[inline]
    pub fn y(&self) -> u32 {
        self.y
    }

    #[inline]
    pub fn zoom(&self) -> u8 {
        self.z
    }

    /// Output edge length in pixels. Tiles are always square.
    #[inline]
    pub fn size(&self) -> u32 {
        self.size
    }

    #[inline]
    pub fn region(&self) -> Region {
        self.region
    }

    /// Path of this tile below the pyramid root: `{z}/{x}/{y}.{extension}`.
    ///
    /// The extension is passed in rather than stored because the same tile
    /// is written first as an intermediate PNG and then again in the
    /// requested output format.
    pub fn relative_path(&self, extension: &str) -> PathBuf {
        PathBuf::from(self.z.to_string())
            .join(self.x.to_string())
            .join(format!("{}.{}", self.y, extension))
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_dimensions() {
        let region = Region::new(10.0, 20.0, 110.0, 70.0);
        assert_eq!(region.width(), 100.0);
        assert_eq!(region.height(), 50.0);
    }

    #[test]
    fn test_region_export_area_format() {
        let region = Region::new(0.0, 0.0, 256.0, 256.0);
        assert_eq!(region.export_area(), "0:0:256:256");
    }

    #[test]
    fn test_region_export_area_fractional() {
        let region = Region::new(0.0, 12.5, 62.5, 75.0);
        assert_eq!(region.export_area(), "0:12.5:62.5:75");
    }

    #[test]
    fn test_region_export_area_negative_origin() {
        // Centering a wide source pushes the vertical origin negative
        let region = Region::new(0.0, -25.0, 100.0, 75.0);
        assert_eq!(region.export_area(), "0:-25:100:75");
    }

    #[test]
    fn test_tile_accessors() {
        let region = Region::new(0.0, 0.0, 50.0, 50.0);
        let tile = Tile::new(2, 3, 2, 256, region);

        assert_eq!(tile.x(), 2);
        assert_eq!(tile.y(), 3);
        assert_eq!(tile.zoom(), 2);
        assert_eq!(tile.size(), 256);
        assert_eq!(tile.region(), region);
    }

    #[test]
    fn test_tile_relative_path() {
        let tile = Tile::new(5, 11, 4, 256, Region::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(tile.relative_path("png"), PathBuf::from("4/5/11.png"));
        assert_eq!(tile.relative_path("webp"), PathBuf::from("4/5/11.webp"));
    }

    #[test]
    fn test_tile_display_is_zxy() {
        let tile = Tile::new(1, 2, 3, 256, Region::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(tile.to_string(), "3/1/2");
    }

    #[test]
    fn test_tile_is_copy() {
        let tile = Tile::new(0, 0, 0, 256, Region::new(0.0, 0.0, 1.0, 1.0));
        let copy = tile;
        // Both bindings stay usable
        assert_eq!(tile, copy);
    }

    // Property-based tests using proptest
    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_export_area_roundtrips(
                left in -10_000.0..10_000.0_f64,
                top in -10_000.0..10_000.0_f64,
                extent in 0.001..10_000.0_f64
            ) {
                let region = Region::new(left, top, left + extent, top + extent);
                let area = region.export_area();

                // Four colon-separated fields, each parsing back to the input
                let fields: Vec<f64> = area
                    .split(':')
                    .map(|part| part.parse().expect("field should parse as f64"))
                    .collect();

                prop_assert_eq!(fields.len(), 4);
                prop_assert_eq!(fields[0], region.left());
                prop_assert_eq!(fields[1], region.top());
                prop_assert_eq!(fields[2], region.right());
                prop_assert_eq!(fields[3], region.bottom());
            }

            #[test]
            fn test_relative_path_components(
                x in 0u32..100_000,
                y in 0u32..100_000,
                z in 0u8..=16
            ) {
                let tile = Tile::new(x, y, z, 256, Region::new(0.0, 0.0, 1.0, 1.0));
                let path = tile.relative_path("webp");

                let parts: Vec<String> = path
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();

                prop_assert_eq!(parts.len(), 3);
                prop_assert_eq!(&parts[0], &z.to_string());
                prop_assert_eq!(&parts[1], &x.to_string());
                prop_assert_eq!(&parts[2], &format!("{}.webp", y));
            }
        }
    }
}
