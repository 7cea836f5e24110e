//! Tile plan generation
//!
//! Expands resolved [`Geometry`] into the ordered list of every tile the
//! pyramid needs, across all zoom levels. Planning is pure computation and
//! produces identical output for identical input; rendering side effects
//! live elsewhere.

use thiserror::Error;

use crate::geometry::Geometry;
use crate::tile::{Region, Tile};

/// Shallowest permitted zoom depth (a single root tile).
pub const MIN_ZOOM: u8 = 1;

/// Deepest permitted zoom depth. The plan is held in memory, and twelve
/// levels is already several million tiles.
pub const MAX_ZOOM: u8 = 12;

/// Errors produced while generating a tile plan.
#[derive(Debug, Error, PartialEq)]
pub enum PlanError {
    /// Requested zoom depth is outside the supported range.
    #[error("invalid zoom depth {0}: must be between 1 and 12 levels")]
    InvalidZoom(u8),

    /// Tile pixel size was zero.
    #[error("invalid tile size: must be a positive number of pixels")]
    InvalidTileSize,

    /// Source extent cannot be subdivided.
    #[error("degenerate source extent {0}: nothing to subdivide")]
    DegenerateExtent(f64),
}

/// The full, ordered set of tiles for one pyramid run.
///
/// Order is guaranteed: level by level from zero, column-major within a
/// level. Work distribution slices by plan index, so the order is part of
/// the contract.
#[derive(Debug, Clone, PartialEq)]
pub struct TilePlan {
    tiles: Vec<Tile>,
    max_zoom: u8,
    tile_size: u32,
}

impl TilePlan {
    /// Generates the plan for every zoom level in `0..max_zoom`.
    ///
    /// At level `z` the extent square is cut into `2^z × 2^z` cells of side
    /// `extent / 2^z`. Cell positions are derived from the integer grid
    /// indices rather than accumulated stepping, so the emitted count per
    /// axis is exactly `2^z` regardless of floating-point rounding.
    ///
    /// # Arguments
    ///
    /// * `geometry` - Resolved source frame
    /// * `max_zoom` - Number of zoom levels, `1..=MAX_ZOOM`
    /// * `tile_size` - Output edge length in pixels, nonzero
    ///
    /// # Returns
    ///
    /// The plan, or a validation error. Never performs I/O.
    pub fn generate(
        geometry: &Geometry,
        max_zoom: u8,
        tile_size: u32,
    ) -> Result<Self, PlanError> {
        if !(MIN_ZOOM..=MAX_ZOOM).contains(&max_zoom) {
            return Err(PlanError::InvalidZoom(max_zoom));
        }
        if tile_size == 0 {
            return Err(PlanError::InvalidTileSize);
        }

        let extent = geometry.extent();
        if !extent.is_finite() || extent <= 0.0 {
            return Err(PlanError::DegenerateExtent(extent));
        }

        let mut tiles = Vec::with_capacity(Self::expected_count(max_zoom));

        for z in 0..max_zoom {
            let per_axis = 1u32 << z;
            let step = extent / per_axis as f64;

            // Column-major walk: all rows of column x before column x + 1
            for x in 0..per_axis {
                let left = geometry.x_origin() + x as f64 * step;
                for y in 0..per_axis {
                    let top = geometry.y_origin() + y as f64 * step;
                    let region = Region::new(left, top, left + step, top + step);
                    tiles.push(Tile::new(x, y, z, tile_size, region));
                }
            }
        }

        Ok(Self {
            tiles,
            max_zoom,
            tile_size,
        })
    }

    /// Total tile count for a given zoom depth: `sum(4^z)` over all levels.
    #[inline]
    pub fn expected_count(max_zoom: u8) -> usize {
        (((1u64 << (2 * max_zoom as u32)) - 1) / 3) as usize
    }

    /// Tile count of a single zoom level, `4^z`.
    #[inline]
    pub fn level_count(z: u8) -> u64 {
        1u64 << (2 * z as u32)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Zoom depth this plan was generated for.
    #[inline]
    pub fn max_zoom(&self) -> u8 {
        self.max_zoom
    }

    /// Output tile edge length in pixels.
    #[inline]
    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    /// All tiles, in plan order.
    #[inline]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Tile> {
        self.tiles.iter()
    }

    /// Splits the plan across `workers` round-robin slices: slice `i`
    /// receives every tile whose plan index is congruent to `i` modulo the
    /// worker count. This interleaves zoom levels across workers, which
    /// balances load since shallow tiles rasterize slower than deep ones.
    ///
    /// A zero worker count is treated as one.
    pub fn partition(&self, workers: usize) -> Vec<Vec<Tile>> {
        let workers = workers.max(1);
        let per_worker = self.tiles.len().div_ceil(workers);
        let mut slices: Vec<Vec<Tile>> = (0..workers)
            .map(|_| Vec::with_capacity(per_worker))
            .collect();

        for (index, tile) in self.tiles.iter().enumerate() {
            slices[index % workers].push(*tile);
        }

        slices
    }
}

impl<'a> IntoIterator for &'a TilePlan {
    type Item = &'a Tile;
    type IntoIter = std::slice::Iter<'a, Tile>;

    fn into_iter(self) -> Self::IntoIter {
        self.tiles.iter()
    }
}
