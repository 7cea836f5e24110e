//! Source geometry resolution
//!
//! Tiling always happens over a square. [`Geometry`] takes the source
//! image's viewport dimensions and derives the square extent that encloses
//! them, together with the origin offsets that keep the artwork centered
//! inside that square.

use thiserror::Error;

use crate::tile::Region;

/// Errors produced while resolving source geometry.
#[derive(Debug, Error, PartialEq)]
pub enum GeometryError {
    /// Width was zero, negative, NaN or infinite.
    #[error("invalid source width {0}: must be positive and finite")]
    InvalidWidth(f64),

    /// Height was zero, negative, NaN or infinite.
    #[error("invalid source height {0}: must be positive and finite")]
    InvalidHeight(f64),
}

/// Square tiling frame derived from the source dimensions.
///
/// The extent is the larger of the two source dimensions; the smaller axis
/// is centered by shifting its origin to `(smaller - larger) / 2`, which is
/// negative or zero. Resolved once per run and read-only afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    width: f64,
    height: f64,
    extent: f64,
    x_origin: f64,
    y_origin: f64,
}

impl Geometry {
    /// Resolves the tiling frame for a source of the given dimensions.
    ///
    /// # Arguments
    ///
    /// * `width` - Source viewport width, in user units
    /// * `height` - Source viewport height, in user units
    ///
    /// # Returns
    ///
    /// The resolved geometry, or an error when either dimension is not a
    /// positive finite number.
    pub fn from_dimensions(width: f64, height: f64) -> Result<Self, GeometryError> {
        if !width.is_finite() || width <= 0.0 {
            return Err(GeometryError::InvalidWidth(width));
        }
        if !height.is_finite() || height <= 0.0 {
            return Err(GeometryError::InvalidHeight(height));
        }

        let extent = width.max(height);
        let mut x_origin = 0.0;
        let mut y_origin = 0.0;

        // Center the smaller axis within the square frame
        if width > height {
            y_origin = (height - width) / 2.0;
        } else if height > width {
            x_origin = (width - height) / 2.0;
        }

        Ok(Self {
            width,
            height,
            extent,
            x_origin,
            y_origin,
        })
    }

    /// Source viewport width, in user units.
    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Source viewport height, in user units.
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Edge length of the square tiling frame.
    #[inline]
    pub fn extent(&self) -> f64 {
        self.extent
    }

    /// Horizontal origin of the frame. Zero or negative.
    #[inline]
    pub fn x_origin(&self) -> f64 {
        self.x_origin
    }

    /// Vertical origin of the frame. Zero or negative.
    #[inline]
    pub fn y_origin(&self) -> f64 {
        self.y_origin
    }

    /// The full square frame as a region, `extent` wide on both axes.
    pub fn bounds(&self) -> Region {
        Region::new(
            self.x_origin,
            self.y_origin,
            self.x_origin + self.extent,
            self.y_origin + self.extent,
        )
    }
}
