//! Output tile formats
//!
//! Thin facade over the `image` crate's format catalogue, narrowed to the
//! encoders that make sense for map tiles. PNG is special throughout the
//! pipeline: the rasterizer always produces PNG, so a PNG pyramid skips the
//! re-encode step entirely.

use std::fmt;
use std::str::FromStr;

use image::ImageFormat;
use thiserror::Error;

/// Raster format of the final tile files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TileFormat {
    Png,
    #[default]
    Webp,
    Jpeg,
    Gif,
    Bmp,
    Tiff,
}

/// Error returned when a format name is not recognised.
#[derive(Debug, Error, PartialEq)]
#[error("unknown tile format \"{0}\": supported formats are png, webp, jpg, gif, bmp, tif")]
pub struct ParseFormatError(String);

impl TileFormat {
    /// File extension used for tiles of this format, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            TileFormat::Png => "png",
            TileFormat::Webp => "webp",
            TileFormat::Jpeg => "jpg",
            TileFormat::Gif => "gif",
            TileFormat::Bmp => "bmp",
            TileFormat::Tiff => "tif",
        }
    }

    /// The corresponding `image` crate format.
    pub fn image_format(&self) -> ImageFormat {
        match self {
            TileFormat::Png => ImageFormat::Png,
            TileFormat::Webp => ImageFormat::WebP,
            TileFormat::Jpeg => ImageFormat::Jpeg,
            TileFormat::Gif => ImageFormat::Gif,
            TileFormat::Bmp => ImageFormat::Bmp,
            TileFormat::Tiff => ImageFormat::Tiff,
        }
    }

    /// Whether tiles of this format keep the rasterizer's alpha channel.
    ///
    /// JPEG has no alpha; re-encoding flattens to RGB first.
    pub fn supports_alpha(&self) -> bool {
        !matches!(self, TileFormat::Jpeg)
    }

    #[inline]
    pub fn is_png(&self) -> bool {
        matches!(self, TileFormat::Png)
    }

    /// Every supported format, for help text and validation messages.
    pub fn all() -> &'static [TileFormat] {
        &[
            TileFormat::Png,
            TileFormat::Webp,
            TileFormat::Jpeg,
            TileFormat::Gif,
            TileFormat::Bmp,
            TileFormat::Tiff,
        ]
    }
}

impl FromStr for TileFormat {
    type Err = ParseFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "png" => Ok(TileFormat::Png),
            "webp" => Ok(TileFormat::Webp),
            "jpg" | "jpeg" => Ok(TileFormat::Jpeg),
            "gif" => Ok(TileFormat::Gif),
            "bmp" => Ok(TileFormat::Bmp),
            "tif" | "tiff" => Ok(TileFormat::Tiff),
            _ => Err(ParseFormatError(s.to_string())),
        }
    }
}

impl fmt::Display for TileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_names() {
        assert_eq!("png".parse::<TileFormat>().unwrap(), TileFormat::Png);
        assert_eq!("webp".parse::<TileFormat>().unwrap(), TileFormat::Webp);
        assert_eq!("gif".parse::<TileFormat>().unwrap(), TileFormat::Gif);
        assert_eq!("bmp".parse::<TileFormat>().unwrap(), TileFormat::Bmp);
    }

    #[test]
    fn test_parse_accepts_aliases() {
        assert_eq!("jpeg".parse::<TileFormat>().unwrap(), TileFormat::Jpeg);
        assert_eq!("jpg".parse::<TileFormat>().unwrap(), TileFormat::Jpeg);
        assert_eq!("tif".parse::<TileFormat>().unwrap(), TileFormat::Tiff);
        assert_eq!("tiff".parse::<TileFormat>().unwrap(), TileFormat::Tiff);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("PNG".parse::<TileFormat>().unwrap(), TileFormat::Png);
        assert_eq!("WebP".parse::<TileFormat>().unwrap(), TileFormat::Webp);
    }

    #[test]
    fn test_parse_rejects_unknown_format() {
        let error = "dds".parse::<TileFormat>().unwrap_err();
        assert!(error.to_string().contains("dds"));
        assert!(error.to_string().contains("supported formats"));
    }

    #[test]
    fn test_display_matches_extension() {
        for format in TileFormat::all() {
            assert_eq!(format.to_string(), format.extension());
        }
    }

    #[test]
    fn test_extension_roundtrips_through_parse() {
        for format in TileFormat::all() {
            let reparsed: TileFormat = format.extension().parse().unwrap();
            assert_eq!(&reparsed, format);
        }
    }

    #[test]
    fn test_default_is_webp() {
        assert_eq!(TileFormat::default(), TileFormat::Webp);
    }

    #[test]
    fn test_only_jpeg_drops_alpha() {
        for format in TileFormat::all() {
            assert_eq!(
                format.supports_alpha(),
                !matches!(format, TileFormat::Jpeg),
                "alpha support wrong for {}",
                format
            );
        }
    }

    #[test]
    fn test_png_detection() {
        assert!(TileFormat::Png.is_png());
        assert!(!TileFormat::Webp.is_png());
    }
}
