//! SVG source probing
//!
//! Reads the root element of an SVG document once and resolves its intrinsic
//! viewport size in user units. Only the outermost `<svg>` element is
//! inspected; the document body never gets parsed beyond what roxmltree
//! needs to build its tree.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors produced while probing an SVG source.
#[derive(Debug, Error)]
pub enum SvgError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The document is not well-formed XML.
    #[error("failed to parse SVG document: {0}")]
    Parse(#[from] roxmltree::Error),

    /// The document parsed, but its root element is something else.
    #[error("root element is <{0}>, expected <svg>")]
    NotSvg(String),

    /// Neither usable width/height attributes nor a viewBox were present.
    #[error("SVG declares no usable width/height and no viewBox")]
    MissingDimensions,

    /// Dimensions resolved to a non-positive or non-finite size.
    #[error("invalid SVG dimensions {width} x {height}: must be positive")]
    InvalidDimensions { width: f64, height: f64 },
}

/// Resolved intrinsic size of an SVG document, in user units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SvgInfo {
    width: f64,
    height: f64,
}

/// A parsed CSS length from a width/height attribute.
enum Length {
    /// Resolved to user units.
    Absolute(f64),
    /// Percentage; only resolvable against the viewBox.
    Percent,
}

impl SvgInfo {
    /// Reads and probes the SVG file at `path`.
    pub fn probe(path: &Path) -> Result<Self, SvgError> {
        let text = fs::read_to_string(path).map_err(|source| SvgError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Probes an SVG document already held in memory.
    ///
    /// Resolution order follows what renderers do: explicit absolute
    /// `width`/`height` attributes win; missing or percentage values fall
    /// back to the `viewBox` dimensions.
    pub fn parse(text: &str) -> Result<Self, SvgError> {
        let document = roxmltree::Document::parse(text)?;
        let root = document.root_element();

        if root.tag_name().name() != "svg" {
            return Err(SvgError::NotSvg(root.tag_name().name().to_string()));
        }

        let view_box = root.attribute("viewBox").and_then(parse_view_box);

        let width = resolve_axis(root.attribute("width"), view_box.map(|(w, _)| w));
        let height = resolve_axis(root.attribute("height"), view_box.map(|(_, h)| h));

        match (width, height) {
            (Some(width), Some(height)) => {
                if !width.is_finite() || !height.is_finite() || width <= 0.0 || height <= 0.0 {
                    return Err(SvgError::InvalidDimensions { width, height });
                }
                Ok(Self { width, height })
            }
            _ => Err(SvgError::MissingDimensions),
        }
    }

    /// Viewport width in user units.
    #[inline]
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Viewport height in user units.
    #[inline]
    pub fn height(&self) -> f64 {
        self.height
    }
}

/// Resolves one axis from its attribute, falling back to the viewBox.
fn resolve_axis(attribute: Option<&str>, view_box_extent: Option<f64>) -> Option<f64> {
    match attribute.map(parse_length) {
        Some(Some(Length::Absolute(value))) => Some(value),
        // Percentages scale the viewBox; a bare viewBox supplies the size outright
        Some(Some(Length::Percent)) | Some(None) | None => view_box_extent,
    }
}

/// Parses a CSS length. Absolute units convert to user units at 96 dpi.
fn parse_length(value: &str) -> Option<Length> {
    const UNITS: [(&str, f64); 6] = [
        ("px", 1.0),
        ("pt", 96.0 / 72.0),
        ("pc", 16.0),
        ("mm", 96.0 / 25.4),
        ("cm", 96.0 / 2.54),
        ("in", 96.0),
    ];

    let value = value.trim();
    if value.is_empty() {
        return None;
    }

    if value.ends_with('%') {
        return Some(Length::Percent);
    }

    let lower = value.to_ascii_lowercase();
    for (suffix, factor) in UNITS {
        if let Some(number) = lower.strip_suffix(suffix) {
            return number
                .trim_end()
                .parse::<f64>()
                .ok()
                .map(|n| Length::Absolute(n * factor));
        }
    }

    value.parse::<f64>().ok().map(Length::Absolute)
}

/// Extracts width/height from a viewBox attribute (`min-x min-y width height`).
fn parse_view_box(value: &str) -> Option<(f64, f64)> {
    let mut numbers = value
        .split(|c: char| c.is_ascii_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(|part| part.parse::<f64>());

    let _min_x = numbers.next()?.ok()?;
    let _min_y = numbers.next()?.ok()?;
    let width = numbers.next()?.ok()?;
    let height = numbers.next()?.ok()?;

    Some((width, height))
}
