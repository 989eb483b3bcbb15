//! Core data types shared by the operation model and the pipeline stages.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;

/// Pixel dimensions of a raster or source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Dimensions with width and height exchanged.
    pub fn transposed(self) -> Self {
        Self::new(self.height, self.width)
    }

    pub fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// The full extent as a rectangle anchored at the origin.
    pub fn to_rect(self) -> Rect {
        Rect::new(0.0, 0.0, self.width as f64, self.height as f64)
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Axis-aligned rectangle with sub-pixel precision.
///
/// Coordinate math (reduction factors, scale constraints, orientation) is
/// done in `f64` and only rounded once, when a rectangle is turned into
/// pixel bounds with [`Rect::to_pixel_bounds`].
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Overlapping area of two rectangles, or `None` when they do not overlap.
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let rect = Rect::new(x, y, right - x, bottom - y);
        (!rect.is_empty()).then_some(rect)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.intersection(other).is_some()
    }

    pub fn scaled(&self, sx: f64, sy: f64) -> Rect {
        Rect::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }

    /// Round to whole pixels and clip to `bounds`.
    ///
    /// Returns `(x, y, width, height)`, or `None` if nothing of the
    /// rectangle remains inside the bounds.
    pub fn to_pixel_bounds(&self, bounds: Dimensions) -> Option<(u32, u32, u32, u32)> {
        let left = self.x.round().max(0.0);
        let top = self.y.round().max(0.0);
        let right = self.right().round().min(bounds.width as f64);
        let bottom = self.bottom().round().min(bounds.height as f64);
        if right <= left || bottom <= top {
            return None;
        }
        Some((
            left as u32,
            top as u32,
            (right - left) as u32,
            (bottom - top) as u32,
        ))
    }

    /// Map a rectangle in raw source space into the space seen after
    /// rotating the source by `orientation`. `full` is the raw extent.
    pub fn to_oriented(&self, orientation: Orientation, full: (f64, f64)) -> Rect {
        let (w, h) = full;
        match orientation {
            Orientation::Rotate0 => *self,
            Orientation::Rotate90 => {
                Rect::new(h - self.bottom(), self.x, self.height, self.width)
            }
            Orientation::Rotate180 => {
                Rect::new(w - self.right(), h - self.bottom(), self.width, self.height)
            }
            Orientation::Rotate270 => Rect::new(self.y, w - self.right(), self.height, self.width),
        }
    }

    /// Inverse of [`Rect::to_oriented`]: map a rectangle in oriented space
    /// back into raw source space. `full` is the raw extent.
    pub fn to_source(&self, orientation: Orientation, full: (f64, f64)) -> Rect {
        let (w, h) = full;
        match orientation {
            Orientation::Rotate0 => *self,
            Orientation::Rotate90 => Rect::new(self.y, h - self.right(), self.height, self.width),
            Orientation::Rotate180 => {
                Rect::new(w - self.right(), h - self.bottom(), self.width, self.height)
            }
            Orientation::Rotate270 => {
                Rect::new(w - self.bottom(), self.x, self.height, self.width)
            }
        }
    }
}

/// Clockwise rotation needed to display a source upright, as implied by
/// its embedded metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    Rotate0,
    Rotate90,
    Rotate180,
    Rotate270,
}

impl Orientation {
    /// Map an EXIF `Orientation` tag value.
    ///
    /// Only the pure rotations (1, 3, 6, 8) are recognized; mirrored
    /// variants map to `Rotate0`.
    pub fn from_exif(value: u32) -> Self {
        match value {
            3 => Orientation::Rotate180,
            6 => Orientation::Rotate90,
            8 => Orientation::Rotate270,
            _ => Orientation::Rotate0,
        }
    }

    pub fn degrees(self) -> u32 {
        match self {
            Orientation::Rotate0 => 0,
            Orientation::Rotate90 => 90,
            Orientation::Rotate180 => 180,
            Orientation::Rotate270 => 270,
        }
    }

    pub fn is_rotated(self) -> bool {
        self != Orientation::Rotate0
    }

    /// Whether applying this orientation exchanges width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(self, Orientation::Rotate90 | Orientation::Rotate270)
    }

    /// Source dimensions as seen after orientation correction.
    pub fn oriented_size(self, size: Dimensions) -> Dimensions {
        if self.swaps_dimensions() {
            size.transposed()
        } else {
            size
        }
    }
}

/// Information about the source image, supplied by the decode layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Info {
    /// Full pixel dimensions of the source, before any decode-time reduction.
    pub size: Dimensions,
    /// Orientation implied by embedded metadata.
    pub orientation: Orientation,
}

impl Info {
    pub fn new(size: Dimensions) -> Self {
        Self {
            size,
            orientation: Orientation::Rotate0,
        }
    }

    pub fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }
}

/// Shortcuts the decode layer reports having taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReaderHint {
    /// The decoder already applied the crop region; the raster handed to
    /// the pipeline covers exactly that region.
    AlreadyCropped,
}

/// Set of [`ReaderHint`]s accompanying one decoded raster.
pub type ReaderHints = HashSet<ReaderHint>;

/// An opaque RGB color, written `#RRGGBB` (or `#RGB`) in config and flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_rgba(self, alpha: u8) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, alpha])
    }
}

impl FromStr for Color {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || PipelineError::InvalidInput(format!("Invalid color: {s:?}"));
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        let channel = |digits: &str| u8::from_str_radix(digits, 16).map_err(|_| invalid());
        match hex.len() {
            6 => Ok(Color::new(
                channel(&hex[0..2])?,
                channel(&hex[2..4])?,
                channel(&hex[4..6])?,
            )),
            3 => {
                let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
                Ok(Color::new(expand(0)?, expand(1)?, expand(2)?))
            }
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

/// Summary of one post-processing request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingStats {
    /// Number of frames processed
    pub frames: usize,

    /// Worker tasks engaged (0 when processed inline on the calling task)
    pub workers: usize,

    /// Dimensions of the first output frame
    pub output_width: u32,
    pub output_height: u32,

    /// Encoded output format ("jpeg", "png", ...)
    pub format: String,

    /// Bytes written to the output sink
    pub bytes_written: u64,

    /// Wall-clock processing time in milliseconds
    pub elapsed_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orientation_from_exif() {
        assert_eq!(Orientation::from_exif(1), Orientation::Rotate0);
        assert_eq!(Orientation::from_exif(6), Orientation::Rotate90);
        assert_eq!(Orientation::from_exif(3), Orientation::Rotate180);
        assert_eq!(Orientation::from_exif(8), Orientation::Rotate270);
        assert_eq!(Orientation::from_exif(5), Orientation::Rotate0);
    }

    #[test]
    fn test_oriented_size_swaps_for_quarter_turns() {
        let size = Dimensions::new(800, 600);
        assert_eq!(Orientation::Rotate90.oriented_size(size), Dimensions::new(600, 800));
        assert_eq!(Orientation::Rotate180.oriented_size(size), size);
    }

    #[test]
    fn test_rect_orientation_round_trip() {
        let full = (1000.0, 600.0);
        let rect = Rect::new(10.0, 20.0, 300.0, 100.0);
        for orientation in [
            Orientation::Rotate0,
            Orientation::Rotate90,
            Orientation::Rotate180,
            Orientation::Rotate270,
        ] {
            let back = rect.to_oriented(orientation, full).to_source(orientation, full);
            assert_eq!(back, rect, "{orientation:?}");
        }
    }

    #[test]
    fn test_rect_to_oriented_quarter_turn() {
        // Top-left 10x20 block of a 100x50 source lands in the top-right
        // corner after a clockwise quarter turn.
        let rect = Rect::new(0.0, 0.0, 10.0, 20.0);
        let oriented = rect.to_oriented(Orientation::Rotate90, (100.0, 50.0));
        assert_eq!(oriented, Rect::new(30.0, 0.0, 20.0, 10.0));
    }

    #[test]
    fn test_rect_intersection() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 5.0, 10.0, 10.0);
        assert_eq!(a.intersection(&b), Some(Rect::new(5.0, 5.0, 5.0, 5.0)));
        assert!(a.intersection(&Rect::new(20.0, 20.0, 1.0, 1.0)).is_none());
    }

    #[test]
    fn test_pixel_bounds_clip() {
        let bounds = Dimensions::new(100, 100);
        assert_eq!(
            Rect::new(-5.0, 90.0, 20.0, 20.0).to_pixel_bounds(bounds),
            Some((0, 90, 15, 10))
        );
        assert_eq!(Rect::new(150.0, 0.0, 10.0, 10.0).to_pixel_bounds(bounds), None);
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("#FF8000".parse::<Color>().unwrap(), Color::new(255, 128, 0));
        assert_eq!("#fff".parse::<Color>().unwrap(), Color::WHITE);
        assert!("FF8000".parse::<Color>().is_err());
        assert!("#GG0000".parse::<Color>().is_err());
        assert_eq!(Color::new(1, 2, 255).to_string(), "#0102FF");
    }
}
