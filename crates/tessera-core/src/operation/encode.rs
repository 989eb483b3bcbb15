//! Output format selection and metadata carry-over.

use std::fmt;
use std::str::FromStr;

use image::ImageFormat;

use super::OperationList;
use crate::error::PipelineError;
use crate::types::{Color, Dimensions};

/// Formats the encoder dispatch can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
    Tiff,
}

impl OutputFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            "gif" => Some(OutputFormat::Gif),
            "webp" => Some(OutputFormat::Webp),
            "tif" | "tiff" => Some(OutputFormat::Tiff),
            _ => None,
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::Webp => "webp",
            OutputFormat::Tiff => "tif",
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::Gif => "image/gif",
            OutputFormat::Webp => "image/webp",
            OutputFormat::Tiff => "image/tiff",
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::Webp => ImageFormat::WebP,
            OutputFormat::Tiff => ImageFormat::Tiff,
        }
    }

    /// Whether the format can hold more than one frame.
    pub fn supports_animation(self) -> bool {
        matches!(self, OutputFormat::Gif)
    }

    pub fn supports_alpha(self) -> bool {
        !matches!(self, OutputFormat::Jpeg)
    }

    /// Whether source EXIF/XMP can be embedded.
    pub fn supports_metadata(self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::Png)
    }
}

impl FromStr for OutputFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_extension(s)
            .ok_or_else(|| PipelineError::UnsupportedOperation(format!("Unknown output format: {s}")))
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::Webp => "webp",
            OutputFormat::Tiff => "tiff",
        };
        f.write_str(name)
    }
}

/// Terminal operation choosing the encoder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Encode {
    pub format: OutputFormat,
    /// JPEG quality, 1..=100. Ignored by lossless formats.
    pub quality: u8,
    /// Color alpha is flattened onto for formats without alpha.
    pub background: Color,
}

impl Encode {
    pub fn new(format: OutputFormat) -> Self {
        Self {
            format,
            quality: 80,
            background: Color::WHITE,
        }
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality.clamp(1, 100);
        self
    }

    pub fn with_background(mut self, background: Color) -> Self {
        self.background = background;
        self
    }

    pub fn has_effect(&self, _full: Dimensions, _ops: &OperationList) -> bool {
        true
    }
}

/// Request to carry the source's embedded EXIF/XMP into the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetadataCopy;

impl MetadataCopy {
    pub fn has_effect(&self, _full: Dimensions, _ops: &OperationList) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(OutputFormat::from_extension("JPG"), Some(OutputFormat::Jpeg));
        assert_eq!(OutputFormat::from_extension("tiff"), Some(OutputFormat::Tiff));
        assert_eq!(OutputFormat::from_extension("bmp"), None);
        assert!("bmp".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_capabilities() {
        assert!(OutputFormat::Gif.supports_animation());
        assert!(!OutputFormat::Png.supports_animation());
        assert!(!OutputFormat::Jpeg.supports_alpha());
        assert!(OutputFormat::Webp.supports_alpha());
    }

    #[test]
    fn test_quality_clamped() {
        assert_eq!(Encode::new(OutputFormat::Jpeg).with_quality(0).quality, 1);
        assert_eq!(Encode::new(OutputFormat::Jpeg).with_quality(255).quality, 100);
    }
}
