//! Watermark overlays.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use ab_glyph::FontArc;
use image::RgbaImage;

use super::OperationList;
use crate::error::{PipelineError, PipelineResult};
use crate::types::{Color, Dimensions};

/// Where an overlay is anchored on the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Position {
    TopLeft,
    TopCenter,
    TopRight,
    LeftCenter,
    Center,
    RightCenter,
    BottomLeft,
    BottomCenter,
    #[default]
    BottomRight,
    /// Tiled across the whole frame.
    Repeat,
}

impl Position {
    /// Top-left corner of a `content` box placed inside `frame`, `inset`
    /// pixels away from the anchored edges. Not meaningful for `Repeat`,
    /// which returns the origin.
    pub fn origin(self, frame: Dimensions, content: Dimensions, inset: u32) -> (i64, i64) {
        let (fw, fh) = (frame.width as i64, frame.height as i64);
        let (cw, ch) = (content.width as i64, content.height as i64);
        let inset = inset as i64;

        let left = inset;
        let center_x = (fw - cw) / 2;
        let right = fw - cw - inset;
        let top = inset;
        let center_y = (fh - ch) / 2;
        let bottom = fh - ch - inset;

        match self {
            Position::TopLeft => (left, top),
            Position::TopCenter => (center_x, top),
            Position::TopRight => (right, top),
            Position::LeftCenter => (left, center_y),
            Position::Center => (center_x, center_y),
            Position::RightCenter => (right, center_y),
            Position::BottomLeft => (left, bottom),
            Position::BottomCenter => (center_x, bottom),
            Position::BottomRight => (right, bottom),
            Position::Repeat => (0, 0),
        }
    }
}

impl std::str::FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('-', "_").as_str() {
            "top_left" => Ok(Position::TopLeft),
            "top_center" | "top" => Ok(Position::TopCenter),
            "top_right" => Ok(Position::TopRight),
            "left_center" | "left" => Ok(Position::LeftCenter),
            "center" => Ok(Position::Center),
            "right_center" | "right" => Ok(Position::RightCenter),
            "bottom_left" => Ok(Position::BottomLeft),
            "bottom_center" | "bottom" => Ok(Position::BottomCenter),
            "bottom_right" => Ok(Position::BottomRight),
            "repeat" => Ok(Position::Repeat),
            other => Err(format!("unknown overlay position '{other}'")),
        }
    }
}

/// Rendered text watermark.
#[derive(Clone)]
pub struct TextOverlay {
    pub text: String,
    /// `None` until a font is configured; such overlays fail validation.
    pub font: Option<FontArc>,
    pub size: f32,
    pub color: Color,
    /// Optional opaque box drawn behind the text.
    pub background: Option<Color>,
}

impl fmt::Debug for TextOverlay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextOverlay")
            .field("text", &self.text)
            .field("font", &self.font.as_ref().map(|_| "<font>"))
            .field("size", &self.size)
            .field("color", &self.color)
            .field("background", &self.background)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum OverlayContent {
    Image(Arc<RgbaImage>),
    Text(TextOverlay),
}

/// A watermark composited onto each frame.
#[derive(Debug, Clone)]
pub struct Overlay {
    pub content: OverlayContent,
    pub position: Position,
    pub inset: u32,
}

impl Overlay {
    pub fn image(image: Arc<RgbaImage>, position: Position, inset: u32) -> Self {
        Self {
            content: OverlayContent::Image(image),
            position,
            inset,
        }
    }

    pub fn text(text: TextOverlay, position: Position, inset: u32) -> Self {
        Self {
            content: OverlayContent::Text(text),
            position,
            inset,
        }
    }

    pub fn has_effect(&self, _full: Dimensions, _ops: &OperationList) -> bool {
        match &self.content {
            OverlayContent::Image(image) => image.width() > 0 && image.height() > 0,
            OverlayContent::Text(text) => !text.text.trim().is_empty() && text.size > 0.0,
        }
    }
}

/// Load a TrueType/OpenType font for text overlays.
pub fn load_font(path: &Path) -> PipelineResult<FontArc> {
    let data = std::fs::read(path).map_err(|e| {
        PipelineError::UnsupportedOperation(format!("Cannot read font {}: {}", path.display(), e))
    })?;
    FontArc::try_from_vec(data).map_err(|_| {
        PipelineError::UnsupportedOperation(format!("Not a usable font: {}", path.display()))
    })
}
