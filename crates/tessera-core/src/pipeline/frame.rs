//! Raster frames and frame sequences.

use image::{Delay, DynamicImage};

use crate::types::Dimensions;

/// One raster of a (possibly animated) image.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: DynamicImage,
    /// Display time of this frame; zero for still images.
    pub delay: Delay,
}

impl Frame {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            image,
            delay: Delay::from_numer_denom_ms(0, 1),
        }
    }

    pub fn with_delay(image: DynamicImage, delay: Delay) -> Self {
        Self { image, delay }
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.image.width(), self.image.height())
    }
}

/// Ordered, index-addressable frames of one source.
///
/// Frames never depend on each other's pixels. Processing replaces frame
/// content but never changes the frame count.
#[derive(Debug, Clone, Default)]
pub struct FrameSequence {
    frames: Vec<Frame>,
}

impl FrameSequence {
    pub fn new(frames: Vec<Frame>) -> Self {
        Self { frames }
    }

    pub fn single(image: DynamicImage) -> Self {
        Self::new(vec![Frame::new(image)])
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn first(&self) -> Option<&Frame> {
        self.frames.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Frame> {
        self.frames.iter()
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }
}

impl From<Vec<Frame>> for FrameSequence {
    fn from(frames: Vec<Frame>) -> Self {
        Self::new(frames)
    }
}

impl IntoIterator for FrameSequence {
    type Item = Frame;
    type IntoIter = std::vec::IntoIter<Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.into_iter()
    }
}

/// Reduce a raster to 8 bits per sample, keeping its channel layout.
///
/// 8-bit rasters pass through untouched.
pub fn normalize_to_8bit(image: DynamicImage) -> DynamicImage {
    match image {
        DynamicImage::ImageLuma8(_)
        | DynamicImage::ImageLumaA8(_)
        | DynamicImage::ImageRgb8(_)
        | DynamicImage::ImageRgba8(_) => image,
        DynamicImage::ImageLuma16(_) => DynamicImage::ImageLuma8(image.to_luma8()),
        DynamicImage::ImageLumaA16(_) => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        DynamicImage::ImageRgb16(_) | DynamicImage::ImageRgb32F(_) => {
            DynamicImage::ImageRgb8(image.to_rgb8())
        }
        _ => DynamicImage::ImageRgba8(image.to_rgba8()),
    }
}
