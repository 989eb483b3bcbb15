//! Transform stage: scale, transpose, rotate, color, sharpen and overlay,
//! applied in list order.

use image::imageops;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};

use crate::config::Config;
use crate::error::{PipelineError, PipelineResult};
use crate::operation::{
    scale::fit_pixel_budget, ColorTransform, Operation, OperationList, Overlay, OverlayContent,
    Position, ReductionFactor, Rotate, Scale, ScaleConstraint, ScaleFilter, ScaleMode, Sharpen,
    TextOverlay, Transpose,
};
use crate::types::Dimensions;

/// Configuration the transform stage needs for every frame.
#[derive(Debug, Clone)]
pub struct TransformSettings {
    pub downscale_filter: ScaleFilter,
    pub upscale_filter: ScaleFilter,
    /// Pixel budget for `ScaleMode::Max` (0 = unlimited).
    pub max_output_pixels: u64,
}

impl TransformSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            downscale_filter: config.processing.downscale_filter,
            upscale_filter: config.processing.upscale_filter,
            max_output_pixels: config.limits.max_output_pixels,
        }
    }
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Run every effective transform operation against `image`, in order.
///
/// Crop, redaction, metadata copy and encode operations are handled by
/// other stages and skipped here.
pub fn apply_transforms(
    mut image: DynamicImage,
    ops: &OperationList,
    full: Dimensions,
    rf: ReductionFactor,
    settings: &TransformSettings,
) -> PipelineResult<DynamicImage> {
    // Once a scale has run the raster is in output space: neither the
    // decode-time reduction nor the constraint applies to later scales.
    let mut rf = rf;
    let mut sc = ops.scale_constraint();

    for op in ops {
        // A scale is judged against the live raster, which orientation or an
        // earlier rotate may have turned; apply_scale skips no-op resizes.
        if !matches!(op, Operation::Scale(_)) && !op.has_effect(full, ops) {
            continue;
        }
        image = match op {
            Operation::Scale(scale) => {
                let scaled = apply_scale(image, scale, rf, sc, settings)?;
                rf = ReductionFactor::default();
                sc = ScaleConstraint::default();
                scaled
            }
            Operation::Transpose(transpose) => apply_transpose(image, *transpose),
            Operation::Rotate(rotate) => apply_rotate(image, rotate),
            Operation::ColorTransform(transform) => apply_color_transform(image, *transform),
            Operation::Sharpen(sharpen) => apply_sharpen(image, sharpen),
            Operation::Overlay(overlay) => {
                apply_overlay(&mut image, overlay)?;
                image
            }
            Operation::Crop(_)
            | Operation::Redaction(_)
            | Operation::MetadataCopy(_)
            | Operation::Encode(_) => image,
        };
    }
    Ok(image)
}

/// Resize to the scale's target. Skips resampling when the raster already
/// has the target size (e.g. decode-time reduction did all the work).
pub fn apply_scale(
    image: DynamicImage,
    scale: &Scale,
    rf: ReductionFactor,
    sc: ScaleConstraint,
    settings: &TransformSettings,
) -> PipelineResult<DynamicImage> {
    let current = Dimensions::new(image.width(), image.height());
    let mut target = scale.resulting_size(current, rf, sc);
    if scale.mode() == ScaleMode::Max {
        target = fit_pixel_budget(target, settings.max_output_pixels);
    }
    if target.width == 0 || target.height == 0 {
        return Err(PipelineError::transform(
            "scale",
            format!("{:?} of a {current} raster yields {target}", scale.mode()),
        ));
    }
    if target == current {
        tracing::trace!("Scale target equals raster size {current}, not resampling");
        return Ok(image);
    }

    let filter = scale.filter().unwrap_or(if target.pixel_count() < current.pixel_count() {
        settings.downscale_filter
    } else {
        settings.upscale_filter
    });
    tracing::trace!("Scaling {current} -> {target} ({filter:?})");
    Ok(image.resize_exact(target.width, target.height, filter.to_filter_type()))
}

pub fn apply_transpose(image: DynamicImage, transpose: Transpose) -> DynamicImage {
    match transpose {
        Transpose::Horizontal => image.fliph(),
        Transpose::Vertical => image.flipv(),
    }
}

/// Rotate clockwise. Right angles are lossless; other angles expand the
/// canvas to the rotated bounding box and leave the corners transparent.
pub fn apply_rotate(image: DynamicImage, rotate: &Rotate) -> DynamicImage {
    match rotate.quarter_turns() {
        Some(0) => image,
        Some(1) => image.rotate90(),
        Some(2) => image.rotate180(),
        Some(3) => image.rotate270(),
        _ => {
            let size = Dimensions::new(image.width(), image.height());
            let bounds = rotate.rotated_bounds(size);
            let mut canvas = RgbaImage::from_pixel(bounds.width, bounds.height, Rgba([0, 0, 0, 0]));
            let x = (bounds.width as i64 - size.width as i64) / 2;
            let y = (bounds.height as i64 - size.height as i64) / 2;
            imageops::overlay(&mut canvas, &image.to_rgba8(), x, y);
            let theta = rotate.normalized_degrees().to_radians() as f32;
            DynamicImage::ImageRgba8(rotate_about_center(
                &canvas,
                theta,
                Interpolation::Bilinear,
                Rgba([0, 0, 0, 0]),
            ))
        }
    }
}

/// Reduce to gray or bitonal, preserving alpha.
pub fn apply_color_transform(image: DynamicImage, transform: ColorTransform) -> DynamicImage {
    let gray = image.grayscale();
    match transform {
        ColorTransform::Gray => gray,
        ColorTransform::Bitonal => {
            let threshold = |v: u8| {
                if v >= ColorTransform::BITONAL_THRESHOLD {
                    255
                } else {
                    0
                }
            };
            match gray {
                DynamicImage::ImageLumaA8(mut buf) => {
                    for pixel in buf.pixels_mut() {
                        pixel.0[0] = threshold(pixel.0[0]);
                    }
                    DynamicImage::ImageLumaA8(buf)
                }
                other => {
                    let mut buf = other.to_luma8();
                    for pixel in buf.pixels_mut() {
                        pixel.0[0] = threshold(pixel.0[0]);
                    }
                    DynamicImage::ImageLuma8(buf)
                }
            }
        }
    }
}

pub fn apply_sharpen(image: DynamicImage, sharpen: &Sharpen) -> DynamicImage {
    image.unsharpen(sharpen.amount() as f32, Sharpen::THRESHOLD)
}

/// Composite a watermark into `image` in place.
pub fn apply_overlay(image: &mut DynamicImage, overlay: &Overlay) -> PipelineResult<()> {
    match &overlay.content {
        OverlayContent::Image(mark) => {
            let mark: &RgbaImage = mark;
            place(image, overlay, Dimensions::new(mark.width(), mark.height()), |image, x, y| {
                imageops::overlay(image, mark, x, y);
            });
            Ok(())
        }
        OverlayContent::Text(text) => draw_text_overlay(image, overlay, text),
    }
}

fn draw_text_overlay(
    image: &mut DynamicImage,
    overlay: &Overlay,
    text: &TextOverlay,
) -> PipelineResult<()> {
    let font = text.font.as_ref().ok_or_else(|| {
        PipelineError::UnsupportedOperation("Text overlay requires a font".to_string())
    })?;
    let (width, height) = text_size(text.size, font, &text.text);
    let color = text.color.to_rgba(255);
    let background = text.background.map(|c| c.to_rgba(255));

    place(image, overlay, Dimensions::new(width, height), |image, x, y| {
        let (x, y) = (x as i32, y as i32);
        if let Some(bg) = background {
            if width > 0 && height > 0 {
                let rect = imageproc::rect::Rect::at(x, y).of_size(width, height);
                draw_filled_rect_mut(image, rect, bg);
            }
        }
        draw_text_mut(image, color, x, y, text.size, font, &text.text);
    });
    Ok(())
}

/// Call `draw` at every origin the overlay's position implies.
fn place<F>(image: &mut DynamicImage, overlay: &Overlay, content: Dimensions, mut draw: F)
where
    F: FnMut(&mut DynamicImage, i64, i64),
{
    let frame = Dimensions::new(image.width(), image.height());
    if overlay.position != Position::Repeat {
        let (x, y) = overlay.position.origin(frame, content, overlay.inset);
        draw(image, x, y);
        return;
    }

    let step_x = (content.width + overlay.inset).max(1) as i64;
    let step_y = (content.height + overlay.inset).max(1) as i64;
    let mut y = 0i64;
    while y < frame.height as i64 {
        let mut x = 0i64;
        while x < frame.width as i64 {
            draw(image, x, y);
            x += step_x;
        }
        y += step_y;
    }
}
