//! Crop and redaction stage.

use image::{DynamicImage, Rgba};
use imageproc::drawing::draw_filled_rect_mut;

use crate::error::{PipelineError, PipelineResult};
use crate::operation::{OperationList, Redaction, ReductionFactor};
use crate::types::{Dimensions, Orientation, ReaderHint, ReaderHints, Rect};

/// The crop region a frame was cut from, in the coordinates of the raster
/// as it entered the crop stage. Redactions are positioned relative to it.
pub type CropReference = Rect;

/// Apply the list's first crop to `image`.
///
/// `full` is the raw source size the crop is expressed against. Returns the
/// (possibly unchanged) raster and the region it now covers. When the
/// decoder already cropped, the raster is left alone but the region is
/// still reported so redactions land correctly.
pub fn apply_crop(
    image: DynamicImage,
    ops: &OperationList,
    full: Dimensions,
    rf: ReductionFactor,
    hints: &ReaderHints,
) -> PipelineResult<(DynamicImage, CropReference)> {
    let identity = Dimensions::new(image.width(), image.height()).to_rect();
    let Some(crop) = ops.crop() else {
        return Ok((image, identity));
    };
    if !crop.has_effect(full, ops) {
        tracing::trace!("Crop {:?} covers the whole source, skipping", crop.region());
        return Ok((image, identity));
    }

    let region = crop.rectangle(full, rf, ops.scale_constraint());
    if hints.contains(&ReaderHint::AlreadyCropped) {
        tracing::debug!("Crop already applied by decoder, skipping");
        return Ok((image, region));
    }

    let bounds = Dimensions::new(image.width(), image.height());
    let (x, y, width, height) = region.to_pixel_bounds(bounds).ok_or_else(|| {
        PipelineError::transform(
            "crop",
            format!("region {region:?} does not intersect the {bounds} raster"),
        )
    })?;
    Ok((image.crop_imm(x, y, width, height), region))
}

/// Paint every redaction that overlaps the cropped raster solid black.
///
/// Redaction regions are in full-source pixels of the raw source. When the
/// orientation correction ran before the crop stage, `pre_rotation` names it
/// so the regions can follow the pixels.
pub fn apply_redactions<'a>(
    image: &mut DynamicImage,
    redactions: impl IntoIterator<Item = &'a Redaction>,
    crop: CropReference,
    full: Dimensions,
    rf: ReductionFactor,
    pre_rotation: Orientation,
) {
    let bounds = Dimensions::new(image.width(), image.height());
    let scale = rf.scale();
    let black = Rgba([0, 0, 0, 255]);

    for redaction in redactions {
        let region = redaction
            .region()
            .to_oriented(pre_rotation, (full.width as f64, full.height as f64))
            .scaled(scale, scale);
        let Some(visible) = region.intersection(&crop) else {
            continue;
        };
        let local = visible.translated(-crop.x, -crop.y);
        let Some((x, y, width, height)) = local.to_pixel_bounds(bounds) else {
            continue;
        };
        tracing::trace!("Redacting {}x{} at ({}, {})", width, height, x, y);
        let rect = imageproc::rect::Rect::at(x as i32, y as i32).of_size(width, height);
        draw_filled_rect_mut(image, rect, black);
    }
}
