//! Embedded-orientation correction and when to apply it.
//!
//! A crop region in the operation list is expressed against the raw source,
//! so correcting orientation first would move the region out from under it.
//! An explicit client rotation is assumed to already include the
//! correction.

use image::DynamicImage;

use crate::operation::OperationList;
use crate::types::{Dimensions, Orientation};

/// When the orientation correction runs relative to the crop stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrientationPlan {
    /// Source is upright already.
    NotNeeded,
    /// Rotate the whole frame before cropping.
    BeforeCrop,
    /// Rotate after crop and redaction, before the transform stage.
    AfterCrop,
    /// An explicit rotation in the list takes the place of the correction.
    Skipped,
}

impl OrientationPlan {
    pub fn decide(orientation: Orientation, ops: &OperationList) -> Self {
        let plan = Self::for_request(orientation, ops);
        match plan {
            OrientationPlan::AfterCrop => tracing::debug!(
                "Deferring {}° orientation correction until after crop",
                orientation.degrees()
            ),
            OrientationPlan::Skipped => tracing::debug!(
                "Skipping {}° orientation correction: explicit rotate present",
                orientation.degrees()
            ),
            _ => {}
        }
        plan
    }

    fn for_request(orientation: Orientation, ops: &OperationList) -> Self {
        if !orientation.is_rotated() {
            OrientationPlan::NotNeeded
        } else if ops.crop().is_none() {
            OrientationPlan::BeforeCrop
        } else if ops.rotate().is_none() {
            OrientationPlan::AfterCrop
        } else {
            OrientationPlan::Skipped
        }
    }

    /// Whether the correction has run by the time the transform stage starts.
    pub fn corrects(self) -> bool {
        matches!(self, OrientationPlan::BeforeCrop | OrientationPlan::AfterCrop)
    }
}

/// Size of the cropped region as the transform stage receives it, in
/// full-source pixels: upright when the correction runs, raw otherwise.
///
/// Scale targets are resolved against this size, so anything that predicts
/// the output (validation, decode-time reduction) has to use it too.
pub fn transform_region(
    orientation: Orientation,
    ops: &OperationList,
    full: Dimensions,
) -> Dimensions {
    let region = ops.region_size(full);
    if OrientationPlan::for_request(orientation, ops).corrects() {
        orientation.oriented_size(region)
    } else {
        region
    }
}

/// Rotate a raster clockwise by the orientation's right angle. Lossless.
pub fn apply_orientation(image: DynamicImage, orientation: Orientation) -> DynamicImage {
    match orientation {
        Orientation::Rotate0 => image,
        Orientation::Rotate90 => image.rotate90(),
        Orientation::Rotate180 => image.rotate180(),
        Orientation::Rotate270 => image.rotate270(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::{Crop, Rotate};
    use image::{GenericImageView, Rgb, RgbImage};

    #[test]
    fn test_upright_needs_nothing() {
        let ops = OperationList::default().with(Crop::square());
        assert_eq!(
            OrientationPlan::decide(Orientation::Rotate0, &ops),
            OrientationPlan::NotNeeded
        );
    }

    #[test]
    fn test_no_crop_rotates_first() {
        let ops = OperationList::default().with(Rotate::new(90.0));
        assert_eq!(
            OrientationPlan::decide(Orientation::Rotate90, &ops),
            OrientationPlan::BeforeCrop
        );
    }

    #[test]
    fn test_crop_defers_rotation() {
        let ops = OperationList::default().with(Crop::pixels(0.0, 0.0, 10.0, 10.0));
        assert_eq!(
            OrientationPlan::decide(Orientation::Rotate180, &ops),
            OrientationPlan::AfterCrop
        );
    }

    #[test]
    fn test_crop_and_rotate_skips_correction() {
        let ops = OperationList::default()
            .with(Crop::pixels(0.0, 0.0, 10.0, 10.0))
            .with(Rotate::new(270.0));
        assert_eq!(
            OrientationPlan::decide(Orientation::Rotate270, &ops),
            OrientationPlan::Skipped
        );
    }

    #[test]
    fn test_transform_region_is_upright_when_corrected() {
        let full = Dimensions::new(1000, 500);
        let whole = OperationList::default();
        assert_eq!(
            transform_region(Orientation::Rotate90, &whole, full),
            Dimensions::new(500, 1000)
        );
        assert_eq!(transform_region(Orientation::Rotate180, &whole, full), full);

        let cropped = OperationList::default().with(Crop::pixels(0.0, 0.0, 200.0, 100.0));
        assert_eq!(
            transform_region(Orientation::Rotate270, &cropped, full),
            Dimensions::new(100, 200)
        );
    }

    #[test]
    fn test_transform_region_stays_raw_when_skipped() {
        let ops = OperationList::default()
            .with(Crop::pixels(0.0, 0.0, 200.0, 100.0))
            .with(Rotate::new(90.0));
        assert_eq!(
            transform_region(Orientation::Rotate90, &ops, Dimensions::new(1000, 500)),
            Dimensions::new(200, 100)
        );
    }

    #[test]
    fn test_apply_orientation_moves_pixels_clockwise() {
        let mut raw = RgbImage::new(4, 2);
        raw.put_pixel(0, 0, Rgb([255, 0, 0]));
        let rotated = apply_orientation(DynamicImage::ImageRgb8(raw), Orientation::Rotate90);
        assert_eq!(rotated.dimensions(), (2, 4));
        // Top-left corner moves to the top-right after a clockwise turn
        assert_eq!(rotated.get_pixel(1, 0).0, [255, 0, 0, 255]);
    }
}
