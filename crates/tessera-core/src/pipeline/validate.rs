//! Operation list validation before any frame is touched.

use crate::config::LimitsConfig;
use crate::error::PipelineError;
use crate::operation::{
    scale::fit_pixel_budget, Operation, OperationList, OverlayContent, ReductionFactor, ScaleMode,
};
use crate::types::Info;

use super::orientation::transform_region;

/// Validates a request against the source and the configured limits.
pub struct Validator {
    limits: LimitsConfig,
}

impl Validator {
    /// Create a new validator with the given limits.
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    /// Reject requests that cannot produce a valid output.
    ///
    /// Checks:
    /// - An Encode operation is present
    /// - Multi-frame sources go to a format that can hold them
    /// - The crop overlaps the source
    /// - The scale yields a non-empty size within the scale and pixel limits
    /// - Text overlays have a font
    pub fn validate(
        &self,
        ops: &OperationList,
        info: &Info,
        frames: usize,
    ) -> Result<(), PipelineError> {
        let encode = ops.encode().ok_or_else(|| {
            PipelineError::InvalidInput("Operation list has no Encode operation".to_string())
        })?;

        if frames > 1 && !encode.format.supports_animation() {
            return Err(PipelineError::UnsupportedOperation(format!(
                "{} cannot hold {} frames",
                encode.format, frames
            )));
        }

        if let Some(crop) = ops.crop() {
            crop.validate(info.size, ops.scale_constraint())?;
        }

        self.check_scale(ops, info)?;

        for op in ops {
            if let Operation::Overlay(overlay) = op {
                if let OverlayContent::Text(text) = &overlay.content {
                    if text.font.is_none() {
                        return Err(PipelineError::UnsupportedOperation(
                            "Text overlay requires a configured font".to_string(),
                        ));
                    }
                }
            }
        }
        Ok(())
    }

    fn check_scale(&self, ops: &OperationList, info: &Info) -> Result<(), PipelineError> {
        let sc = ops.scale_constraint();
        let region = transform_region(info.orientation, ops, info.size);
        let Some(scale) = ops.scale() else {
            return Ok(());
        };

        let mut target = scale.resulting_size(region, ReductionFactor::default(), sc);
        let is_max = scale.mode() == ScaleMode::Max;
        if is_max {
            target = fit_pixel_budget(target, self.limits.max_output_pixels);
        }
        if target.width == 0 || target.height == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "Scale {:?} of a {region} region yields {target}",
                scale.mode()
            )));
        }

        let ratio = (target.width as f64 / region.width.max(1) as f64)
            .max(target.height as f64 / region.height.max(1) as f64);
        if ratio > self.limits.max_scale + 1e-9 {
            return Err(PipelineError::InvalidInput(format!(
                "Requested scale {:.3} exceeds the maximum of {}",
                ratio, self.limits.max_scale
            )));
        }

        let max_pixels = self.limits.max_output_pixels;
        if !is_max && max_pixels > 0 && target.pixel_count() > max_pixels {
            return Err(PipelineError::InvalidInput(format!(
                "Output of {target} exceeds the {max_pixels} pixel limit"
            )));
        }
        Ok(())
    }
}
