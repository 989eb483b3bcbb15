//! Region selection.
//!
//! A crop is resolved in three coordinate spaces:
//!
//! | Space | Used by |
//! |---|---|
//! | virtual (scale-constrained) | pixel regions as the client wrote them |
//! | full source | [`Crop::source_rect`], redaction overlap, `has_effect` |
//! | reduced raster | [`Crop::rectangle`], the actual pixel crop |
//!
//! Moving from virtual to full divides by the scale constraint; moving from
//! full to reduced multiplies by the reduction factor scale.

use super::{OperationList, ReductionFactor, ScaleConstraint};
use crate::error::PipelineError;
use crate::types::{Dimensions, Orientation, Rect};

/// The shape of a requested crop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CropRegion {
    /// The whole source.
    Full,
    /// The largest centered square.
    Square,
    /// Pixel region in the scale-constrained source.
    Pixels(Rect),
    /// Fractions (0..=1) of the source dimensions.
    Percent(Rect),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crop {
    region: CropRegion,
}

impl Crop {
    pub fn new(region: CropRegion) -> Self {
        Self { region }
    }

    pub fn full() -> Self {
        Self::new(CropRegion::Full)
    }

    pub fn square() -> Self {
        Self::new(CropRegion::Square)
    }

    pub fn pixels(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(CropRegion::Pixels(Rect::new(x, y, width, height)))
    }

    pub fn percent(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(CropRegion::Percent(Rect::new(x, y, width, height)))
    }

    pub fn region(&self) -> CropRegion {
        self.region
    }

    /// The requested region in full-source coordinates, before clipping.
    fn unclipped_source_rect(&self, full: Dimensions, sc: ScaleConstraint) -> Rect {
        match self.region {
            CropRegion::Full => full.to_rect(),
            CropRegion::Square => {
                let side = full.width.min(full.height) as f64;
                Rect::new(
                    (full.width as f64 - side) / 2.0,
                    (full.height as f64 - side) / 2.0,
                    side,
                    side,
                )
            }
            CropRegion::Pixels(rect) => {
                let inverse = 1.0 / sc.ratio();
                rect.scaled(inverse, inverse)
            }
            CropRegion::Percent(rect) => rect.scaled(full.width as f64, full.height as f64),
        }
    }

    /// The region in full-source coordinates, clipped to the source.
    ///
    /// A region lying entirely outside the source resolves to an empty
    /// rectangle; [`Crop::validate`] rejects such crops up front.
    pub fn source_rect(&self, full: Dimensions, sc: ScaleConstraint) -> Rect {
        self.unclipped_source_rect(full, sc)
            .intersection(&full.to_rect())
            .unwrap_or_default()
    }

    /// The region in the coordinates of a raster that was reduced by `rf`
    /// at decode time.
    pub fn rectangle(&self, full: Dimensions, rf: ReductionFactor, sc: ScaleConstraint) -> Rect {
        let scale = rf.scale();
        self.source_rect(full, sc).scaled(scale, scale)
    }

    /// Whether cropping would remove any pixel of the source.
    pub fn has_effect(&self, full: Dimensions, ops: &OperationList) -> bool {
        match self.region {
            CropRegion::Full => false,
            _ => {
                let rect = self.source_rect(full, ops.scale_constraint());
                rect != full.to_rect()
            }
        }
    }

    /// Reject regions that do not overlap the source at all.
    pub fn validate(&self, full: Dimensions, sc: ScaleConstraint) -> Result<(), PipelineError> {
        let requested = self.unclipped_source_rect(full, sc);
        if requested.is_empty() {
            return Err(PipelineError::InvalidInput(format!(
                "Crop region {:?} has zero area",
                self.region
            )));
        }
        if !requested.intersects(&full.to_rect()) {
            return Err(PipelineError::InvalidInput(format!(
                "Crop region {:?} lies outside the {full} source",
                self.region
            )));
        }
        Ok(())
    }

    /// Re-express a crop written against the oriented (upright) source in
    /// the raw source's coordinates.
    ///
    /// `full` is the raw source size. Full and square crops are symmetric
    /// under rotation and come back unchanged.
    pub fn oriented_to_source(
        &self,
        orientation: Orientation,
        full: Dimensions,
        sc: ScaleConstraint,
    ) -> Crop {
        let region = match self.region {
            CropRegion::Full | CropRegion::Square => self.region,
            CropRegion::Pixels(rect) => {
                let virtual_size = sc.constrained_size(full);
                CropRegion::Pixels(rect.to_source(
                    orientation,
                    (virtual_size.width as f64, virtual_size.height as f64),
                ))
            }
            CropRegion::Percent(rect) => CropRegion::Percent(rect.to_source(orientation, (1.0, 1.0))),
        };
        Crop::new(region)
    }
}
