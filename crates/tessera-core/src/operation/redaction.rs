//! Opaque masking of source regions.

use super::OperationList;
use crate::types::{Dimensions, Rect};

/// A rectangle of the source, in full-resolution source pixels, that is
/// painted solid black in the output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Redaction {
    region: Rect,
}

impl Redaction {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            region: Rect::new(x, y, width, height),
        }
    }

    pub fn region(&self) -> Rect {
        self.region
    }

    /// Whether any visible pixel would be masked: the region must overlap
    /// the source and, when a crop is requested, the cropped area.
    pub fn has_effect(&self, full: Dimensions, ops: &OperationList) -> bool {
        if self.region.is_empty() || !self.region.intersects(&full.to_rect()) {
            return false;
        }
        match ops.crop() {
            Some(crop) => self
                .region
                .intersects(&crop.source_rect(full, ops.scale_constraint())),
            None => true,
        }
    }
}
