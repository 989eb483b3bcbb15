//! The operation model: typed transform requests and the ordered list that
//! carries them through the pipeline.
//!
//! Operations are immutable once built. Each answers `has_effect` against
//! the full source size and its sibling operations; the pipeline skips any
//! operation whose answer is `false`.

pub mod color;
pub mod constraint;
pub mod crop;
pub mod encode;
pub mod list;
pub mod overlay;
pub mod redaction;
pub mod reduction;
pub mod rotate;
pub mod scale;

pub use color::{ColorTransform, Sharpen};
pub use constraint::ScaleConstraint;
pub use crop::{Crop, CropRegion};
pub use encode::{Encode, MetadataCopy, OutputFormat};
pub use list::OperationList;
pub use overlay::{load_font, Overlay, OverlayContent, Position, TextOverlay};
pub use redaction::Redaction;
pub use reduction::ReductionFactor;
pub use rotate::{Rotate, Transpose};
pub use scale::{Scale, ScaleFilter, ScaleMode};

use crate::types::Dimensions;

/// One requested transform.
#[derive(Debug, Clone)]
pub enum Operation {
    Crop(Crop),
    Scale(Scale),
    Transpose(Transpose),
    Rotate(Rotate),
    ColorTransform(ColorTransform),
    Sharpen(Sharpen),
    Overlay(Overlay),
    Redaction(Redaction),
    MetadataCopy(MetadataCopy),
    Encode(Encode),
}

/// Variant tag of an [`Operation`], for lookups and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    Crop,
    Scale,
    Transpose,
    Rotate,
    ColorTransform,
    Sharpen,
    Overlay,
    Redaction,
    MetadataCopy,
    Encode,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Crop(_) => OperationKind::Crop,
            Operation::Scale(_) => OperationKind::Scale,
            Operation::Transpose(_) => OperationKind::Transpose,
            Operation::Rotate(_) => OperationKind::Rotate,
            Operation::ColorTransform(_) => OperationKind::ColorTransform,
            Operation::Sharpen(_) => OperationKind::Sharpen,
            Operation::Overlay(_) => OperationKind::Overlay,
            Operation::Redaction(_) => OperationKind::Redaction,
            Operation::MetadataCopy(_) => OperationKind::MetadataCopy,
            Operation::Encode(_) => OperationKind::Encode,
        }
    }

    /// Whether applying this operation to a `full`-sized source, alongside
    /// the rest of `ops`, would change any output pixel.
    pub fn has_effect(&self, full: Dimensions, ops: &OperationList) -> bool {
        match self {
            Operation::Crop(op) => op.has_effect(full, ops),
            Operation::Scale(op) => op.has_effect(full, ops),
            Operation::Transpose(op) => op.has_effect(full, ops),
            Operation::Rotate(op) => op.has_effect(full, ops),
            Operation::ColorTransform(op) => op.has_effect(full, ops),
            Operation::Sharpen(op) => op.has_effect(full, ops),
            Operation::Overlay(op) => op.has_effect(full, ops),
            Operation::Redaction(op) => op.has_effect(full, ops),
            Operation::MetadataCopy(op) => op.has_effect(full, ops),
            Operation::Encode(op) => op.has_effect(full, ops),
        }
    }
}

macro_rules! impl_from_operation {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Operation {
                fn from(op: $variant) -> Self {
                    Operation::$variant(op)
                }
            }
        )*
    };
}

impl_from_operation!(
    Crop,
    Scale,
    Transpose,
    Rotate,
    ColorTransform,
    Sharpen,
    Overlay,
    Redaction,
    MetadataCopy,
    Encode,
);
