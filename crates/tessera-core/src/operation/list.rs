//! Ordered operation container.

use super::{
    Crop, Encode, MetadataCopy, Operation, OperationKind, Redaction, Rotate, Scale,
    ScaleConstraint,
};
use crate::types::Dimensions;

/// The operations of one request, in client order, plus the scale
/// constraint the client is bound by.
///
/// Order is the composition contract: the transform stage applies
/// operations exactly as listed. Built once by the routing layer and read
/// only by the pipeline.
#[derive(Debug, Clone, Default)]
pub struct OperationList {
    operations: Vec<Operation>,
    scale_constraint: ScaleConstraint,
}

impl OperationList {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            scale_constraint: ScaleConstraint::default(),
        }
    }

    pub fn with_scale_constraint(mut self, scale_constraint: ScaleConstraint) -> Self {
        self.scale_constraint = scale_constraint;
        self
    }

    /// Append an operation, builder style.
    pub fn with(mut self, op: impl Into<Operation>) -> Self {
        self.operations.push(op.into());
        self
    }

    pub fn scale_constraint(&self) -> ScaleConstraint {
        self.scale_constraint
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operation> {
        self.operations.iter()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// First operation of the given kind.
    pub fn first(&self, kind: OperationKind) -> Option<&Operation> {
        self.operations.iter().find(|op| op.kind() == kind)
    }

    pub fn contains(&self, kind: OperationKind) -> bool {
        self.first(kind).is_some()
    }

    pub fn crop(&self) -> Option<&Crop> {
        self.operations.iter().find_map(|op| match op {
            Operation::Crop(crop) => Some(crop),
            _ => None,
        })
    }

    pub fn scale(&self) -> Option<&Scale> {
        self.operations.iter().find_map(|op| match op {
            Operation::Scale(scale) => Some(scale),
            _ => None,
        })
    }

    pub fn rotate(&self) -> Option<&Rotate> {
        self.operations.iter().find_map(|op| match op {
            Operation::Rotate(rotate) => Some(rotate),
            _ => None,
        })
    }

    pub fn encode(&self) -> Option<&Encode> {
        self.operations.iter().find_map(|op| match op {
            Operation::Encode(encode) => Some(encode),
            _ => None,
        })
    }

    pub fn metadata_copy(&self) -> Option<&MetadataCopy> {
        self.operations.iter().find_map(|op| match op {
            Operation::MetadataCopy(copy) => Some(copy),
            _ => None,
        })
    }

    pub fn redactions(&self) -> impl Iterator<Item = &Redaction> {
        self.operations.iter().filter_map(|op| match op {
            Operation::Redaction(redaction) => Some(redaction),
            _ => None,
        })
    }

    /// Size of the region the first crop selects, in full-source pixels.
    /// The whole source when there is no crop.
    pub fn region_size(&self, full: Dimensions) -> Dimensions {
        match self.crop() {
            Some(crop) => {
                let rect = crop.source_rect(full, self.scale_constraint);
                Dimensions::new(rect.width.round() as u32, rect.height.round() as u32)
            }
            None => full,
        }
    }

    /// Whether every operation other than `Encode` is a no-op for a
    /// `full`-sized source.
    pub fn is_identity(&self, full: Dimensions) -> bool {
        self.operations
            .iter()
            .filter(|op| !matches!(op, Operation::Encode(_) | Operation::MetadataCopy(_)))
            .all(|op| !op.has_effect(full, self))
    }
}

impl<'a> IntoIterator for &'a OperationList {
    type Item = &'a Operation;
    type IntoIter = std::slice::Iter<'a, Operation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

impl FromIterator<Operation> for OperationList {
    fn from_iter<I: IntoIterator<Item = Operation>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
