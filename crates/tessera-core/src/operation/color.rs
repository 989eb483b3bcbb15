//! Color and detail adjustments.

use super::OperationList;
use crate::types::Dimensions;

/// Color space reduction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorTransform {
    /// Luma only.
    Gray,
    /// Pure black and white, thresholded on luma.
    Bitonal,
}

impl ColorTransform {
    /// Luma value at or above which a bitonal pixel turns white.
    pub const BITONAL_THRESHOLD: u8 = 128;

    pub fn has_effect(&self, _full: Dimensions, _ops: &OperationList) -> bool {
        true
    }
}

/// Unsharp-mask sharpening. `amount` is the blur sigma of the mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sharpen {
    amount: f64,
}

impl Sharpen {
    /// Difference below which an unsharp-masked pixel is left alone.
    pub const THRESHOLD: i32 = 1;

    pub fn new(amount: f64) -> Self {
        Self { amount }
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn has_effect(&self, _full: Dimensions, _ops: &OperationList) -> bool {
        self.amount > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sharpen_effect_requires_positive_amount() {
        let full = Dimensions::new(8, 8);
        let ops = OperationList::default();
        assert!(!Sharpen::new(0.0).has_effect(full, &ops));
        assert!(!Sharpen::new(-1.0).has_effect(full, &ops));
        assert!(Sharpen::new(0.5).has_effect(full, &ops));
    }
}
