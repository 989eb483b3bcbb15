//! Scale constraint: the tiered-access bound on output resolution.

use crate::error::PipelineError;
use crate::types::Dimensions;

/// Rational bound on the maximum output scale relative to the source.
///
/// A constraint of 1:2 presents the client with a virtual source half the
/// size of the real one; every pixel coordinate the client sends is in that
/// virtual space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScaleConstraint {
    numerator: u32,
    denominator: u32,
}

impl ScaleConstraint {
    /// Create a constraint. It must be non-zero and must not exceed 1.
    pub fn new(numerator: u32, denominator: u32) -> Result<Self, PipelineError> {
        if numerator == 0 || denominator == 0 {
            return Err(PipelineError::InvalidInput(format!(
                "Scale constraint {numerator}:{denominator} must be non-zero"
            )));
        }
        if numerator > denominator {
            return Err(PipelineError::InvalidInput(format!(
                "Scale constraint {numerator}:{denominator} is greater than 1"
            )));
        }
        Ok(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(self) -> u32 {
        self.numerator
    }

    pub fn denominator(self) -> u32 {
        self.denominator
    }

    pub fn ratio(self) -> f64 {
        self.numerator as f64 / self.denominator as f64
    }

    pub fn has_effect(self) -> bool {
        self.numerator != self.denominator
    }

    /// Size of the virtual source the client addresses.
    pub fn constrained_size(self, full: Dimensions) -> Dimensions {
        let r = self.ratio();
        Dimensions::new(
            (full.width as f64 * r).round().max(1.0) as u32,
            (full.height as f64 * r).round().max(1.0) as u32,
        )
    }
}

impl Default for ScaleConstraint {
    fn default() -> Self {
        Self {
            numerator: 1,
            denominator: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_identity() {
        let sc = ScaleConstraint::default();
        assert_eq!(sc.ratio(), 1.0);
        assert!(!sc.has_effect());
    }

    #[test]
    fn test_rejects_invalid() {
        assert!(ScaleConstraint::new(0, 2).is_err());
        assert!(ScaleConstraint::new(1, 0).is_err());
        assert!(ScaleConstraint::new(3, 2).is_err());
    }

    #[test]
    fn test_constrained_size() {
        let sc = ScaleConstraint::new(1, 2).unwrap();
        assert_eq!(
            sc.constrained_size(Dimensions::new(1000, 601)),
            Dimensions::new(500, 301)
        );
    }
}
