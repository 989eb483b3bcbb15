//! Geometric reorientation: mirror flips and clockwise rotation.

use super::OperationList;
use crate::types::Dimensions;

/// Axis to flip across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transpose {
    /// Mirror left to right.
    Horizontal,
    /// Mirror top to bottom.
    Vertical,
}

impl Transpose {
    pub fn has_effect(&self, _full: Dimensions, _ops: &OperationList) -> bool {
        true
    }
}

/// Clockwise rotation by an arbitrary angle in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotate {
    degrees: f64,
}

impl Rotate {
    const EPSILON: f64 = 1e-9;

    pub fn new(degrees: f64) -> Self {
        Self { degrees }
    }

    pub fn degrees(&self) -> f64 {
        self.degrees
    }

    /// Angle folded into `[0, 360)`.
    pub fn normalized_degrees(&self) -> f64 {
        let d = self.degrees.rem_euclid(360.0);
        if (360.0 - d) < Self::EPSILON {
            0.0
        } else {
            d
        }
    }

    /// Quarter turns for right-angle rotations, `None` for anything else.
    pub fn quarter_turns(&self) -> Option<u8> {
        let d = self.normalized_degrees();
        let turns = (d / 90.0).round();
        ((d - turns * 90.0).abs() < Self::EPSILON).then_some(turns as u8 % 4)
    }

    /// Bounding box of a `size` raster after rotation.
    pub fn rotated_bounds(&self, size: Dimensions) -> Dimensions {
        match self.quarter_turns() {
            Some(0) | Some(2) => size,
            Some(_) => size.transposed(),
            None => {
                let radians = self.normalized_degrees().to_radians();
                let (sin, cos) = (radians.sin().abs(), radians.cos().abs());
                let w = size.width as f64;
                let h = size.height as f64;
                Dimensions::new(
                    (w * cos + h * sin).ceil() as u32,
                    (w * sin + h * cos).ceil() as u32,
                )
            }
        }
    }

    pub fn has_effect(&self, _full: Dimensions, _ops: &OperationList) -> bool {
        self.normalized_degrees().abs() > Self::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ops() -> OperationList {
        OperationList::default()
    }

    #[test]
    fn test_full_turns_have_no_effect() {
        let full = Dimensions::new(10, 10);
        assert!(!Rotate::new(0.0).has_effect(full, &ops()));
        assert!(!Rotate::new(360.0).has_effect(full, &ops()));
        assert!(!Rotate::new(-720.0).has_effect(full, &ops()));
        assert!(Rotate::new(45.0).has_effect(full, &ops()));
    }

    #[test]
    fn test_quarter_turns() {
        assert_eq!(Rotate::new(90.0).quarter_turns(), Some(1));
        assert_eq!(Rotate::new(-90.0).quarter_turns(), Some(3));
        assert_eq!(Rotate::new(540.0).quarter_turns(), Some(2));
        assert_eq!(Rotate::new(30.0).quarter_turns(), None);
    }

    #[test]
    fn test_rotated_bounds() {
        let size = Dimensions::new(100, 50);
        assert_eq!(Rotate::new(90.0).rotated_bounds(size), Dimensions::new(50, 100));
        assert_eq!(Rotate::new(180.0).rotated_bounds(size), size);
        let diag = Rotate::new(45.0).rotated_bounds(Dimensions::new(100, 100));
        assert_eq!(diag, Dimensions::new(142, 142));
    }
}
