//! Resizing requests.

use image::imageops::FilterType;
use serde::{Deserialize, Serialize};

use super::{OperationList, ReductionFactor, ScaleConstraint};
use crate::types::Dimensions;

/// How the output size is derived from the (cropped) region.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ScaleMode {
    /// Region at full (scale-constrained) resolution.
    Full,
    /// Largest size the server permits; the output pixel limit shrinks it.
    Max,
    /// Exact width, height follows the aspect ratio.
    ByWidth(u32),
    /// Exact height, width follows the aspect ratio.
    ByHeight(u32),
    /// Fraction of the region size (0.5 = half).
    Percent(f64),
    /// Largest size fitting inside the box, aspect ratio preserved.
    AspectFitInside { width: u32, height: u32 },
    /// Exactly the given size, aspect ratio ignored.
    NonAspectFill { width: u32, height: u32 },
}

/// Resampling filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleFilter {
    Nearest,
    Bilinear,
    CatmullRom,
    Gaussian,
    Lanczos3,
}

impl ScaleFilter {
    pub fn to_filter_type(self) -> FilterType {
        match self {
            ScaleFilter::Nearest => FilterType::Nearest,
            ScaleFilter::Bilinear => FilterType::Triangle,
            ScaleFilter::CatmullRom => FilterType::CatmullRom,
            ScaleFilter::Gaussian => FilterType::Gaussian,
            ScaleFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    mode: ScaleMode,
    filter: Option<ScaleFilter>,
}

impl Scale {
    pub fn new(mode: ScaleMode) -> Self {
        Self { mode, filter: None }
    }

    pub fn percent(fraction: f64) -> Self {
        Self::new(ScaleMode::Percent(fraction))
    }

    /// Override the configured resampling filter for this request.
    pub fn with_filter(mut self, filter: ScaleFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn mode(&self) -> ScaleMode {
        self.mode
    }

    pub fn filter(&self) -> Option<ScaleFilter> {
        self.filter
    }

    /// Output size for a raster of `current` pixels.
    ///
    /// `current` was already reduced by `rf` at decode time, and the client
    /// sees the source through `sc`. Both are divided out, so a 50% request
    /// against a raster decoded at half size yields the raster's own size.
    /// The result may contain a zero dimension; callers validate it.
    pub fn resulting_size(
        &self,
        current: Dimensions,
        rf: ReductionFactor,
        sc: ScaleConstraint,
    ) -> Dimensions {
        let factor = sc.ratio() / rf.scale();
        let (vw, vh) = (current.width as f64 * factor, current.height as f64 * factor);

        let (w, h) = match self.mode {
            ScaleMode::Full | ScaleMode::Max => (vw, vh),
            ScaleMode::Percent(p) => (vw * p, vh * p),
            ScaleMode::ByWidth(w) => (w as f64, vh * w as f64 / vw),
            ScaleMode::ByHeight(h) => (vw * h as f64 / vh, h as f64),
            ScaleMode::AspectFitInside { width, height } => {
                let s = (width as f64 / vw).min(height as f64 / vh);
                (vw * s, vh * s)
            }
            ScaleMode::NonAspectFill { width, height } => (width as f64, height as f64),
        };
        Dimensions::new(w.round() as u32, h.round() as u32)
    }

    /// Output scale relative to the full-resolution region: the largest
    /// per-axis ratio, which is what decode-time reduction must preserve.
    pub fn resulting_scale(&self, region: Dimensions, sc: ScaleConstraint) -> f64 {
        let target = self.resulting_size(region, ReductionFactor::default(), sc);
        let sx = target.width as f64 / region.width.max(1) as f64;
        let sy = target.height as f64 / region.height.max(1) as f64;
        sx.max(sy)
    }

    /// Whether the output size would differ from the (cropped) source.
    pub fn has_effect(&self, full: Dimensions, ops: &OperationList) -> bool {
        let sc = ops.scale_constraint();
        let region = ops.region_size(full);
        self.resulting_size(region, ReductionFactor::default(), sc) != region
    }
}

/// Shrink `size` proportionally until it fits within `max_pixels`.
/// A budget of zero means unlimited.
pub fn fit_pixel_budget(size: Dimensions, max_pixels: u64) -> Dimensions {
    if max_pixels == 0 || size.pixel_count() <= max_pixels {
        return size;
    }
    let s = (max_pixels as f64 / size.pixel_count() as f64).sqrt();
    Dimensions::new(
        ((size.width as f64 * s).floor() as u32).max(1),
        ((size.height as f64 * s).floor() as u32).max(1),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operation::Crop;

    #[test]
    fn test_percent_compensates_for_reduction() {
        let scale = Scale::percent(0.5);
        let current = Dimensions::new(500, 400);
        let size = scale.resulting_size(current, ReductionFactor::new(1), ScaleConstraint::default());
        assert_eq!(size, current);
    }

    #[test]
    fn test_percent_without_reduction() {
        let scale = Scale::percent(0.5);
        let size = scale.resulting_size(
            Dimensions::new(1000, 800),
            ReductionFactor::default(),
            ScaleConstraint::default(),
        );
        assert_eq!(size, Dimensions::new(500, 400));
    }

    #[test]
    fn test_full_honours_constraint() {
        let sc = ScaleConstraint::new(1, 4).unwrap();
        let size = Scale::new(ScaleMode::Full).resulting_size(
            Dimensions::new(1000, 800),
            ReductionFactor::new(1),
            sc,
        );
        assert_eq!(size, Dimensions::new(500, 400));
    }

    #[test]
    fn test_aspect_modes() {
        let rf = ReductionFactor::default();
        let sc = ScaleConstraint::default();
        let current = Dimensions::new(1000, 500);
        assert_eq!(
            Scale::new(ScaleMode::ByWidth(200)).resulting_size(current, rf, sc),
            Dimensions::new(200, 100)
        );
        assert_eq!(
            Scale::new(ScaleMode::ByHeight(100)).resulting_size(current, rf, sc),
            Dimensions::new(200, 100)
        );
        assert_eq!(
            Scale::new(ScaleMode::AspectFitInside {
                width: 300,
                height: 300
            })
            .resulting_size(current, rf, sc),
            Dimensions::new(300, 150)
        );
        assert_eq!(
            Scale::new(ScaleMode::NonAspectFill {
                width: 300,
                height: 300
            })
            .resulting_size(current, rf, sc),
            Dimensions::new(300, 300)
        );
    }

    #[test]
    fn test_has_effect_considers_crop() {
        let full = Dimensions::new(1000, 1000);
        let scale = Scale::new(ScaleMode::ByWidth(400));
        let plain = OperationList::default();
        assert!(scale.has_effect(full, &plain));

        let cropped = OperationList::default().with(Crop::pixels(0.0, 0.0, 400.0, 400.0));
        assert!(!scale.has_effect(full, &cropped));
    }

    #[test]
    fn test_full_has_effect_only_under_constraint() {
        let full = Dimensions::new(1000, 1000);
        let scale = Scale::new(ScaleMode::Full);
        assert!(!scale.has_effect(full, &OperationList::default()));
        let constrained = OperationList::default()
            .with_scale_constraint(ScaleConstraint::new(1, 2).unwrap());
        assert!(scale.has_effect(full, &constrained));
    }

    #[test]
    fn test_resulting_scale() {
        let scale = Scale::percent(0.25);
        let s = scale.resulting_scale(Dimensions::new(1000, 1000), ScaleConstraint::default());
        assert!((s - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_fit_pixel_budget() {
        let size = Dimensions::new(2000, 1000);
        assert_eq!(fit_pixel_budget(size, 0), size);
        assert_eq!(fit_pixel_budget(size, 500_000), Dimensions::new(1000, 500));
    }
}
