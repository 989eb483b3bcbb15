//! Decode-time downscaling bookkeeping.

/// Power-of-two downscale that the decode layer already applied.
///
/// A factor of `n` means the raster handed to the pipeline is `2^n` times
/// smaller than the source in each dimension. Any coordinate expressed in
/// full-source space has to be multiplied by [`ReductionFactor::scale`]
/// before it can address the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ReductionFactor(u8);

impl ReductionFactor {
    /// Largest factor the bookkeeping supports (a 1/2^30 reduction).
    pub const MAX: u8 = 30;

    pub fn new(factor: u8) -> Self {
        Self(factor.min(Self::MAX))
    }

    pub fn factor(self) -> u8 {
        self.0
    }

    /// Linear scale of the reduced raster relative to the source: `2^-n`.
    pub fn scale(self) -> f64 {
        1.0 / (1u64 << self.0) as f64
    }

    /// Pick the largest factor whose reduction still leaves at least
    /// `scale` of the source resolution, capped at `max_factor`.
    ///
    /// A request for 30% of the source yields 1 (50%), because a further
    /// halving to 25% would throw away pixels the output needs.
    pub fn for_scale(scale: f64, max_factor: u8) -> Self {
        let mut factor = 0u8;
        let mut next_scale = 0.5;
        while scale <= next_scale && factor < max_factor.min(Self::MAX) {
            next_scale /= 2.0;
            factor += 1;
        }
        Self(factor)
    }

    /// Size of a `length`-pixel source extent after this reduction.
    pub fn reduce_length(self, length: u32) -> u32 {
        ((length as f64) * self.scale()).ceil().max(1.0) as u32
    }
}
