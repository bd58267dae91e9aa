//! Uniform sampling of link attributes from closed ranges.

use nalgebra::Vector3;
use rand::Rng;
use serde::Deserialize;

use crate::error::{GenError, GenResult};

/// A closed interval `[lo, hi]` to sample from.
///
/// Deserializes from a two-element array, e.g. `mass = [0.5, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "[f64; 2]")]
pub struct Range {
    lo: f64,
    hi: f64,
}

impl Range {
    /// Create a range, rejecting `lo > hi` and non-finite bounds.
    pub fn new(attribute: &str, lo: f64, hi: f64) -> GenResult<Self> {
        if !lo.is_finite() || !hi.is_finite() || lo > hi {
            return Err(GenError::InvalidRange {
                attribute: attribute.to_string(),
                lo,
                hi,
            });
        }
        Ok(Self { lo, hi })
    }

    /// A zero-width range.
    #[must_use]
    pub fn constant(value: f64) -> Self {
        Self { lo: value, hi: value }
    }

    #[must_use]
    pub fn lo(&self) -> f64 {
        self.lo
    }

    #[must_use]
    pub fn hi(&self) -> f64 {
        self.hi
    }

    #[must_use]
    pub fn contains(&self, value: f64) -> bool {
        self.lo <= value && value <= self.hi
    }

    /// Draw a value uniformly from `[lo, hi]`.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        if self.lo == self.hi {
            return self.lo;
        }
        // work in halves so `hi - lo` cannot overflow for extreme bounds
        let mid = self.lo / 2.0 + self.hi / 2.0;
        let half = self.hi / 2.0 - self.lo / 2.0;
        // rounding may land one ulp outside the bounds
        (mid + half * rng.gen_range(-1.0..=1.0)).clamp(self.lo, self.hi)
    }
}

impl TryFrom<[f64; 2]> for Range {
    type Error = GenError;

    fn try_from([lo, hi]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new("range", lo, hi)
    }
}

/// Three independent per-axis ranges.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(from = "[Range; 3]")]
pub struct Range3 {
    pub x: Range,
    pub y: Range,
    pub z: Range,
}

impl Range3 {
    #[must_use]
    pub fn new(x: Range, y: Range, z: Range) -> Self {
        Self { x, y, z }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Vector3<f64> {
        Vector3::new(self.x.sample(rng), self.y.sample(rng), self.z.sample(rng))
    }

    #[must_use]
    pub fn contains(&self, v: &Vector3<f64>) -> bool {
        self.x.contains(v.x) && self.y.contains(v.y) && self.z.contains(v.z)
    }
}

impl From<[Range; 3]> for Range3 {
    fn from([x, y, z]: [Range; 3]) -> Self {
        Self::new(x, y, z)
    }
}
