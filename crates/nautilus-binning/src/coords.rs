//! Pixel to physical coordinate transforms
//!
//! Pixel coordinates are 0-based with the centre of the first pixel at
//! `(0, 0)`, so the outer edge of a bin starting at pixel `x` lies at
//! `x - 0.5`.

use serde::Deserialize;

/// Maps 0-based pixel coordinates to physical coordinates
pub trait CoordTransform {
    /// Convert a pixel position to physical units
    fn to_physical(&self, x: f64, y: f64) -> (f64, f64);
}

/// Physical coordinates equal pixel coordinates
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IdentityTransform;

impl CoordTransform for IdentityTransform {
    fn to_physical(&self, x: f64, y: f64) -> (f64, f64) {
        (x, y)
    }
}

/// Linear mapping of one axis
///
/// `crpix` is the 1-based reference pixel, `crval` the physical value at
/// that pixel and `cdelt` the physical size of one pixel.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct AxisTransform {
    pub crpix: f64,
    pub crval: f64,
    pub cdelt: f64,
}

impl AxisTransform {
    pub const fn new(crpix: f64, crval: f64, cdelt: f64) -> Self {
        Self {
            crpix,
            crval,
            cdelt,
        }
    }

    /// Physical value of the 0-based pixel position `p`
    #[inline]
    pub fn apply(&self, p: f64) -> f64 {
        self.crval + (p + 1.0 - self.crpix) * self.cdelt
    }
}

impl Default for AxisTransform {
    fn default() -> Self {
        Self::new(1.0, 0.0, 1.0)
    }
}

/// Independent linear transform on each axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct LinearTransform {
    pub x: AxisTransform,
    pub y: AxisTransform,
}

impl LinearTransform {
    pub const fn new(x: AxisTransform, y: AxisTransform) -> Self {
        Self { x, y }
    }
}

impl CoordTransform for LinearTransform {
    fn to_physical(&self, x: f64, y: f64) -> (f64, f64) {
        (self.x.apply(x), self.y.apply(y))
    }
}
