//! SNR evaluation over pixel rectangles
//!
//! The signal-to-noise ratio of a set of pixels is
//!
//! ```text
//! snr = sum(value) / sqrt(sum(error^2))
//! ```
//!
//! taken over the valid pixels only. Rectangles may extend past the image;
//! the part outside contributes nothing.

use crate::error::{BinningError, BinningResult};
use nautilus_core::{Box, FPix, NullMask};

/// Aggregated statistics of the valid pixels in a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectStats {
    /// Sum of the pixel values
    pub sum_value: f64,
    /// Sum of the squared pixel errors
    pub sum_noise_sq: f64,
    /// Number of valid pixels
    pub area: u64,
    /// `sum_value / sqrt(sum_noise_sq)`; non-finite when the noise sum is 0
    pub snr: f64,
}

impl RectStats {
    /// True when the rectangle holds no valid pixel
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.area == 0
    }

    /// Mean value of the valid pixels, or `None` if there are none
    pub fn mean(&self) -> Option<f64> {
        (self.area > 0).then(|| self.sum_value / self.area as f64)
    }
}

/// Read-only view of the three input grids of a binning run
#[derive(Debug, Clone, Copy)]
pub struct SnrEvaluator<'a> {
    values: &'a FPix,
    errors: &'a FPix,
    nulls: &'a NullMask,
}

impl<'a> SnrEvaluator<'a> {
    /// Create an evaluator over co-registered value, error and null grids
    ///
    /// # Errors
    ///
    /// Returns `BinningError::DimensionMismatch` if the error grid or the
    /// null mask differs in size from the value grid.
    pub fn new(values: &'a FPix, errors: &'a FPix, nulls: &'a NullMask) -> BinningResult<Self> {
        let expected = values.dimensions();
        if errors.dimensions() != expected {
            return Err(BinningError::DimensionMismatch {
                what: "error image",
                expected,
                actual: errors.dimensions(),
            });
        }
        if nulls.dimensions() != expected {
            return Err(BinningError::DimensionMismatch {
                what: "null mask",
                expected,
                actual: nulls.dimensions(),
            });
        }
        Ok(Self {
            values,
            errors,
            nulls,
        })
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.values.dimensions()
    }

    pub fn values(&self) -> &'a FPix {
        self.values
    }

    pub fn nulls(&self) -> &'a NullMask {
        self.nulls
    }

    /// Aggregate the valid pixels of `node`
    pub fn evaluate(&self, node: Box) -> RectStats {
        let (width, height) = self.dimensions();
        let mut stats = RectStats::default();

        for (x, y) in node.clipped_pixels(width, height) {
            if self.nulls.is_null(x, y) {
                continue;
            }
            let value = self.values.get_pixel_unchecked(x, y) as f64;
            let error = self.errors.get_pixel_unchecked(x, y) as f64;
            stats.sum_value += value;
            stats.sum_noise_sq += error * error;
            stats.area += 1;
        }

        stats.snr = stats.sum_value / stats.sum_noise_sq.sqrt();
        stats
    }
}
