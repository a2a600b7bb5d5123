//! NullMask - Per-pixel validity flags
//!
//! A `NullMask` marks the pixels of an image that must be excluded from
//! every statistic: NaN samples, samples equal to an integer null value,
//! and samples outside an externally supplied spatial mask.
//!
//! A set flag means the pixel is *null* (invalid).

use crate::error::{Error, Result};
use crate::fpix::{FPix, check_dimensions};

/// Per-pixel null flags, row-major, same layout as [`FPix`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NullMask {
    width: u32,
    height: u32,
    nulls: Vec<bool>,
}

impl NullMask {
    /// Create a mask where every pixel is valid
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0 or the
    /// grid is too large.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(Self {
            width,
            height,
            nulls: vec![false; (width as usize) * (height as usize)],
        })
    }

    /// Mark every NaN pixel of `pix` as null
    pub fn from_nan(pix: &FPix) -> Self {
        Self::from_predicate(pix, f32::is_nan)
    }

    /// Mark every pixel of `pix` for which `is_null` returns true
    pub fn from_predicate(pix: &FPix, is_null: impl Fn(f32) -> bool) -> Self {
        Self {
            width: pix.width(),
            height: pix.height(),
            nulls: pix.data().iter().map(|&v| is_null(v)).collect(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Whether the pixel at (x, y) is null.
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn is_null(&self, x: u32, y: u32) -> bool {
        self.nulls[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Flag the pixel at (x, y)
    pub fn set_null(&mut self, x: u32, y: u32, null: bool) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * (self.width as usize) + (x as usize),
                len: self.nulls.len(),
            });
        }
        self.nulls[(y as usize) * (self.width as usize) + (x as usize)] = null;
        Ok(())
    }

    /// Number of null pixels
    pub fn count_null(&self) -> usize {
        self.nulls.iter().filter(|&&n| n).count()
    }

    /// Number of valid pixels
    pub fn count_valid(&self) -> usize {
        self.nulls.len() - self.count_null()
    }

    /// True if no pixel is valid
    pub fn all_null(&self) -> bool {
        self.nulls.iter().all(|&n| n)
    }

    /// Null every pixel that is null in `other` as well (logical OR)
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` if the masks differ in size.
    pub fn merge(&mut self, other: &NullMask) -> Result<()> {
        if self.dimensions() != other.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: other.dimensions(),
            });
        }
        for (a, &b) in self.nulls.iter_mut().zip(&other.nulls) {
            *a |= b;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_mask_all_valid() {
        let mask = NullMask::new(3, 2).unwrap();
        assert_eq!(mask.count_valid(), 6);
        assert!(!mask.all_null());
        assert!(NullMask::new(0, 2).is_err());
    }

    #[test]
    fn test_from_nan() {
        let pix = FPix::from_data(2, 2, vec![1.0, f32::NAN, f32::NAN, 0.0]).unwrap();
        let mask = NullMask::from_nan(&pix);
        assert!(!mask.is_null(0, 0));
        assert!(mask.is_null(1, 0));
        assert!(mask.is_null(0, 1));
        assert_eq!(mask.count_null(), 2);
    }

    #[test]
    fn test_merge() {
        let pix = FPix::from_data(2, 1, vec![f32::NAN, 1.0]).unwrap();
        let mut mask = NullMask::from_nan(&pix);
        let mut other = NullMask::new(2, 1).unwrap();
        other.set_null(1, 0, true).unwrap();
        mask.merge(&other).unwrap();
        assert!(mask.all_null());

        let wrong = NullMask::new(1, 2).unwrap();
        assert!(mask.merge(&wrong).is_err());
    }
}
