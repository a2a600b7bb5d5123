//! FPix, UPix - Floating-point and label images
//!
//! `FPix` is a 2D array of `f32` values. It carries the input pixel grid,
//! the per-pixel error grid and the value/area/SNR output grids.
//! `UPix` is the same layout with `u32` values and carries the bin mask-id
//! grid, where 0 marks pixels that belong to no bin.
//!
//! Both carry a free-form physical unit string (e.g. "counts", "pixels"),
//! which is what the writers attach to the persisted grid.
//!
//! See [`serial`] for serialization support.
//!
//! # Examples
//!
//! ```
//! use nautilus_core::FPix;
//!
//! let mut fpix = FPix::new(100, 100).unwrap();
//! fpix.set_pixel(10, 20, 0.5).unwrap();
//! assert_eq!(fpix.get_pixel(10, 20).unwrap(), 0.5);
//! ```

pub mod serial;

use crate::error::{Error, Result};

/// Largest pixel count of any grid (2^29)
pub const MAX_PIXELS: u64 = 1 << 29;

/// Check that a `width` x `height` grid can be allocated
///
/// # Errors
///
/// Returns `Error::InvalidDimension` if a side is 0 or the grid has more
/// than [`MAX_PIXELS`] pixels.
pub fn check_dimensions(width: u32, height: u32) -> Result<()> {
    if width == 0 || height == 0 || width as u64 * height as u64 > MAX_PIXELS {
        return Err(Error::InvalidDimension { width, height });
    }
    Ok(())
}

/// Floating-point image
///
/// # Memory Layout
///
/// Data is stored in row-major order with no padding. The pixel at (x, y)
/// is at index `y * width + x`.
#[derive(Debug, Clone, PartialEq)]
pub struct FPix {
    /// Width in pixels
    width: u32,
    /// Height in pixels
    height: u32,
    /// Pixel data (row-major, no padding)
    data: Vec<f32>,
    /// Physical unit of the pixel values, empty if unknown
    unit: String,
}

impl FPix {
    /// Create a new FPix with all pixels set to zero
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use nautilus_core::FPix;
    ///
    /// let fpix = FPix::new(640, 480).unwrap();
    /// assert_eq!(fpix.width(), 640);
    /// assert_eq!(fpix.height(), 480);
    /// ```
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::new_with_value(width, height, 0.0)
    }

    /// Create a new FPix with all pixels set to the specified value
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0 or the
    /// grid exceeds [`MAX_PIXELS`].
    pub fn new_with_value(width: u32, height: u32, value: f32) -> Result<Self> {
        check_dimensions(width, height)?;

        let size = (width as usize) * (height as usize);
        Ok(FPix {
            width,
            height,
            data: vec![value; size],
            unit: String::new(),
        })
    }

    /// Create a FPix from raw row-major data
    ///
    /// # Errors
    ///
    /// Returns an error if dimensions are invalid or data length doesn't match.
    pub fn from_data(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        check_data_len(width, height, data.len())?;
        Ok(FPix {
            width,
            height,
            data,
            unit: String::new(),
        })
    }

    /// Get the image width in pixels
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Get the image height in pixels
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Get the image dimensions as (width, height)
    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Physical unit of the pixel values
    #[inline]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Set the physical unit of the pixel values
    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit = unit.into();
    }

    /// Builder form of [`FPix::set_unit`]
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Get the pixel value at (x, y)
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<f32> {
        let idx = self.index_of(x, y)?;
        Ok(self.data[idx])
    }

    /// Set the pixel value at (x, y)
    ///
    /// # Errors
    ///
    /// Returns `Error::IndexOutOfBounds` if coordinates are out of range.
    #[inline]
    pub fn set_pixel(&mut self, x: u32, y: u32, value: f32) -> Result<()> {
        let idx = self.index_of(x, y)?;
        self.data[idx] = value;
        Ok(())
    }

    /// Get the pixel value at (x, y) without bounds checking
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn get_pixel_unchecked(&self, x: u32, y: u32) -> f32 {
        self.data[(y as usize) * (self.width as usize) + (x as usize)]
    }

    /// Set the pixel value at (x, y) without bounds checking
    ///
    /// # Panics
    ///
    /// Panics if `x >= width` or `y >= height`.
    #[inline]
    pub fn set_pixel_unchecked(&mut self, x: u32, y: u32, value: f32) {
        self.data[(y as usize) * (self.width as usize) + (x as usize)] = value;
    }

    /// Get raw access to the pixel data
    #[inline]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Create a new image by applying `f` to every pixel. The unit is not
    /// carried over.
    pub fn map(&self, f: impl Fn(f32) -> f32) -> FPix {
        FPix {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(|&v| f(v)).collect(),
            unit: String::new(),
        }
    }

    /// Check that `other` has the same dimensions as this image
    ///
    /// # Errors
    ///
    /// Returns `Error::DimensionMismatch` with this image as the expected size.
    pub fn check_same_size(&self, other: (u32, u32)) -> Result<()> {
        if self.dimensions() != other {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: other,
            });
        }
        Ok(())
    }

    #[inline]
    fn index_of(&self, x: u32, y: u32) -> Result<usize> {
        let idx = (y as usize) * (self.width as usize) + (x as usize);
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: idx,
                len: self.data.len(),
            });
        }
        Ok(idx)
    }
}

/// Unsigned 32-bit label image
///
/// Same row-major layout as [`FPix`]. Used for the bin mask-id grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UPix {
    width: u32,
    height: u32,
    data: Vec<u32>,
    unit: String,
}

impl UPix {
    /// Create a new UPix with all pixels set to zero
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if width or height is 0 or the
    /// grid exceeds [`MAX_PIXELS`].
    pub fn new(width: u32, height: u32) -> Result<Self> {
        check_dimensions(width, height)?;
        Ok(UPix {
            width,
            height,
            data: vec![0; (width as usize) * (height as usize)],
            unit: String::new(),
        })
    }

    /// Create a UPix from raw row-major data
    pub fn from_data(width: u32, height: u32, data: Vec<u32>) -> Result<Self> {
        check_data_len(width, height, data.len())?;
        Ok(UPix {
            width,
            height,
            data,
            unit: String::new(),
        })
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

    #[inline]
    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn set_unit(&mut self, unit: impl Into<String>) {
        self.unit = unit.into();
    }

    /// Get the label at (x, y)
    pub fn get_pixel(&self, x: u32, y: u32) -> Result<u32> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * (self.width as usize) + (x as usize),
                len: self.data.len(),
            });
        }
        Ok(self.data[(y as usize) * (self.width as usize) + (x as usize)])
    }

    /// Set the label at (x, y)
    pub fn set_pixel(&mut self, x: u32, y: u32, value: u32) -> Result<()> {
        if x >= self.width || y >= self.height {
            return Err(Error::IndexOutOfBounds {
                index: (y as usize) * (self.width as usize) + (x as usize),
                len: self.data.len(),
            });
        }
        self.data[(y as usize) * (self.width as usize) + (x as usize)] = value;
        Ok(())
    }

    #[inline]
    pub fn data(&self) -> &[u32] {
        &self.data
    }
}

fn check_data_len(width: u32, height: u32, len: usize) -> Result<()> {
    check_dimensions(width, height)?;
    let expected = (width as usize) * (height as usize);
    if len != expected {
        return Err(Error::InvalidParameter(format!(
            "data length {len} doesn't match {width}x{height} = {expected}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fpix_creation() {
        let fpix = FPix::new(100, 200).unwrap();
        assert_eq!(fpix.dimensions(), (100, 200));
        assert_eq!(fpix.data().len(), 20000);
        assert!(fpix.unit().is_empty());
    }

    #[test]
    fn test_fpix_invalid_dimensions() {
        assert!(FPix::new(0, 10).is_err());
        assert!(FPix::new(10, 0).is_err());
        assert!(UPix::new(0, 0).is_err());
    }

    #[test]
    fn test_fpix_from_data_length_mismatch() {
        assert!(FPix::from_data(3, 3, vec![0.0; 8]).is_err());
        assert!(FPix::from_data(3, 3, vec![0.0; 9]).is_ok());
    }

    #[test]
    fn test_dimension_cap() {
        assert!(check_dimensions(1 << 14, 1 << 15).is_ok());
        assert!(matches!(
            check_dimensions(1 << 15, 1 << 15),
            Err(Error::InvalidDimension { .. })
        ));
        assert!(check_dimensions(u32::MAX, u32::MAX).is_err());
        assert!(check_dimensions(0, 5).is_err());
        assert!(UPix::new(u32::MAX, 2).is_err());
        assert!(FPix::from_data(1 << 30, 1, Vec::new()).is_err());
    }

    #[test]
    fn test_fpix_get_set() {
        let mut fpix = FPix::new(4, 3).unwrap();
        fpix.set_pixel(3, 2, -1.25).unwrap();
        assert_eq!(fpix.get_pixel(3, 2).unwrap(), -1.25);
        assert!(fpix.get_pixel(4, 0).is_err());
        assert!(fpix.set_pixel(0, 3, 1.0).is_err());
    }

    #[test]
    fn test_fpix_map_and_size_check() {
        let fpix = FPix::new_with_value(3, 2, 4.0).unwrap().with_unit("counts");
        let root = fpix.map(f32::sqrt);
        assert_eq!(root.get_pixel(1, 1).unwrap(), 2.0);
        assert!(root.unit().is_empty());
        assert!(fpix.check_same_size(root.dimensions()).is_ok());
        assert!(fpix.check_same_size((2, 3)).is_err());
    }

    #[test]
    fn test_upix_labels() {
        let mut upix = UPix::new(3, 1).unwrap();
        upix.set_pixel(0, 0, 7).unwrap();
        upix.set_pixel(2, 0, 7).unwrap();
        assert_eq!(upix.data(), &[7, 0, 7]);
        assert!(upix.get_pixel(3, 0).is_err());
    }
}
