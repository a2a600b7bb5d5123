//! Input images for a binning run
//!
//! Every reader produces an [`InputImage`]: the samples as an [`FPix`], the
//! pixels to exclude as a [`NullMask`], and the physical unit of the
//! samples. Integer sources honour an optional null value (the BLANK
//! convention); float sources mark NaN samples as null.

use crate::IoResult;
use nautilus_core::{FPix, NullMask};

/// Decoded input image with its validity mask
#[derive(Debug, Clone, PartialEq)]
pub struct InputImage {
    /// Sample values
    pub pix: FPix,
    /// Pixels excluded from every statistic
    pub nulls: NullMask,
    /// Physical unit of the samples (may be empty)
    pub unit: String,
}

impl InputImage {
    /// Build an input image from float samples; NaN samples are null
    pub fn from_float_pix(pix: FPix) -> Self {
        let nulls = NullMask::from_nan(&pix);
        let unit = pix.unit().to_string();
        Self { pix, nulls, unit }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.pix.width()
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.pix.height()
    }

    #[inline]
    pub fn dimensions(&self) -> (u32, u32) {
        self.pix.dimensions()
    }

    /// Exclude every pixel that is null in `mask` as well
    pub fn apply_mask(&mut self, mask: &NullMask) -> IoResult<()> {
        self.nulls.merge(mask)?;
        Ok(())
    }
}

/// Convert float samples of any width
pub(crate) fn from_floats<T: Copy + Into<f64>>(
    width: u32,
    height: u32,
    data: &[T],
    unit: &str,
) -> IoResult<InputImage> {
    let samples = data.iter().map(|&v| v.into() as f32).collect();
    let pix = FPix::from_data(width, height, samples)?.with_unit(unit);
    Ok(InputImage::from_float_pix(pix))
}

/// Convert integer samples, nulling those equal to `null_value`
///
/// The comparison is done on the integer before conversion, so large
/// values that do not survive the trip to f32 are still matched exactly.
pub(crate) fn from_integers<T: Copy + Into<i64>>(
    width: u32,
    height: u32,
    data: &[T],
    null_value: Option<i64>,
    unit: &str,
) -> IoResult<InputImage> {
    let mut samples = Vec::with_capacity(data.len());
    let mut flags = Vec::with_capacity(data.len());
    for &v in data {
        let v: i64 = v.into();
        samples.push(v as f32);
        flags.push(null_value == Some(v));
    }

    let pix = FPix::from_data(width, height, samples)?.with_unit(unit);
    let mut nulls = NullMask::new(width, height)?;
    for (i, _) in flags.iter().enumerate().filter(|(_, f)| **f) {
        let x = (i % width as usize) as u32;
        let y = (i / width as usize) as u32;
        nulls.set_null(x, y, true)?;
    }

    Ok(InputImage {
        pix,
        nulls,
        unit: unit.to_string(),
    })
}
