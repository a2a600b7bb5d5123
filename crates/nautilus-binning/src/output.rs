//! Binning results
//!
//! A [`BinnedImage`] holds one [`OutputCell`] per input pixel, the list of
//! committed [`Bin`]s and their rectangles as a [`Region`]. The grids the
//! writers consume are materialised on demand: float grids carry NaN and
//! the mask-id grid carries 0 wherever no bin was written.

use nautilus_core::{Box, FPix, NullMask, Region, RegionRect, Result, UPix};
use std::fmt;

/// Unit of the area grid
pub const AREA_UNIT: &str = "pixels";

/// State of one output pixel
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum OutputCell {
    /// Not covered by any committed bin
    #[default]
    Unassigned,
    /// Inside a committed bin but excluded from its statistics
    Invalid,
    /// Part of bin `mask_id`
    Binned {
        value: f32,
        area: u64,
        snr: f32,
        mask_id: u32,
    },
}

impl OutputCell {
    /// Mask id of the bin, if any
    pub fn mask_id(&self) -> Option<u32> {
        match self {
            OutputCell::Binned { mask_id, .. } => Some(*mask_id),
            _ => None,
        }
    }
}

/// A committed leaf of the quad-tree
#[derive(Debug, Clone, PartialEq)]
pub struct Bin {
    /// Sequential id, starting at 1
    pub id: u32,
    /// Mean of the valid pixel values
    pub value: f64,
    /// Number of valid pixels
    pub area: u64,
    /// Signal-to-noise ratio of the bin
    pub snr: f64,
    /// Footprint in pixel coordinates (may extend past the image)
    pub pixels: Box,
    /// Footprint in physical coordinates
    pub rect: RegionRect,
}

/// Overview of a finished run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BinningSummary {
    pub bins: usize,
    /// Pixels carrying a bin id
    pub binned_pixels: usize,
    /// Pixels inside a bin but excluded from it
    pub invalid_pixels: usize,
    /// Pixels not covered by any bin
    pub unassigned_pixels: usize,
    pub min_area: Option<u64>,
    pub max_area: Option<u64>,
    pub min_snr: Option<f64>,
    pub max_snr: Option<f64>,
}

impl fmt::Display for BinningSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bins over {} pixels", self.bins, self.binned_pixels)?;
        if let (Some(lo), Some(hi)) = (self.min_area, self.max_area) {
            write!(f, ", area {}..{}", lo, hi)?;
        }
        if let (Some(lo), Some(hi)) = (self.min_snr, self.max_snr) {
            write!(f, ", snr {:.3}..{:.3}", lo, hi)?;
        }
        if self.invalid_pixels > 0 {
            write!(f, ", {} invalid pixels", self.invalid_pixels)?;
        }
        Ok(())
    }
}

/// Output grids, bin list and region of a binning run
#[derive(Debug, Clone, PartialEq)]
pub struct BinnedImage {
    width: u32,
    height: u32,
    unit: String,
    cells: Vec<OutputCell>,
    bins: Vec<Bin>,
    region: Region,
}

impl BinnedImage {
    /// Create an empty result for a `width` x `height` image whose values
    /// are in `unit`
    pub fn new(width: u32, height: u32, unit: impl Into<String>) -> Self {
        Self {
            width,
            height,
            unit: unit.into(),
            cells: vec![OutputCell::Unassigned; width as usize * height as usize],
            bins: Vec::new(),
            region: Region::new(),
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

    /// Unit of the value grid
    pub fn unit(&self) -> &str {
        &self.unit
    }

    /// Cell at (x, y), or `None` outside the image
    pub fn cell(&self, x: u32, y: u32) -> Option<&OutputCell> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get(y as usize * self.width as usize + x as usize)
    }

    /// All cells, row-major
    pub fn cells(&self) -> &[OutputCell] {
        &self.cells
    }

    /// Committed bins in commit order
    pub fn bins(&self) -> &[Bin] {
        &self.bins
    }

    /// Bin rectangles in commit order
    pub fn region(&self) -> &Region {
        &self.region
    }

    /// Write `bin` into the grids and append its rectangle to the region
    ///
    /// Every pixel of the bin footprint inside the image becomes either
    /// `Invalid` (null in `nulls`) or `Binned`.
    pub(crate) fn commit(&mut self, bin: Bin, nulls: &NullMask) {
        let binned = OutputCell::Binned {
            value: bin.value as f32,
            area: bin.area,
            snr: bin.snr as f32,
            mask_id: bin.id,
        };
        for (x, y) in bin.pixels.clipped_pixels(self.width, self.height) {
            let idx = y as usize * self.width as usize + x as usize;
            debug_assert_eq!(self.cells[idx], OutputCell::Unassigned, "pixel written twice");
            self.cells[idx] = if nulls.is_null(x, y) {
                OutputCell::Invalid
            } else {
                binned
            };
        }
        self.region.push(bin.rect);
        self.bins.push(bin);
    }

    fn float_grid(&self, f: impl Fn(f32, u64, f32) -> f32) -> Result<FPix> {
        let data = self
            .cells
            .iter()
            .map(|c| match *c {
                OutputCell::Binned {
                    value, area, snr, ..
                } => f(value, area, snr),
                _ => f32::NAN,
            })
            .collect();
        FPix::from_data(self.width, self.height, data)
    }

    /// Bin mean per pixel, in the input unit
    pub fn value_grid(&self) -> Result<FPix> {
        Ok(self
            .float_grid(|value, _, _| value)?
            .with_unit(self.unit.clone()))
    }

    /// Bin area per pixel, in pixels
    pub fn area_grid(&self) -> Result<FPix> {
        Ok(self
            .float_grid(|_, area, _| area as f32)?
            .with_unit(AREA_UNIT))
    }

    /// Bin SNR per pixel
    pub fn snr_grid(&self) -> Result<FPix> {
        self.float_grid(|_, _, snr| snr)
    }

    /// Bin id per pixel, 0 where no bin was written
    pub fn mask_grid(&self) -> Result<UPix> {
        let data = self
            .cells
            .iter()
            .map(|c| c.mask_id().unwrap_or(0))
            .collect();
        UPix::from_data(self.width, self.height, data)
    }

    /// Count pixels and bin extremes
    pub fn summary(&self) -> BinningSummary {
        let mut summary = BinningSummary {
            bins: self.bins.len(),
            ..BinningSummary::default()
        };
        for cell in &self.cells {
            match cell {
                OutputCell::Binned { .. } => summary.binned_pixels += 1,
                OutputCell::Invalid => summary.invalid_pixels += 1,
                OutputCell::Unassigned => summary.unassigned_pixels += 1,
            }
        }
        summary.min_area = self.bins.iter().map(|b| b.area).min();
        summary.max_area = self.bins.iter().map(|b| b.area).max();
        summary.min_snr = self.bins.iter().map(|b| b.snr).reduce(f64::min);
        summary.max_snr = self.bins.iter().map(|b| b.snr).reduce(f64::max);
        summary
    }
}
