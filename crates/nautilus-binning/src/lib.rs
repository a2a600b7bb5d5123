//! nautilus-binning - Quad-tree adaptive SNR binning
//!
//! Partitions an image into rectangular bins whose aggregated
//! signal-to-noise ratio meets a target, using a quad-tree that keeps
//! splitting while a [`SplitPolicy`] allows it.
//!
//! # Overview
//!
//! - [`snr`] - statistics of the valid pixels in a rectangle
//! - [`policy`] - quadrant construction and the five split rules
//! - [`engine`] - the quad-tree walk ([`Partitioner`])
//! - [`output`] - output cells, bins, grids and run summary
//! - [`coords`] - pixel to physical coordinate transforms
//!
//! # Example
//!
//! ```
//! use nautilus_binning::{BinningParams, IdentityTransform, SplitPolicy, bin_image};
//! use nautilus_core::{FPix, NullMask};
//!
//! let values = FPix::new_with_value(4, 4, 100.0).unwrap();
//! let errors = FPix::new_with_value(4, 4, 1.0).unwrap();
//! let nulls = NullMask::new(4, 4).unwrap();
//! let params = BinningParams::new(1000.0, SplitPolicy::ZeroAbove).unwrap();
//!
//! let binned = bin_image(&values, &errors, &nulls, &IdentityTransform, params).unwrap();
//! assert_eq!(binned.bins().len(), 1);
//! assert_eq!(binned.bins()[0].snr, 400.0);
//! ```

pub mod coords;
pub mod engine;
pub mod error;
pub mod output;
pub mod policy;
pub mod snr;

pub use coords::{AxisTransform, CoordTransform, IdentityTransform, LinearTransform};
pub use engine::{BinningParams, Partitioner};
pub use error::{BinningError, BinningResult};
pub use output::{AREA_UNIT, Bin, BinnedImage, BinningSummary, OutputCell};
pub use policy::{SplitPolicy, quadrants};
pub use snr::{RectStats, SnrEvaluator};

use nautilus_core::{FPix, NullMask};

/// Bin `values` in a single call
///
/// `errors` holds the 1-sigma error of every pixel and `nulls` the pixels
/// to leave out; both must match `values` in size.
pub fn bin_image(
    values: &FPix,
    errors: &FPix,
    nulls: &NullMask,
    transform: &dyn CoordTransform,
    params: BinningParams,
) -> BinningResult<BinnedImage> {
    let eval = SnrEvaluator::new(values, errors, nulls)?;
    Ok(Partitioner::new(eval, transform, params)?.run())
}
