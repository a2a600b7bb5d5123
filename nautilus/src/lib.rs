//! Nautilus - Quad-tree adaptive SNR binning for Rust
//!
//! Partitions a 2-D image into rectangular bins, each holding enough signal
//! to reach a target signal-to-noise ratio. Bright areas keep their
//! resolution, faint areas are merged into larger bins.
//!
//! # Overview
//!
//! - [`binning`] - the quad-tree engine and its split policies
//! - [`io`] - image, mask and region file formats
//! - [`run()`] - a complete file-to-file run driven by [`RunParams`]
//!
//! # Example
//!
//! ```
//! use nautilus::binning::{BinningParams, IdentityTransform, SplitPolicy, bin_image};
//! use nautilus::{FPix, NullMask};
//!
//! let values = FPix::new_with_value(8, 8, 25.0).unwrap();
//! let errors = values.map(f32::sqrt);
//! let nulls = NullMask::new(8, 8).unwrap();
//! let params = BinningParams::new(10.0, SplitPolicy::OneAbove).unwrap();
//!
//! let binned = bin_image(&values, &errors, &nulls, &IdentityTransform, params).unwrap();
//! assert_eq!(binned.bins().len(), 16);
//! ```

// Re-export core types (primary data structures used everywhere)
pub use nautilus_core::*;

// Re-export domain crates as modules to avoid name conflicts
pub use nautilus_binning as binning;
pub use nautilus_io as io;

pub mod error;
pub mod params;
pub mod run;

pub use error::{RunError, RunResult};
pub use nautilus_binning::{BinningSummary, LinearTransform, SplitPolicy};
pub use params::{OutputPaths, RunConfig, RunParams};
pub use run::{check_outputs, run};
