//! Nautilus Core - Basic data structures for adaptive binning
//!
//! This crate provides the fundamental data structures shared by the
//! binning engine and its I/O collaborators:
//!
//! - [`FPix`] - Floating-point image (pixel values, errors, output grids)
//! - [`UPix`] - Unsigned 32-bit label image (bin mask ids)
//! - [`NullMask`] - Per-pixel validity flags
//! - [`Box`] - Integer pixel rectangle
//! - [`RegionRect`] / [`Region`] - Rectangles in physical coordinates

pub mod box_;
pub mod error;
pub mod fpix;
pub mod mask;
pub mod region;

pub use box_::Box;
pub use error::{Error, Result};
pub use fpix::{FPix, MAX_PIXELS, UPix, check_dimensions};
pub use mask::NullMask;
pub use region::{Region, RegionRect};
