//! Box - Integer pixel rectangle
//!
//! A `Box` describes a rectangle of pixels by its lower-left corner and
//! its size. During binning it is the quad-tree node under consideration
//! and, once committed, the pixel footprint of a bin. A box may extend past
//! the image; [`Box::clip`] restricts it to the image extent.

use crate::error::{Error, Result};

/// A rectangle of pixels
///
/// Small and frequently copied, so it is a plain `Copy` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Box {
    /// Left x coordinate
    pub x: i32,
    /// Lower y coordinate
    pub y: i32,
    /// Width
    pub w: i32,
    /// Height
    pub h: i32,
}

impl Box {
    /// Create a box without validation
    pub const fn new_unchecked(x: i32, y: i32, w: i32, h: i32) -> Self {
        Self { x, y, w, h }
    }

    /// Box covering a whole `width` x `height` image
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidDimension` if a side does not fit in `i32`.
    pub fn covering(width: u32, height: u32) -> Result<Self> {
        let invalid = || Error::InvalidDimension { width, height };
        Ok(Self {
            x: 0,
            y: 0,
            w: i32::try_from(width).map_err(|_| invalid())?,
            h: i32::try_from(height).map_err(|_| invalid())?,
        })
    }

    /// Get the right x coordinate (exclusive)
    #[inline]
    pub fn right(&self) -> i32 {
        self.x + self.w
    }

    /// Get the upper y coordinate (exclusive)
    #[inline]
    pub fn top(&self) -> i32 {
        self.y + self.h
    }

    /// Clip the box to fit within a `width` x `height` image
    ///
    /// Returns `None` when nothing of the box lies inside the image.
    pub fn clip(&self, width: u32, height: u32) -> Option<Box> {
        let x = self.x.max(0);
        let y = self.y.max(0);
        let right = self.right().min(width as i32);
        let top = self.top().min(height as i32);

        if x < right && y < top {
            Some(Box {
                x,
                y,
                w: right - x,
                h: top - y,
            })
        } else {
            None
        }
    }

    /// Iterate over the `(x, y)` pixel indices of the box that lie inside a
    /// `width` x `height` image, row by row.
    pub fn clipped_pixels(&self, width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
        let clipped = self.clip(width, height);
        clipped.into_iter().flat_map(|b| {
            (b.y..b.top()).flat_map(move |y| (b.x..b.right()).map(move |x| (x as u32, y as u32)))
        })
    }
}
