//! RegionRect, Region - Rectangles in physical coordinates
//!
//! A [`Region`] is the vector description of a binning run: one
//! [`RegionRect`] per committed bin, kept in commit order. Rectangles are
//! stored by two opposite corners in physical units, so they stay exact
//! under any axis-aligned coordinate transform (including ones with a
//! negative scale).
//!
//! See [`serial`] for the text region format.

pub mod serial;

/// Axis-aligned rectangle given by two opposite corners
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RegionRect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl RegionRect {
    /// Create a rectangle from two opposite corners
    pub const fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    /// Extent along x (always non-negative)
    #[inline]
    pub fn width(&self) -> f64 {
        (self.x1 - self.x0).abs()
    }

    /// Extent along y (always non-negative)
    #[inline]
    pub fn height(&self) -> f64 {
        (self.y1 - self.y0).abs()
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }
}

/// Ordered list of rectangles, one per committed bin
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Region {
    rects: Vec<RegionRect>,
}

impl Region {
    /// Create a new empty region
    pub fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Number of rectangles
    #[inline]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Get a rectangle by index
    pub fn get(&self, index: usize) -> Option<&RegionRect> {
        self.rects.get(index)
    }

    /// Append a rectangle
    pub fn push(&mut self, rect: RegionRect) {
        self.rects.push(rect);
    }

    /// All rectangles in commit order
    pub fn rects(&self) -> &[RegionRect] {
        &self.rects
    }

    /// Sum of the rectangle areas
    pub fn total_area(&self) -> f64 {
        self.rects.iter().map(RegionRect::area).sum()
    }
}

impl FromIterator<RegionRect> for Region {
    fn from_iter<T: IntoIterator<Item = RegionRect>>(iter: T) -> Self {
        Self {
            rects: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_geometry_any_corner_order() {
        let r = RegionRect::from_corners(4.5, 2.5, 0.5, -0.5);
        assert_eq!(r.width(), 4.0);
        assert_eq!(r.height(), 3.0);
        assert_eq!(r.area(), 12.0);
    }

    #[test]
    fn test_region_keeps_push_order() {
        let mut region = Region::new();
        region.push(RegionRect::from_corners(2.0, 2.0, 3.0, 3.0));
        region.push(RegionRect::from_corners(0.0, 0.0, 1.0, 1.0));
        assert_eq!(region.len(), 2);
        assert_eq!(region.get(0).unwrap().x0, 2.0);
        assert_eq!(region.get(1).unwrap().x0, 0.0);
    }

    #[test]
    fn test_region_total_area() {
        let region: Region = [
            RegionRect::from_corners(-0.5, -0.5, 1.5, 1.5),
            RegionRect::from_corners(3.5, 1.5, 1.5, -0.5),
        ]
        .into_iter()
        .collect();
        assert_eq!(region.total_area(), 8.0);
        assert_eq!(Region::new().total_area(), 0.0);
    }
}
