//! Quad-tree partition engine
//!
//! Starting from the whole image, every node is either split into its four
//! quadrants or committed as a bin. Quadrants are visited in the order LL,
//! LR, UL, UR, depth first; this order fixes the bin ids and the order of
//! the region list.
//!
//! The traversal uses an explicit work stack instead of recursion. Children
//! are pushed in reverse so they are popped in the order above, which
//! reproduces a recursive pre-order walk exactly.

use crate::coords::CoordTransform;
use crate::error::{BinningError, BinningResult};
use crate::output::{Bin, BinnedImage};
use crate::policy::{SplitPolicy, quadrants};
use crate::snr::SnrEvaluator;
use nautilus_core::{Box, RegionRect};
use tracing::{debug, trace, warn};

/// Parameters of one binning run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinningParams {
    /// Target SNR
    pub threshold: f64,
    /// Split rule
    pub policy: SplitPolicy,
}

impl BinningParams {
    /// # Errors
    ///
    /// Returns `BinningError::InvalidThreshold` unless `threshold` is
    /// positive. `+inf` is accepted.
    pub fn new(threshold: f64, policy: SplitPolicy) -> BinningResult<Self> {
        let params = Self { threshold, policy };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> BinningResult<()> {
        if !(self.threshold > 0.0) {
            return Err(BinningError::InvalidThreshold(self.threshold));
        }
        Ok(())
    }
}

/// Traversal context of a single run
///
/// Owns the output grids, the id counter and the region list while the
/// quad-tree is walked; the inputs are only borrowed.
pub struct Partitioner<'a> {
    eval: SnrEvaluator<'a>,
    transform: &'a dyn CoordTransform,
    params: BinningParams,
    root: Box,
    next_id: u32,
    splits: usize,
    empty_leaves: usize,
    output: BinnedImage,
}

impl<'a> Partitioner<'a> {
    pub fn new(
        eval: SnrEvaluator<'a>,
        transform: &'a dyn CoordTransform,
        params: BinningParams,
    ) -> BinningResult<Self> {
        params.validate()?;
        let (width, height) = eval.dimensions();
        let root = Box::covering(width, height)?;
        let output = BinnedImage::new(width, height, eval.values().unit());
        Ok(Self {
            eval,
            transform,
            params,
            root,
            next_id: 1,
            splits: 0,
            empty_leaves: 0,
            output,
        })
    }

    /// Walk the quad-tree and return the finished output
    pub fn run(mut self) -> BinnedImage {
        let (width, height) = self.eval.dimensions();
        if self.eval.nulls().all_null() {
            warn!(width, height, "every pixel is null; no bins will be produced");
        }

        let mut stack = vec![self.root];
        while let Some(node) = stack.pop() {
            if self.should_split(node) {
                self.splits += 1;
                trace!(x = node.x, y = node.y, w = node.w, h = node.h, "split");
                let [ll, lr, ul, ur] = quadrants(node);
                stack.extend([ur, ul, lr, ll]);
            } else {
                self.commit(node);
            }
        }

        debug!(
            bins = self.output.bins().len(),
            splits = self.splits,
            empty_leaves = self.empty_leaves,
            valid_pixels = self.eval.nulls().count_valid(),
            region_area = self.output.region().total_area(),
            "quad-tree walk finished"
        );
        self.output
    }

    fn should_split(&self, node: Box) -> bool {
        node.w > 1
            && node.h > 1
            && self
                .params
                .policy
                .should_split(node, self.params.threshold, &self.eval)
    }

    /// Turn a leaf into a bin; leaves without valid pixels are dropped
    fn commit(&mut self, node: Box) {
        let stats = self.eval.evaluate(node);
        let Some(value) = stats.mean() else {
            self.empty_leaves += 1;
            return;
        };

        let id = self.next_id;
        self.next_id += 1;

        let (x0, y0) = self
            .transform
            .to_physical(node.x as f64 - 0.5, node.y as f64 - 0.5);
        let (x1, y1) = self
            .transform
            .to_physical(node.right() as f64 - 0.5, node.top() as f64 - 0.5);

        trace!(
            id,
            x = node.x,
            y = node.y,
            w = node.w,
            h = node.h,
            area = stats.area,
            snr = stats.snr,
            "commit"
        );
        let bin = Bin {
            id,
            value,
            area: stats.area,
            snr: stats.snr,
            pixels: node,
            rect: RegionRect::from_corners(x0, y0, x1, y1),
        };
        self.output.commit(bin, self.eval.nulls());
    }
}
