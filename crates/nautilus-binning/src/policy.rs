//! Split policies
//!
//! A node `(x, y, w, h)` is divided into four quadrants:
//!
//! | Quadrant | Origin                | Size             |
//! |----------|-----------------------|------------------|
//! | LL       | `(x, y)`              | `(w/2, h/2)`     |
//! | LR       | `(x + w/2, y)`        | `(w - w/2, h/2)` |
//! | UL       | `(x, y + h/2)`        | `(w/2, h - h/2)` |
//! | UR       | `(x + w/2, y + h/2)`  | `(w - w/2, h - h/2)` |
//!
//! with integer division, so an odd extent always leaves the larger half
//! on the upper/right side.
//!
//! Policy 0 looks at the node itself. Policies 1 to 4 look at the four
//! quadrants: a quadrant *qualifies* when its SNR reaches the threshold or
//! when it holds no valid pixel, and the node is split when enough
//! quadrants qualify.

use crate::error::{BinningError, BinningResult};
use crate::snr::{RectStats, SnrEvaluator};
use nautilus_core::Box;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Quadrant indices in traversal order
pub const LOWER_LEFT: usize = 0;
pub const LOWER_RIGHT: usize = 1;
pub const UPPER_LEFT: usize = 2;
pub const UPPER_RIGHT: usize = 3;

/// Split `node` into its LL, LR, UL, UR quadrants
pub fn quadrants(node: Box) -> [Box; 4] {
    let lw = node.w / 2;
    let lh = node.h / 2;
    let uw = node.w - lw;
    let uh = node.h - lh;
    [
        Box::new_unchecked(node.x, node.y, lw, lh),
        Box::new_unchecked(node.x + lw, node.y, uw, lh),
        Box::new_unchecked(node.x, node.y + lh, lw, uh),
        Box::new_unchecked(node.x + lw, node.y + lh, uw, uh),
    ]
}

/// Rule deciding whether a quad-tree node is split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(try_from = "PolicySelector")]
pub enum SplitPolicy {
    /// Split while the node itself is above the threshold
    #[default]
    ZeroAbove,
    /// Split if at least one quadrant qualifies
    OneAbove,
    /// Split if two side-by-side quadrants qualify
    TwoAbove,
    /// Split if at least three quadrants qualify
    ThreeAbove,
    /// Split only if all four quadrants qualify
    AllAbove,
}

impl SplitPolicy {
    /// All policies, indexed by selector
    pub const ALL: [SplitPolicy; 5] = [
        SplitPolicy::ZeroAbove,
        SplitPolicy::OneAbove,
        SplitPolicy::TwoAbove,
        SplitPolicy::ThreeAbove,
        SplitPolicy::AllAbove,
    ];

    /// Numeric selector (0-4)
    pub fn selector(self) -> u8 {
        self as u8
    }

    /// Short name, e.g. `one-above`
    pub fn name(self) -> &'static str {
        match self {
            SplitPolicy::ZeroAbove => "zero-above",
            SplitPolicy::OneAbove => "one-above",
            SplitPolicy::TwoAbove => "two-above",
            SplitPolicy::ThreeAbove => "three-above",
            SplitPolicy::AllAbove => "all-above",
        }
    }

    /// Decide from the statistics of the four quadrants
    ///
    /// Not meaningful for [`SplitPolicy::ZeroAbove`], which ignores the
    /// quadrants; it returns `false` there.
    pub fn decide(self, children: &[RectStats; 4], threshold: f64) -> bool {
        let total_area: u64 = children.iter().map(|c| c.area).sum();
        if total_area == 0 {
            return false;
        }

        let q = children.map(|c| c.snr >= threshold || c.area == 0);
        let count = q.iter().filter(|&&b| b).count();

        match self {
            SplitPolicy::ZeroAbove => false,
            SplitPolicy::OneAbove => count >= 1,
            SplitPolicy::TwoAbove => {
                (q[LOWER_LEFT] && q[LOWER_RIGHT])
                    || (q[LOWER_RIGHT] && q[UPPER_RIGHT])
                    || (q[UPPER_RIGHT] && q[UPPER_LEFT])
                    || (q[UPPER_LEFT] && q[LOWER_LEFT])
            }
            SplitPolicy::ThreeAbove => count >= 3,
            SplitPolicy::AllAbove => count == 4,
        }
    }

    /// Whether `node` should be split under this policy
    ///
    /// The caller still has to refuse splitting nodes that are one pixel
    /// wide or tall.
    pub fn should_split(self, node: Box, threshold: f64, eval: &SnrEvaluator<'_>) -> bool {
        match self {
            SplitPolicy::ZeroAbove => eval.evaluate(node).snr > threshold,
            _ => {
                let children = quadrants(node).map(|q| eval.evaluate(q));
                self.decide(&children, threshold)
            }
        }
    }
}

impl TryFrom<i64> for SplitPolicy {
    type Error = BinningError;

    fn try_from(value: i64) -> BinningResult<Self> {
        usize::try_from(value)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
            .ok_or(BinningError::InvalidPolicy(value))
    }
}

impl FromStr for SplitPolicy {
    type Err = BinningError;

    /// Accepts a selector (`"0"`..`"4"`) or a name such as `one-above`,
    /// `one_above` or `OneAbove`.
    fn from_str(s: &str) -> BinningResult<Self> {
        let s = s.trim();
        if let Ok(n) = s.parse::<i64>() {
            return Self::try_from(n);
        }
        let key: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .collect::<String>()
            .to_ascii_lowercase();
        match key.as_str() {
            "zeroabove" => Ok(SplitPolicy::ZeroAbove),
            "oneabove" => Ok(SplitPolicy::OneAbove),
            "twoabove" => Ok(SplitPolicy::TwoAbove),
            "threeabove" => Ok(SplitPolicy::ThreeAbove),
            "allabove" | "fourabove" => Ok(SplitPolicy::AllAbove),
            _ => Err(BinningError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for SplitPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Serialized form of a policy: selector or name
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PolicySelector {
    Number(i64),
    Name(String),
}

impl TryFrom<PolicySelector> for SplitPolicy {
    type Error = BinningError;

    fn try_from(value: PolicySelector) -> BinningResult<Self> {
        match value {
            PolicySelector::Number(n) => Self::try_from(n),
            PolicySelector::Name(s) => s.parse(),
        }
    }
}
