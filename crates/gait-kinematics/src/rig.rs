//! ---
//! gait_section: "04-kinematics"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Per-leg data selection and the two-leg skeleton."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use gait_common::{CanvasConfig, SkeletonConfig};

use crate::types::{LegSide, Point2D, Segment};

/// Everything that differs between the two legs: which anchor and which
/// record fields feed the (shared) reconstruction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegRig {
    pub side: LegSide,
    pub anchor: Point2D,
    pub thigh: Segment,
    pub shank: Segment,
}

impl LegRig {
    pub const fn left(anchor: Point2D) -> Self {
        Self {
            side: LegSide::Left,
            anchor,
            thigh: Segment::LeftThigh,
            shank: Segment::LeftShank,
        }
    }

    pub const fn right(anchor: Point2D) -> Self {
        Self {
            side: LegSide::Right,
            anchor,
            thigh: Segment::RightThigh,
            shank: Segment::RightShank,
        }
    }
}

/// Ordered pair of rigs, left first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Skeleton {
    rigs: [LegRig; 2],
}

impl Skeleton {
    pub const fn new(left_anchor: Point2D, right_anchor: Point2D) -> Self {
        Self {
            rigs: [LegRig::left(left_anchor), LegRig::right(right_anchor)],
        }
    }

    pub fn from_config(skeleton: &SkeletonConfig, canvas: &CanvasConfig) -> Self {
        let (left, right) = skeleton.anchors(canvas);
        Self::new(left.into(), right.into())
    }

    pub fn rigs(&self) -> &[LegRig; 2] {
        &self.rigs
    }

    /// Fixed line joining both thigh anchors.
    pub fn reference_line(&self) -> (Point2D, Point2D) {
        (self.rigs[0].anchor, self.rigs[1].anchor)
    }
}
