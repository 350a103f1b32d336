//! ---
//! gait_section: "04-kinematics"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Record and pose data model."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use std::fmt;
use std::ops::{Add, Sub};

/// One sensor sample for a limb segment (12 bytes on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn component(self, index: usize) -> f32 {
        match index {
            0 => self.x,
            1 => self.y,
            _ => self.z,
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl From<[f32; 3]> for Vec3 {
    fn from(value: [f32; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

/// Screen-space coordinate. Origin top-left, y grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2D {
    pub x: f64,
    pub y: f64,
}

impl Point2D {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Self) -> f64 {
        (self - other).norm()
    }

    pub fn norm(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<[f64; 2]> for Point2D {
    fn from(value: [f64; 2]) -> Self {
        Self::new(value[0], value[1])
    }
}

impl Add for Point2D {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Point2D {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl fmt::Display for Point2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.2}, {:.2})", self.x, self.y)
    }
}

/// Limb segment identity. `Segment::ALL` is the canonical (and wire) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    LeftThigh,
    LeftShank,
    RightThigh,
    RightShank,
}

impl Segment {
    pub const ALL: [Segment; 4] = [
        Segment::LeftThigh,
        Segment::LeftShank,
        Segment::RightThigh,
        Segment::RightShank,
    ];

    pub const fn index(self) -> usize {
        match self {
            Segment::LeftThigh => 0,
            Segment::LeftShank => 1,
            Segment::RightThigh => 2,
            Segment::RightShank => 3,
        }
    }

    /// Short label used by the recorded datasets (`LT`, `LS`, `RT`, `RS`).
    pub const fn label(self) -> &'static str {
        match self {
            Segment::LeftThigh => "LT",
            Segment::LeftShank => "LS",
            Segment::RightThigh => "RT",
            Segment::RightShank => "RS",
        }
    }
}

/// All four segment samples of one timestep.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimestepRecord {
    vectors: [Vec3; 4],
}

impl TimestepRecord {
    pub const fn new(left_thigh: Vec3, left_shank: Vec3, right_thigh: Vec3, right_shank: Vec3) -> Self {
        Self {
            vectors: [left_thigh, left_shank, right_thigh, right_shank],
        }
    }

    /// Build a record by asking for each segment in canonical order.
    pub fn from_fn(mut f: impl FnMut(Segment) -> Vec3) -> Self {
        Self {
            vectors: Segment::ALL.map(&mut f),
        }
    }

    pub fn get(&self, segment: Segment) -> Vec3 {
        self.vectors[segment.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Segment, Vec3)> + '_ {
        Segment::ALL.into_iter().map(|segment| (segment, self.get(segment)))
    }

    pub fn is_finite(&self) -> bool {
        self.vectors.iter().all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegSide {
    Left,
    Right,
}

impl LegSide {
    pub const fn as_str(self) -> &'static str {
        match self {
            LegSide::Left => "left",
            LegSide::Right => "right",
        }
    }
}

/// Reconstructed joint positions of one leg for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegPose {
    pub side: LegSide,
    pub thigh: Point2D,
    pub knee: Point2D,
    pub shank_tip: Point2D,
}

impl LegPose {
    /// Thigh-to-knee and knee-to-shank segments, in drawing order.
    pub fn segments(&self) -> [(Point2D, Point2D); 2] {
        [(self.thigh, self.knee), (self.knee, self.shank_tip)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_accessors_follow_segment_identity() {
        let record = TimestepRecord::new(
            Vec3::new(1.0, 2.0, 3.0),
            Vec3::new(4.0, 5.0, 6.0),
            Vec3::new(7.0, 8.0, 9.0),
            Vec3::new(10.0, 11.0, 12.0),
        );
        assert_eq!(record.get(Segment::LeftShank), Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(record.get(Segment::RightShank).z, 12.0);
        let labels: Vec<_> = record.iter().map(|(s, _)| s.label()).collect();
        assert_eq!(labels, ["LT", "LS", "RT", "RS"]);
    }

    #[test]
    fn from_fn_visits_canonical_order() {
        let record = TimestepRecord::from_fn(|segment| {
            let base = segment.index() as f32;
            Vec3::new(base, base, base)
        });
        assert_eq!(record.get(Segment::RightThigh), Vec3::new(2.0, 2.0, 2.0));
    }

    #[test]
    fn point_distance_is_euclidean() {
        let a = Point2D::new(0.0, 0.0);
        let b = Point2D::new(3.0, 4.0);
        assert_eq!(a.distance(b), 5.0);
        assert_eq!((b - a) + a, b);
    }

    #[test]
    fn non_finite_components_are_detected() {
        let record = TimestepRecord::new(
            Vec3::ZERO,
            Vec3::new(f32::NAN, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::ZERO,
        );
        assert!(!record.is_finite());
        assert!(TimestepRecord::default().is_finite());
    }
}
