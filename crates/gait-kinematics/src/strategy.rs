//! ---
//! gait_section: "04-kinematics"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Angle-driven and position-driven leg reconstruction."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
//! Both strategies turn one [`TimestepRecord`] into a [`LegPose`] per leg.
//! The [`LegRig`] decides which record fields and which anchor are used, the
//! math is identical for left and right.
use gait_common::{
    Axis, CanvasConfig, KneeFrame, ReconstructionConfig, ReconstructionMode, SkeletonConfig,
};

use crate::error::GeometryError;
use crate::rig::{LegRig, Skeleton};
use crate::types::{LegPose, LegSide, Point2D, TimestepRecord, Vec3};

pub trait Reconstruct {
    fn name(&self) -> &'static str;

    fn reconstruct(&self, rig: &LegRig, record: &TimestepRecord)
        -> Result<LegPose, GeometryError>;

    /// Reconstruct both legs in skeleton order. The first failing leg is
    /// reported together with its side.
    fn reconstruct_skeleton(
        &self,
        skeleton: &Skeleton,
        record: &TimestepRecord,
    ) -> Result<[LegPose; 2], (LegSide, GeometryError)> {
        let [left, right] = skeleton.rigs();
        let left_pose = self.reconstruct(left, record).map_err(|err| (left.side, err))?;
        let right_pose = self
            .reconstruct(right, record)
            .map_err(|err| (right.side, err))?;
        Ok([left_pose, right_pose])
    }
}

fn checked_length(length: f64) -> Result<f64, GeometryError> {
    if length.is_finite() && length > 0.0 {
        Ok(length)
    } else {
        Err(GeometryError::InvalidLength(length))
    }
}

/// Forward kinematics from segment pitch angles (radians).
///
/// `knee = (T.x - L sin θt, T.y + L cos θt)` and the shank tip follows from
/// the knee the same way with θs. Zero pitch hangs the segment straight down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AngleDriven {
    length: f64,
    thigh_axis: Axis,
    shank_axis: Axis,
}

impl AngleDriven {
    pub fn new(length: f64, thigh_axis: Axis, shank_axis: Axis) -> Result<Self, GeometryError> {
        Ok(Self {
            length: checked_length(length)?,
            thigh_axis,
            shank_axis,
        })
    }

    pub fn length(&self) -> f64 {
        self.length
    }

    pub fn knee(&self, thigh: Point2D, thigh_pitch: f64) -> Point2D {
        Point2D::new(
            thigh.x - self.length * thigh_pitch.sin(),
            thigh.y + self.length * thigh_pitch.cos(),
        )
    }

    pub fn shank_tip(&self, knee: Point2D, shank_pitch: f64) -> Point2D {
        Point2D::new(
            knee.x + self.length * shank_pitch.sin(),
            knee.y + self.length * shank_pitch.cos(),
        )
    }

    fn pitch(sample: Vec3, axis: Axis) -> f64 {
        f64::from(sample.component(axis.index()))
    }
}

impl Reconstruct for AngleDriven {
    fn name(&self) -> &'static str {
        "angle"
    }

    fn reconstruct(
        &self,
        rig: &LegRig,
        record: &TimestepRecord,
    ) -> Result<LegPose, GeometryError> {
        let thigh_pitch = Self::pitch(record.get(rig.thigh), self.thigh_axis);
        let shank_pitch = Self::pitch(record.get(rig.shank), self.shank_axis);
        if !thigh_pitch.is_finite() || !shank_pitch.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        let knee = self.knee(rig.anchor, thigh_pitch);
        Ok(LegPose {
            side: rig.side,
            thigh: rig.anchor,
            knee,
            shank_tip: self.shank_tip(knee, shank_pitch),
        })
    }
}

/// Knee placement from thigh and shank endpoint positions.
///
/// The knee sits on the intersection of two circles of radius `L` centred on
/// the endpoints, on the +y side of the thigh-to-shank axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionDriven {
    length: f64,
    width: f64,
    height: f64,
    knee_frame: KneeFrame,
}

impl PositionDriven {
    pub fn new(
        length: f64,
        canvas: &CanvasConfig,
        knee_frame: KneeFrame,
    ) -> Result<Self, GeometryError> {
        Ok(Self {
            length: checked_length(length)?,
            width: f64::from(canvas.width),
            height: f64::from(canvas.height),
            knee_frame,
        })
    }

    pub fn knee_frame(&self) -> KneeFrame {
        self.knee_frame
    }

    /// Scale a raw sample into canvas coordinates around the canvas centre.
    pub fn to_screen(&self, sample: Vec3) -> Point2D {
        let scale = self.length / 4.0;
        Point2D::new(
            f64::from(sample.x) * scale + self.width / 2.0,
            f64::from(sample.y) * scale + self.height / 2.0,
        )
    }

    pub fn knee(&self, thigh: Point2D, shank: Point2D) -> Result<Point2D, GeometryError> {
        if !thigh.is_finite() || !shank.is_finite() {
            return Err(GeometryError::NonFinite);
        }
        let delta = shank - thigh;
        let distance = delta.norm();
        let reach = 2.0 * self.length;
        if distance == 0.0 {
            return Err(GeometryError::CoincidentEndpoints);
        }
        if distance > reach {
            return Err(GeometryError::Unreachable { distance, reach });
        }
        let x_local = distance / 2.0;
        // Rounding can push the radicand just below zero at full reach.
        let y_local = (self.length * self.length - x_local * x_local)
            .max(0.0)
            .sqrt();
        let offset = match self.knee_frame {
            KneeFrame::Rotated => {
                let (sin, cos) = delta.y.atan2(delta.x).sin_cos();
                Point2D::new(
                    x_local * cos - y_local * sin,
                    x_local * sin + y_local * cos,
                )
            }
            KneeFrame::Local => Point2D::new(x_local, y_local),
        };
        Ok(thigh + offset)
    }
}

impl Reconstruct for PositionDriven {
    fn name(&self) -> &'static str {
        "position"
    }

    fn reconstruct(
        &self,
        rig: &LegRig,
        record: &TimestepRecord,
    ) -> Result<LegPose, GeometryError> {
        let thigh = self.to_screen(record.get(rig.thigh));
        let shank_tip = self.to_screen(record.get(rig.shank));
        let knee = self.knee(thigh, shank_tip)?;
        Ok(LegPose {
            side: rig.side,
            thigh,
            knee,
            shank_tip,
        })
    }
}

/// The configured strategy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reconstructor {
    Angle(AngleDriven),
    Position(PositionDriven),
}

impl Reconstructor {
    pub fn from_config(
        reconstruction: &ReconstructionConfig,
        skeleton: &SkeletonConfig,
        canvas: &CanvasConfig,
    ) -> Result<Self, GeometryError> {
        Ok(match reconstruction.mode {
            ReconstructionMode::Angle => Reconstructor::Angle(AngleDriven::new(
                skeleton.segment_length,
                reconstruction.thigh_pitch_axis,
                reconstruction.shank_pitch_axis,
            )?),
            ReconstructionMode::Position => Reconstructor::Position(PositionDriven::new(
                skeleton.segment_length,
                canvas,
                reconstruction.knee_frame,
            )?),
        })
    }
}

impl Reconstruct for Reconstructor {
    fn name(&self) -> &'static str {
        match self {
            Reconstructor::Angle(inner) => inner.name(),
            Reconstructor::Position(inner) => inner.name(),
        }
    }

    fn reconstruct(
        &self,
        rig: &LegRig,
        record: &TimestepRecord,
    ) -> Result<LegPose, GeometryError> {
        match self {
            Reconstructor::Angle(inner) => inner.reconstruct(rig, record),
            Reconstructor::Position(inner) => inner.reconstruct(rig, record),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Segment;
    use proptest::prelude::*;

    const L: f64 = 70.0;

    fn assert_close(actual: Point2D, expected: Point2D) {
        assert_within(actual, expected, 1e-9);
    }

    fn assert_within(actual: Point2D, expected: Point2D, tolerance: f64) {
        assert!(
            actual.distance(expected) < tolerance,
            "expected {expected}, got {actual}"
        );
    }

    fn angle() -> AngleDriven {
        AngleDriven::new(L, Axis::X, Axis::Z).expect("valid length")
    }

    fn position(knee_frame: KneeFrame) -> PositionDriven {
        PositionDriven::new(L, &CanvasConfig::default(), knee_frame).expect("valid length")
    }

    #[test]
    fn zero_pitch_hangs_leg_straight_down() {
        let rig = LegRig::left(Point2D::new(315.0, 240.0));
        let pose = angle()
            .reconstruct(&rig, &TimestepRecord::default())
            .expect("finite record");
        assert_close(pose.thigh, Point2D::new(315.0, 240.0));
        assert_close(pose.knee, Point2D::new(315.0, 310.0));
        assert_close(pose.shank_tip, Point2D::new(315.0, 380.0));
    }

    #[test]
    fn pitch_axes_select_record_components() {
        let rig = LegRig::right(Point2D::new(0.0, 0.0));
        let half_pi = std::f32::consts::FRAC_PI_2;
        let record = TimestepRecord::new(
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::new(half_pi, 1.0, 1.0),
            Vec3::new(1.0, 1.0, half_pi),
        );
        let pose = angle().reconstruct(&rig, &record).expect("finite record");
        // f32 pitch leaves a few micro-pixels of cosine residue.
        assert_within(pose.knee, Point2D::new(-L, 0.0), 1e-4);
        assert_within(pose.shank_tip, Point2D::new(0.0, 0.0), 1e-4);
    }

    #[test]
    fn angle_strategy_rejects_nan_pitch() {
        let rig = LegRig::left(Point2D::new(0.0, 0.0));
        let record = TimestepRecord::new(
            Vec3::new(f32::NAN, 0.0, 0.0),
            Vec3::ZERO,
            Vec3::ZERO,
            Vec3::ZERO,
        );
        assert_eq!(
            angle().reconstruct(&rig, &record),
            Err(GeometryError::NonFinite)
        );
    }

    #[test]
    fn non_positive_length_is_rejected() {
        assert_eq!(
            AngleDriven::new(0.0, Axis::X, Axis::Z),
            Err(GeometryError::InvalidLength(0.0))
        );
        assert!(PositionDriven::new(-1.0, &CanvasConfig::default(), KneeFrame::Rotated).is_err());
    }

    #[test]
    fn to_screen_scales_around_canvas_centre() {
        let screen = position(KneeFrame::Rotated).to_screen(Vec3::new(4.0, -4.0, 9.0));
        assert_close(screen, Point2D::new(320.0 + L, 240.0 - L));
    }

    #[test]
    fn coincident_endpoints_fail() {
        let p = Point2D::new(10.0, 10.0);
        assert_eq!(
            position(KneeFrame::Rotated).knee(p, p),
            Err(GeometryError::CoincidentEndpoints)
        );
    }

    #[test]
    fn unreachable_endpoints_fail() {
        let result = position(KneeFrame::Rotated)
            .knee(Point2D::new(0.0, 0.0), Point2D::new(0.0, 2.0 * L + 1.0));
        match result {
            Err(GeometryError::Unreachable { distance, reach }) => {
                assert_eq!(distance, 2.0 * L + 1.0);
                assert_eq!(reach, 2.0 * L);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn full_reach_places_knee_at_midpoint() {
        let knee = position(KneeFrame::Rotated)
            .knee(Point2D::new(0.0, 0.0), Point2D::new(0.0, 2.0 * L))
            .expect("reachable");
        assert_close(knee, Point2D::new(0.0, L));
    }

    #[test]
    fn rotated_knee_bends_forward_for_hanging_leg() {
        let thigh = Point2D::new(100.0, 100.0);
        let shank = Point2D::new(100.0, 200.0);
        let knee = position(KneeFrame::Rotated)
            .knee(thigh, shank)
            .expect("reachable");
        assert!(knee.x < thigh.x);
        assert!((knee.y - 150.0).abs() < 1e-9);
    }

    #[test]
    fn local_frame_ignores_axis_direction() {
        let thigh = Point2D::new(100.0, 100.0);
        let shank = Point2D::new(100.0, 200.0);
        let knee = position(KneeFrame::Local)
            .knee(thigh, shank)
            .expect("reachable");
        let y_local = (L * L - 50.0 * 50.0).sqrt();
        assert_close(knee, Point2D::new(150.0, 100.0 + y_local));
    }

    #[test]
    fn position_strategy_reads_rig_fields() {
        let rig = LegRig::right(Point2D::new(0.0, 0.0));
        let record = TimestepRecord::from_fn(|segment| match segment {
            Segment::RightThigh => Vec3::new(0.0, -1.0, 0.0),
            Segment::RightShank => Vec3::new(0.0, 1.0, 0.0),
            _ => Vec3::ZERO,
        });
        let pose = position(KneeFrame::Rotated)
            .reconstruct(&rig, &record)
            .expect("reachable");
        assert_eq!(pose.side, LegSide::Right);
        assert_close(pose.thigh, Point2D::new(320.0, 240.0 - L / 4.0));
        assert_close(pose.shank_tip, Point2D::new(320.0, 240.0 + L / 4.0));
    }

    #[test]
    fn skeleton_failure_reports_side() {
        let skeleton = Skeleton::new(Point2D::new(0.0, 0.0), Point2D::new(10.0, 0.0));
        let strategy = Reconstructor::Position(position(KneeFrame::Rotated));
        let record = TimestepRecord::from_fn(|segment| match segment {
            Segment::LeftShank => Vec3::new(0.0, 1.0, 0.0),
            _ => Vec3::ZERO,
        });
        let result = strategy.reconstruct_skeleton(&skeleton, &record);
        assert_eq!(
            result,
            Err((LegSide::Right, GeometryError::CoincidentEndpoints))
        );
    }

    #[test]
    fn from_config_picks_strategy() {
        let mut reconstruction = ReconstructionConfig::default();
        let skeleton = SkeletonConfig::default();
        let canvas = CanvasConfig::default();
        let strategy = Reconstructor::from_config(&reconstruction, &skeleton, &canvas)
            .expect("defaults are valid");
        assert_eq!(strategy.name(), "angle");
        reconstruction.mode = ReconstructionMode::Position;
        let strategy = Reconstructor::from_config(&reconstruction, &skeleton, &canvas)
            .expect("defaults are valid");
        assert_eq!(strategy.name(), "position");
    }

    proptest! {
        #[test]
        fn rotated_knee_is_one_segment_from_both_endpoints(
            tx in -500.0f64..500.0,
            ty in -500.0f64..500.0,
            angle in -std::f64::consts::PI..std::f64::consts::PI,
            fraction in 0.001f64..=1.0,
        ) {
            let distance = 2.0 * L * fraction;
            let thigh = Point2D::new(tx, ty);
            let shank = thigh + Point2D::new(distance * angle.cos(), distance * angle.sin());
            prop_assume!(thigh.distance(shank) <= 2.0 * L);
            let knee = position(KneeFrame::Rotated).knee(thigh, shank).expect("reachable");
            prop_assert!((knee.distance(thigh) - L).abs() < 1e-6);
            prop_assert!((knee.distance(shank) - L).abs() < 1e-6);
        }
    }
}
