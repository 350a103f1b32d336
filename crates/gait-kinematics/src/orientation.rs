//! ---
//! gait_section: "04-kinematics"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Quaternion to Euler angle conversion for orientation datasets."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
pub use gait_common::EulerSequence;
use nalgebra::{Quaternion, UnitQuaternion};

use crate::types::{Segment, TimestepRecord, Vec3};

const GIMBAL_EPSILON: f64 = 1e-9;

/// Convert a quaternion given as `(x, y, z, w)` into Euler angles in degrees.
///
/// Zero-norm or non-finite input cannot be normalised and maps to
/// `[0.0, 0.0, 0.0]`.
pub fn quaternion_to_euler_degrees(quaternion: [f64; 4], sequence: EulerSequence) -> [f64; 3] {
    let [x, y, z, w] = quaternion;
    let raw = Quaternion::new(w, x, y, z);
    let norm = raw.norm();
    if !norm.is_finite() || norm == 0.0 {
        return [0.0; 3];
    }
    let unit = UnitQuaternion::from_quaternion(raw);
    let radians = match sequence {
        EulerSequence::IntrinsicXyz => intrinsic_xyz(&unit),
        EulerSequence::ExtrinsicXyz => {
            let (roll, pitch, yaw) = unit.euler_angles();
            [roll, pitch, yaw]
        }
    };
    radians.map(f64::to_degrees)
}

// R = Rx(a) * Ry(b) * Rz(c)
fn intrinsic_xyz(unit: &UnitQuaternion<f64>) -> [f64; 3] {
    let rotation = unit.to_rotation_matrix();
    let m = rotation.matrix();
    let sin_b = m[(0, 2)].clamp(-1.0, 1.0);
    let b = sin_b.asin();
    if 1.0 - sin_b.abs() < GIMBAL_EPSILON {
        let a = m[(2, 1)].atan2(m[(1, 1)]);
        return [a, b, 0.0];
    }
    let a = (-m[(1, 2)]).atan2(m[(2, 2)]);
    let c = (-m[(0, 1)]).atan2(m[(0, 0)]);
    [a, b, c]
}

/// One timestep of segment orientations, quaternions stored `(x, y, z, w)`
/// in `Segment::ALL` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientationRecord {
    quaternions: [[f64; 4]; 4],
}

impl OrientationRecord {
    pub fn from_fn(mut f: impl FnMut(Segment) -> [f64; 4]) -> Self {
        Self {
            quaternions: Segment::ALL.map(&mut f),
        }
    }

    pub fn get(&self, segment: Segment) -> [f64; 4] {
        self.quaternions[segment.index()]
    }

    /// Euler angles (radians) per segment, ready for angle-driven playback.
    pub fn to_pitch_record(&self, sequence: EulerSequence) -> TimestepRecord {
        TimestepRecord::from_fn(|segment| {
            let [a, b, c] = quaternion_to_euler_degrees(self.get(segment), sequence);
            Vec3::new(
                a.to_radians() as f32,
                b.to_radians() as f32,
                c.to_radians() as f32,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(actual: [f64; 3], expected: [f64; 3]) -> bool {
        actual
            .iter()
            .zip(expected.iter())
            .all(|(a, e)| (a - e).abs() < 1e-6)
    }

    fn axis_quaternion(axis: [f64; 3], degrees: f64) -> [f64; 4] {
        let half = degrees.to_radians() / 2.0;
        [
            axis[0] * half.sin(),
            axis[1] * half.sin(),
            axis[2] * half.sin(),
            half.cos(),
        ]
    }

    #[test]
    fn identity_is_zero() {
        for sequence in [EulerSequence::IntrinsicXyz, EulerSequence::ExtrinsicXyz] {
            let angles = quaternion_to_euler_degrees([0.0, 0.0, 0.0, 1.0], sequence);
            assert!(close(angles, [0.0; 3]), "{sequence:?}: {angles:?}");
        }
    }

    #[test]
    fn zero_norm_yields_zero_angles() {
        let angles = quaternion_to_euler_degrees([0.0; 4], EulerSequence::IntrinsicXyz);
        assert_eq!(angles, [0.0; 3]);
        let angles = quaternion_to_euler_degrees([f64::NAN, 0.0, 0.0, 1.0], EulerSequence::ExtrinsicXyz);
        assert_eq!(angles, [0.0; 3]);
    }

    #[test]
    fn single_axis_rotations_land_on_their_axis() {
        let q = axis_quaternion([1.0, 0.0, 0.0], 30.0);
        assert!(close(
            quaternion_to_euler_degrees(q, EulerSequence::IntrinsicXyz),
            [30.0, 0.0, 0.0]
        ));
        let q = axis_quaternion([0.0, 0.0, 1.0], -45.0);
        assert!(close(
            quaternion_to_euler_degrees(q, EulerSequence::ExtrinsicXyz),
            [0.0, 0.0, -45.0]
        ));
    }

    #[test]
    fn unnormalised_input_is_normalised() {
        let q = axis_quaternion([0.0, 1.0, 0.0], 20.0).map(|v| v * 3.0);
        assert!(close(
            quaternion_to_euler_degrees(q, EulerSequence::IntrinsicXyz),
            [0.0, 20.0, 0.0]
        ));
    }

    #[test]
    fn sequences_differ_for_compound_rotations() {
        // Rx(30) followed by a rotation about the moving y axis.
        let qx = UnitQuaternion::from_euler_angles(30f64.to_radians(), 0.0, 0.0);
        let qy = UnitQuaternion::from_euler_angles(0.0, 40f64.to_radians(), 0.0);
        let composed = qx * qy;
        let q = composed.quaternion();
        let raw = [q.i, q.j, q.k, q.w];
        assert!(close(
            quaternion_to_euler_degrees(raw, EulerSequence::IntrinsicXyz),
            [30.0, 40.0, 0.0]
        ));
        let extrinsic = quaternion_to_euler_degrees(raw, EulerSequence::ExtrinsicXyz);
        assert!(!close(extrinsic, [30.0, 40.0, 0.0]));
    }

    #[test]
    fn gimbal_lock_pins_third_angle() {
        let q = axis_quaternion([0.0, 1.0, 0.0], 90.0);
        let angles = quaternion_to_euler_degrees(q, EulerSequence::IntrinsicXyz);
        assert!((angles[1] - 90.0).abs() < 1e-3);
        assert_eq!(angles[2], 0.0);
    }

    #[test]
    fn orientation_record_converts_to_radians() {
        let record = OrientationRecord::from_fn(|segment| match segment {
            Segment::LeftThigh => axis_quaternion([1.0, 0.0, 0.0], 90.0),
            _ => [0.0, 0.0, 0.0, 1.0],
        });
        let pitch = record.to_pitch_record(EulerSequence::IntrinsicXyz);
        let thigh = pitch.get(Segment::LeftThigh);
        assert!((thigh.x - std::f32::consts::FRAC_PI_2).abs() < 1e-5);
        assert_eq!(pitch.get(Segment::RightShank), Vec3::ZERO);
    }
}
