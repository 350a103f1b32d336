//! ---
//! gait_section: "04-kinematics"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Timestep records and planar two-link leg reconstruction."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
//! Pure, synchronous geometry. Nothing in this crate logs or performs I/O;
//! callers decide what a [`GeometryError`] means for their loop.

pub mod error;
pub mod orientation;
pub mod rig;
pub mod strategy;
pub mod types;

pub use error::GeometryError;
pub use orientation::{quaternion_to_euler_degrees, EulerSequence, OrientationRecord};
pub use rig::{LegRig, Skeleton};
pub use strategy::{AngleDriven, PositionDriven, Reconstruct, Reconstructor};
pub use types::{LegPose, LegSide, Point2D, Segment, TimestepRecord, Vec3};
