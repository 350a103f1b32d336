//! ---
//! gait_section: "04-kinematics"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Reconstruction error taxonomy."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
use thiserror::Error;

/// A frame whose geometry cannot be solved. Callers decide whether to skip
/// the frame or abort playback.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeometryError {
    /// Thigh and shank endpoints coincide, the knee is undetermined.
    #[error("thigh and shank endpoints coincide")]
    CoincidentEndpoints,
    /// The endpoints are further apart than two segment lengths.
    #[error("endpoints are {distance:.3} apart but two segments only reach {reach:.3}")]
    Unreachable { distance: f64, reach: f64 },
    /// The record carried NaN or infinite components.
    #[error("record contains non-finite components")]
    NonFinite,
    /// Segment lengths must be finite and positive.
    #[error("segment length must be positive, got {0}")]
    InvalidLength(f64),
}
