//! ---
//! gait_section: "07-playback"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Paced playback of record feeds onto render surfaces."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---

pub mod driver;
pub mod pacing;

pub use driver::{PlaybackDriver, PlaybackOptions, PlaybackSummary, StopReason};
pub use pacing::Pacer;
