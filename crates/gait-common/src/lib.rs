//! ---
//! gait_section: "01-core-functionality"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Shared primitives and utilities for producer and viewer."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
//! Shared primitives for the gait workspace.
//! This crate exposes configuration loading, tracing setup and loop timing
//! metrics consumed across the workspace.

pub mod config;
pub mod logging;
pub mod metrics;

pub use config::{
    Axis, CanvasConfig, ColumnLayout, EulerSequence, Framing, GaitConfig, GeometryPolicy, InputConfig,
    KneeFrame, LoadedGaitConfig, LoggingConfig, PacingMode, PlaybackConfig,
    ReconstructionConfig, ReconstructionMode, ReplayPolicy, SkeletonConfig, StreamConfig,
};
pub use logging::{init_tracing, LogFormat};
pub use metrics::{JitterHistogram, JitterSummary, LoopTimingReporter};
