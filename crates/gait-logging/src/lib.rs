//! ---
//! gait_section: "03-logging"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Injected structured logging context."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---
//! Components receive a [`LogContext`] at construction instead of reaching
//! for a process-wide logger. Every event emitted through the `gait_*!`
//! macros carries the context fields, so a viewer log line can always be
//! traced back to its role, record source, leg side and frame number.
#![warn(missing_docs)]

use tracing::Level;
use tracing_subscriber::{fmt as subscriber_fmt, prelude::*, EnvFilter, Registry};

pub mod macros;

#[doc(hidden)]
pub use tracing as __tracing;

/// Initialize a baseline tracing subscriber suitable for development and tests.
pub fn init() {
    let _ = Registry::default()
        .with(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with(subscriber_fmt::layer())
        .try_init();
}

/// Structured logging context propagated by the convenience macros.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct LogContext {
    /// Process role (`producer`, `viewer`, ...).
    pub role: Option<&'static str>,
    /// Record source description (file path, channel address).
    pub source: Option<String>,
    /// Leg side the event refers to.
    pub side: Option<&'static str>,
    /// Frame or message sequence number.
    pub frame: Option<u64>,
}

impl LogContext {
    /// Create an empty logging context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Context for a process role.
    pub fn for_role(role: &'static str) -> Self {
        Self::default().with_role(role)
    }

    /// Attach a process role.
    pub fn with_role(mut self, role: &'static str) -> Self {
        self.role = Some(role);
        self
    }

    /// Attach a record source description.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Attach a leg side.
    pub fn with_side(mut self, side: &'static str) -> Self {
        self.side = Some(side);
        self
    }

    /// Attach a frame number.
    pub fn with_frame(mut self, frame: u64) -> Self {
        self.frame = Some(frame);
        self
    }
}

/// High-level outcome used when emitting session lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The session ended through one of its designed termination paths.
    Success,
    /// The session failed or was aborted.
    Fault,
}

impl SessionOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            SessionOutcome::Success => "success",
            SessionOutcome::Fault => "fault",
        }
    }
}

/// Emit a standardized session event with a success/fault outcome.
pub fn log_session_event(
    context: Option<&LogContext>,
    event: &str,
    message: &str,
    outcome: SessionOutcome,
) {
    let default_ctx = LogContext::default();
    let ctx = context.unwrap_or(&default_ctx);
    match outcome {
        SessionOutcome::Success => tracing::info!(
            event,
            outcome = outcome.as_str(),
            role = ctx.role.unwrap_or(""),
            source = ctx.source.as_deref().unwrap_or(""),
            frame = ctx.frame.unwrap_or_default(),
            message = %message
        ),
        SessionOutcome::Fault => tracing::error!(
            event,
            outcome = outcome.as_str(),
            role = ctx.role.unwrap_or(""),
            source = ctx.source.as_deref().unwrap_or(""),
            frame = ctx.frame.unwrap_or_default(),
            message = %message
        ),
    }
}
