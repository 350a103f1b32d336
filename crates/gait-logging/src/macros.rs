//! ---
//! gait_section: "03-logging"
//! gait_subsection: "module"
//! gait_type: "source"
//! gait_scope: "code"
//! gait_description: "Context-enriched logging macros."
//! gait_version: "v0.1.0"
//! gait_owner: "tbd"
//! ---

#[doc(hidden)]
#[macro_export]
macro_rules! __gait_event {
    ($level:expr, $ctx:expr, $($arg:tt)+) => {{
        let ctx: &$crate::LogContext = &$ctx;
        $crate::__tracing::event!(
            $level,
            role = ctx.role.unwrap_or(""),
            source = ctx.source.as_deref().unwrap_or(""),
            side = ctx.side.unwrap_or(""),
            frame = ctx.frame.unwrap_or_default(),
            message = %format_args!($($arg)+)
        );
    }};
}

/// Emit an informational log enriched with a [`LogContext`](crate::LogContext).
#[macro_export]
macro_rules! gait_info {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__gait_event!($crate::__tracing::Level::INFO, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__gait_event!($crate::__tracing::Level::INFO, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a debug log enriched with a [`LogContext`](crate::LogContext).
#[macro_export]
macro_rules! gait_debug {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__gait_event!($crate::__tracing::Level::DEBUG, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__gait_event!($crate::__tracing::Level::DEBUG, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit a warning enriched with a [`LogContext`](crate::LogContext).
#[macro_export]
macro_rules! gait_warn {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__gait_event!($crate::__tracing::Level::WARN, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__gait_event!($crate::__tracing::Level::WARN, $crate::LogContext::default(), $($arg)+)
    };
}

/// Emit an error log enriched with a [`LogContext`](crate::LogContext).
#[macro_export]
macro_rules! gait_error {
    (context = $ctx:expr, $($arg:tt)+) => {
        $crate::__gait_event!($crate::__tracing::Level::ERROR, $ctx, $($arg)+)
    };
    ($($arg:tt)+) => {
        $crate::__gait_event!($crate::__tracing::Level::ERROR, $crate::LogContext::default(), $($arg)+)
    };
}
