#![forbid(unsafe_code)]

//! Logging shims.
//!
//! With the `tracing` feature the `fit_*` macros forward to `tracing`; without
//! it they expand to nothing, so the trigger layer can log unconditionally.

#[cfg(feature = "tracing")]
pub use tracing;

/// Trace-level event (forwards to `tracing::trace!` when enabled).
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! fit_trace {
    ($($arg:tt)*) => {
        $crate::logging::tracing::trace!($($arg)*)
    };
}

/// Trace-level event (disabled).
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! fit_trace {
    ($($arg:tt)*) => {};
}

/// Debug-level event (forwards to `tracing::debug!` when enabled).
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! fit_debug {
    ($($arg:tt)*) => {
        $crate::logging::tracing::debug!($($arg)*)
    };
}

/// Debug-level event (disabled).
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! fit_debug {
    ($($arg:tt)*) => {};
}

/// Warn-level event (forwards to `tracing::warn!` when enabled).
#[cfg(feature = "tracing")]
#[macro_export]
macro_rules! fit_warn {
    ($($arg:tt)*) => {
        $crate::logging::tracing::warn!($($arg)*)
    };
}

/// Warn-level event (disabled).
#[cfg(not(feature = "tracing"))]
#[macro_export]
macro_rules! fit_warn {
    ($($arg:tt)*) => {};
}
