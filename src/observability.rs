//! Crate-internal logging macros.
//!
//! Every event is emitted under the `chute` target.
//!
//! Precedence:
//! 1) `tracing` feature => `tracing` events
//! 2) `logging` feature => `log` records
//! 3) neither enabled => no-op (format args are still type-checked)

macro_rules! chute_event {
    ($tracing_macro:ident, $log_macro:ident, $($arg:tt)+) => {{
        #[cfg(feature = "tracing")]
        { tracing::$tracing_macro!(target: "chute", $($arg)+); }

        #[cfg(all(not(feature = "tracing"), feature = "logging"))]
        { log::$log_macro!(target: "chute", $($arg)+); }

        #[cfg(all(not(feature = "tracing"), not(feature = "logging")))]
        { let _ = format_args!($($arg)+); }
    }};
}

macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::observability::chute_event!(debug, debug, $($arg)+) };
}

macro_rules! log_info {
    ($($arg:tt)+) => { $crate::observability::chute_event!(info, info, $($arg)+) };
}

macro_rules! log_warn {
    ($($arg:tt)+) => { $crate::observability::chute_event!(warn, warn, $($arg)+) };
}

pub(crate) use chute_event;
pub(crate) use log_debug;
pub(crate) use log_info;
pub(crate) use log_warn;
