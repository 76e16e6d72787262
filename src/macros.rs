//! Internal diagnostics macros.
//!
//! The registry emits trace/warn diagnostics on the paths where it makes a
//! judgment call (deferred relationships, self-healed links, ids that merely
//! look malformed). Diagnostics go through `tracing` when the `tracing`
//! feature is enabled and compile to nothing otherwise, matching the optional
//! dependency declared in Cargo.toml.

#[cfg(feature = "tracing")]
macro_rules! focus_trace {
    ($($arg:tt)*) => { tracing::trace!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! focus_trace {
    ($($arg:tt)*) => {{}};
}

#[cfg(feature = "tracing")]
macro_rules! focus_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! focus_warn {
    ($($arg:tt)*) => {{}};
}

pub(crate) use {focus_trace, focus_warn};
