//! Logging for mask construction and application.
//!
//! Events reach `tracing` only with the `tracing` feature or under
//! `cfg(test)`. Otherwise `trace!` and `debug!` expand to nothing and their
//! arguments are never evaluated, so formatting a mask for a log line costs
//! nothing in normal builds.

#[cfg(any(test, feature = "tracing"))]
macro_rules! trace {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*);
    };
}

#[cfg(not(any(test, feature = "tracing")))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}

#[cfg(any(test, feature = "tracing"))]
macro_rules! debug {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*);
    };
}

#[cfg(not(any(test, feature = "tracing")))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}

pub(crate) use {debug, trace};
