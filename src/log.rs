//! Logging facade.
//!
//! All diagnostics go through these macros. With the `log` feature enabled
//! they forward to the [`log`] crate; without it they compile to nothing, so
//! the default build carries no logging dependency.

macro_rules! debug {
    ($($tt:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::debug!($($tt)*);
        #[cfg(not(feature = "log"))]
        { let _ = format_args!($($tt)*); }
    }};
}

macro_rules! warning {
    ($($tt:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::warn!($($tt)*);
        #[cfg(not(feature = "log"))]
        { let _ = format_args!($($tt)*); }
    }};
}

pub(crate) use {debug, warning};
