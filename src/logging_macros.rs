//! Logging macros that capture source location.
//!
//! Each macro records `module_path!()`, `file!()`, and `line!()` at the call
//! site and attaches them to the event as a [`SourceLocation`], which the
//! log4j formatter emits as `locationInfo` together with the user name.
//! Arguments are only formatted when the level passes the console's
//! minimum.
//!
//! # Examples
//!
//! ```rust,no_run
//! use log2console::{Console, ConsoleConfig, console_info};
//!
//! let console = Console::from_config(&ConsoleConfig::default()).expect("valid config");
//! console_info!(console, "Server", "listening on port {}", 8080);
//! ```
//!
//! [`SourceLocation`]: crate::SourceLocation

/// Log at `TRACE` with call-site location.
#[macro_export]
macro_rules! console_trace {
    ($console:expr, $category:expr, $($arg:tt)+) => {
        $crate::__console_impl!($console, $crate::Severity::Trace, $category, $($arg)+)
    };
}

/// Log at `DEBUG` with call-site location.
#[macro_export]
macro_rules! console_debug {
    ($console:expr, $category:expr, $($arg:tt)+) => {
        $crate::__console_impl!($console, $crate::Severity::Debug, $category, $($arg)+)
    };
}

/// Log at `INFO` with call-site location.
///
/// Accepts a plain string or `format!`-style arguments.
#[macro_export]
macro_rules! console_info {
    ($console:expr, $category:expr, $($arg:tt)+) => {
        $crate::__console_impl!($console, $crate::Severity::Info, $category, $($arg)+)
    };
}

/// Log at `WARN` with call-site location.
#[macro_export]
macro_rules! console_warn {
    ($console:expr, $category:expr, $($arg:tt)+) => {
        $crate::__console_impl!($console, $crate::Severity::Warn, $category, $($arg)+)
    };
}

/// Log at `ERROR` with call-site location.
#[macro_export]
macro_rules! console_error {
    ($console:expr, $category:expr, $($arg:tt)+) => {
        $crate::__console_impl!($console, $crate::Severity::Error, $category, $($arg)+)
    };
}

/// Log at `FATAL` with call-site location.
#[macro_export]
macro_rules! console_fatal {
    ($console:expr, $category:expr, $($arg:tt)+) => {
        $crate::__console_impl!($console, $crate::Severity::Fatal, $category, $($arg)+)
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __console_impl {
    ($console:expr, $level:expr, $category:expr, $($arg:tt)+) => {{
        let console = &$console;
        let level = $level;
        if console.enabled(level) {
            let location = $crate::SourceLocation::new(
                ::std::module_path!(),
                ::std::file!(),
                ::std::line!(),
            );
            console.log_at(level, $category, &::std::format!($($arg)+), location)
        } else {
            false
        }
    }};
}
