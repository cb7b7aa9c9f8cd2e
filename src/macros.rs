//! Logging macros for ergonomic log message formatting.
//!
//! These macros format their arguments like `format!` and record the call
//! site (file, line and module path) of the macro invocation.
//!
//! # Examples
//!
//! ```
//! use rust_log_router::prelude::*;
//! use rust_log_router::info;
//!
//! let router = Router::new().unwrap();
//! let logger = router.logger("server");
//!
//! // Basic logging
//! info!(logger, "Server started").unwrap();
//!
//! // With format arguments
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port).unwrap();
//!
//! router.close().unwrap();
//! ```

/// Log a message at the given level with automatic formatting.
///
/// # Examples
///
/// ```
/// # use rust_log_router::prelude::*;
/// # let router = Router::new().unwrap();
/// # let logger = router.logger("app");
/// use rust_log_router::log;
/// log!(logger, Level::NOTICE, "Simple message").unwrap();
/// log!(logger, Level::ERROR, "Error code: {}", 500).unwrap();
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log_at(
            $level,
            $crate::Payload::from(format!($($arg)+)),
            $crate::CallSite::new(file!(), line!(), Some(module_path!())),
        )
    };
}

/// Log a debug-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_router::prelude::*;
/// # let router = Router::new().unwrap();
/// # let logger = router.logger("app");
/// use rust_log_router::debug;
/// debug!(logger, "Counter value: {}", 10).unwrap();
/// ```
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::DEBUG, $($arg)+)
    };
}

/// Log an info-level message.
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::INFO, $($arg)+)
    };
}

/// Log a notice-level message.
#[macro_export]
macro_rules! notice {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::NOTICE, $($arg)+)
    };
}

/// Log a warning-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_router::prelude::*;
/// # let router = Router::new().unwrap();
/// # let logger = router.logger("app");
/// use rust_log_router::warning;
/// let usage = 91;
/// warning!(logger, "Disk usage at {}%", usage).unwrap();
/// ```
#[macro_export]
macro_rules! warning {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::WARNING, $($arg)+)
    };
}

/// Log an error-level message.
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::Level::ERROR, $($arg)+)
    };
}
