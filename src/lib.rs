//! # Rust Log Router
//!
//! An in-process log router: named loggers produce entries, one dispatch
//! thread per router delivers them to a reconfigurable set of backends, each
//! filtering by level and rendering through its own `{{.Field}}` template.
//!
//! ## Features
//!
//! - **Ordered Delivery**: a single dispatch thread owns the backend list
//! - **Live Reconfiguration**: replace or add backends while logging
//! - **Graceful Shutdown**: `close` delivers every accepted entry first
//! - **Custom Levels**: register levels and colors at runtime
//! - **Redaction**: sensitive arguments render through their redacted form
//!
//! ## Example
//!
//! ```
//! use rust_log_router::prelude::*;
//!
//! let stderr = FileBackend::stderr(DEFAULT_FORMAT, LevelSet::from([Level::ERROR])).unwrap();
//! let router = Router::builder()
//!     .backend(std::sync::Arc::new(stderr))
//!     .build()
//!     .unwrap();
//!
//! let logger = router.logger("app");
//! logger.info("not wanted by any backend").unwrap();
//! router.close().unwrap();
//! ```

pub mod backends;
pub mod config;
pub mod core;
pub mod global;
pub mod macros;

pub mod prelude {
    pub use crate::backends::FileBackend;
    pub use crate::config::{configure, init, Config, Logging};
    pub use crate::core::{
        Arg, Backend, BackendConfig, CallSite, CallerInfo, CallerProvider, Entry, FixedCaller,
        Level, LevelColor, LevelRegistry, LevelSet, Logger, NoCaller, Payload, Redactable,
        Result, Router, RouterBuilder, RouterError, RouterMetrics, RouterStatus, SharedBackend,
        Template, TrackedCaller, DEBUG_FORMAT, DEFAULT_FORMAT, MESSAGE_FORMAT,
    };
}

pub use backends::FileBackend;
#[cfg(all(unix, feature = "syslog"))]
pub use backends::SyslogBackend;
pub use config::{configure, init, Config, Logging};
pub use core::{
    Arg, Backend, BackendConfig, CallSite, CallerInfo, CallerProvider, DiagnosticCallback, Entry,
    FixedCaller, Level, LevelColor, LevelRegistry, LevelSet, Logger, NoCaller, Payload,
    Redactable, Result, Router, RouterBuilder, RouterError, RouterMetrics, RouterStatus,
    SharedBackend, Template, TrackedCaller, DEBUG_FORMAT, DEFAULT_FORMAT, MESSAGE_FORMAT,
};
