//! Core router types and traits

pub mod backend;
pub mod caller;
pub mod color;
pub mod entry;
pub mod error;
pub mod level;
pub mod logger;
pub mod metrics;
pub mod redact;
pub mod router;
pub mod template;

pub use backend::{Backend, BackendConfig, SharedBackend};
pub use caller::{
    CallSite, CallerInfo, CallerProvider, FixedCaller, NoCaller, SharedCallerProvider,
    TrackedCaller,
};
pub use color::{LevelColor, RESET};
pub use entry::{Entry, EntryBuilder, Payload};
pub use error::{Result, RouterError};
pub use level::{Level, LevelInfo, LevelRegistry, LevelSet};
pub use logger::Logger;
pub use metrics::RouterMetrics;
pub use redact::{Arg, Redactable};
pub use router::{DiagnosticCallback, Router, RouterBuilder, RouterStatus};
pub use template::{Field, FieldSource, Template, DEBUG_FORMAT, DEFAULT_FORMAT, MESSAGE_FORMAT};
