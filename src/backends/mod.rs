//! Built-in backends and output URLs
//!
//! Outputs are named by URL: `file:///dev/stdout`, `file:///dev/stderr`,
//! `file:///var/log/app.log` and, on unix, `syslog://[facility[/tag]]`.
//! The URL doubles as the backend name used by per-logger output lists.

pub mod file;

#[cfg(all(unix, feature = "syslog"))]
pub mod syslog;

pub use file::FileBackend;

#[cfg(all(unix, feature = "syslog"))]
pub use syslog::{Facility, Severity, SyslogBackend};

use crate::core::{LevelSet, Result, RouterError, SharedBackend};
use std::sync::Arc;

pub const SCHEME_SEPARATOR: &str = "://";

pub const STDOUT_URL: &str = "file:///dev/stdout";
pub const STDERR_URL: &str = "file:///dev/stderr";

/// An output URL split into scheme and location
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputUrl {
    pub scheme: String,
    pub location: String,
}

impl OutputUrl {
    /// Split `url` at the first `://`; the scheme is lower-cased
    pub fn parse(url: &str) -> Result<Self> {
        let (scheme, location) = url
            .split_once(SCHEME_SEPARATOR)
            .ok_or_else(|| RouterError::MalformedUrl {
                url: url.to_string(),
            })?;

        if scheme.is_empty() {
            return Err(RouterError::MalformedUrl {
                url: url.to_string(),
            });
        }

        Ok(Self {
            scheme: scheme.to_ascii_lowercase(),
            location: location.to_string(),
        })
    }

    pub fn url(&self) -> String {
        format!("{}{SCHEME_SEPARATOR}{}", self.scheme, self.location)
    }
}

/// Build the backend an output URL names
///
/// `tag` is the syslog tag used when the URL does not carry one.
#[cfg_attr(not(all(unix, feature = "syslog")), allow(unused_variables))]
pub fn open(url: &str, format: &str, levels: LevelSet, tag: &str) -> Result<SharedBackend> {
    let parsed = OutputUrl::parse(url)?;
    match parsed.scheme.as_str() {
        "file" => Ok(Arc::new(FileBackend::from_location(
            &parsed.location,
            format,
            levels,
        )?)),
        #[cfg(all(unix, feature = "syslog"))]
        "syslog" => Ok(Arc::new(SyslogBackend::from_location(
            &parsed.location,
            format,
            levels,
            tag,
        )?)),
        other => Err(RouterError::UnsupportedScheme {
            scheme: other.to_string(),
        }),
    }
}
