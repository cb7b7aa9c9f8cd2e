//! Caller location capture
//!
//! Logger methods are `#[track_caller]` and the logging macros expand
//! `file!()`, `line!()` and `module_path!()`; either way the call site ends up
//! as a [`CallSite`]. A [`CallerProvider`] turns that into the [`CallerInfo`]
//! stored on the entry. Routers carry one so tests can substitute a fixed
//! location.

use std::panic::Location;
use std::sync::Arc;

/// Raw call-site data handed to a [`CallerProvider`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub file: &'static str,
    pub line: u32,
    /// Enclosing module path, known only for macro calls
    pub function: Option<&'static str>,
}

impl CallSite {
    /// Location of the caller of the enclosing `#[track_caller]` function
    #[track_caller]
    pub fn here() -> Self {
        Self::from(Location::caller())
    }

    pub const fn new(file: &'static str, line: u32, function: Option<&'static str>) -> Self {
        Self {
            file,
            line,
            function,
        }
    }
}

impl From<&'static Location<'static>> for CallSite {
    fn from(location: &'static Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
            function: None,
        }
    }
}

/// Source location of a log call (best-effort, fields may be empty)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallerInfo {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl CallerInfo {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.file.is_empty() && self.line == 0 && self.function.is_empty()
    }
}

/// Resolves the call site of a log call
pub trait CallerProvider: Send + Sync {
    fn resolve(&self, site: &CallSite) -> CallerInfo;
}

pub type SharedCallerProvider = Arc<dyn CallerProvider>;

/// Default provider: records the call site as given
#[derive(Debug, Clone, Copy, Default)]
pub struct TrackedCaller;

impl CallerProvider for TrackedCaller {
    fn resolve(&self, site: &CallSite) -> CallerInfo {
        CallerInfo {
            file: site.file.to_string(),
            line: site.line,
            function: site.function.unwrap_or_default().to_string(),
        }
    }
}

/// Provider that records nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCaller;

impl CallerProvider for NoCaller {
    fn resolve(&self, _site: &CallSite) -> CallerInfo {
        CallerInfo::default()
    }
}

/// Provider that always reports the same location
#[derive(Debug, Clone, Default)]
pub struct FixedCaller(pub CallerInfo);

impl CallerProvider for FixedCaller {
    fn resolve(&self, _site: &CallSite) -> CallerInfo {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn site() -> CallSite {
        CallSite::here()
    }

    #[test]
    fn test_tracked_caller() {
        let line = line!() + 1;
        let site = site();
        let info = TrackedCaller.resolve(&site);

        assert!(info.file.ends_with("caller.rs"));
        assert_eq!(info.line, line);
        assert_eq!(info.function, "");
    }

    #[test]
    fn test_macro_style_site() {
        let site = CallSite::new(file!(), 12, Some(module_path!()));
        let info = TrackedCaller.resolve(&site);
        assert!(info.function.ends_with("caller::tests"));
    }

    #[test]
    fn test_no_caller() {
        assert!(NoCaller.resolve(&site()).is_empty());
    }

    #[test]
    fn test_fixed_caller() {
        let provider = FixedCaller(CallerInfo::new("main.rs", 7, "main"));
        assert_eq!(
            provider.resolve(&site()),
            CallerInfo::new("main.rs", 7, "main")
        );
    }
}
