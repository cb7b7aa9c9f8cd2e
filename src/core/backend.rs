//! Backend trait for log output destinations
//!
//! A backend owns an output resource plus a [`BackendConfig`] (level set and
//! format template). The router only ever calls `wants`, `log` and `flush`
//! from its dispatch thread. Configuration setters may be called from any
//! thread; `BackendConfig` guards them with its own lock.

use super::entry::Entry;
use super::error::Result;
use super::level::{Level, LevelSet};
use super::template::Template;
use parking_lot::RwLock;
use std::sync::Arc;

/// Shared handle to a backend, as held by routers
pub type SharedBackend = Arc<dyn Backend>;

pub trait Backend: Send + Sync {
    /// Identifier of this backend, also used by per-logger output lists
    fn name(&self) -> &str;

    /// Level set and format of this backend
    fn config(&self) -> &BackendConfig;

    /// Render `entry` and write it to the output resource if this backend
    /// `wants` it
    ///
    /// Entries outside the level set are skipped with `Ok(())`, whoever the
    /// caller is. Failures are returned to the router, which then retires
    /// the backend.
    fn log(&self, entry: &Entry) -> Result<()>;

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn wants(&self, entry: &Entry) -> bool {
        self.config().wants(entry.level())
    }

    fn format(&self) -> String {
        self.config().format()
    }

    fn set_format(&self, format: &str) -> Result<()> {
        self.config().set_format(format)
    }

    fn levels(&self) -> LevelSet {
        self.config().levels()
    }

    fn set_levels(&self, levels: LevelSet) {
        self.config().set_levels(levels)
    }

    fn add_levels(&self, levels: &[Level]) {
        self.config().add_levels(levels)
    }

    fn remove_levels(&self, levels: &[Level]) {
        self.config().remove_levels(levels)
    }
}

#[derive(Debug)]
struct ConfigState {
    levels: LevelSet,
    template: Arc<Template>,
}

/// Level set and format template behind a lock
#[derive(Debug)]
pub struct BackendConfig {
    state: RwLock<ConfigState>,
}

impl BackendConfig {
    pub fn new(format: &str, levels: LevelSet) -> Result<Self> {
        Ok(Self {
            state: RwLock::new(ConfigState {
                levels,
                template: Arc::new(Template::parse(format)?),
            }),
        })
    }

    pub fn wants(&self, level: Level) -> bool {
        self.state.read().levels.wants(level)
    }

    /// Current template; the lock is released before rendering
    pub fn template(&self) -> Arc<Template> {
        Arc::clone(&self.state.read().template)
    }

    pub fn format(&self) -> String {
        self.state.read().template.source().to_string()
    }

    /// Replace the format; an invalid template leaves the old one in place
    pub fn set_format(&self, format: &str) -> Result<()> {
        let template = Arc::new(Template::parse(format)?);
        self.state.write().template = template;
        Ok(())
    }

    pub fn levels(&self) -> LevelSet {
        self.state.read().levels.clone()
    }

    pub fn set_levels(&self, levels: LevelSet) {
        self.state.write().levels = levels;
    }

    pub fn add_levels(&self, levels: &[Level]) {
        self.state.write().levels.extend(levels.iter().copied());
    }

    pub fn remove_levels(&self, levels: &[Level]) {
        let mut state = self.state.write();
        for level in levels {
            state.levels.remove(*level);
        }
    }
}
