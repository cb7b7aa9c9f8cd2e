//! Named entry factories
//!
//! A [`Logger`] turns log calls into [`Entry`] values and hands them to its
//! router. It numbers its own entries; the numbering and the hand-off happen
//! under one lock, so a logger's entries reach the router (and therefore
//! every backend) in sequence order even when several threads share it.

use super::caller::CallSite;
use super::entry::{Entry, Payload};
use super::error::{Result, RouterError};
use super::level::{Level, LevelSet};
use super::redact::Arg;
use super::router::Router;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;

/// Separator between parent and child logger names
pub const NAME_SEPARATOR: &str = ".";

pub struct Logger {
    name: Arc<str>,
    levels: LevelSet,
    outputs: Option<Arc<[String]>>,
    router: Router,
    /// Last per-logger sequence number handed out
    lid: Mutex<u64>,
}

impl Logger {
    /// A logger interested in every level and feeding every backend
    ///
    /// Names are not checked for uniqueness; two loggers with the same name
    /// keep separate sequence counters.
    pub fn new(router: Router, name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            levels: LevelSet::all(),
            outputs: None,
            router,
            lid: Mutex::new(0),
        }
    }

    /// Restrict the levels this logger emits (default: [`LevelSet::all`])
    #[must_use]
    pub fn with_levels(mut self, levels: LevelSet) -> Self {
        self.levels = levels;
        self
    }

    /// Restrict delivery to the backends with these names
    #[must_use]
    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let outputs: Vec<String> = outputs.into_iter().map(Into::into).collect();
        self.outputs = Some(Arc::from(outputs));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn levels(&self) -> &LevelSet {
        &self.levels
    }

    pub fn set_levels(&mut self, levels: LevelSet) {
        self.levels = levels;
    }

    pub fn outputs(&self) -> Option<&[String]> {
        self.outputs.as_deref()
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Last per-logger sequence number handed out (0 before the first entry)
    pub fn last_lid(&self) -> u64 {
        *self.lid.lock()
    }

    pub fn is_enabled(&self, level: Level) -> bool {
        self.levels.wants(level)
    }

    /// A child named `<this name>.<name>`
    ///
    /// The child copies this logger's levels and outputs as they are now and
    /// starts its own sequence at 1. An empty name keeps the parent's name.
    pub fn child(&self, name: &str) -> Logger {
        let name: Arc<str> = if name.is_empty() {
            Arc::clone(&self.name)
        } else {
            Arc::from(format!("{}{NAME_SEPARATOR}{name}", self.name))
        };

        Logger {
            name,
            levels: self.levels.clone(),
            outputs: self.outputs.clone(),
            router: self.router.clone(),
            lid: Mutex::new(0),
        }
    }

    /// Log a message at `level`
    ///
    /// Fails with [`RouterError::InvalidLevel`] if the router's registry does
    /// not know the level, and with [`RouterError::RouterClosed`] once the
    /// router is closed. A level this logger is not interested in is skipped
    /// before any entry is built.
    #[track_caller]
    pub fn log(&self, level: Level, message: impl Into<Payload>) -> Result<()> {
        self.log_at(level, message.into(), CallSite::here())
    }

    /// Log a `{}` format string with lazily rendered arguments
    #[track_caller]
    pub fn logf(&self, level: Level, format: &str, args: Vec<Arg>) -> Result<()> {
        let payload = Payload::Format {
            format: format.to_string(),
            args,
        };
        self.log_at(level, payload, CallSite::here())
    }

    /// Log with an explicit call site; used by the logging macros
    pub fn log_at(&self, level: Level, payload: Payload, site: CallSite) -> Result<()> {
        let info = self
            .router
            .registry()
            .info(level)
            .ok_or_else(|| RouterError::invalid_level(level.to_string()))?;

        if !self.levels.wants(level) {
            return Ok(());
        }

        let caller = self.router.caller_provider().resolve(&site);

        let mut lid = self.lid.lock();
        let entry = Entry::builder(level, info.name)
            .color(info.color)
            .logger(Arc::clone(&self.name))
            .caller(caller)
            .payload(payload)
            .outputs(self.outputs.clone())
            .ids(0, *lid + 1)
            .build();
        self.router.log(entry)?;
        *lid += 1;
        Ok(())
    }

    /// Log a message at a level looked up by name
    #[track_caller]
    pub fn log_named(&self, level: &str, message: impl Into<Payload>) -> Result<()> {
        let level = self.router.registry().parse(level)?;
        self.log_at(level, message.into(), CallSite::here())
    }

    #[inline]
    #[track_caller]
    pub fn debug(&self, message: impl Into<Payload>) -> Result<()> {
        self.log(Level::DEBUG, message)
    }

    #[inline]
    #[track_caller]
    pub fn info(&self, message: impl Into<Payload>) -> Result<()> {
        self.log(Level::INFO, message)
    }

    #[inline]
    #[track_caller]
    pub fn notice(&self, message: impl Into<Payload>) -> Result<()> {
        self.log(Level::NOTICE, message)
    }

    #[inline]
    #[track_caller]
    pub fn warning(&self, message: impl Into<Payload>) -> Result<()> {
        self.log(Level::WARNING, message)
    }

    #[inline]
    #[track_caller]
    pub fn error(&self, message: impl Into<Payload>) -> Result<()> {
        self.log(Level::ERROR, message)
    }

    #[inline]
    #[track_caller]
    pub fn debugf(&self, format: &str, args: Vec<Arg>) -> Result<()> {
        self.logf(Level::DEBUG, format, args)
    }

    #[inline]
    #[track_caller]
    pub fn infof(&self, format: &str, args: Vec<Arg>) -> Result<()> {
        self.logf(Level::INFO, format, args)
    }

    #[inline]
    #[track_caller]
    pub fn noticef(&self, format: &str, args: Vec<Arg>) -> Result<()> {
        self.logf(Level::NOTICE, format, args)
    }

    #[inline]
    #[track_caller]
    pub fn warningf(&self, format: &str, args: Vec<Arg>) -> Result<()> {
        self.logf(Level::WARNING, format, args)
    }

    #[inline]
    #[track_caller]
    pub fn errorf(&self, format: &str, args: Vec<Arg>) -> Result<()> {
        self.logf(Level::ERROR, format, args)
    }

    /// Log at ERROR, drain the router and exit the process with status 1
    #[track_caller]
    pub fn fatal(&self, message: impl Into<Payload>) -> ! {
        let payload = message.into();
        self.terminate(payload, CallSite::here())
    }

    #[track_caller]
    pub fn fatalf(&self, format: &str, args: Vec<Arg>) -> ! {
        let payload = Payload::Format {
            format: format.to_string(),
            args,
        };
        self.terminate(payload, CallSite::here())
    }

    /// Log at ERROR, then panic with the rendered message
    ///
    /// The entry is queued before the panic starts unwinding.
    #[track_caller]
    pub fn panic(&self, message: impl Into<Payload>) -> ! {
        let payload = message.into();
        let text = payload.render();
        if let Err(e) = self.log_at(Level::ERROR, payload, CallSite::here()) {
            eprintln!("[ROUTER ERROR] Failed to log panic message: {}", e);
        }
        panic!("{}", text)
    }

    #[track_caller]
    pub fn panicf(&self, format: &str, args: Vec<Arg>) -> ! {
        let payload = Payload::Format {
            format: format.to_string(),
            args,
        };
        let text = payload.render();
        if let Err(e) = self.log_at(Level::ERROR, payload, CallSite::here()) {
            eprintln!("[ROUTER ERROR] Failed to log panic message: {}", e);
        }
        panic!("{}", text)
    }

    fn terminate(&self, payload: Payload, site: CallSite) -> ! {
        let text = payload.render();
        if let Err(e) = self.log_at(Level::ERROR, payload, site) {
            eprintln!("[ROUTER ERROR] Failed to log fatal message: {}", e);
            eprintln!("{}", text);
        }
        match self.router.close() {
            Ok(()) | Err(RouterError::RouterClosed) => {}
            Err(e) => eprintln!("[ROUTER ERROR] Failed to drain router before exit: {}", e),
        }
        std::process::exit(1)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("levels", &self.levels)
            .field("outputs", &self.outputs)
            .field("last_lid", &self.last_lid())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::backend::{Backend, BackendConfig};
    use crate::core::caller::{CallerInfo, FixedCaller};
    use crate::core::color::LevelColor;
    use crate::core::level::LevelRegistry;
    use crate::core::template::MESSAGE_FORMAT;

    struct Capture {
        config: BackendConfig,
        entries: Mutex<Vec<Entry>>,
    }

    impl Capture {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                config: BackendConfig::new(MESSAGE_FORMAT, LevelSet::all()).unwrap(),
                entries: Mutex::new(Vec::new()),
            })
        }
    }

    impl Backend for Capture {
        fn name(&self) -> &str {
            "capture"
        }

        fn config(&self) -> &BackendConfig {
            &self.config
        }

        fn log(&self, entry: &Entry) -> Result<()> {
            self.entries.lock().push(entry.clone());
            Ok(())
        }
    }

    fn setup() -> (Router, Arc<Capture>) {
        let capture = Capture::new();
        let router = Router::builder()
            .backend(capture.clone())
            .caller_provider(Arc::new(FixedCaller(CallerInfo::new("app.rs", 10, "app::run"))))
            .build()
            .unwrap();
        (router, capture)
    }

    #[test]
    fn test_entries_carry_logger_metadata() {
        let (router, capture) = setup();
        let logger = router.logger("app");
        logger.warning("low disk").unwrap();
        router.close().unwrap();

        let entries = capture.entries.lock();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.logger(), "app");
        assert_eq!(entry.level(), Level::WARNING);
        assert_eq!(entry.level_name(), "WARNING");
        assert_eq!(entry.gid(), 1);
        assert_eq!(entry.lid(), 1);
        assert_eq!(entry.caller(), &CallerInfo::new("app.rs", 10, "app::run"));
        assert_eq!(entry.message(), "low disk");
    }

    #[test]
    fn test_lid_per_logger() {
        let (router, capture) = setup();
        let a = router.logger("a");
        let b = router.logger("a");
        a.info("a1").unwrap();
        b.info("b1").unwrap();
        a.info("a2").unwrap();
        assert_eq!(a.last_lid(), 2);
        assert_eq!(b.last_lid(), 1);
        router.close().unwrap();

        let ids: Vec<(u64, u64)> = capture
            .entries
            .lock()
            .iter()
            .map(|e| (e.gid(), e.lid()))
            .collect();
        assert_eq!(ids, vec![(1, 1), (2, 1), (3, 2)]);
    }

    #[test]
    fn test_logger_level_filter_skips_entry() {
        let (router, capture) = setup();
        let logger = router
            .logger("quiet")
            .with_levels(LevelSet::from([Level::ERROR]));

        logger.debug("dropped").unwrap();
        logger.error("kept").unwrap();
        assert_eq!(logger.last_lid(), 1);
        assert_eq!(router.current_gid(), 1);
        router.close().unwrap();

        let entries = capture.entries.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message(), "kept");
    }

    #[test]
    fn test_unknown_level_is_error() {
        let (router, _capture) = setup();
        let other = LevelRegistry::new();
        let (custom, _) = other.register("elsewhere", LevelColor::default()).unwrap();

        let logger = router.logger("app");
        assert!(matches!(
            logger.log(custom, "x"),
            Err(RouterError::InvalidLevel { .. })
        ));
        assert!(matches!(
            logger.log_named("bogus", "x"),
            Err(RouterError::InvalidLevel { .. })
        ));
        router.close().unwrap();
    }


    #[test]
    fn test_custom_level() {
        let (router, capture) = setup();
        let (audit, _) = router
            .registry()
            .register("audit", LevelColor::default())
            .unwrap();

        let logger = router.logger("app");
        logger.log(audit, "user created").unwrap();
        logger.log_named("Audit", "user deleted").unwrap();
        router.close().unwrap();

        let entries = capture.entries.lock();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|e| e.level() == audit));
        assert_eq!(entries[0].level_name(), "AUDIT");
    }

    #[test]
    fn test_child_loggers() {
        let (router, capture) = setup();
        let parent = router
            .logger("app")
            .with_levels(LevelSet::from([Level::INFO]))
            .with_outputs(["capture"]);
        parent.info("p1").unwrap();

        let child = parent.child("db");
        assert_eq!(child.name(), "app.db");
        assert_eq!(child.levels(), parent.levels());
        assert_eq!(child.outputs(), Some(&["capture".to_string()][..]));
        assert_eq!(child.child("").name(), "app.db");
        assert_eq!(child.child("pool").name(), "app.db.pool");

        child.info("c1").unwrap();
        child.debug("filtered").unwrap();
        router.close().unwrap();

        let entries = capture.entries.lock();
        let seen: Vec<(String, u64)> = entries
            .iter()
            .map(|e| (e.logger().to_string(), e.lid()))
            .collect();
        assert_eq!(
            seen,
            vec![("app".to_string(), 1), ("app.db".to_string(), 1)]
        );
    }

    #[test]
    fn test_child_does_not_follow_parent_changes() {
        let (router, _capture) = setup();
        let mut parent = router.logger("app");
        let child = parent.child("worker");
        parent.set_levels(LevelSet::from([Level::ERROR]));

        assert!(child.is_enabled(Level::DEBUG));
        assert!(!parent.is_enabled(Level::DEBUG));
        router.close().unwrap();
    }

    #[test]
    fn test_logf_with_redaction() {
        struct ApiKey;

        impl fmt::Display for ApiKey {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("sk-live-123")
            }
        }

        impl crate::core::redact::Redactable for ApiKey {
            fn redacted(&self) -> String {
                "sk-****".to_string()
            }
        }

        let (router, capture) = setup();
        let logger = router.logger("api");
        logger
            .noticef("using key {} for {}", vec![Arg::redacted(ApiKey), Arg::from("eu-1")])
            .unwrap();
        router.close().unwrap();

        assert_eq!(
            capture.entries.lock()[0].message(),
            "using key sk-**** for eu-1"
        );
    }

    #[test]
    fn test_log_after_close() {
        let (router, _capture) = setup();
        let logger = router.logger("late");
        router.close().unwrap();

        assert!(logger.info("too late").unwrap_err().is_closed());
        assert_eq!(logger.last_lid(), 0);
    }

    #[test]
    fn test_panic_logs_before_unwinding() {
        let (router, capture) = setup();
        let logger = router.logger("app");

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            logger.panicf("invariant broken: {}", vec![Arg::from(7)]);
        }));
        assert!(result.is_err());
        router.close().unwrap();

        let entries = capture.entries.lock();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].level(), Level::ERROR);
        assert_eq!(entries[0].message(), "invariant broken: 7");
    }

    #[test]
    fn test_tracked_call_site() {
        let capture = Capture::new();
        let router = Router::builder().backend(capture.clone()).build().unwrap();
        let logger = router.logger("app");

        let line = line!() + 1;
        logger.info("here").unwrap();
        router.close().unwrap();

        let entries = capture.entries.lock();
        assert!(entries[0].file().ends_with("logger.rs"));
        assert_eq!(entries[0].line(), line);
    }
}
