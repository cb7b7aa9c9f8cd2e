//! Custom backend alongside the built-in ones
//!
//! Run with: cargo run --example custom_backend

use rust_log_router::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Counts entries per level instead of writing them
struct LevelCounter {
    config: BackendConfig,
    counts: [AtomicU64; 5],
}

impl LevelCounter {
    fn new() -> Result<Self> {
        Ok(Self {
            config: BackendConfig::new(MESSAGE_FORMAT, LevelSet::all())?,
            counts: Default::default(),
        })
    }
}

impl Backend for LevelCounter {
    fn name(&self) -> &str {
        "counter"
    }

    fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn log(&self, entry: &Entry) -> Result<()> {
        if !self.wants(entry) {
            return Ok(());
        }
        if let Some(count) = self.counts.get(entry.level().ordinal() as usize) {
            count.fetch_add(1, Ordering::Relaxed);
        }
        Ok(())
    }
}

fn main() -> Result<()> {
    let counter = Arc::new(LevelCounter::new()?);
    let router = Router::builder()
        .on_backend_error(Arc::new(|backend: &str, err: &RouterError| {
            eprintln!("backend {} removed: {}", backend, err);
        }))
        .build()?;

    router.set_backends(vec![
        Arc::new(FileBackend::stdout(
            DEFAULT_FORMAT,
            LevelSet::from([Level::DEBUG, Level::INFO, Level::NOTICE]),
        )?) as SharedBackend,
        Arc::new(FileBackend::stderr(
            DEFAULT_FORMAT,
            LevelSet::from([Level::WARNING, Level::ERROR]),
        )?),
        Arc::new(FileBackend::open("out.log", DEBUG_FORMAT, LevelSet::all())?),
        counter.clone(),
    ])?;

    let logger = router.logger("example");
    let child = logger.child("child");
    for logger in [&logger, &child] {
        logger.debug("debug")?;
        logger.info("info")?;
        logger.notice("notice")?;
        logger.warning("warning")?;
        logger.error("error")?;
    }

    println!("{}", router.status()?);
    router.close()?;

    for level in Level::BUILTIN {
        let count = counter.counts[level.ordinal() as usize].load(Ordering::Relaxed);
        println!("{:<8} {}", level.to_string(), count);
    }
    Ok(())
}
