//! Basic usage through the process-wide default logging
//!
//! Run with: cargo run --example basic

use rust_log_router::{global, info, warning, Arg, Result};

fn main() -> Result<()> {
    global::println("output")?;
    global::printf("formatted {}", vec![Arg::from("output")])?;

    let logger = global::logger("main")?;
    logger.debug("debug")?;
    logger.info("info")?;
    logger.notice("notice")?;
    logger.warning("warning")?;
    logger.error("error")?;

    let worker = logger.child("worker");
    info!(worker, "processing {} items", 3)?;
    warning!(worker, "queue at {}%", 85)?;

    global::fatalf("formatted {}", vec![Arg::from("error")])
}
