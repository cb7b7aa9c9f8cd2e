//! Process-wide default logging
//!
//! The first call to any function here starts the default [`Logging`]
//! (stdout and stderr outputs, logger named `main`) unless [`init_with_config`]
//! ran before. After [`close`], every call fails with
//! [`RouterError::RouterClosed`].

use crate::config::{self, Config, Logging};
use crate::core::{Arg, Level, Logger, Payload, Result, RouterError};
use std::sync::OnceLock;

static LOGGING: OnceLock<Logging> = OnceLock::new();

/// Start the default logging with the default configuration
pub fn init() -> Result<&'static Logging> {
    install(config::init()?)
}

/// Start the default logging with `config`
///
/// Fails if the default logging is already running.
pub fn init_with_config(config: &Config) -> Result<&'static Logging> {
    install(config::configure(config)?)
}

fn install(logging: Logging) -> Result<&'static Logging> {
    if let Err(rejected) = LOGGING.set(logging) {
        if let Err(e) = rejected.close() {
            eprintln!("[ROUTER WARNING] Failed to close unused router: {}", e);
        }
        return Err(RouterError::config(
            "global",
            "default logging is already initialized",
        ));
    }
    current()
}

fn current() -> Result<&'static Logging> {
    LOGGING
        .get()
        .ok_or_else(|| RouterError::config("global", "default logging is not initialized"))
}

/// The default logging, started on first use
pub fn logging() -> Result<&'static Logging> {
    if let Some(logging) = LOGGING.get() {
        return Ok(logging);
    }
    match init() {
        Ok(logging) => Ok(logging),
        // another thread won the race
        Err(RouterError::InvalidConfiguration { .. }) => current(),
        Err(e) => Err(e),
    }
}

/// A logger from the default logging
pub fn logger(name: &str) -> Result<Logger> {
    Ok(logging()?.logger(name))
}

/// Log `message` at INFO through the default logger
#[track_caller]
pub fn println(message: impl Into<Payload>) -> Result<()> {
    logging()?.default_logger().log(Level::INFO, message)
}

/// Log a `{}` format string at INFO through the default logger
#[track_caller]
pub fn printf(format: &str, args: Vec<Arg>) -> Result<()> {
    logging()?.default_logger().logf(Level::INFO, format, args)
}

/// Log at ERROR, drain the default router and exit with status 1
#[track_caller]
pub fn fatal(message: impl Into<Payload>) -> ! {
    match logging() {
        Ok(logging) => logging.default_logger().fatal(message),
        Err(e) => {
            eprintln!("[ROUTER ERROR] Default logging unavailable: {}", e);
            eprintln!("{}", message.into().render());
            std::process::exit(1)
        }
    }
}

#[track_caller]
pub fn fatalf(format: &str, args: Vec<Arg>) -> ! {
    match logging() {
        Ok(logging) => logging.default_logger().fatalf(format, args),
        Err(e) => {
            eprintln!("[ROUTER ERROR] Default logging unavailable: {}", e);
            let payload = Payload::Format {
                format: format.to_string(),
                args,
            };
            eprintln!("{}", payload.render());
            std::process::exit(1)
        }
    }
}

/// Drain and stop the default router
pub fn close() -> Result<()> {
    logging()?.close()
}
