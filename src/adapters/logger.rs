//! Stderr backend for the `log` facade.
//!
//! The daemon runs under a service manager that timestamps and stores
//! stderr, so records are written bare: `target: message`.

use std::io::Write;

use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::config::log_level_filter;

/// Environment variable that overrides the configured level.
pub const LEVEL_ENV: &str = "HPM_LOG";

struct StderrLogger;

static LOGGER: StderrLogger = StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}: {}", record.target(), record.args());
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

/// Install the logger.  Fails if another logger is already set.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Change the level at runtime (config reload).
pub fn set_level(level: LevelFilter) {
    log::set_max_level(level);
}

/// `HPM_LOG` wins over the config key; anything unparsable means `info`.
pub fn resolve_level(configured: &str, env: Option<&str>) -> LevelFilter {
    env.and_then(log_level_filter)
        .or_else(|| log_level_filter(configured))
        .unwrap_or(LevelFilter::Info)
}
