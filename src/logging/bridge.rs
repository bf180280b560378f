// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Routes records from the `log` facade into a scope, so libraries logging
//! through `log` share the scope's level and sinks.

use std::panic::Location;

use super::entry::Caller;
use super::scope::Scope;
use super::Level;

/// `log::Log` implementation writing to one scope
pub struct LogBridge {
    scope: Scope,
}

impl LogBridge {
    pub fn new(scope: Scope) -> Self {
        Self { scope }
    }

    /// Install as the process-wide `log` logger.
    ///
    /// All `log` levels are let through the facade; the scope's output level
    /// does the filtering.
    pub fn install(scope: Scope) -> Result<(), log::SetLoggerError> {
        log::set_boxed_logger(Box::new(Self::new(scope)))?;
        log::set_max_level(log::LevelFilter::Trace);
        Ok(())
    }
}

/// Scope level a `log` record is emitted at
pub fn level_from_log(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warn,
        log::Level::Info => Level::Info,
        log::Level::Debug | log::Level::Trace => Level::Debug,
    }
}

impl log::Log for LogBridge {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.scope
            .output_level()
            .admits(level_from_log(metadata.level()))
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let caller = match (record.file_static(), record.line()) {
            (Some(file), Some(line)) => Caller { file, line },
            _ => Caller::from_location(Location::caller()),
        };
        let message = record.args().to_string();
        self.scope.emit(
            level_from_log(record.level()),
            None,
            &message.trim_end_matches('\n'),
            caller,
        );
    }

    fn flush(&self) {
        let _ = self.scope.dispatcher().current().sync();
    }
}
