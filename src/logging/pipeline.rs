// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Tee composition of sinks plus the lifecycle hooks that travel with it.

use chrono::Utc;
use std::fmt::Display;
use std::sync::Arc;

use super::entry::{format_time, Encoding, Field, LogEntry};
use super::sink::{LogSink, Outputs};
use super::{Level, LogError};

/// Close hook registered by a sink that holds external resources
pub type CloseFn = Box<dyn Fn() -> Result<(), LogError> + Send + Sync>;

/// Process termination hook invoked after a fatal record is written
pub type ExitHook = Arc<dyn Fn(i32) + Send + Sync>;

/// Ordered set of sinks that all see the same entry
///
/// Each sink is asked whether it accepts the entry's level before the entry
/// is handed to it.
#[derive(Default)]
pub struct Tee {
    sinks: Vec<Box<dyn LogSink>>,
}

impl Tee {
    pub fn new(sinks: Vec<Box<dyn LogSink>>) -> Self {
        Self { sinks }
    }

    pub fn push(&mut self, sink: Box<dyn LogSink>) {
        self.sinks.push(sink);
    }
}

impl LogSink for Tee {
    fn enabled(&self, level: Level) -> bool {
        self.sinks.iter().any(|s| s.enabled(level))
    }

    fn write(&self, entry: &LogEntry) -> Result<(), LogError> {
        let mut first_err = None;
        for sink in self.sinks.iter().filter(|s| s.enabled(entry.level)) {
            if let Err(e) = sink.write(entry) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn flush(&self) -> Result<(), LogError> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.flush() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn close(&self) -> Result<(), LogError> {
        let mut first_err = None;
        for sink in &self.sinks {
            if let Err(e) = sink.close() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn with_fields(&self, fields: &[Field]) -> Box<dyn LogSink> {
        Box::new(Tee {
            sinks: self.sinks.iter().map(|s| s.with_fields(fields)).collect(),
        })
    }
}

/// The active backend: a tee of sinks, the encoding call sites render for,
/// a dedicated error sink, and the close/exit hooks
pub struct Pipeline {
    tee: Tee,
    encoding: Encoding,
    error_sink: Outputs,
    closers: Vec<CloseFn>,
    exit: ExitHook,
}

impl Pipeline {
    pub fn new(base: Box<dyn LogSink>, encoding: Encoding, error_sink: Outputs) -> Self {
        Self {
            tee: Tee::new(vec![base]),
            encoding,
            error_sink,
            closers: Vec::new(),
            exit: Arc::new(|code| std::process::exit(code)),
        }
    }

    /// Replace the fatal-record exit hook
    pub fn with_exit_hook(mut self, exit: ExitHook) -> Self {
        self.exit = exit;
        self
    }

    /// Add a sink after the existing ones
    pub fn tee(&mut self, sink: Box<dyn LogSink>) {
        self.tee.push(sink);
    }

    /// Register a hook run by [`Pipeline::close`]
    pub fn on_close(&mut self, f: CloseFn) {
        self.closers.push(f);
    }

    pub fn sinks(&self) -> &Tee {
        &self.tee
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn write(&self, entry: &LogEntry) -> Result<(), LogError> {
        self.tee.write(entry)
    }

    /// Flush every sink; all sinks are attempted and the first error returned
    pub fn sync(&self) -> Result<(), LogError> {
        self.tee.flush()
    }

    /// Flush best-effort, then run every close hook.
    ///
    /// Every hook runs even if an earlier one fails. Each failure is reported
    /// to the error sink; only the first is returned.
    pub fn close(&self) -> Result<(), LogError> {
        if let Err(e) = self.tee.close() {
            self.report("log sync error", &e);
        }

        let mut first_err = None;
        for close in &self.closers {
            if let Err(e) = close() {
                self.report("log close error", &e);
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Write one diagnostic line to the error sink
    pub fn report(&self, what: &str, err: &dyn Display) {
        let line = format!("{} {}: {}\n", format_time(&Utc::now()), what, err);
        let _ = self.error_sink.write_all(line.as_bytes());
        let _ = self.error_sink.sync();
    }

    pub fn exit_hook(&self) -> ExitHook {
        Arc::clone(&self.exit)
    }

    pub(crate) fn exit(&self, code: i32) {
        (self.exit)(code)
    }
}

impl Default for Pipeline {
    /// Text to stdout, diagnostics to stderr
    fn default() -> Self {
        use super::sink::{ConsoleSink, Output};
        let base = ConsoleSink::new(
            Outputs::new(vec![Output::Stdout]),
            Encoding::Console,
            Level::Debug,
        );
        Pipeline::new(
            Box::new(base),
            Encoding::Console,
            Outputs::new(vec![Output::Stderr]),
        )
    }
}

impl Drop for Pipeline {
    /// Writers that loaded this pipeline before a swap may still land records
    /// after `close`; the last holder flushes them.
    fn drop(&mut self) {
        if let Err(e) = self.tee.flush() {
            self.report("log sync error", &e);
        }
    }
}
