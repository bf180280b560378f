// SPDX-License-Identifier: Apache-2.0 OR MIT
// Sink abstraction and the console/file sink

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use super::entry::{Encoding, Field, LogEntry};
use super::rotate::{RotatingFile, RotationPolicy};
use super::{Level, LogError};

/// Backend destination for log entries
///
/// Sinks are shared across emitting threads, so every method takes `&self`
/// and implementations guard their own mutable state.
pub trait LogSink: Send + Sync {
    /// Whether a record at `level` should be handed to this sink
    fn enabled(&self, level: Level) -> bool;

    /// Write one entry
    fn write(&self, entry: &LogEntry) -> Result<(), LogError>;

    /// Push buffered entries to their destination
    fn flush(&self) -> Result<(), LogError>;

    /// Release resources held by the sink
    fn close(&self) -> Result<(), LogError> {
        self.flush()
    }

    /// A sink sharing this one's configuration that adds `fields` to every
    /// entry it writes. The receiver is not modified.
    fn with_fields(&self, fields: &[Field]) -> Box<dyn LogSink>;
}

/// Most verbose level `base` accepts, or `Level::None` if it accepts nothing
///
/// Tee'd sinks compute their threshold from the base sink once, at
/// construction.
pub fn minimum_enabled(base: &dyn LogSink) -> Level {
    Level::EMITTABLE
        .iter()
        .rev()
        .copied()
        .find(|level| base.enabled(*level))
        .unwrap_or(Level::None)
}

/// A single byte destination
pub enum Output {
    Stdout,
    Stderr,
    File(Mutex<File>),
    Rotating(Mutex<RotatingFile>),
    Writer(Mutex<Box<dyn Write + Send>>),
}

impl Output {
    /// Open a destination by name: `stdout`, `stderr`, or a file path
    /// opened for appending
    pub fn open(target: &str) -> Result<Self, LogError> {
        match target {
            "stdout" => Ok(Output::Stdout),
            "stderr" => Ok(Output::Stderr),
            path => OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map(|f| Output::File(Mutex::new(f)))
                .map_err(|source| LogError::Open {
                    path: PathBuf::from(path),
                    source,
                }),
        }
    }

    pub fn rotating(path: &str, policy: RotationPolicy) -> Result<Self, LogError> {
        RotatingFile::open(path, policy)
            .map(|f| Output::Rotating(Mutex::new(f)))
            .map_err(|source| LogError::Open {
                path: PathBuf::from(path),
                source,
            })
    }

    /// Wrap an arbitrary writer
    pub fn writer(w: impl Write + Send + 'static) -> Self {
        Output::Writer(Mutex::new(Box::new(w)))
    }

    fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        match self {
            Output::Stdout => io::stdout().lock().write_all(buf),
            Output::Stderr => io::stderr().lock().write_all(buf),
            Output::File(f) => lock(f).write_all(buf),
            Output::Rotating(f) => lock(f).write_all(buf),
            Output::Writer(w) => lock(w).write_all(buf),
        }
    }

    fn sync(&self) -> io::Result<()> {
        match self {
            Output::Stdout => io::stdout().flush(),
            Output::Stderr => io::stderr().flush(),
            Output::File(f) => {
                let mut f = lock(f);
                f.flush()?;
                f.sync_data()
            }
            Output::Rotating(f) => lock(f).flush(),
            Output::Writer(w) => lock(w).flush(),
        }
    }
}

fn lock<T: ?Sized>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    // A panic while holding an output lock leaves the writer usable
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Fan-out over several outputs; every output is attempted and the first
/// failure is returned
#[derive(Default)]
pub struct Outputs(Vec<Output>);

impl Outputs {
    pub fn new(outputs: Vec<Output>) -> Self {
        Self(outputs)
    }

    /// Open every named destination, failing on the first that cannot be
    /// opened
    pub fn open_all<S: AsRef<str>>(targets: &[S]) -> Result<Self, LogError> {
        targets
            .iter()
            .map(|t| Output::open(t.as_ref()))
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    pub fn push(&mut self, output: Output) {
        self.0.push(output);
    }

    pub fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        let mut first_err = None;
        for output in &self.0 {
            if let Err(e) = output.write_all(buf) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    pub fn sync(&self) -> io::Result<()> {
        let mut first_err = None;
        for output in &self.0 {
            if let Err(e) = output.sync() {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }
}

/// Synchronous sink writing encoded entries to console and/or files
pub struct ConsoleSink {
    outputs: Arc<Outputs>,
    encoding: Encoding,
    threshold: Level,
    fields: Vec<Field>,
}

impl ConsoleSink {
    /// Sink accepting every level up to and including `threshold`
    pub fn new(outputs: Outputs, encoding: Encoding, threshold: Level) -> Self {
        Self {
            outputs: Arc::new(outputs),
            encoding,
            threshold,
            fields: Vec::new(),
        }
    }
}

impl LogSink for ConsoleSink {
    fn enabled(&self, level: Level) -> bool {
        self.threshold.admits(level)
    }

    fn write(&self, entry: &LogEntry) -> Result<(), LogError> {
        let line = self.encoding.encode(entry, &self.fields)?;
        self.outputs.write_all(line.as_bytes())?;
        if entry.level == Level::Fatal {
            self.outputs.sync()?;
        }
        Ok(())
    }

    fn flush(&self) -> Result<(), LogError> {
        self.outputs.sync().map_err(LogError::from)
    }

    fn with_fields(&self, fields: &[Field]) -> Box<dyn LogSink> {
        let mut merged = self.fields.clone();
        merged.extend_from_slice(fields);
        Box::new(ConsoleSink {
            outputs: Arc::clone(&self.outputs),
            encoding: self.encoding,
            threshold: self.threshold,
            fields: merged,
        })
    }
}
