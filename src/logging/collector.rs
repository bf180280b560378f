// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Buffered sink shipping JSON-encoded entries to a local collector over a
//! Unix domain socket.
//!
//! Entries are buffered in memory and delivered on flush as one HTTP POST
//! whose body is a JSON array of the encoded lines. The buffer is drained
//! before the POST is attempted, so a failed delivery drops the batch.
//!
//! Reads and writes are bounded by [`COLLECTOR_TIMEOUT`]. The connect itself
//! is not: `std` has no connect timeout for Unix sockets. Connecting to a
//! missing or unbound socket fails at once; only a collector whose accept
//! backlog is full can stall a flush.

use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::entry::{Encoding, Field, LogEntry};
use super::sink::LogSink;
use super::{Level, LogError};

/// Read and write timeout for one delivery
pub const COLLECTOR_TIMEOUT: Duration = Duration::from_millis(100);

/// Location of the local collector
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectorExport {
    /// Filesystem path of the collector's socket
    pub socket_address: PathBuf,
    /// HTTP path the batch is posted to
    pub path: String,
}

impl CollectorExport {
    pub fn new(socket_address: impl Into<PathBuf>, path: impl Into<String>) -> Self {
        Self {
            socket_address: socket_address.into(),
            path: path.into(),
        }
    }

    fn url(&self) -> String {
        format!("http://unix{}{}", self.socket_address.display(), self.request_path())
    }

    fn request_path(&self) -> String {
        if self.path.starts_with('/') {
            self.path.clone()
        } else {
            format!("/{}", self.path)
        }
    }

    /// POST `body` and require a 200 response
    fn post(&self, body: &[u8]) -> Result<(), LogError> {
        let fail = |e: std::io::Error| {
            LogError::Collector(format!("failed to send logs to {}: {}", self.url(), e))
        };

        let mut stream = UnixStream::connect(&self.socket_address).map_err(fail)?;
        stream.set_read_timeout(Some(COLLECTOR_TIMEOUT)).map_err(fail)?;
        stream.set_write_timeout(Some(COLLECTOR_TIMEOUT)).map_err(fail)?;

        let head = format!(
            "POST {} HTTP/1.1\r\nHost: unix\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            self.request_path(),
            body.len()
        );
        stream.write_all(head.as_bytes()).map_err(fail)?;
        stream.write_all(body).map_err(fail)?;
        stream.flush().map_err(fail)?;

        let status_line = read_status_line(&mut stream).map_err(fail)?;
        match status_line.split_whitespace().nth(1) {
            Some("200") => Ok(()),
            _ => Err(LogError::Collector(format!(
                "collector {} returned non-ok status: {}",
                self.url(),
                status_line
            ))),
        }
    }
}

fn read_status_line(stream: &mut UnixStream) -> std::io::Result<String> {
    let mut response = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        if let Some(end) = response.windows(2).position(|w| w == b"\r\n") {
            response.truncate(end);
            break;
        }
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        response.extend_from_slice(&chunk[..n]);
    }
    Ok(String::from_utf8_lossy(&response).into_owned())
}

/// Sink buffering entries for the local collector
pub struct CollectorSink {
    export: Arc<CollectorExport>,
    threshold: Level,
    buffer: Arc<Mutex<Vec<String>>>,
    fields: Vec<Field>,
}

impl CollectorSink {
    pub fn new(export: CollectorExport, threshold: Level) -> Self {
        Self {
            export: Arc::new(export),
            threshold,
            buffer: Arc::new(Mutex::new(Vec::new())),
            fields: Vec::new(),
        }
    }

    /// Number of entries waiting for the next flush
    pub fn buffered(&self) -> usize {
        self.lock().len()
    }

    /// Take every buffered line, leaving the buffer empty
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl LogSink for CollectorSink {
    fn enabled(&self, level: Level) -> bool {
        self.threshold.admits(level)
    }

    fn write(&self, entry: &LogEntry) -> Result<(), LogError> {
        let line = Encoding::Json.encode(entry, &self.fields)?;
        self.lock().push(line);
        Ok(())
    }

    fn flush(&self) -> Result<(), LogError> {
        let lines = self.drain();
        if lines.is_empty() {
            return Ok(());
        }
        let body = serde_json::to_vec(&lines)?;
        self.export.post(&body)
    }

    fn with_fields(&self, fields: &[Field]) -> Box<dyn LogSink> {
        let mut merged = self.fields.clone();
        merged.extend_from_slice(fields);
        Box::new(CollectorSink {
            export: Arc::clone(&self.export),
            threshold: self.threshold,
            buffer: Arc::clone(&self.buffer),
            fields: merged,
        })
    }
}
