// SPDX-License-Identifier: Apache-2.0 OR MIT
// Log entry record and its encodings

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};
use std::panic::Location;

use super::{Level, LogError};

/// Structured key/value attached to an entry, in attachment order
pub type Field = (String, Value);

/// Source location of the emitting call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
}

impl Caller {
    pub fn from_location(location: &Location<'static>) -> Self {
        Self {
            file: location.file(),
            line: location.line(),
        }
    }

    /// `dir/file.rs:line`, keeping only the last directory component
    pub fn short(&self) -> String {
        let mut parts = self.file.rsplitn(3, |c: char| c == '/' || c == '\\');
        let file = parts.next().unwrap_or(self.file);
        match parts.next() {
            Some(dir) => format!("{}/{}:{}", dir, file, self.line),
            None => format!("{}:{}", file, self.line),
        }
    }
}

/// One record handed to the sinks
///
/// Built per log call and dropped after dispatch.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: Level,
    /// Emitted scope name; empty for the default scope
    pub scope: String,
    pub time: DateTime<Utc>,
    pub message: String,
    pub caller: Option<Caller>,
    pub stack: Option<String>,
    pub fields: Vec<Field>,
}

impl LogEntry {
    pub fn new(level: Level, scope: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            scope: scope.into(),
            time: Utc::now(),
            message: message.into(),
            caller: None,
            stack: None,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((key.into(), value.into()));
        self
    }
}

/// Layout used to turn an entry into bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// Tab separated, human oriented
    #[default]
    Console,
    /// One JSON object per line
    Json,
    /// JSON object with the remote aggregator's key names and severities
    Aggregator,
}

impl Encoding {
    /// Whether call sites should produce structured fields instead of
    /// folding them into the message text
    pub fn is_structured(self) -> bool {
        !matches!(self, Encoding::Console)
    }

    /// Encode `entry` as one line (newline terminated). `extra` fields come
    /// before the entry's own fields.
    pub fn encode(self, entry: &LogEntry, extra: &[Field]) -> Result<String, LogError> {
        match self {
            Encoding::Console => Ok(encode_console(entry, extra)),
            Encoding::Json => encode_json(entry, extra),
            Encoding::Aggregator => encode_aggregator(entry, extra),
        }
    }
}

/// UTC time with microsecond precision, e.g. `2024-03-01T12:00:00.000001Z`
pub fn format_time(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Severity name used by the remote aggregator
pub fn aggregator_severity(level: Level) -> &'static str {
    match level {
        Level::Debug => "DEBUG",
        Level::Info => "INFO",
        Level::Warn => "WARNING",
        Level::Error => "ERROR",
        Level::Fatal => "CRITICAL",
        Level::None => "DEFAULT",
    }
}

fn field_map(extra: &[Field], fields: &[Field]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in extra.iter().chain(fields) {
        map.insert(k.clone(), v.clone());
    }
    map
}

fn encode_console(entry: &LogEntry, extra: &[Field]) -> String {
    let mut line = format_time(&entry.time);
    line.push('\t');
    line.push_str(entry.level.as_str());
    if !entry.scope.is_empty() {
        line.push('\t');
        line.push_str(&entry.scope);
    }
    if let Some(caller) = &entry.caller {
        line.push('\t');
        line.push_str(&caller.short());
    }
    line.push('\t');
    line.push_str(&entry.message);

    if !extra.is_empty() || !entry.fields.is_empty() {
        line.push('\t');
        line.push_str(&Value::Object(field_map(extra, &entry.fields)).to_string());
    }
    if let Some(stack) = &entry.stack {
        line.push('\n');
        line.push_str(stack.trim_end());
    }
    line.push('\n');
    line
}

fn encode_json(entry: &LogEntry, extra: &[Field]) -> Result<String, LogError> {
    let mut map = Map::new();
    map.insert("time".into(), Value::String(format_time(&entry.time)));
    map.insert("level".into(), Value::String(entry.level.as_str().into()));
    if !entry.scope.is_empty() {
        map.insert("scope".into(), Value::String(entry.scope.clone()));
    }
    if let Some(caller) = &entry.caller {
        map.insert("caller".into(), Value::String(caller.short()));
    }
    if !entry.message.is_empty() {
        map.insert("msg".into(), Value::String(entry.message.clone()));
    }
    map.extend(field_map(extra, &entry.fields));
    if let Some(stack) = &entry.stack {
        map.insert("stack".into(), Value::String(stack.clone()));
    }

    let mut line = serde_json::to_string(&Value::Object(map))?;
    line.push('\n');
    Ok(line)
}

fn encode_aggregator(entry: &LogEntry, extra: &[Field]) -> Result<String, LogError> {
    let mut map = Map::new();
    map.insert(
        "timestamp".into(),
        Value::String(entry.time.to_rfc3339_opts(SecondsFormat::Nanos, true)),
    );
    map.insert(
        "severity".into(),
        Value::String(aggregator_severity(entry.level).into()),
    );
    if !entry.scope.is_empty() {
        map.insert("logger".into(), Value::String(entry.scope.clone()));
    }
    if let Some(caller) = &entry.caller {
        map.insert("caller".into(), Value::String(caller.short()));
    }
    if !entry.message.is_empty() {
        map.insert("message".into(), Value::String(entry.message.clone()));
    }
    map.extend(field_map(extra, &entry.fields));
    if let Some(stack) = &entry.stack {
        map.insert("stacktrace".into(), Value::String(stack.clone()));
    }

    let mut line = serde_json::to_string(&Value::Object(map))?;
    line.push('\n');
    Ok(line)
}
