// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Turns an admitted log call into an entry and hands it to the active
//! pipeline.

use serde_json::Value;
use std::backtrace::Backtrace;
use std::sync::{Arc, RwLock};

use super::entry::{Caller, Field, LogEntry};
use super::pipeline::Pipeline;
use super::structured::RichError;
use super::Level;

/// Holder of the active pipeline
///
/// Emitters take a snapshot of the current pipeline per call, so a
/// reconfiguration never tears an in-flight write.
pub struct Dispatcher {
    active: RwLock<Arc<Pipeline>>,
}

impl Dispatcher {
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            active: RwLock::new(Arc::new(pipeline)),
        }
    }

    pub fn current(&self) -> Arc<Pipeline> {
        let guard = self.active.read().unwrap_or_else(|p| p.into_inner());
        Arc::clone(&guard)
    }

    /// Swap in `pipeline`, returning the one it replaces
    pub fn install(&self, pipeline: Pipeline) -> Arc<Pipeline> {
        let mut guard = self.active.write().unwrap_or_else(|p| p.into_inner());
        std::mem::replace(&mut *guard, Arc::new(pipeline))
    }

    pub(crate) fn dispatch(&self, call: Call<'_>) {
        let pipeline = self.current();

        let mut entry = LogEntry::new(call.level, call.scope, String::new());
        if pipeline.encoding().is_structured() {
            if let Some(err) = call.err {
                // The rich error's fields replace the message entirely
                entry.fields.extend(
                    err.fields()
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), Value::String(v))),
                );
            } else {
                entry.message = call.message;
            }
            entry.fields.extend_from_slice(call.labels);
        } else {
            entry.message = render_text(call.message, call.err, call.labels);
        }

        if call.log_callers {
            entry.caller = Some(call.caller);
        }
        if dump_stack(call.level, call.is_default_scope, call.stack_trace_level) {
            entry.stack = Some(Backtrace::force_capture().to_string());
        }

        if let Err(e) = pipeline.write(&entry) {
            pipeline.report("log write error", &e);
        }
        if call.level == Level::Fatal {
            pipeline.exit(1);
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new(Pipeline::default())
    }
}

/// Everything the dispatcher needs to know about one admitted call
pub(crate) struct Call<'a> {
    pub(crate) level: Level,
    /// Emitted scope name; empty for the default scope
    pub(crate) scope: &'a str,
    pub(crate) is_default_scope: bool,
    pub(crate) stack_trace_level: Level,
    pub(crate) log_callers: bool,
    pub(crate) caller: Caller,
    pub(crate) message: String,
    pub(crate) err: Option<&'a RichError>,
    pub(crate) labels: &'a [Field],
}

/// Whether a call at `level` captures a stack trace.
///
/// On the default scope the call's own level is compared against the stack
/// trace threshold. On named scopes only error-or-worse calls can capture one,
/// and a fatal call needs only a fatal threshold.
pub(crate) fn dump_stack(level: Level, is_default_scope: bool, stack_trace_level: Level) -> bool {
    let needed = if is_default_scope {
        level
    } else if level == Level::Fatal {
        Level::Fatal
    } else {
        Level::Error
    };
    stack_trace_level >= needed
}

/// Text-mode message: the rich error's non-empty fields and the labels are
/// appended after a tab
pub(crate) fn render_text(message: String, err: Option<&RichError>, labels: &[Field]) -> String {
    if err.is_none() && labels.is_empty() {
        return message;
    }

    let mut out = message;
    out.push('\t');
    if let Some(err) = err {
        for (key, value) in err.fields() {
            out.push_str(key);
            out.push('=');
            out.push_str(&value);
            out.push(' ');
        }
    }
    let rendered: Vec<String> = labels
        .iter()
        .map(|(k, v)| format!("{}={}", k, label_text(v)))
        .collect();
    out.push_str(&rendered.join(" "));
    out
}

fn label_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
