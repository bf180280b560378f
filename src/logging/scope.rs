// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Named logging scopes and their per-scope settings.

use serde_json::Value;
use std::fmt::{self, Display};
use std::panic::Location;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;

use super::dispatch::{Call, Dispatcher};
use super::entry::{Caller, Field};
use super::structured::RichError;
use super::Level;

/// Name of the scope used for unscoped logging
pub const DEFAULT_SCOPE_NAME: &str = "default";
/// Pseudo scope name addressing every registered scope in configuration
pub const OVERRIDE_SCOPE_NAME: &str = "all";
/// Label key carrying diagnostics about malformed label lists
pub const LABELS_ERROR_KEY: &str = "with_labels_error";

/// Characters a scope name cannot contain
pub(crate) const RESERVED_CHARS: &[char] = &[':', ',', '.'];

/// Settings shared by every handle to a registered scope
pub(crate) struct ScopeState {
    name: String,
    description: String,
    caller_skip: usize,
    output_level: AtomicU8,
    stack_trace_level: AtomicU8,
    log_callers: AtomicBool,
}

impl ScopeState {
    pub(crate) fn new(name: &str, description: &str, caller_skip: usize) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            caller_skip,
            output_level: AtomicU8::new(Level::Info.as_u8()),
            stack_trace_level: AtomicU8::new(Level::None.as_u8()),
            log_callers: AtomicBool::new(false),
        }
    }

    fn load(level: &AtomicU8) -> Level {
        Level::from_u8(level.load(Ordering::Relaxed)).unwrap_or(Level::None)
    }
}

/// Handle to a registered scope
///
/// Output level, stack trace level and caller reporting live in the shared
/// registration and are seen by every handle. Labels belong to the handle:
/// [`Scope::with_labels`] returns a new handle and leaves this one unchanged.
#[derive(Clone)]
pub struct Scope {
    state: Arc<ScopeState>,
    dispatcher: Arc<Dispatcher>,
    labels: Vec<Field>,
}

macro_rules! level_methods {
    ($($level:ident: $log:ident, $log_with:ident, $enabled:ident;)*) => {
        $(
            #[doc = concat!("Emit `msg` at ", stringify!($level), " level")]
            #[track_caller]
            pub fn $log(&self, msg: impl Display) {
                self.emit(Level::$level, None, &msg, Caller::from_location(Location::caller()));
            }

            #[doc = concat!("Emit `msg` with a rich error at ", stringify!($level), " level")]
            #[track_caller]
            pub fn $log_with(&self, err: &RichError, msg: impl Display) {
                self.emit(Level::$level, Some(err), &msg, Caller::from_location(Location::caller()));
            }

            #[doc = concat!("Whether ", stringify!($level), " output is enabled for this scope")]
            pub fn $enabled(&self) -> bool {
                self.output_level().admits(Level::$level)
            }
        )*
    };
}

impl Scope {
    pub(crate) fn new(state: Arc<ScopeState>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            state,
            dispatcher,
            labels: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.state.name
    }

    pub fn description(&self) -> &str {
        &self.state.description
    }

    /// Extra stack frames to skip when attributing the caller
    pub fn caller_skip(&self) -> usize {
        self.state.caller_skip
    }

    pub(crate) fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn is_default(&self) -> bool {
        self.state.name == DEFAULT_SCOPE_NAME
    }

    /// Whether both handles refer to the same registration
    pub fn same_identity(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    pub fn output_level(&self) -> Level {
        ScopeState::load(&self.state.output_level)
    }

    pub fn set_output_level(&self, level: Level) {
        self.state.output_level.store(level.as_u8(), Ordering::Relaxed);
    }

    pub fn stack_trace_level(&self) -> Level {
        ScopeState::load(&self.state.stack_trace_level)
    }

    pub fn set_stack_trace_level(&self, level: Level) {
        self.state
            .stack_trace_level
            .store(level.as_u8(), Ordering::Relaxed);
    }

    pub fn log_callers(&self) -> bool {
        self.state.log_callers.load(Ordering::Relaxed)
    }

    pub fn set_log_callers(&self, enabled: bool) {
        self.state.log_callers.store(enabled, Ordering::Relaxed);
    }

    /// Labels attached to this handle, in attachment order
    pub fn labels(&self) -> &[Field] {
        &self.labels
    }

    /// Handle with one more label; an existing key keeps its position and
    /// takes the new value
    pub fn with_label(&self, key: impl Into<String>, value: impl Into<Value>) -> Scope {
        let mut out = self.clone();
        out.put_label(key.into(), value.into());
        out
    }

    /// Handle with labels taken from a flat `key, value, key, value, ...`
    /// list.
    ///
    /// Malformed lists do not fail: an odd-length list or a non-string key
    /// attaches a [`LABELS_ERROR_KEY`] label describing the problem, keeping
    /// any pairs accepted before it.
    pub fn with_labels<I>(&self, kvlist: I) -> Scope
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let items: Vec<Value> = kvlist.into_iter().map(Into::into).collect();
        let mut out = self.clone();

        if items.len() % 2 != 0 {
            out.put_label(
                LABELS_ERROR_KEY.to_string(),
                Value::String(format!(
                    "even number of parameters required, got {}",
                    items.len()
                )),
            );
            return out;
        }

        let mut iter = items.into_iter();
        while let (Some(key), Some(value)) = (iter.next(), iter.next()) {
            match key {
                Value::String(key) => out.put_label(key, value),
                other => {
                    out.put_label(
                        LABELS_ERROR_KEY.to_string(),
                        Value::String(format!("label name {} must be a string", other)),
                    );
                    return out;
                }
            }
        }
        out
    }

    fn put_label(&mut self, key: String, value: Value) {
        match self.labels.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.labels.push((key, value)),
        }
    }

    level_methods! {
        Fatal: fatal, fatal_with, fatal_enabled;
        Error: error, error_with, error_enabled;
        Warn: warn, warn_with, warn_enabled;
        Info: info, info_with, info_enabled;
        Debug: debug, debug_with, debug_enabled;
    }

    /// Emit at a runtime-chosen level
    #[track_caller]
    pub fn log(&self, level: Level, err: Option<&RichError>, msg: impl Display) {
        self.emit(level, err, &msg, Caller::from_location(Location::caller()));
    }

    pub(crate) fn emit(
        &self,
        level: Level,
        err: Option<&RichError>,
        msg: &dyn Display,
        caller: Caller,
    ) {
        if level == Level::None || !self.output_level().admits(level) {
            return;
        }
        let emitted_name = if self.is_default() { "" } else { self.name() };
        self.dispatcher.dispatch(Call {
            level,
            scope: emitted_name,
            is_default_scope: self.is_default(),
            stack_trace_level: self.stack_trace_level(),
            log_callers: self.log_callers(),
            caller,
            message: msg.to_string(),
            err,
            labels: &self.labels,
        });
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("name", &self.name())
            .field("output_level", &self.output_level())
            .field("stack_trace_level", &self.stack_trace_level())
            .field("log_callers", &self.log_callers())
            .field("labels", &self.labels)
            .finish()
    }
}
