// SPDX-License-Identifier: Apache-2.0 OR MIT
// Scope-partitioned logging
//
// Scopes are registered in a ScopeRegistry and share one Dispatcher, which
// holds the active Pipeline: a tee of sinks plus an error sink and the
// close/exit hooks. Configuration builds a new pipeline and swaps it in.

pub mod bridge;
pub mod collector;
mod configure;
pub mod dispatch;
pub mod entry;
mod error;
#[macro_use]
mod macros;
pub mod pipeline;
pub mod registry;
pub mod remote;
pub mod rotate;
pub mod scope;
mod severity;
pub mod sink;
pub mod structured;

// Public exports
pub use bridge::LogBridge;
pub use collector::{CollectorExport, CollectorSink};
pub use configure::build_pipeline;
pub use dispatch::Dispatcher;
pub use entry::{Caller, Encoding, Field, LogEntry};
pub use error::LogError;
pub use pipeline::{CloseFn, ExitHook, Pipeline, Tee};
pub use registry::ScopeRegistry;
pub use remote::{MonitoredResource, RemoteClient, RemoteConnector, RemoteEntry, RemoteExport, RemoteSink};
pub use rotate::{RotatingFile, RotationPolicy};
pub use scope::{Scope, DEFAULT_SCOPE_NAME, LABELS_ERROR_KEY, OVERRIDE_SCOPE_NAME};
pub use severity::Level;
pub use sink::{minimum_enabled, ConsoleSink, LogSink, Output, Outputs};
pub use structured::RichError;
