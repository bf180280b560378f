// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Errors surfaced by configuration and by sink lifecycle calls.

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced by the logging subsystem
///
/// Emission calls never return these; they are reported to the error sink.
/// Configuration and lifecycle (`sync`, `close`) calls return them.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("invalid log level '{0}'")]
    InvalidLevel(String),

    #[error("invalid output level format '{0}'")]
    InvalidScopedLevel(String),

    #[error("no level defined for scope '{0}'")]
    NoLevelForScope(String),

    #[error("a project must be provided for remote aggregator export")]
    MissingRemoteTarget,

    #[error("failed to open log destination '{}': {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode log entry: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("error writing logs to remote aggregator: {0}")]
    Remote(String),

    #[error("local collector error: {0}")]
    Collector(String),

    #[error("failed to parse log options: {0}")]
    ConfigParse(String),

    #[error("failed to read log options file '{}': {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
