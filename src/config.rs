// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Logging options and their JSON5 file form.
//!
//! Per-scope levels are kept as comma separated `<scope>:<level>` strings,
//! the same form the command line accepts. A bare `<level>` entry is the
//! default scope's, and the pseudo scope `all` addresses every scope.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::logging::collector::CollectorExport;
use crate::logging::entry::Encoding;
use crate::logging::remote::{RemoteConnector, RemoteExport};
use crate::logging::rotate::RotationPolicy;
use crate::logging::scope::DEFAULT_SCOPE_NAME;
use crate::logging::{Level, LogError};

const DEFAULT_OUTPUT_PATH: &str = "stdout";
const DEFAULT_ERROR_OUTPUT_PATH: &str = "stderr";
const DEFAULT_ROTATION_MAX_SIZE_MB: u64 = 100;
const DEFAULT_ROTATION_MAX_AGE_DAYS: u32 = 30;
const DEFAULT_ROTATION_MAX_BACKUPS: usize = 1000;

/// Settings applied by [`ScopeRegistry::configure`](crate::logging::ScopeRegistry::configure)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Destinations for log output: `stdout`, `stderr` or file paths
    pub output_paths: Vec<String>,

    /// Destinations for the logging system's own failures
    pub error_output_paths: Vec<String>,

    /// Optional size-rotated log file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotate_output_path: Option<String>,

    /// Size in megabytes beyond which the rotated file is rolled over
    pub rotation_max_size: u64,

    /// Age in days beyond which backups are deleted (0 = no limit)
    pub rotation_max_age: u32,

    /// Number of backups kept (0 = no limit)
    pub rotation_max_backups: usize,

    /// Emit JSON lines instead of console text
    pub json_encoding: bool,

    output_levels: String,
    stack_trace_levels: String,
    log_callers: String,

    aggregator_format: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    remote: Option<RemoteExport>,

    #[serde(skip_serializing_if = "Option::is_none")]
    collector: Option<CollectorExport>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output_paths: vec![DEFAULT_OUTPUT_PATH.to_string()],
            error_output_paths: vec![DEFAULT_ERROR_OUTPUT_PATH.to_string()],
            rotate_output_path: None,
            rotation_max_size: DEFAULT_ROTATION_MAX_SIZE_MB,
            rotation_max_age: DEFAULT_ROTATION_MAX_AGE_DAYS,
            rotation_max_backups: DEFAULT_ROTATION_MAX_BACKUPS,
            json_encoding: false,
            output_levels: format!("{}:{}", DEFAULT_SCOPE_NAME, Level::Info),
            stack_trace_levels: format!("{}:{}", DEFAULT_SCOPE_NAME, Level::None),
            log_callers: String::new(),
            aggregator_format: false,
            remote: None,
            collector: None,
        }
    }
}

impl Options {
    /// Load options from a JSON5 file
    pub fn load_from_file(path: &Path) -> Result<Self, LogError> {
        let content = std::fs::read_to_string(path).map_err(|source| LogError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse options from JSON5 text; absent keys take their defaults
    pub fn parse(content: &str) -> Result<Self, LogError> {
        json5::from_str(content).map_err(|e| LogError::ConfigParse(e.to_string()))
    }

    /// Check everything that can be checked without touching the filesystem
    pub fn validate(&self) -> Result<(), LogError> {
        parse_scoped_levels(&self.output_levels)?;
        parse_scoped_levels(&self.stack_trace_levels)?;
        if let Some(remote) = &self.remote {
            if remote.project.is_empty() {
                return Err(LogError::MissingRemoteTarget);
            }
        }
        if self.rotate_output_path.is_some() && self.rotation_max_size == 0 {
            return Err(LogError::ConfigParse(
                "rotation_max_size must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Layout the primary sinks write
    pub fn encoding(&self) -> Encoding {
        if self.aggregator_format {
            Encoding::Aggregator
        } else if self.json_encoding {
            Encoding::Json
        } else {
            Encoding::Console
        }
    }

    pub fn rotation_policy(&self) -> RotationPolicy {
        RotationPolicy {
            max_size_bytes: self.rotation_max_size.saturating_mul(1024 * 1024),
            max_age_days: self.rotation_max_age,
            max_backups: self.rotation_max_backups,
        }
    }

    /// Write JSON in the remote aggregator's layout
    pub fn with_aggregator_format(mut self) -> Self {
        self.aggregator_format = true;
        self
    }

    /// Also export every entry to a remote aggregator
    pub fn with_tee_to_remote(
        self,
        project: &str,
        log_name: &str,
        connector: Arc<dyn RemoteConnector>,
    ) -> Self {
        self.with_tee_to_remote_quota(project, project, log_name, connector)
    }

    /// Like [`Options::with_tee_to_remote`], billing `quota_project`
    pub fn with_tee_to_remote_quota(
        mut self,
        project: &str,
        quota_project: &str,
        log_name: &str,
        connector: Arc<dyn RemoteConnector>,
    ) -> Self {
        let mut export = RemoteExport::new(project, log_name).with_connector(connector);
        export.quota_project = quota_project.to_string();
        self.remote = Some(export);
        self
    }

    /// Also buffer entries for a local collector listening on a Unix socket
    pub fn with_tee_to_collector(mut self, socket_address: &str, path: &str) -> Self {
        self.collector = Some(CollectorExport::new(socket_address, path));
        self
    }

    pub fn aggregator_format(&self) -> bool {
        self.aggregator_format
    }

    pub fn remote(&self) -> Option<&RemoteExport> {
        self.remote.as_ref()
    }

    pub fn collector(&self) -> Option<&CollectorExport> {
        self.collector.as_ref()
    }

    /// Raw `<scope>:<level>,...` output level spec
    pub fn output_levels(&self) -> &str {
        &self.output_levels
    }

    pub fn set_output_levels(&mut self, spec: impl Into<String>) {
        self.output_levels = spec.into();
    }

    /// Raw `<scope>:<level>,...` stack trace level spec
    pub fn stack_trace_levels(&self) -> &str {
        &self.stack_trace_levels
    }

    pub fn set_stack_trace_levels(&mut self, spec: impl Into<String>) {
        self.stack_trace_levels = spec.into();
    }

    /// Raw comma separated list of scopes that report callers
    pub fn log_callers_spec(&self) -> &str {
        &self.log_callers
    }

    pub fn set_log_callers_spec(&mut self, spec: impl Into<String>) {
        self.log_callers = spec.into();
    }

    pub fn set_output_level(&mut self, scope: &str, level: Level) {
        self.output_levels = set_scoped_level(&self.output_levels, scope, level);
    }

    pub fn output_level(&self, scope: &str) -> Result<Level, LogError> {
        get_scoped_level(&self.output_levels, scope)
    }

    pub fn set_stack_trace_level(&mut self, scope: &str, level: Level) {
        self.stack_trace_levels = set_scoped_level(&self.stack_trace_levels, scope, level);
    }

    pub fn stack_trace_level(&self, scope: &str) -> Result<Level, LogError> {
        get_scoped_level(&self.stack_trace_levels, scope)
    }

    pub fn set_log_callers(&mut self, scope: &str, include: bool) {
        let mut scopes: Vec<&str> = segments(&self.log_callers)
            .filter(|s| *s != scope)
            .collect();
        if include {
            scopes.push(scope);
        }
        self.log_callers = scopes.join(",");
    }

    pub fn log_callers(&self, scope: &str) -> bool {
        segments(&self.log_callers).any(|s| s == scope)
    }

    pub(crate) fn parsed_output_levels(&self) -> Result<Vec<(String, Level)>, LogError> {
        parse_scoped_levels(&self.output_levels)
    }

    pub(crate) fn parsed_stack_trace_levels(&self) -> Result<Vec<(String, Level)>, LogError> {
        parse_scoped_levels(&self.stack_trace_levels)
    }

    pub(crate) fn caller_scopes(&self) -> impl Iterator<Item = &str> {
        segments(&self.log_callers)
    }
}

fn segments(spec: &str) -> impl Iterator<Item = &str> {
    spec.split(',').filter(|s| !s.is_empty())
}

/// Split one `<scope>:<level>` or bare `<level>` entry
pub fn parse_scoped_level(entry: &str) -> Result<(String, Level), LogError> {
    let pieces: Vec<&str> = entry.split(':').collect();
    let (scope, level) = match pieces.as_slice() {
        [level] => (DEFAULT_SCOPE_NAME, *level),
        [scope, level] => (*scope, *level),
        _ => return Err(LogError::InvalidScopedLevel(entry.to_string())),
    };
    let level = level
        .parse::<Level>()
        .map_err(|_| LogError::InvalidLevel(entry.to_string()))?;
    Ok((scope.to_string(), level))
}

/// Parse a whole comma separated spec, in order; empty entries are skipped
pub fn parse_scoped_levels(spec: &str) -> Result<Vec<(String, Level)>, LogError> {
    segments(spec).map(parse_scoped_level).collect()
}

fn entry_for(entries: &[&str], scope: &str) -> Option<usize> {
    if scope == DEFAULT_SCOPE_NAME {
        if let Some(idx) = entries.iter().position(|e| !e.contains(':')) {
            return Some(idx);
        }
    }
    let prefix = format!("{}:", scope);
    entries.iter().position(|e| e.starts_with(&prefix))
}

fn set_scoped_level(spec: &str, scope: &str, level: Level) -> String {
    let replacement = format!("{}:{}", scope, level);
    let mut entries: Vec<&str> = segments(spec).collect();
    match entry_for(&entries, scope) {
        Some(idx) => entries[idx] = &replacement,
        None => entries.push(&replacement),
    }
    entries.join(",")
}

fn get_scoped_level(spec: &str, scope: &str) -> Result<Level, LogError> {
    let entries: Vec<&str> = segments(spec).collect();
    match entry_for(&entries, scope) {
        Some(idx) => parse_scoped_level(entries[idx]).map(|(_, level)| level),
        None => Err(LogError::NoLevelForScope(scope.to_string())),
    }
}
