// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Command-line flags for logging options.
//!
//! Flatten [`LogArgs`] into an application's own `clap` arguments and call
//! [`LogArgs::apply`] on the options before configuring.

use clap::Args;
use std::path::PathBuf;

use crate::config::Options;
use crate::logging::LogError;

#[derive(Args, Debug, Clone, Default, PartialEq)]
pub struct LogArgs {
    /// JSON5 file with logging options; flags override it
    #[arg(long = "log_config")]
    pub config: Option<PathBuf>,

    /// Where to write log output: any path, or the special values stdout and stderr
    #[arg(long = "log_target")]
    pub targets: Vec<String>,

    /// Path of an optional size-rotated log file
    #[arg(long = "log_rotate")]
    pub rotate: Option<String>,

    /// Maximum age in days of rotated backups (0 indicates no limit)
    #[arg(long = "log_rotate_max_age")]
    pub rotate_max_age: Option<u32>,

    /// Maximum size in megabytes of the log file before it is rotated
    #[arg(long = "log_rotate_max_size")]
    pub rotate_max_size: Option<u64>,

    /// Maximum number of rotated backups to keep (0 indicates no limit)
    #[arg(long = "log_rotate_max_backups")]
    pub rotate_max_backups: Option<usize>,

    /// Format output as JSON instead of console text
    #[arg(long = "log_as_json")]
    pub as_json: bool,

    /// Comma-separated minimum per-scope output level, <scope>:<level>,...
    /// where level is one of debug, info, warn, error, fatal, none
    #[arg(long = "log_output_level")]
    pub output_level: Option<String>,

    /// Comma-separated minimum per-scope level at which stack traces are
    /// captured, <scope>:<level>,...
    #[arg(long = "log_stacktrace_level")]
    pub stack_trace_level: Option<String>,

    /// Comma-separated list of scopes that report the caller's source
    /// location, or all
    #[arg(long = "log_caller")]
    pub callers: Option<String>,
}

impl LogArgs {
    /// Options from `--log_config` (or the defaults) with the flags applied
    pub fn to_options(&self) -> Result<Options, LogError> {
        let mut options = match &self.config {
            Some(path) => Options::load_from_file(path)?,
            None => Options::default(),
        };
        self.apply(&mut options);
        Ok(options)
    }

    /// Overlay the flags that were given onto `options`
    pub fn apply(&self, options: &mut Options) {
        if !self.targets.is_empty() {
            options.output_paths = self.targets.clone();
        }
        if let Some(path) = &self.rotate {
            options.rotate_output_path = Some(path.clone());
        }
        if let Some(days) = self.rotate_max_age {
            options.rotation_max_age = days;
        }
        if let Some(mb) = self.rotate_max_size {
            options.rotation_max_size = mb;
        }
        if let Some(count) = self.rotate_max_backups {
            options.rotation_max_backups = count;
        }
        if self.as_json {
            options.json_encoding = true;
        }
        if let Some(spec) = &self.output_level {
            options.set_output_levels(spec.clone());
        }
        if let Some(spec) = &self.stack_trace_level {
            options.set_stack_trace_levels(spec.clone());
        }
        if let Some(spec) = &self.callers {
            options.set_log_callers_spec(spec.clone());
        }
    }
}
