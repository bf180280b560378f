// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Applying [`Options`] to a registry.
//!
//! Everything fallible happens before anything is changed: level specs are
//! parsed, destinations opened and the remote client connected first. Only
//! then are scope settings updated and the new pipeline swapped in.

use std::collections::HashMap;

use super::collector::CollectorSink;
use super::pipeline::Pipeline;
use super::registry::ScopeRegistry;
use super::remote::RemoteSink;
use super::scope::{Scope, OVERRIDE_SCOPE_NAME};
use super::sink::{minimum_enabled, ConsoleSink, Output, Outputs};
use super::{Level, LogError};
use crate::config::Options;

impl ScopeRegistry {
    /// Apply `options`: rebuild the pipeline and update every registered
    /// scope. On error nothing is changed.
    ///
    /// The fatal exit hook of the current pipeline carries over to the new
    /// one. The replaced pipeline is closed.
    pub fn configure(&self, options: &Options) -> Result<(), LogError> {
        let output_levels = options.parsed_output_levels()?;
        let stack_trace_levels = options.parsed_stack_trace_levels()?;

        let pipeline =
            build_pipeline(options)?.with_exit_hook(self.dispatcher().current().exit_hook());

        let scopes = self.scopes();
        apply_levels(&scopes, &output_levels, Scope::set_output_level);
        apply_levels(&scopes, &stack_trace_levels, Scope::set_stack_trace_level);
        apply_callers(&scopes, options.caller_scopes());

        self.install(pipeline);
        Ok(())
    }
}

/// Build the sink tee described by `options` without installing it
pub fn build_pipeline(options: &Options) -> Result<Pipeline, LogError> {
    options.validate()?;
    let encoding = options.encoding();

    let error_sink = Outputs::open_all(&options.error_output_paths)?;
    let mut outputs = Outputs::open_all(&options.output_paths)?;
    if let Some(path) = &options.rotate_output_path {
        outputs.push(Output::rotating(path, options.rotation_policy())?);
    }

    // Per-scope levels do the filtering; the base sink takes everything
    let base = ConsoleSink::new(outputs, encoding, Level::Debug);
    let mut pipeline = Pipeline::new(Box::new(base), encoding, error_sink);

    if let Some(remote) = options.remote() {
        let (sink, close) = RemoteSink::connect(remote, minimum_enabled(pipeline.sinks()))?;
        pipeline.tee(Box::new(sink));
        pipeline.on_close(close);
    }

    if let Some(collector) = options.collector() {
        let sink = CollectorSink::new(collector.clone(), minimum_enabled(pipeline.sinks()));
        pipeline.tee(Box::new(sink));
    }

    Ok(pipeline)
}

/// Apply parsed `(scope, level)` pairs in order. A pair naming `all`
/// applies to every scope and ends processing; unknown scopes are ignored.
fn apply_levels(
    scopes: &HashMap<String, Scope>,
    levels: &[(String, Level)],
    set: impl Fn(&Scope, Level),
) {
    for (name, level) in levels {
        if let Some(scope) = scopes.get(name) {
            set(scope, *level);
        } else if name == OVERRIDE_SCOPE_NAME {
            scopes.values().for_each(|scope| set(scope, *level));
            return;
        }
    }
}

fn apply_callers<'a>(scopes: &HashMap<String, Scope>, names: impl Iterator<Item = &'a str>) {
    for name in names {
        if let Some(scope) = scopes.get(name) {
            scope.set_log_callers(true);
        } else if name == OVERRIDE_SCOPE_NAME {
            scopes.values().for_each(|scope| scope.set_log_callers(true));
            return;
        }
    }
}
