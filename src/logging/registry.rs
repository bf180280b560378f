// SPDX-License-Identifier: Apache-2.0 OR MIT
// Registry of named scopes sharing one dispatcher

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::dispatch::Dispatcher;
use super::pipeline::Pipeline;
use super::scope::{Scope, ScopeState, DEFAULT_SCOPE_NAME, RESERVED_CHARS};
use super::LogError;
use crate::shutdown::Callback;

const DEFAULT_SCOPE_DESCRIPTION: &str = "Unscoped logging messages.";

/// Registry of scopes and the pipeline they write to
///
/// Scopes are registered once per name and never removed. Registering an
/// existing name returns a handle to the existing registration.
pub struct ScopeRegistry {
    scopes: RwLock<HashMap<String, Arc<ScopeState>>>,
    dispatcher: Arc<Dispatcher>,
    default_scope: Scope,
}

impl ScopeRegistry {
    /// Registry writing text to stdout, with the default scope registered
    pub fn new() -> Self {
        Self::with_pipeline(Pipeline::default())
    }

    pub fn with_pipeline(pipeline: Pipeline) -> Self {
        let dispatcher = Arc::new(Dispatcher::new(pipeline));
        let default_state = Arc::new(ScopeState::new(
            DEFAULT_SCOPE_NAME,
            DEFAULT_SCOPE_DESCRIPTION,
            1,
        ));

        let mut scopes = HashMap::new();
        scopes.insert(DEFAULT_SCOPE_NAME.to_string(), Arc::clone(&default_state));

        Self {
            scopes: RwLock::new(scopes),
            default_scope: Scope::new(default_state, Arc::clone(&dispatcher)),
            dispatcher,
        }
    }

    /// Register `name`, or look it up if already registered.
    ///
    /// The returned handle carries no labels. Description and caller skip of
    /// an existing registration are kept.
    ///
    /// # Panics
    ///
    /// Panics if `name` contains `:`, `,` or `.`; those characters delimit
    /// configuration strings.
    pub fn register(&self, name: &str, description: &str, caller_skip: usize) -> Scope {
        if name.contains(RESERVED_CHARS) {
            panic!(
                "scope name '{}' contains one of the reserved characters {:?}",
                name, RESERVED_CHARS
            );
        }

        if let Some(state) = self.read().get(name) {
            return Scope::new(Arc::clone(state), Arc::clone(&self.dispatcher));
        }

        let mut scopes = self.write();
        let state = scopes
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(ScopeState::new(name, description, caller_skip)));
        Scope::new(Arc::clone(state), Arc::clone(&self.dispatcher))
    }

    pub fn find(&self, name: &str) -> Option<Scope> {
        self.read()
            .get(name)
            .map(|state| Scope::new(Arc::clone(state), Arc::clone(&self.dispatcher)))
    }

    /// Snapshot of every registered scope; later registrations are not
    /// reflected in it
    pub fn scopes(&self) -> HashMap<String, Scope> {
        self.read()
            .iter()
            .map(|(name, state)| {
                (
                    name.clone(),
                    Scope::new(Arc::clone(state), Arc::clone(&self.dispatcher)),
                )
            })
            .collect()
    }

    /// Scope used for unscoped logging
    pub fn default_scope(&self) -> &Scope {
        &self.default_scope
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    /// Replace the active pipeline; the previous one is closed
    pub fn install(&self, pipeline: Pipeline) {
        let previous = self.dispatcher.install(pipeline);
        // Failures were already reported to the previous error sink
        let _ = previous.close();
    }

    /// Flush every sink of the active pipeline
    pub fn sync(&self) -> Result<(), LogError> {
        self.dispatcher.current().sync()
    }

    /// Flush and run every registered close hook of the active pipeline
    pub fn close(&self) -> Result<(), LogError> {
        self.dispatcher.current().close()
    }

    /// Shutdown callback that closes the logging system
    pub fn shutdown_callback(self: &Arc<Self>) -> impl Callback {
        let registry = Arc::clone(self);
        move |_manager: &str| registry.close().map_err(anyhow::Error::from)
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ScopeState>>> {
        self.scopes.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<ScopeState>>> {
        self.scopes.write().unwrap_or_else(|p| p.into_inner())
    }
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
