// SPDX-License-Identifier: Apache-2.0 OR MIT
//! Graceful shutdown coordination.
//!
//! A [`Manager`] detects that the process should stop (a signal, say) and
//! calls [`GracefulShutdown::start`], which runs every registered
//! [`Callback`] concurrently. Failures go to the configured [`ErrorHandler`]
//! rather than aborting the shutdown.

mod signal;

pub use signal::{PosixSignalManager, POSIX_SIGNAL_MANAGER};

use anyhow::anyhow;
use std::sync::{Arc, RwLock};
use std::thread;

/// Work to run when shutdown starts; receives the triggering manager's name
pub trait Callback: Send + Sync {
    fn on_shutdown(&self, manager: &str) -> anyhow::Result<()>;
}

impl<F> Callback for F
where
    F: Fn(&str) -> anyhow::Result<()> + Send + Sync,
{
    fn on_shutdown(&self, manager: &str) -> anyhow::Result<()> {
        self(manager)
    }
}

/// Receives errors raised during shutdown
pub trait ErrorHandler: Send + Sync {
    fn on_error(&self, err: &anyhow::Error);
}

impl<F> ErrorHandler for F
where
    F: Fn(&anyhow::Error) + Send + Sync,
{
    fn on_error(&self, err: &anyhow::Error) {
        self(err)
    }
}

/// Source of a shutdown request
pub trait Manager: Send + Sync {
    fn name(&self) -> &str;

    /// Begin watching for the shutdown trigger; must not block
    fn start(&self, shutdown: Arc<GracefulShutdown>) -> anyhow::Result<()>;

    /// Called before callbacks run
    fn shutdown_start(&self) -> anyhow::Result<()>;

    /// Called after every callback has returned
    fn shutdown_finish(&self) -> anyhow::Result<()>;
}

#[derive(Default)]
pub struct GracefulShutdown {
    callbacks: RwLock<Vec<Arc<dyn Callback>>>,
    managers: RwLock<Vec<Arc<dyn Manager>>>,
    error_handler: RwLock<Option<Arc<dyn ErrorHandler>>>,
}

impl GracefulShutdown {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn add_callback(&self, callback: impl Callback + 'static) {
        write(&self.callbacks).push(Arc::new(callback));
    }

    pub fn add_manager(&self, manager: impl Manager + 'static) {
        write(&self.managers).push(Arc::new(manager));
    }

    pub fn set_error_handler(&self, handler: impl ErrorHandler + 'static) {
        *write(&self.error_handler) = Some(Arc::new(handler));
    }

    /// Hand `result`'s error, if any, to the error handler
    pub fn report_error(&self, result: anyhow::Result<()>) {
        if let Err(err) = result {
            let handler = read(&self.error_handler).clone();
            if let Some(handler) = handler {
                handler.on_error(&err);
            }
        }
    }

    /// Run the shutdown sequence on behalf of `manager`.
    ///
    /// Callbacks run concurrently; this returns once all have finished.
    pub fn start(&self, manager: &dyn Manager) {
        self.report_error(manager.shutdown_start());

        let callbacks = read(&self.callbacks).clone();
        let name = manager.name();
        let results: Vec<anyhow::Result<()>> = thread::scope(|s| {
            let handles: Vec<_> = callbacks
                .iter()
                .map(|callback| s.spawn(move || callback.on_shutdown(name)))
                .collect();
            handles
                .into_iter()
                .map(|h| {
                    h.join()
                        .unwrap_or_else(|_| Err(anyhow!("shutdown callback panicked")))
                })
                .collect()
        });
        for result in results {
            self.report_error(result);
        }

        self.report_error(manager.shutdown_finish());
    }

    /// Start every registered manager, stopping at the first that fails
    pub fn start_shutdown(self: &Arc<Self>) -> anyhow::Result<()> {
        let managers = read(&self.managers).clone();
        for manager in managers {
            manager.start(Arc::clone(self))?;
        }
        Ok(())
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|p| p.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|p| p.into_inner())
}
