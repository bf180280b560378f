// SPDX-License-Identifier: Apache-2.0 OR MIT
// Shutdown manager triggered by POSIX signals

use anyhow::Context;
use std::sync::Arc;
use std::thread;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::mpsc;

use super::{GracefulShutdown, Manager};

pub const POSIX_SIGNAL_MANAGER: &str = "PosixSignalManager";

/// Starts shutdown on the first of a set of signals (SIGINT and SIGTERM by
/// default) and exits the process with status 0 once shutdown finishes
#[derive(Debug, Clone)]
pub struct PosixSignalManager {
    signals: Vec<SignalKind>,
    exit_on_finish: bool,
}

impl PosixSignalManager {
    pub fn new() -> Self {
        Self::with_signals(vec![SignalKind::interrupt(), SignalKind::terminate()])
    }

    pub fn with_signals(signals: Vec<SignalKind>) -> Self {
        Self {
            signals,
            exit_on_finish: true,
        }
    }

    /// Keep the process running after shutdown finishes
    pub fn without_exit(mut self) -> Self {
        self.exit_on_finish = false;
        self
    }
}

impl Default for PosixSignalManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Manager for PosixSignalManager {
    fn name(&self) -> &str {
        POSIX_SIGNAL_MANAGER
    }

    /// Install the signal handlers, then wait for a signal on a background
    /// thread
    fn start(&self, shutdown: Arc<GracefulShutdown>) -> anyhow::Result<()> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("failed to build signal runtime")?;

        let streams = {
            let _guard = runtime.enter();
            self.signals
                .iter()
                .map(|kind| signal(*kind))
                .collect::<Result<Vec<_>, _>>()
                .context("failed to install signal handler")?
        };

        let manager = self.clone();
        thread::Builder::new()
            .name("shutdown-signal".into())
            .spawn(move || {
                let (tx, mut rx) = mpsc::channel::<()>(1);
                for mut stream in streams {
                    let tx = tx.clone();
                    runtime.spawn(async move {
                        if stream.recv().await.is_some() {
                            let _ = tx.send(()).await;
                        }
                    });
                }
                drop(tx);

                if runtime.block_on(rx.recv()).is_some() {
                    shutdown.start(&manager);
                }
            })
            .context("failed to spawn signal thread")?;
        Ok(())
    }

    fn shutdown_start(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn shutdown_finish(&self) -> anyhow::Result<()> {
        if self.exit_on_finish {
            std::process::exit(0);
        }
        Ok(())
    }
}
