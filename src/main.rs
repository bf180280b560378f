// SPDX-License-Identifier: Apache-2.0 OR MIT
use anyhow::Result;
use clap::Parser;
use scopelog::cli::LogArgs;
use scopelog::logging::LogBridge;
use scopelog::shutdown::{GracefulShutdown, PosixSignalManager};
use scopelog::{log_debug, log_error, log_info, RichError, ScopeRegistry};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(flatten)]
    log: LogArgs,

    /// Keep running until SIGINT or SIGTERM, then shut down gracefully
    #[arg(long)]
    wait_for_signal: bool,

    /// Interval between heartbeat records while waiting, in milliseconds
    #[arg(long, default_value_t = 1000)]
    heartbeat_ms: u64,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let registry = Arc::new(ScopeRegistry::new());
    let demo = registry.register("demo", "Demo records.", 0);
    let deps = registry.register("deps", "Records from the log facade.", 0);
    registry.configure(&args.log.to_options()?)?;
    LogBridge::install(deps)?;

    let unavailable = RichError::new()
        .impact("records are not persisted")
        .action("check that the database is reachable")
        .likely_cause("database restarted");

    let scope = demo.with_labels(["component", "demo"]).with_label("pid", std::process::id());
    log_info!(scope, "starting with {} registered scopes", registry.scopes().len());
    log_debug!(scope, "debug output enabled");
    log_error!(scope, error = &unavailable.with_err_msg("connection refused"); "write failed");
    log::warn!("message routed through the log facade");
    registry.default_scope().info("unscoped record");

    let shutdown = GracefulShutdown::new();
    shutdown.add_callback(registry.shutdown_callback());

    if !args.wait_for_signal {
        shutdown.start(&PosixSignalManager::new().without_exit());
        return Ok(());
    }

    let errors = registry.default_scope().clone();
    shutdown.set_error_handler(move |err: &anyhow::Error| {
        errors.error(format_args!("shutdown error: {:#}", err));
    });
    shutdown.add_manager(PosixSignalManager::new());
    shutdown.start_shutdown()?;

    let mut ticker = tokio::time::interval(Duration::from_millis(args.heartbeat_ms));
    loop {
        ticker.tick().await;
        log_debug!(scope, "heartbeat");
    }
}
