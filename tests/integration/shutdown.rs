//! Integration Tests: Closing logging through the shutdown coordinator

#[cfg(test)]
mod tests {
    use scopelog::logging::{RemoteClient, RemoteConnector, RemoteEntry, RemoteExport};
    use scopelog::shutdown::{GracefulShutdown, PosixSignalManager};
    use scopelog::{Options, ScopeRegistry};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct CountingClient {
        logged: AtomicUsize,
        closed: AtomicUsize,
        fail_close: bool,
    }

    impl RemoteClient for CountingClient {
        fn log(&self, _entry: RemoteEntry) {
            self.logged.fetch_add(1, Ordering::SeqCst);
        }

        fn flush(&self) -> anyhow::Result<()> {
            Ok(())
        }

        fn close(&self) -> anyhow::Result<()> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            if self.fail_close {
                anyhow::bail!("remote went away");
            }
            Ok(())
        }
    }

    struct Connector(Arc<CountingClient>);

    impl RemoteConnector for Connector {
        fn connect(&self, _export: &RemoteExport) -> anyhow::Result<Arc<dyn RemoteClient>> {
            Ok(self.0.clone())
        }
    }

    fn configured(client: &Arc<CountingClient>) -> Arc<ScopeRegistry> {
        let mut options =
            Options::default().with_tee_to_remote("proj", "app", Arc::new(Connector(client.clone())));
        options.output_paths.clear();
        options.error_output_paths.clear();

        let registry = Arc::new(ScopeRegistry::new());
        registry.configure(&options).unwrap();
        registry
    }

    #[test]
    fn test_shutdown_closes_remote_client() {
        let client = Arc::new(CountingClient::default());
        let registry = configured(&client);
        registry.default_scope().info("before shutdown");

        let shutdown = GracefulShutdown::new();
        shutdown.add_callback(registry.shutdown_callback());
        shutdown.start(&PosixSignalManager::new().without_exit());

        assert_eq!(client.logged.load(Ordering::SeqCst), 1);
        assert_eq!(client.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_close_failure_reaches_error_handler() {
        let client = Arc::new(CountingClient {
            fail_close: true,
            ..Default::default()
        });
        let registry = configured(&client);

        let errors = Arc::new(Mutex::new(Vec::new()));
        let shutdown = GracefulShutdown::new();
        shutdown.add_callback(registry.shutdown_callback());
        let seen = Arc::clone(&errors);
        shutdown.set_error_handler(move |err: &anyhow::Error| {
            seen.lock().unwrap().push(err.to_string());
        });
        shutdown.start(&PosixSignalManager::new().without_exit());

        let errors = errors.lock().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("remote went away"), "{}", errors[0]);
    }
}
