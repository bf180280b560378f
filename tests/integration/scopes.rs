//! Integration Tests: Scope registration, per-scope levels and labels

#[cfg(test)]
mod tests {
    use crate::common::harness;
    use scopelog::logging::{Encoding, Level, LABELS_ERROR_KEY};
    use serde_json::Value;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_warn_scope_drops_info() {
        let h = harness(Encoding::Console);
        let db = h.registry.register("db", "database access", 0);
        db.set_output_level(Level::Warn);

        db.info("cache warm");
        db.warn("slow query");

        let lines = h.out.lines();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("\twarn\tdb\tslow query"), "{}", lines[0]);
    }

    #[test]
    fn test_scopes_are_independent() {
        let h = harness(Encoding::Console);
        let db = h.registry.register("db", "", 0);
        let http = h.registry.register("http", "", 0);
        db.set_output_level(Level::Error);
        http.set_output_level(Level::Debug);

        db.warn("hidden");
        http.debug("visible");

        let out = h.out.contents();
        assert!(!out.contains("hidden"));
        assert!(out.contains("\tdebug\thttp\tvisible"));
    }

    #[test]
    fn test_duplicate_registration_shares_settings() {
        let h = harness(Encoding::Console);
        let first = h.registry.register("db", "database access", 0);
        let second = h.registry.register("db", "something else", 2);

        second.set_output_level(Level::None);
        first.error("silenced");

        assert!(first.same_identity(&second));
        assert_eq!(first.description(), "database access");
        assert_eq!(h.out.contents(), "");
    }

    #[test]
    fn test_labels_do_not_leak_between_handles() {
        let h = harness(Encoding::Json);
        let base = h.registry.register("api", "", 0);
        let alice = base.with_labels(["user", "alice"]);
        let bob = base.with_labels(["user", "bob"]);

        base.info("plain");
        alice.info("as alice");
        bob.info("as bob");

        let lines = h.out.json_lines();
        assert!(lines[0].get("user").is_none());
        assert_eq!(lines[1]["user"], "alice");
        assert_eq!(lines[2]["user"], "bob");
    }

    #[test]
    fn test_odd_label_list_is_reported_not_fatal() {
        let h = harness(Encoding::Json);
        let scope = h
            .registry
            .register("api", "", 0)
            .with_labels(["user", "alice", "dangling"]);

        scope.info("still logged");

        let lines = h.out.json_lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["msg"], "still logged");
        assert_eq!(
            lines[0][LABELS_ERROR_KEY],
            "even number of parameters required, got 3"
        );
        assert!(lines[0].get("user").is_none());
    }

    #[test]
    fn test_label_values_keep_their_json_type() {
        let h = harness(Encoding::Json);
        let scope = h.registry.register("api", "", 0).with_labels([
            Value::from("attempt"),
            Value::from(3),
            Value::from("cached"),
            Value::from(true),
        ]);
        scope.info("retry");

        let line = &h.out.json_lines()[0];
        assert_eq!(line["attempt"], 3);
        assert_eq!(line["cached"], true);
    }

    #[test]
    fn test_level_changes_visible_across_threads() {
        let h = harness(Encoding::Console);
        let db = h.registry.register("db", "", 0);
        db.set_output_level(Level::Error);

        let registry = Arc::new(h.registry);
        let worker = {
            let registry = Arc::clone(&registry);
            thread::spawn(move || {
                registry.find("db").unwrap().set_output_level(Level::Debug);
            })
        };
        worker.join().unwrap();

        assert_eq!(db.output_level(), Level::Debug);
        assert!(db.debug_enabled());
    }

    #[test]
    fn test_concurrent_emission_keeps_lines_whole() {
        let h = harness(Encoding::Console);
        let registry = Arc::new(h.registry);

        let handles: Vec<_> = (0..4)
            .map(|t| {
                let scope = registry.register(&format!("worker{}", t), "", 0);
                thread::spawn(move || {
                    for i in 0..50 {
                        scope.info(format_args!("record {}", i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let lines = h.out.lines();
        assert_eq!(lines.len(), 200);
        assert!(lines.iter().all(|l| l.contains("\tinfo\tworker")));
    }
}
