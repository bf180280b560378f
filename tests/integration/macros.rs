//! Integration Tests: Formatting macros

#[cfg(test)]
mod tests {
    use crate::common::harness;
    use scopelog::logging::{Encoding, Level, RichError};
    use scopelog::{log_debug, log_error, log_fatal, log_info, log_warn};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_formatted_messages() {
        let h = harness(Encoding::Console);
        let db = h.registry.register("db", "", 0);
        db.set_output_level(Level::Debug);

        log_debug!(db, "opened {} connections", 4);
        log_info!(db, "ready");
        log_warn!(db, "pool at {}%", 90);

        let lines = h.out.lines();
        assert!(lines[0].ends_with("\tdebug\tdb\topened 4 connections"));
        assert!(lines[1].ends_with("\tinfo\tdb\tready"));
        assert!(lines[2].ends_with("\twarn\tdb\tpool at 90%"));
    }

    #[test]
    fn test_arguments_not_evaluated_when_disabled() {
        let h = harness(Encoding::Console);
        let db = h.registry.register("db", "", 0);
        let calls = AtomicUsize::new(0);
        let expensive = || {
            calls.fetch_add(1, Ordering::SeqCst);
            "state dump"
        };

        log_debug!(db, "{}", expensive());
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        db.set_output_level(Level::Debug);
        log_debug!(db, "{}", expensive());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(h.out.contents().contains("\tstate dump\n"));
    }

    #[test]
    fn test_rich_error_form() {
        let h = harness(Encoding::Json);
        let db = h.registry.register("db", "", 0);
        let template = RichError::new()
            .action("retry later")
            .more_info("https://example.com/runbook");

        log_error!(db, error = &template.with_err_msg("deadlock"); "txn {} aborted", 17);

        let line = &h.out.json_lines()[0];
        assert_eq!(line["action"], "retry later");
        assert_eq!(line["moreInfo"], "https://example.com/runbook");
        assert_eq!(line["err"], "deadlock");
        assert!(line.get("msg").is_none());
    }

    #[test]
    fn test_fatal_macro_exits() {
        let h = harness(Encoding::Console);
        let db = h.registry.register("db", "", 0);
        log_fatal!(db, "giving up after {} retries", 3);
        assert_eq!(*h.exits.lock().unwrap(), vec![1]);
        assert!(h.out.contents().contains("giving up after 3 retries"));
    }
}
