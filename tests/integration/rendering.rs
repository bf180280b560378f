//! Integration Tests: Record rendering
//!
//! Text and JSON layouts, rich errors, caller locations, stack trace
//! capture, write-failure reporting and the fatal exit hook.

#[cfg(test)]
mod tests {
    use crate::common::{harness, harness_with_sink, Capture, RecordingSink};
    use scopelog::logging::{Encoding, Level, RichError};

    fn db_unavailable() -> RichError {
        RichError::new().impact("writes blocked")
    }

    #[test]
    fn test_text_record_with_rich_error() {
        let h = harness(Encoding::Console);
        let db = h.registry.register("db", "", 0);

        db.error_with(&db_unavailable().with_err_msg("timeout"), "connect failed");

        let lines = h.out.lines();
        assert_eq!(lines.len(), 1);
        assert!(
            lines[0].ends_with("\terror\tdb\tconnect failed\timpact=writes blocked err=timeout "),
            "{:?}",
            lines[0]
        );
    }

    #[test]
    fn test_json_record_with_rich_error_has_fields_not_message() {
        let h = harness(Encoding::Json);
        let db = h.registry.register("db", "", 0);

        db.error_with(&db_unavailable().with_err_msg("timeout"), "connect failed");

        let line = &h.out.json_lines()[0];
        assert_eq!(line["level"], "error");
        assert_eq!(line["scope"], "db");
        assert_eq!(line["impact"], "writes blocked");
        assert_eq!(line["err"], "timeout");
        assert!(line.get("msg").is_none());
        assert!(line.get("message").is_none());
    }

    #[test]
    fn test_json_record_labels_are_fields() {
        let h = harness(Encoding::Json);
        let scope = h
            .registry
            .register("api", "", 0)
            .with_labels(["route", "/users", "method", "GET"]);
        scope.warn("slow request");

        let line = &h.out.json_lines()[0];
        assert_eq!(line["msg"], "slow request");
        assert_eq!(line["route"], "/users");
        assert_eq!(line["method"], "GET");
    }

    #[test]
    fn test_text_record_labels_follow_tab() {
        let h = harness(Encoding::Console);
        let scope = h
            .registry
            .register("api", "", 0)
            .with_labels(["route", "/users", "method", "GET"]);
        scope.warn("slow request");

        assert!(h.out.contents().ends_with("\tslow request\troute=/users method=GET\n"));
    }

    #[test]
    fn test_caller_reported_only_when_enabled() {
        let h = harness(Encoding::Json);
        let db = h.registry.register("db", "", 0);

        db.info("no caller");
        db.set_log_callers(true);
        db.info("with caller");

        let lines = h.out.json_lines();
        assert!(lines[0].get("caller").is_none());
        let caller = lines[1]["caller"].as_str().unwrap();
        assert!(caller.starts_with("integration/rendering.rs:"), "{}", caller);
    }

    #[test]
    fn test_stack_trace_rule_differs_for_default_scope() {
        let h = harness(Encoding::Json);
        let default = h.registry.default_scope();
        let db = h.registry.register("db", "", 0);
        for scope in [default, &db] {
            scope.set_output_level(Level::Debug);
            scope.set_stack_trace_level(Level::Error);
        }

        default.debug("default debug");
        db.debug("named debug");
        default.error("default error");

        let lines = h.out.json_lines();
        // The default scope compares the call's own level
        assert!(lines[0].get("stack").is_none());
        // Named scopes compare against error
        assert!(lines[1].get("stack").is_some());
        assert!(lines[2].get("stack").is_some());
    }

    #[test]
    fn test_no_stack_traces_by_default() {
        let h = harness(Encoding::Json);
        let db = h.registry.register("db", "", 0);
        db.error("no stack");
        assert!(h.out.json_lines()[0].get("stack").is_none());
    }

    #[test]
    fn test_fatal_writes_then_exits() {
        let h = harness(Encoding::Console);
        let db = h.registry.register("db", "", 0);

        db.fatal("unrecoverable");

        assert!(h.out.contents().contains("\tfatal\tdb\tunrecoverable\n"));
        assert_eq!(*h.exits.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_suppressed_fatal_does_not_exit() {
        let h = harness(Encoding::Console);
        let db = h.registry.register("db", "", 0);
        db.set_output_level(Level::None);

        db.fatal("silenced");

        assert_eq!(h.out.contents(), "");
        assert!(h.exits.lock().unwrap().is_empty());
    }

    #[test]
    fn test_write_failure_goes_to_error_sink() {
        let mut sink = RecordingSink::new(Level::Debug);
        sink.fail_writes = true;
        let h = harness_with_sink(Box::new(sink.clone()), Encoding::Console, Capture::default());
        let db = h.registry.register("db", "", 0);

        db.error("lost");

        assert_eq!(sink.count(), 1);
        let errors = h.errors.contents();
        assert!(errors.contains(" log write error: "), "{}", errors);
        assert!(errors.contains("sink unavailable"));
    }
}
