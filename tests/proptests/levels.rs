//! Property-Based Tests: Levels, scoped level specs and labels
//!
//! # Coverage
//!
//! - **Level names:** every level survives a trip through its string form.
//! - **Delivery law:** a record reaches the sinks exactly when the scope's
//!   output level admits it.
//! - **Scoped specs:** any valid `<scope>:<level>` list parses back to the
//!   pairs it was built from.
//! - **Labels:** well-formed label lists never produce a diagnostic label,
//!   and the receiver is never modified.

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use scopelog::config::{parse_scoped_level, parse_scoped_levels};
    use scopelog::logging::{
        Encoding, Field, Level, LogEntry, LogError, LogSink, Outputs, Pipeline, ScopeRegistry,
        LABELS_ERROR_KEY,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingSink(Arc<AtomicUsize>);

    impl LogSink for CountingSink {
        fn enabled(&self, _level: Level) -> bool {
            true
        }

        fn write(&self, _entry: &LogEntry) -> Result<(), LogError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn flush(&self) -> Result<(), LogError> {
            Ok(())
        }

        fn with_fields(&self, _fields: &[Field]) -> Box<dyn LogSink> {
            Box::new(CountingSink(Arc::clone(&self.0)))
        }
    }

    fn any_level() -> impl Strategy<Value = Level> {
        prop::sample::select(Level::ALL.to_vec())
    }

    fn any_emittable() -> impl Strategy<Value = Level> {
        prop::sample::select(Level::EMITTABLE.to_vec())
    }

    fn scope_name() -> impl Strategy<Value = String> {
        "[a-z][a-z0-9_-]{0,12}".prop_filter("reserved name", |s| s != "all")
    }

    proptest! {
        /// **Property:** `as_str` and `parse` are inverses, as are `as_u8`
        /// and `from_u8`.
        #[test]
        fn test_level_name_round_trip(level in any_level()) {
            prop_assert_eq!(level.as_str().parse::<Level>().unwrap(), level);
            prop_assert_eq!(Level::from_u8(level.as_u8()), Some(level));
        }

        /// **Property:** a record at `level` is delivered exactly when the
        /// scope threshold is at least `level`.
        #[test]
        fn test_delivery_law(threshold in any_level(), level in any_emittable()) {
            let count = Arc::new(AtomicUsize::new(0));
            let pipeline = Pipeline::new(
                Box::new(CountingSink(Arc::clone(&count))),
                Encoding::Console,
                Outputs::default(),
            )
            .with_exit_hook(Arc::new(|_| {}));
            let registry = ScopeRegistry::with_pipeline(pipeline);
            let scope = registry.register("prop", "", 0);
            scope.set_output_level(threshold);

            scope.log(level, None, "x");

            let expected = usize::from(threshold >= level);
            prop_assert_eq!(count.load(Ordering::SeqCst), expected);
        }

        /// **Property:** a spec built from `(scope, level)` pairs parses back
        /// to the same pairs, in order.
        #[test]
        fn test_scoped_spec_round_trip(
            pairs in prop::collection::vec((scope_name(), any_level()), 0..8)
        ) {
            let spec = pairs
                .iter()
                .map(|(s, l)| format!("{}:{}", s, l))
                .collect::<Vec<_>>()
                .join(",");
            prop_assert_eq!(parse_scoped_levels(&spec).unwrap(), pairs);
        }

        /// **Property:** entries with more than one separator never parse.
        #[test]
        fn test_extra_separators_rejected(a in scope_name(), b in scope_name(), level in any_level()) {
            let entry = format!("{}:{}:{}", a, b, level);
            let is_invalid_scoped = matches!(
                parse_scoped_level(&entry),
                Err(LogError::InvalidScopedLevel(_))
            );
            prop_assert!(is_invalid_scoped);
        }

        /// **Property:** well-formed label lists attach at most one label per
        /// distinct key and leave the receiver untouched.
        #[test]
        fn test_well_formed_labels(
            pairs in prop::collection::vec(("[a-d]", "[a-z]{0,4}"), 0..10)
        ) {
            let registry = ScopeRegistry::with_pipeline(Pipeline::new(
                Box::new(CountingSink(Arc::new(AtomicUsize::new(0)))),
                Encoding::Console,
                Outputs::default(),
            ));
            let base = registry.register("labels", "", 0);
            let flat: Vec<String> = pairs
                .iter()
                .flat_map(|(k, v)| [k.clone(), v.clone()])
                .collect();

            let labelled = base.with_labels(flat);

            prop_assert!(base.labels().is_empty());
            prop_assert!(labelled.labels().iter().all(|(k, _)| k != LABELS_ERROR_KEY));
            let mut distinct: Vec<&String> = pairs.iter().map(|(k, _)| k).collect();
            distinct.sort();
            distinct.dedup();
            prop_assert_eq!(labelled.labels().len(), distinct.len());

            // The last value written for a key wins
            for (key, value) in labelled.labels() {
                let last = pairs.iter().rev().find(|(k, _)| k == key).map(|(_, v)| v.as_str());
                prop_assert_eq!(value.as_str(), last);
            }
        }
    }
}
