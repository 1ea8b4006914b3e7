//! Log-diagnostic tests: the degraded merge path and the fatal baseline
//! path must both stay observable in the logs, and distinguishable from
//! ordinary per-overlay warnings.

use serde_json::{json, Value};

use prompt_overlay::composer::Composer;
use prompt_overlay::merge::{merge, MergeKeys, MergePolicy};
use prompt_overlay::source::MemorySource;
use prompt_overlay::template::TemplateStore;
use prompt_overlay::value::DEPTH_LIMIT;

/// Build an object nested `depth` container levels deep.
fn nested(depth: usize) -> Value {
    let mut value = json!("leaf");
    for _ in 0..depth {
        value = json!({ "inner": value });
    }
    value
}

#[test]
fn shallow_merge_fallback_logs_a_warning() {
    testing_logger::setup();

    let first = json!({"deep": nested(DEPTH_LIMIT + 8), "shared": {"a": 1}});
    let second = json!({"shared": {"b": 2}});
    let result = merge(&first, &second, MergePolicy::Merge, &MergeKeys::new());

    // Output degraded to the shallow union...
    assert_eq!(result["shared"], json!({"b": 2}));

    // ...and said so in the logs, so callers comparing behavior can tell
    // the degraded path apart from a normal merge.
    testing_logger::validate(|captured| {
        let warnings: Vec<_> = captured
            .iter()
            .filter(|entry| entry.level == log::Level::Warn)
            .collect();
        assert!(!warnings.is_empty(), "expected a warn-level diagnostic");
        assert!(warnings
            .iter()
            .any(|entry| entry.body.contains("shallow one-level union")));
    });
}

#[test]
fn normal_merge_logs_no_fallback_warning() {
    testing_logger::setup();

    let first = json!({"a": {"b": 1}});
    let second = json!({"a": {"c": 2}});
    let _ = merge(&first, &second, MergePolicy::Merge, &MergeKeys::new());

    testing_logger::validate(|captured| {
        assert!(captured
            .iter()
            .all(|entry| !entry.body.contains("shallow one-level union")));
    });
}

#[test]
fn fatal_baseline_substitution_logs_an_error() {
    testing_logger::setup();

    let source = MemorySource::new().with_template(
        "t",
        r#"{ "metadata": { "name": "t", "version": "1.0" }, "sections": { "a": 1 } }"#,
    );
    let composer = Composer::new(TemplateStore::new(source));

    let (document, record) =
        composer.compose_with_baseline(&json!("not a map"), &["t"], || json!({"baseline": true}));
    assert_eq!(document, json!({"baseline": true}));
    assert!(record.is_none());

    testing_logger::validate(|captured| {
        let errors: Vec<_> = captured
            .iter()
            .filter(|entry| entry.level == log::Level::Error)
            .collect();
        assert_eq!(errors.len(), 1, "the fatal path logs exactly one error");
        assert!(errors[0].body.contains("known-good baseline"));
        assert!(errors[0].body.contains("Composition fatal"));
    });
}

#[test]
fn skipped_overlay_logs_below_error_level() {
    testing_logger::setup();

    let source = MemorySource::new();
    let composer = Composer::new(TemplateStore::new(source));

    // The overlay is missing but composition succeeds; operators must be
    // able to tell this apart from the whole-pipeline fatal path above.
    let composition = composer.compose(&json!({"a": 1}), &["ghost"]).unwrap();
    assert!(!composition.record.per_template[0].success);

    testing_logger::validate(|captured| {
        assert!(captured.iter().all(|entry| entry.level != log::Level::Error));
    });
}
