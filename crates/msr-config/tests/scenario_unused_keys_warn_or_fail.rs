use msr_config::{load_layered_yaml_from_strings, report_unused_keys, ConfigMode, UnusedKeyPolicy};

/// Unused-key guard:
/// 1) Unused keys are detected in WARN mode but do not error.
/// 2) Unused keys cause failure in FAIL mode.
/// 3) Keys under consumed prefixes are not flagged.
/// 4) Deterministic ordering of unused pointers.

#[test]
fn warn_mode_reports_unused_keys_without_error() {
    let yaml = r#"
validation:
  report_date: "2025-02-01"
  tresholds:
    rate_min: 0.004
reconcile:
  balance_tolerance: 1
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(ConfigMode::Validate, &loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    // A misspelled section is exactly what the guard exists to catch.
    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/validation/tresholds/rate_min".to_string()]
    );
}

#[test]
fn fail_mode_errors_on_unused_keys() {
    let yaml = r#"
validation:
  report_date: "2025-02-01"
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");

    // report_date is only consumed by validate, not by reconcile.
    let result = report_unused_keys(ConfigMode::Reconcile, &loaded.config_json, UnusedKeyPolicy::Fail);
    let msg = format!("{:?}", result.err().expect("fail policy must error"));
    assert!(msg.contains("CONFIG_UNUSED_KEYS"));
    assert!(msg.contains("mode=RECONCILE"));

    let ok = report_unused_keys(ConfigMode::Validate, &loaded.config_json, UnusedKeyPolicy::Fail);
    assert!(ok.is_ok());
}

#[test]
fn consumed_prefix_covers_nested_keys() {
    let yaml = r#"
validation:
  thresholds:
    rate_min: 0.004
    fee_low: 0.0005
  investor_bands:
    GNMA: [0.001, 0.012]
    Private Label: { min: 0.002, max: 0.004 }
ingest:
  loan_id_pattern: "^MSR\\d+$"
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(ConfigMode::Validate, &loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert!(report.is_clean(), "unexpected: {:?}", report.unused_leaf_pointers);
}

#[test]
fn deterministic_unused_pointer_ordering() {
    let yaml = r#"
unused:
  b: 2
  a: 1
"#;

    let loaded = load_layered_yaml_from_strings(&[yaml]).expect("config load must succeed");
    let report = report_unused_keys(ConfigMode::Validate, &loaded.config_json, UnusedKeyPolicy::Warn)
        .expect("warn mode must not error");

    assert_eq!(
        report.unused_leaf_pointers,
        vec!["/unused/a".to_string(), "/unused/b".to_string()]
    );
}
