//! YAML configuration files
//!
//! Loading from disk, version gating, preset resolution and rule validation.

mod common;

use bleak_engine::{run_with_bleak, BleakConfig, BleakOptions, ConfigError, Preset, WhitelistRule};
use common::*;
use proptest::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

fn write_yaml(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_from_file() {
    let file = write_yaml(
        r#"
version: 1
preset: thorough
overrides:
  iterations: 7
  check_disposer_tree: false
"#,
    );
    let config = BleakConfig::from_yaml(file.path()).unwrap();
    assert_eq!(config.preset(), Preset::Thorough);
    assert_eq!(config.iterations, 7);
    assert!(!config.check_disposer_tree);
    // untouched keys keep the preset's value
    assert!(config.follow_weak_references);
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = BleakConfig::from_yaml(dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
}

#[test]
fn test_missing_version_rejected() {
    let err = BleakConfig::from_yaml_str("preset: fast\n").unwrap_err();
    assert!(matches!(err, ConfigError::MissingVersion));
    assert!(err.to_string().contains("version: 1"));
}

#[test]
fn test_future_version_rejected() {
    let err = BleakConfig::from_yaml_str("version: 2\npreset: fast\n").unwrap_err();
    match err {
        ConfigError::UnsupportedVersion { found, supported } => {
            assert_eq!(found, 2);
            assert_eq!(supported, vec![1]);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_preset_rejected() {
    let err = BleakConfig::from_yaml_str("version: 1\npreset: paranoid\n").unwrap_err();
    assert!(matches!(err, ConfigError::UnknownPreset(ref name) if name == "paranoid"));
}

#[test]
fn test_unknown_override_key_rejected() {
    let err = BleakConfig::from_yaml_str("version: 1\npreset: fast\noverrides:\n  iteratoins: 4\n")
        .unwrap_err();
    assert!(matches!(err, ConfigError::Yaml(_)));
}

#[test]
fn test_out_of_range_override_rejected() {
    let err = BleakConfig::from_yaml_str("version: 1\npreset: fast\noverrides:\n  iterations: 0\n")
        .unwrap_err();
    match err {
        ConfigError::Range { field, .. } => assert_eq!(field, "iterations"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_invalid_whitelist_regex_rejected() {
    let yaml = r#"
version: 1
preset: balanced
overrides:
  whitelist:
    - kind: pattern
      regex: "Cache#(entries"
"#;
    let err = BleakConfig::from_yaml_str(yaml).unwrap_err();
    match err {
        ConfigError::InvalidPattern { pattern, .. } => assert_eq!(pattern, "Cache#(entries"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_empty_signature_rule_rejected() {
    for kind in ["signature_contains", "signature_ends_with"] {
        let yaml = format!(
            "version: 1\npreset: balanced\noverrides:\n  whitelist:\n    - kind: {}\n      elements: []\n",
            kind
        );
        let err = BleakConfig::from_yaml_str(&yaml).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)), "{} accepted: {}", kind, err);
    }
}

#[test]
fn test_empty_rule_cannot_hide_leak() {
    let app = CacheApp::new();
    let options = BleakOptions::default().known_issue_rule(WhitelistRule::contains(Vec::<String>::new()));
    let mut runs = 0;
    let err = run_with_bleak(backend(&app.heap), options, || {
        runs += 1;
        app.add_entry();
        Ok(())
    })
    .unwrap_err();
    assert!(matches!(err, bleak_engine::BleakError::Config(ConfigError::Validation(_))));
    assert_eq!(runs, 0);
}

#[test]
fn test_whitelist_from_file_suppresses_leak() {
    let file = write_yaml(
        r#"
version: 1
preset: balanced
overrides:
  whitelist:
    - kind: pattern
      regex: "Cache#entries -> Entry\\[\\]$"
  known_issues:
    - kind: leak_root_type
      name: "Unrelated[]"
"#,
    );
    let config = BleakConfig::from_yaml(file.path()).unwrap();
    assert_eq!(config.known_issues, vec![WhitelistRule::root_type("Unrelated[]")]);

    let app = CacheApp::new();
    let result = run_with_bleak(backend(&app.heap), BleakOptions::from(config), || {
        app.add_entry();
        Ok(())
    })
    .unwrap();
    assert_eq!(result.whitelisted, 1);
    assert!(result.known_issues.is_empty());
}

#[test]
fn test_exported_file_reloads() {
    let original = BleakConfig::from_preset(Preset::Fast)
        .iterations(9)
        .whitelist_rule(WhitelistRule::contains(["Cache#entries", "*"]));
    let file = write_yaml(&original.to_yaml().unwrap());
    let reloaded = BleakConfig::from_yaml(file.path()).unwrap();
    assert_eq!(reloaded, original);
}

proptest! {
    #[test]
    fn prop_iterations_in_range_accepted(iterations in 1usize..=100) {
        let yaml = format!("version: 1\npreset: custom\noverrides:\n  iterations: {}\n", iterations);
        let config = BleakConfig::from_yaml_str(&yaml).unwrap();
        prop_assert_eq!(config.iterations, iterations);
    }

    #[test]
    fn prop_iterations_above_range_rejected(iterations in 101usize..10_000) {
        let yaml = format!("version: 1\npreset: custom\noverrides:\n  iterations: {}\n", iterations);
        let is_range_error = matches!(
            BleakConfig::from_yaml_str(&yaml),
            Err(ConfigError::Range { .. })
        );
        prop_assert!(is_range_error);
    }
}
