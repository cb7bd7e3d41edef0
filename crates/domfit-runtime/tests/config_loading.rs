//! # FitConfig loading (requires `fit-config`)
//!
//! TOML and JSON inputs, partial documents falling back to defaults, file
//! loading, and validation failures surfacing as `ConfigError::Validation`.

use std::io::Write;

use domfit_runtime::{CoalescePolicy, ConfigError, FitConfig, MutationObserveConfig};

#[test]
fn empty_toml_is_default() {
    let config = FitConfig::from_toml_str("").unwrap();
    assert_eq!(config, FitConfig::default());
}

#[test]
fn partial_toml_overrides_fields() {
    let config = FitConfig::from_toml_str(
        r#"
coalesce = "trailing"
evidence_logging = true

[mutations]
attributes = false
"#,
    )
    .unwrap();
    assert_eq!(config.coalesce, CoalescePolicy::Trailing);
    assert!(config.evidence_logging);
    assert!(config.observe_size);
    assert_eq!(
        config.mutations,
        MutationObserveConfig {
            attributes: false,
            ..MutationObserveConfig::default()
        }
    );
}

#[test]
fn json_round_trip_through_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"coalesce":"drop","observe_size":false,"evidence_capacity":8}}"#
    )
    .unwrap();

    let config = FitConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.coalesce, CoalescePolicy::Drop);
    assert!(!config.observe_size);
    assert_eq!(config.evidence_capacity, 8);
}

#[test]
fn toml_file_loads() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "coalesce = \"trailing\"").unwrap();
    let config = FitConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.coalesce, CoalescePolicy::Trailing);
}

#[test]
fn unknown_policy_is_a_parse_error() {
    let err = FitConfig::from_toml_str(r#"coalesce = "sometimes""#).unwrap_err();
    assert!(matches!(err, ConfigError::Toml(_)));
    assert!(err.to_string().starts_with("TOML parse error"));
}

#[test]
fn invalid_values_fail_validation() {
    let err = FitConfig::from_json_str(r#"{"evidence_logging":true,"evidence_capacity":0}"#)
        .unwrap_err();
    match err {
        ConfigError::Validation(errors) => assert_eq!(errors.len(), 1),
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn missing_file_is_io_error() {
    let err = FitConfig::from_toml_file("/nonexistent/domfit.toml").unwrap_err();
    assert!(matches!(err, ConfigError::Io(_)));
    assert!(std::error::Error::source(&err).is_some());
}
