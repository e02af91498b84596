//! Unit tests for `AppError` display formats.

use findata_gateway::AppError;

#[test]
fn config_error_display_starts_with_config_prefix() {
    let err = AppError::Config("bad value".into());
    assert!(err.to_string().starts_with("config:"));
}

#[test]
fn unknown_toolset_error_display_includes_message() {
    let err = AppError::UnknownToolset("'bogus' is not a known toolset".into());
    assert_eq!(
        err.to_string(),
        "unknown toolset: 'bogus' is not a known toolset"
    );
}

#[test]
fn conflict_error_is_distinct_from_unknown_toolset() {
    let conflict = AppError::ToolsetConflict("already enabled".into());
    let unknown = AppError::UnknownToolset("already enabled".into());
    assert_ne!(conflict.to_string(), unknown.to_string());
}

#[test]
fn module_load_error_display_includes_module_name() {
    let err = AppError::ModuleLoad("module 'quotes' timed out after 10s".into());
    let s = err.to_string();
    assert!(s.starts_with("module load:"));
    assert!(s.contains("quotes"));
}

#[test]
fn error_message_no_trailing_period() {
    let err = AppError::Mcp("dispatch failed".into());
    let s = err.to_string();
    assert!(
        !s.ends_with('.'),
        "error message must not end with a period: {s}"
    );
}

#[test]
fn error_implements_std_error_trait() {
    let err: Box<dyn std::error::Error> = Box::new(AppError::Io("disk full".into()));
    assert!(!err.to_string().is_empty());
}

#[test]
fn toml_parse_error_converts_to_config_error() {
    let result: Result<findata_gateway::GlobalConfig, _> =
        findata_gateway::GlobalConfig::from_toml_str("http_port = \"not a number\"");
    let err = result.expect_err("invalid TOML must fail");
    assert!(err.to_string().starts_with("config:"));
}
