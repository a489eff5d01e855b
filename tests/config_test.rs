use ingest_log_forwarder::app::{ACCOUNT_SLOT, Config, ConfigError};
use serial_test::serial;
use std::io::Write;

fn valid_args() -> Vec<&'static str> {
    vec![
        "ingest-log-forwarder",
        "--application-name",
        "ConsoleApp",
        "--account-id",
        "12345",
        "--license-key",
        "secret-key",
    ]
}

#[test]
fn test_valid_config_resolves_endpoint_with_account_substituted() {
    let config = Config::from_args(valid_args()).unwrap();
    let url = config.resolved_endpoint().unwrap();
    assert_eq!(
        url.as_str(),
        "https://insights-collector.newrelic.com/v1/accounts/12345/events"
    );
}

#[test]
fn test_missing_account_id_fails_fast() {
    let args = vec![
        "ingest-log-forwarder",
        "--application-name",
        "ConsoleApp",
        "--license-key",
        "secret-key",
    ];
    match Config::from_args(args) {
        Err(ConfigError::MissingOption(option)) => assert_eq!(option, "account_id"),
        other => panic!("expected MissingOption(account_id), got {other:?}"),
    }
}

#[test]
fn test_missing_license_key_fails_fast() {
    let args = vec![
        "ingest-log-forwarder",
        "--application-name",
        "ConsoleApp",
        "--account-id",
        "12345",
    ];
    match Config::from_args(args) {
        Err(ConfigError::MissingOption(option)) => assert_eq!(option, "license_key"),
        other => panic!("expected MissingOption(license_key), got {other:?}"),
    }
}

#[test]
fn test_template_without_account_slot_is_rejected() {
    let mut args = valid_args();
    args.extend(["--endpoint-template", "https://example.com/v1/events"]);
    assert!(matches!(
        Config::from_args(args),
        Err(ConfigError::InvalidUrl(_))
    ));
}

#[test]
fn test_template_resolving_to_relative_url_is_rejected() {
    let mut args = valid_args();
    args.extend(["--endpoint-template", "/v1/accounts/{account_id}/events"]);
    assert!(matches!(
        Config::from_args(args),
        Err(ConfigError::InvalidUrl(_))
    ));
}

#[test]
fn test_buffer_capacity_must_cover_batch_size() {
    let mut args = valid_args();
    args.extend(["--buffer-capacity", "10", "--max-batch-size", "50"]);
    assert!(matches!(
        Config::from_args(args),
        Err(ConfigError::InvalidConfig(_))
    ));
}

#[test]
fn test_zero_batch_size_is_rejected() {
    let mut args = valid_args();
    args.extend(["--max-batch-size", "0"]);
    assert!(matches!(
        Config::from_args(args),
        Err(ConfigError::InvalidConfig(_))
    ));
}

#[test]
fn test_account_slot_constant_matches_default_template() {
    let config = Config::from_args(valid_args()).unwrap();
    assert!(config.endpoint_template.contains(ACCOUNT_SLOT));
}

#[test]
fn test_from_file_loads_partial_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
application_name = "FileApp"
environment_name = "Staging"
account_id = "98765"
license_key = "file-key"
max_batch_size = 5
buffer_capacity = 50
"#
    )
    .unwrap();

    let config = Config::from_file(file.path()).unwrap();
    assert_eq!(config.application_name.as_deref(), Some("FileApp"));
    assert_eq!(config.environment_name, "Staging");
    assert_eq!(config.max_batch_size, 5);
    assert!(
        config
            .resolved_endpoint()
            .unwrap()
            .as_str()
            .contains("/accounts/98765/")
    );
}

#[test]
fn test_from_file_rejects_invalid_content() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "account_id = ").unwrap();
    assert!(matches!(
        Config::from_file(file.path()),
        Err(ConfigError::ParseError(_))
    ));
}

#[test]
#[serial]
fn test_env_fallback_for_environment_name() {
    // set_var is unsafe in edition 2024; serialized so no other test races
    unsafe { std::env::set_var("ENVIRONMENT_NAME", "Development") };
    let config = Config::from_args(valid_args()).unwrap();
    unsafe { std::env::remove_var("ENVIRONMENT_NAME") };

    assert_eq!(config.environment_name, "Development");
}

#[test]
fn test_durations_are_derived_in_post_process() {
    let mut args = valid_args();
    args.extend(["--flush-interval-ms", "250", "--request-timeout-secs", "5"]);
    let config = Config::from_args(args).unwrap();
    assert_eq!(config.flush_interval, std::time::Duration::from_millis(250));
    assert_eq!(config.request_timeout, std::time::Duration::from_secs(5));
}
