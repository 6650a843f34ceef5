use volley_logging::{init_logging, init_simple_tracing, LogFormat, LogLevel, LoggingConfig};

#[test]
fn test_logging_config_from_yaml() {
    let yaml_config = r#"
level: debug
format: json
include_location: true
"#;

    let config: LoggingConfig = serde_yaml::from_str(yaml_config).unwrap();
    assert_eq!(config.level, LogLevel::Debug);
    assert_eq!(config.format, LogFormat::Json);
    assert!(config.include_location);

    assert!(init_logging(&config).is_ok());
}

#[test]
fn test_repeated_initialization_is_harmless() {
    let config = LoggingConfig::default();
    assert!(init_logging(&config).is_ok());
    assert!(init_logging(&config).is_ok());
    assert!(init_simple_tracing("warn").is_ok());
}

#[test]
fn test_invalid_level_falls_back() {
    // An unparsable directive must not make initialization fail
    let _filter = volley_logging::build_env_filter("not a [valid] directive");
    assert!(init_simple_tracing("not a [valid] directive").is_ok());
}
