//! Logging Tests

use stash_domain::ErrorKind;
use stash_infrastructure::constants::DEFAULT_LOG_LEVEL;
use stash_infrastructure::logging::{LoggingConfig, init_logging, parse_log_level};
use tracing::Level;

#[test]
fn test_parse_log_level() {
    assert_eq!(parse_log_level("trace").unwrap(), Level::TRACE);
    assert_eq!(parse_log_level("debug").unwrap(), Level::DEBUG);
    assert_eq!(parse_log_level("INFO").unwrap(), Level::INFO);
    assert_eq!(parse_log_level("warn").unwrap(), Level::WARN);
    assert_eq!(parse_log_level("warning").unwrap(), Level::WARN);
    assert_eq!(parse_log_level("error").unwrap(), Level::ERROR);

    let error = parse_log_level("invalid").unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Config);
    assert_eq!(
        error.metadata().unwrap().config_key.as_deref(),
        Some("logging.level")
    );
}

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert_eq!(config.level, DEFAULT_LOG_LEVEL);
    assert!(!config.json_format);
    assert!(config.file_output.is_none());
}

#[test]
fn test_init_logging_twice_is_config_error() {
    let config = LoggingConfig::default();
    // Another test in this binary may have installed a subscriber already
    let _ = init_logging(&config);

    let error = init_logging(&config).unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Config);
}

#[test]
fn test_init_logging_rejects_bad_level() {
    let config = LoggingConfig {
        level: "chatty".to_string(),
        ..LoggingConfig::default()
    };
    assert_eq!(init_logging(&config).unwrap_err().kind(), ErrorKind::Config);
}
