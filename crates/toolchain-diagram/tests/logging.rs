//! Tests for logging functionality
//!
//! A process can install only one global subscriber, so initialization
//! calls after the first are expected to fail; they must never panic.

use std::str::FromStr;

use toolchain_diagram::core::logging::{init_logging, LogFormat};

#[test]
fn test_log_format_parsing() {
    assert_eq!(LogFormat::from_str("compact").unwrap(), LogFormat::Compact);
    assert_eq!(LogFormat::from_str("pretty").unwrap(), LogFormat::Pretty);
    assert_eq!(LogFormat::from_str("json").unwrap(), LogFormat::Json);
    assert!(LogFormat::from_str("xml").is_err());
}

#[test]
fn test_log_format_variants() {
    for name in LogFormat::variants() {
        assert!(LogFormat::from_str(name).is_ok());
    }
}

#[test]
fn test_init_logging_levels_and_formats() {
    for level in ["trace", "debug", "info", "warn", "error", "off"] {
        for format in LogFormat::variants() {
            let _ = init_logging(Some(level), Some(format));
        }
    }
    let _ = init_logging(None, None);
}

#[test]
fn test_init_logging_invalid_format() {
    let result = init_logging(Some("info"), Some("invalid_format"));
    assert!(result.is_err());
}
