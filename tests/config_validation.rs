//! Integration tests for configuration validation

#![allow(clippy::expect_used, clippy::unwrap_used)]

use sfs_protocol::config::{
    ClientConfig, CodecConfig, FloatOrder, LoggingConfig, ProtocolConfig, ServerConfig,
};
use sfs_protocol::error::ProtocolError;
use std::collections::HashMap;
use std::time::Duration;
use tracing::Level;

#[test]
fn test_default_config_validates() {
    let config = ProtocolConfig::default();
    let errors = config.validate();
    assert!(
        errors.is_empty(),
        "Default config should be valid, but got errors: {:?}",
        errors
    );
    assert!(config.validate_strict().is_ok());
}

#[test]
fn test_invalid_server_address() {
    let mut config = ProtocolConfig::default();
    config.server.address = "invalid_address".to_string();

    let errors = config.validate();
    assert!(!errors.is_empty(), "Should have validation errors");
    assert!(errors.iter().any(|e| e.contains("Invalid server address")));
}

#[test]
fn test_empty_server_address() {
    let mut config = ProtocolConfig::default();
    config.server.address = String::new();

    let errors = config.validate();
    assert!(errors.iter().any(|e| e.contains("cannot be empty")));
}

#[test]
fn test_client_accepts_host_names() {
    let client = ClientConfig {
        address: "sfs.example.com:9933".to_string(),
        ..ClientConfig::default()
    };
    assert!(client.validate().is_empty());

    let client = ClientConfig {
        address: "sfs.example.com".to_string(),
        ..ClientConfig::default()
    };
    assert!(client
        .validate()
        .iter()
        .any(|e| e.contains("Invalid client address")));
}

#[test]
fn test_zero_max_depth() {
    let codec = CodecConfig {
        max_depth: 0,
        ..CodecConfig::default()
    };
    let errors = codec.validate();
    assert!(errors.iter().any(|e| e.contains("Max depth must be greater than 0")));
}

#[test]
fn test_excessive_max_depth() {
    let codec = CodecConfig {
        max_depth: 100_000,
        ..CodecConfig::default()
    };
    assert!(codec.validate().iter().any(|e| e.contains("Max depth too large")));
}

#[test]
fn test_frame_size_bounds() {
    let small = CodecConfig {
        max_frame_size: 512,
        ..CodecConfig::default()
    };
    assert!(small.validate().iter().any(|e| e.contains("too small")));

    let exact = CodecConfig {
        max_frame_size: 1024,
        ..CodecConfig::default()
    };
    assert!(exact.validate().is_empty());
}

#[test]
fn test_server_timeouts_and_limits() {
    let server = ServerConfig {
        connection_timeout: Duration::from_millis(50),
        max_connections: 0,
        accept_backlog: 0,
        ..ServerConfig::default()
    };
    let errors = server.validate();
    assert_eq!(errors.len(), 3, "{errors:?}");
    assert!(errors.iter().any(|e| e.contains("too short")));
    assert!(errors.iter().any(|e| e.contains("Max connections")));
    assert!(errors.iter().any(|e| e.contains("Accept backlog")));

    let server = ServerConfig {
        connection_timeout: Duration::from_secs(301),
        ..ServerConfig::default()
    };
    assert!(server.validate().iter().any(|e| e.contains("too long")));
}

#[test]
fn test_logging_app_name() {
    let logging = LoggingConfig {
        app_name: String::new(),
        ..LoggingConfig::default()
    };
    assert!(logging.validate().iter().any(|e| e.contains("cannot be empty")));

    let logging = LoggingConfig {
        app_name: "x".repeat(65),
        ..LoggingConfig::default()
    };
    assert!(logging.validate().iter().any(|e| e.contains("too long")));
}

#[test]
fn test_validate_strict_collects_everything() {
    let config = ProtocolConfig::default_with_overrides(|c| {
        c.codec.max_depth = 0;
        c.server.address = String::new();
    });
    match config.validate_strict() {
        Err(ProtocolError::ConfigError(msg)) => {
            assert!(msg.contains("Max depth"));
            assert!(msg.contains("Server address"));
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_toml_sections_default_when_absent() {
    let config = ProtocolConfig::from_toml(
        r#"
        [codec]
        max_depth = 16
        float_order = "native"
        max_frame_size = 65536
        "#,
    )
    .unwrap();

    assert_eq!(config.codec.max_depth, 16);
    assert_eq!(config.codec.float_order, FloatOrder::Native);
    assert_eq!(config.codec.max_frame_size, 65_536);
    assert_eq!(config.server.address, "127.0.0.1:9933");
    assert_eq!(config.logging.log_level, Level::INFO);
}

#[test]
fn test_toml_rejects_bad_float_order() {
    let result = ProtocolConfig::from_toml(
        r#"
        [codec]
        max_depth = 16
        float_order = "little"
        max_frame_size = 65536
        "#,
    );
    assert!(matches!(result, Err(ProtocolError::ConfigError(_))));
}

#[test]
fn test_example_config_parses_back() {
    let text = ProtocolConfig::example_config();
    assert!(text.contains("[codec]"));
    let parsed = ProtocolConfig::from_toml(&text).unwrap();
    assert!(parsed.validate().is_empty());
    assert_eq!(parsed.client.response_timeout, Duration::from_secs(30));
}

#[test]
fn test_save_and_load_file() {
    let path = std::env::temp_dir().join(format!("sfs-protocol-config-{}.toml", std::process::id()));
    let config = ProtocolConfig::default_with_overrides(|c| {
        c.codec.max_depth = 32;
        c.logging.log_level = Level::DEBUG;
        c.logging.json_format = true;
    });
    config.save_to_file(&path).unwrap();

    let loaded = ProtocolConfig::from_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(loaded.codec.max_depth, 32);
    assert_eq!(loaded.logging.log_level, Level::DEBUG);
    assert!(loaded.logging.json_format);
}

#[test]
fn test_missing_file() {
    assert!(matches!(
        ProtocolConfig::from_file("/definitely/not/here.toml"),
        Err(ProtocolError::ConfigError(_))
    ));
}

#[test]
fn test_env_style_overrides() {
    let vars: HashMap<&str, &str> = [
        ("SFS_PROTOCOL_SERVER_ADDRESS", "0.0.0.0:9000"),
        ("SFS_PROTOCOL_MAX_DEPTH", "8"),
        ("SFS_PROTOCOL_FLOAT_ORDER", "native"),
        ("SFS_PROTOCOL_CONNECTION_TIMEOUT_MS", "2500"),
    ]
    .into_iter()
    .collect();

    let config = ProtocolConfig::from_vars(|k| vars.get(k).map(|v| v.to_string())).unwrap();
    assert_eq!(config.server.address, "0.0.0.0:9000");
    assert_eq!(config.codec.max_depth, 8);
    assert_eq!(config.codec.float_order, FloatOrder::Native);
    assert_eq!(config.client.connection_timeout, Duration::from_millis(2500));

    let bad = ProtocolConfig::from_vars(|k| (k == "SFS_PROTOCOL_MAX_FRAME_SIZE").then(|| "big".to_string()));
    assert!(matches!(bad, Err(ProtocolError::ConfigError(_))));
}
