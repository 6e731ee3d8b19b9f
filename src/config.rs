//! # Configuration Management
//!
//! Centralized configuration for the codec, the TCP transport and logging.
//!
//! ## Configuration Sources
//! - TOML files via `from_file()` / `from_toml()`
//! - Environment variables prefixed `SFS_PROTOCOL_` via `from_env()`
//! - Direct instantiation with defaults
//!
//! ## Security Considerations
//! - `max_depth` bounds container nesting on decode
//! - `max_frame_size` is checked before a frame body is buffered

use crate::error::{ProtocolError, Result};
use crate::utils::timeout;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::Duration;
use tracing::Level;

/// Default TCP port of SFS2X servers.
pub const DEFAULT_PORT: u16 = 9933;

/// Default container nesting limit.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Default upper bound on a frame's payload length (16 MB).
pub const MAX_FRAME_SIZE: usize = 16 * 1024 * 1024;

/// Root configuration structure that contains all configurable settings
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct ProtocolConfig {
    /// Value codec options
    #[serde(default)]
    pub codec: CodecConfig,

    /// Server-specific configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Client-specific configuration
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ProtocolConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut file = File::open(path)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to open config file: {e}")))?;

        let mut contents = String::new();
        file.read_to_string(&mut contents)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to read config file: {e}")))?;

        Self::from_toml(&contents)
    }

    /// Load configuration from TOML string
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str::<Self>(content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to parse TOML: {e}")))
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each known variable.
    ///
    /// Unparseable numeric values are rejected rather than silently ignored.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(addr) = lookup("SFS_PROTOCOL_SERVER_ADDRESS") {
            config.server.address = addr;
        }

        if let Some(addr) = lookup("SFS_PROTOCOL_CLIENT_ADDRESS") {
            config.client.address = addr;
        }

        if let Some(val) = lookup("SFS_PROTOCOL_CONNECTION_TIMEOUT_MS") {
            let ms = parse_var::<u64>("SFS_PROTOCOL_CONNECTION_TIMEOUT_MS", &val)?;
            config.server.connection_timeout = Duration::from_millis(ms);
            config.client.connection_timeout = Duration::from_millis(ms);
        }

        if let Some(val) = lookup("SFS_PROTOCOL_MAX_DEPTH") {
            config.codec.max_depth = parse_var("SFS_PROTOCOL_MAX_DEPTH", &val)?;
        }

        if let Some(val) = lookup("SFS_PROTOCOL_MAX_FRAME_SIZE") {
            config.codec.max_frame_size = parse_var("SFS_PROTOCOL_MAX_FRAME_SIZE", &val)?;
        }

        if let Some(val) = lookup("SFS_PROTOCOL_FLOAT_ORDER") {
            config.codec.float_order = match val.as_str() {
                "big_endian" => FloatOrder::BigEndian,
                "native" => FloatOrder::Native,
                other => {
                    return Err(ProtocolError::ConfigError(format!(
                        "Invalid SFS_PROTOCOL_FLOAT_ORDER: '{other}' (expected 'big_endian' or 'native')"
                    )))
                }
            };
        }

        if let Some(val) = lookup("SFS_PROTOCOL_LOG_LEVEL") {
            config.logging.log_level = val.parse::<Level>().map_err(|_| {
                ProtocolError::ConfigError(format!("Invalid SFS_PROTOCOL_LOG_LEVEL: '{val}'"))
            })?;
        }

        Ok(config)
    }

    /// Apply overrides to the default configuration
    pub fn default_with_overrides<F>(mutator: F) -> Self
    where
        F: FnOnce(&mut Self),
    {
        let mut config = Self::default();
        mutator(&mut config);
        config
    }

    /// Generate example configuration file content
    pub fn example_config() -> String {
        toml::to_string_pretty(&Self::default())
            .unwrap_or_else(|_| String::from("# Failed to generate example config"))
    }

    /// Save configuration to a file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)
            .map_err(|e| ProtocolError::ConfigError(format!("Failed to write config file: {e}")))?;

        Ok(())
    }

    /// Validate the configuration for common issues and misconfigurations
    ///
    /// Returns a list of validation errors. Empty list means configuration is valid.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        errors.extend(self.codec.validate());
        errors.extend(self.server.validate());
        errors.extend(self.client.validate());
        errors.extend(self.logging.validate());
        errors
    }

    /// Validate and return Result - convenience method
    pub fn validate_strict(&self) -> Result<()> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::ConfigError(format!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )))
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| ProtocolError::ConfigError(format!("Invalid {name}: '{value}'")))
}

/// Byte order used for IEEE-754 floats on the wire.
///
/// Integers are always big-endian. `Native` packs floats in host order, which
/// some peers emit; both ends must agree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FloatOrder {
    #[default]
    BigEndian,
    Native,
}

/// Value codec options
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CodecConfig {
    /// Deepest container nesting accepted on decode
    pub max_depth: usize,

    /// Float byte order for encode and decode
    #[serde(default)]
    pub float_order: FloatOrder,

    /// Largest frame payload accepted from a stream
    pub max_frame_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            float_order: FloatOrder::BigEndian,
            max_frame_size: MAX_FRAME_SIZE,
        }
    }
}

impl CodecConfig {
    /// Validate codec configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.max_depth == 0 {
            errors.push("Max depth must be greater than 0".to_string());
        } else if self.max_depth > 1024 {
            errors.push(format!(
                "Max depth too large: {} (maximum: 1024)",
                self.max_depth
            ));
        }

        if self.max_frame_size < 1024 {
            errors.push("Max frame size too small (minimum: 1 KB)".to_string());
        } else if self.max_frame_size > u32::MAX as usize {
            errors.push(format!(
                "Max frame size too large: {} bytes (maximum: {} bytes)",
                self.max_frame_size,
                u32::MAX
            ));
        }

        errors
    }
}

/// Server-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Server listen address (e.g., "127.0.0.1:9933")
    pub address: String,

    /// Accepted connections buffered before the accept loop waits for a consumer
    pub accept_backlog: usize,

    /// Send timeout applied to accepted connections
    #[serde(with = "duration_serde")]
    pub connection_timeout: Duration,

    /// Maximum number of concurrent connections per acceptor
    pub max_connections: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: format!("127.0.0.1:{DEFAULT_PORT}"),
            accept_backlog: 32,
            connection_timeout: timeout::DEFAULT_TIMEOUT,
            max_connections: 1000,
        }
    }
}

impl ServerConfig {
    /// Validate server configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.address.is_empty() {
            errors.push("Server address cannot be empty".to_string());
        } else if self.address.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!(
                "Invalid server address format: '{}' (expected format: '0.0.0.0:9933')",
                self.address
            ));
        }

        if self.accept_backlog == 0 {
            errors.push("Accept backlog must be greater than 0".to_string());
        } else if self.accept_backlog > 65_536 {
            errors.push(format!(
                "Accept backlog too large: {} (maximum: 65536)",
                self.accept_backlog
            ));
        }

        if self.connection_timeout.as_millis() < 100 {
            errors.push("Connection timeout too short (minimum: 100ms)".to_string());
        } else if self.connection_timeout.as_secs() > 300 {
            errors.push("Connection timeout too long (maximum: 300s)".to_string());
        }

        if self.max_connections == 0 {
            errors.push("Max connections must be greater than 0".to_string());
        } else if self.max_connections > 100_000 {
            errors.push(format!(
                "Max connections very high: {} (ensure system resources can support this)",
                self.max_connections
            ));
        }

        errors
    }
}

/// Client-specific configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    /// Target server address
    pub address: String,

    /// Timeout for connection attempts
    #[serde(with = "duration_serde")]
    pub connection_timeout: Duration,

    /// Timeout for waiting for response messages
    #[serde(with = "duration_serde")]
    pub response_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: format!("127.0.0.1:{DEFAULT_PORT}"),
            connection_timeout: timeout::DEFAULT_TIMEOUT,
            response_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    /// Validate client configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        // Host names are allowed here, so only the port is checked.
        match self.address.rsplit_once(':') {
            None if self.address.is_empty() => {
                errors.push("Client address cannot be empty".to_string());
            }
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {}
            _ => errors.push(format!(
                "Invalid client address format: '{}' (expected format: 'example.com:9933')",
                self.address
            )),
        }

        if self.connection_timeout.as_millis() < 100 {
            errors.push("Connection timeout too short (minimum: 100ms)".to_string());
        }

        if self.response_timeout.as_millis() < 100 {
            errors.push("Response timeout too short (minimum: 100ms)".to_string());
        }

        errors
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Application name for logs
    pub app_name: String,

    /// Log level
    #[serde(with = "log_level_serde")]
    pub log_level: Level,

    /// Whether to use JSON formatting for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            app_name: String::from("sfs-protocol"),
            log_level: Level::INFO,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// Validate logging configuration
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.app_name.is_empty() {
            errors.push("Application name cannot be empty".to_string());
        } else if self.app_name.len() > 64 {
            errors.push(format!(
                "Application name too long: {} characters (maximum: 64)",
                self.app_name.len()
            ));
        }

        errors
    }
}

/// Helper module for Duration serialization/deserialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let millis = duration.as_millis() as u64;
        millis.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Helper module for tracing::Level serialization/deserialization
mod log_level_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::str::FromStr;
    use tracing::Level;

    pub fn serialize<S>(level: &Level, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let level_str = match *level {
            Level::TRACE => "trace",
            Level::DEBUG => "debug",
            Level::INFO => "info",
            Level::WARN => "warn",
            Level::ERROR => "error",
        };
        level_str.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
    where
        D: Deserializer<'de>,
    {
        let level_str = String::deserialize(deserializer)?;
        Level::from_str(&level_str)
            .map_err(|_| serde::de::Error::custom(format!("Invalid log level: {level_str}")))
    }
}
