//! Configuration file support for the demo tools.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Local bind address; empty selects a loopback ephemeral port.
    #[serde(default)]
    pub bind: String,
    /// Default remote address.
    pub remote: Option<String>,
    /// Read buffer and kernel buffer size in bytes.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,
    /// Read deadline used by the tick loop, in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
}

fn default_buffer_size() -> usize {
    4096
}

fn default_read_timeout_ms() -> u64 {
    1
}

impl Default for EndpointConfig {
    fn default() -> Self {
        EndpointConfig {
            bind: String::new(),
            remote: None,
            buffer_size: default_buffer_size(),
            read_timeout_ms: default_read_timeout_ms(),
        }
    }
}

impl EndpointConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Retry policy for reliable sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Time between retransmission attempts, in milliseconds.
    #[serde(default = "default_retry_interval_ms")]
    pub interval_ms: u64,
    /// Maximum retransmissions, not counting the initial send.
    #[serde(default = "default_retry_count")]
    pub count: u32,
}

fn default_retry_interval_ms() -> u64 {
    250
}

fn default_retry_count() -> u32 {
    5
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            interval_ms: default_retry_interval_ms(),
            count: default_retry_count(),
        }
    }
}

impl RetryConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Combined tool configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub endpoint: EndpointConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Create an example configuration for an echo server.
    pub fn example_echo() -> Self {
        Config {
            endpoint: EndpointConfig {
                bind: "0.0.0.0:4600".to_string(),
                remote: None,
                buffer_size: 64 * 1024,
                read_timeout_ms: 1,
            },
            retry: RetryConfig::default(),
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert!(config.endpoint.bind.is_empty());
        assert_eq!(config.endpoint.buffer_size, 4096);
        assert_eq!(config.retry.interval(), Duration::from_millis(250));
        assert_eq!(config.retry.count, 5);
    }

    #[test]
    fn test_serialize_deserialize() {
        let config = Config::example_echo();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();

        assert_eq!(parsed.endpoint.bind, "0.0.0.0:4600");
        assert_eq!(parsed.endpoint.buffer_size, 64 * 1024);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let parsed: Config = toml::from_str("[endpoint]\nbind = \"127.0.0.1:9000\"\n").unwrap();
        assert_eq!(parsed.endpoint.bind, "127.0.0.1:9000");
        assert_eq!(parsed.endpoint.read_timeout_ms, 1);
        assert_eq!(parsed.retry.count, 5);
    }
}
