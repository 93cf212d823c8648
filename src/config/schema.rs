//! Typed view of the resolved configuration.
//!
//! Each field is read key-by-key from a [`Configuration`], so every key
//! follows the layer precedence independently.

use std::net::SocketAddr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::loader::ConfigError;
use crate::config::resolver::Configuration;

pub const PORT_KEY: &str = "PORT";
pub const MOUNTS_KEY: &str = "mounts";
pub const LOGGING_KEY: &str = "LOGGING";
pub const MAX_BODY_SIZE_KEY: &str = "MAX_BODY_SIZE";
pub const METRICS_ADDRESS_KEY: &str = "METRICS_ADDRESS";

/// Root configuration for the gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Listening port.
    pub port: u16,

    /// Raw mount entries in declaration order.
    pub mounts: Vec<Value>,

    /// Logging settings.
    pub logging: LoggingConfig,

    /// Maximum accepted request body in bytes.
    pub max_body_size: usize,

    /// Prometheus exporter address, when metrics are exposed.
    pub metrics_address: Option<SocketAddr>,
}

/// An empty gateway: no mounts, default port and logging.
impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: 80,
            mounts: Vec::new(),
            logging: LoggingConfig::default(),
            max_body_size: 2 * 1024 * 1024,
            metrics_address: None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level or EnvFilter directive, e.g. `info` or `stashbox=debug,tower_http=info`.
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl GatewayConfig {
    /// Extract the typed configuration, falling back to [`Default`] for
    /// keys no layer defines.
    pub fn from_configuration(config: &Configuration) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match config.get(PORT_KEY) {
            Some(value) => {
                let port = integer(PORT_KEY, value)?;
                u16::try_from(port).map_err(|_| invalid(PORT_KEY, format!("{port} is not a valid port")))?
            }
            None => defaults.port,
        };

        let mounts = match config.get(MOUNTS_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(entries)) => entries.clone(),
            Some(other) => return Err(invalid(MOUNTS_KEY, format!("expected an array, found {other}"))),
        };

        let logging = match config.get(LOGGING_KEY) {
            None | Some(Value::Null) => defaults.logging,
            Some(value) => serde_json::from_value(value.clone())
                .map_err(|e| invalid(LOGGING_KEY, e.to_string()))?,
        };

        let max_body_size = match config.get(MAX_BODY_SIZE_KEY) {
            Some(value) => usize::try_from(integer(MAX_BODY_SIZE_KEY, value)?)
                .map_err(|e| invalid(MAX_BODY_SIZE_KEY, e.to_string()))?,
            None => defaults.max_body_size,
        };

        let metrics_address = match config.get(METRICS_ADDRESS_KEY) {
            None | Some(Value::Null) | Some(Value::Bool(false)) => None,
            Some(Value::String(addr)) => Some(
                addr.parse()
                    .map_err(|e| invalid(METRICS_ADDRESS_KEY, format!("{addr}: {e}")))?,
            ),
            Some(other) => {
                return Err(invalid(METRICS_ADDRESS_KEY, format!("expected an address, found {other}")))
            }
        };

        Ok(Self {
            port,
            mounts,
            logging,
            max_body_size,
            metrics_address,
        })
    }
}

/// Accept integers given as numbers or, as environment values are, as strings.
fn integer(key: &str, value: &Value) -> Result<u64, ConfigError> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .ok_or_else(|| invalid(key, format!("{n} is not a non-negative integer"))),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| invalid(key, format!("'{s}' is not a non-negative integer"))),
        other => Err(invalid(key, format!("expected an integer, found {other}"))),
    }
}

fn invalid(key: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::layers::ConfigLayer;
    use serde_json::{json, Map};

    fn resolve(vars: Vec<(&str, &str)>, file: Value) -> GatewayConfig {
        let mut overrides = Map::new();
        overrides.insert("unused".into(), json!(true));
        let config = Configuration::from_layers(
            vec![
                ConfigLayer::overrides(overrides),
                ConfigLayer::environment(vars),
                ConfigLayer::new("file", file),
                ConfigLayer::defaults(),
            ],
            "test",
        );
        GatewayConfig::from_configuration(&config).unwrap()
    }

    #[test]
    fn test_defaults_only() {
        let config = resolve(vec![], json!({}));
        assert_eq!(config.port, 80);
        assert_eq!(config.mounts.len(), 1);
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.max_body_size, 2 * 1024 * 1024);
        assert_eq!(config.metrics_address, None);
    }

    #[test]
    fn test_port_from_environment_string() {
        let config = resolve(vec![("STASHBOX__PORT", "9000")], json!({ "PORT": 8080 }));
        assert_eq!(config.port, 9000);
    }

    #[test]
    fn test_partial_logging_object_uses_field_defaults() {
        let config = resolve(vec![("STASHBOX__LOGGING__format", "json")], json!({}));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_port() {
        let config = Configuration::from_layers(
            vec![ConfigLayer::new("file", json!({ "PORT": 70000 }))],
            "test",
        );
        assert!(matches!(
            GatewayConfig::from_configuration(&config),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_null_mounts_means_none() {
        let config = resolve(vec![("STASHBOX__mounts", "null")], json!({}));
        assert!(config.mounts.is_empty());
    }

    #[test]
    fn test_metrics_address() {
        let config = resolve(vec![("STASHBOX__METRICS_ADDRESS", "127.0.0.1:9090")], json!({}));
        assert_eq!(config.metrics_address, Some("127.0.0.1:9090".parse().unwrap()));
    }
}
