//! # Host Configuration
//!
//! Loaded once at startup from TOML. Every section and key is optional.
//!
//! ```toml
//! [listener]
//! bind_address = "0.0.0.0"
//! port = 8052
//! read_timeout_ms = 250
//!
//! [host]
//! tick_rate = 60
//!
//! [queue]
//! capacity = 1024   # omit for unbounded
//! ```

use std::net::IpAddr;
use std::path::Path;

use cogalert_core::QueueConfig;
use cogalert_networking::ListenerConfig;
use serde::Deserialize;

use crate::error::{ConfigError, ConfigResult};

/// Highest accepted host tick rate.
pub const MAX_TICK_RATE: u32 = 1000;

/// Default host tick rate in Hz.
pub const DEFAULT_TICK_RATE: u32 = 60;

/// Complete host configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AlertConfig {
    /// Network listener settings.
    pub listener: ListenerSection,
    /// Consumer loop settings.
    pub host: HostSection,
    /// Dispatch queue settings.
    pub queue: QueueSection,
}

/// `[listener]` section.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ListenerSection {
    /// Address to bind.
    pub bind_address: IpAddr,
    /// UDP port.
    pub port: u16,
    /// Receive timeout between shutdown checks, in milliseconds.
    pub read_timeout_ms: u64,
}

impl Default for ListenerSection {
    fn default() -> Self {
        let defaults = ListenerConfig::default();
        Self {
            bind_address: defaults.bind_address,
            port: defaults.port,
            read_timeout_ms: defaults.read_timeout_ms,
        }
    }
}

/// `[host]` section.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostSection {
    /// Drains per second.
    pub tick_rate: u32,
}

impl Default for HostSection {
    fn default() -> Self {
        Self {
            tick_rate: DEFAULT_TICK_RATE,
        }
    }
}

/// `[queue]` section.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QueueSection {
    /// Maximum pending alerts before the oldest is dropped. Unbounded if unset.
    pub capacity: Option<usize>,
}

impl AlertConfig {
    /// Reads and validates a TOML file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Parses and validates TOML text.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] on syntax or schema errors,
    /// [`ConfigError::Invalid`] on out-of-range values.
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.host.tick_rate == 0 || self.host.tick_rate > MAX_TICK_RATE {
            return Err(ConfigError::Invalid(format!(
                "host.tick_rate must be between 1 and {MAX_TICK_RATE}, got {}",
                self.host.tick_rate
            )));
        }
        if self.queue.capacity == Some(0) {
            return Err(ConfigError::Invalid(
                "queue.capacity must be positive; omit it for an unbounded queue".to_string(),
            ));
        }
        Ok(())
    }

    /// Listener settings in the form the listener takes.
    #[must_use]
    pub fn listener_config(&self) -> ListenerConfig {
        ListenerConfig {
            bind_address: self.listener.bind_address,
            port: self.listener.port,
            read_timeout_ms: self.listener.read_timeout_ms,
        }
    }

    /// Queue settings in the form the queue takes.
    #[must_use]
    pub fn queue_config(&self) -> QueueConfig {
        QueueConfig {
            capacity: self.queue.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AlertConfig::from_toml_str("").unwrap();

        assert_eq!(config, AlertConfig::default());
        assert_eq!(config.listener.port, 8052);
        assert_eq!(config.host.tick_rate, 60);
        assert_eq!(config.queue_config(), QueueConfig::unbounded());
    }

    #[test]
    fn test_full_config() {
        let config = AlertConfig::from_toml_str(
            r#"
            [listener]
            bind_address = "127.0.0.1"
            port = 9000
            read_timeout_ms = 100

            [host]
            tick_rate = 30

            [queue]
            capacity = 16
            "#,
        )
        .unwrap();

        let listener = config.listener_config();
        assert_eq!(listener.socket_addr().to_string(), "127.0.0.1:9000");
        assert_eq!(listener.read_timeout_ms, 100);
        assert_eq!(config.host.tick_rate, 30);
        assert_eq!(config.queue_config(), QueueConfig::bounded(16));
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = AlertConfig::from_toml_str("[listener]\nport = 7000\n").unwrap();

        assert_eq!(config.listener.port, 7000);
        assert_eq!(config.listener.read_timeout_ms, 250);
        assert!(config.listener.bind_address.is_unspecified());
    }

    #[test]
    fn test_invalid_values() {
        for text in ["[host]\ntick_rate = 0", "[host]\ntick_rate = 5000", "[queue]\ncapacity = 0"] {
            assert!(matches!(
                AlertConfig::from_toml_str(text),
                Err(ConfigError::Invalid(_))
            ));
        }
    }

    #[test]
    fn test_syntax_and_schema_errors() {
        assert!(matches!(
            AlertConfig::from_toml_str("[listener\nport = 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            AlertConfig::from_toml_str("[listener]\nprot = 1"),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            AlertConfig::from_toml_str("[listener]\nbind_address = \"not-an-ip\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = AlertConfig::load("/nonexistent/cogalert.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
