//! Configuration file loading.
//!
//! The file is YAML with an optional `port` and an `estia` section holding
//! engine settings. Every key is optional:
//!
//! ```yaml
//! port: /dev/ttyUSB0
//! estia:
//!   read_interval_ms: 60
//!   sensors: [twi, two, to]
//! ```

use std::path::Path;

use estia_serial::EstiaConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RunnerError};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Serial device path.
    pub port: Option<String>,
    pub estia: EstiaConfig,
}

impl RunnerConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty document deserializes to unit, not a map
        if text.trim().is_empty() {
            return Ok(RunnerConfig::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(RunnerConfig::default());
        };
        let text = std::fs::read_to_string(path).map_err(|source| RunnerError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text)
    }

    /// Apply command line overrides.
    pub fn with_port(mut self, port: Option<String>) -> Self {
        if port.is_some() {
            self.port = port;
        }
        self
    }

    pub fn port(&self) -> Result<&str> {
        self.port.as_deref().ok_or(RunnerError::NoPort)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estia_serial::Parity;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(RunnerConfig::from_yaml("").unwrap(), RunnerConfig::default());
        assert_eq!(RunnerConfig::load(None).unwrap(), RunnerConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = RunnerConfig::from_yaml(
            "port: /dev/ttyUSB0\nestia:\n  read_interval_ms: 60\n  serial:\n    parity: none\n  sensors: [twi, to]\n",
        )
        .unwrap();

        assert_eq!(config.port.as_deref(), Some("/dev/ttyUSB0"));
        assert_eq!(config.estia.read_interval_ms, 60);
        assert_eq!(config.estia.serial.parity, Parity::None);
        assert_eq!(config.estia.serial.baud_rate, 2400);
        assert_eq!(config.estia.sensors, vec!["twi", "to"]);
        assert_eq!(config.estia.command_retries, 2);
    }

    #[test]
    fn test_port_override() {
        let config = RunnerConfig::from_yaml("port: /dev/ttyS0").unwrap();
        assert_eq!(config.clone().with_port(None).port().unwrap(), "/dev/ttyS0");
        assert_eq!(
            config.with_port(Some("/dev/ttyUSB1".into())).port().unwrap(),
            "/dev/ttyUSB1"
        );
    }

    #[test]
    fn test_missing_port() {
        assert!(matches!(RunnerConfig::default().port(), Err(RunnerError::NoPort)));
    }

    #[test]
    fn test_invalid_config() {
        assert!(matches!(
            RunnerConfig::from_yaml("estia:\n  byte_delay_ms: soon\n"),
            Err(RunnerError::Config(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = RunnerConfig::load(Some(Path::new("/nonexistent/estia.yaml"))).unwrap_err();
        assert!(matches!(err, RunnerError::ConfigRead { .. }));
    }
}
