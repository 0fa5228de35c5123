// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Driver configuration.
//
// The harness hands the driver a flat property map; the CLI reads the same
// settings from the environment. Only the node list is required.

use std::collections::HashMap;
use std::time::Duration;

use kvbridge_store::cluster::DEFAULT_TIMEOUT;
use kvbridge_store::ClusterOptions;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Property holding the comma-separated store node addresses.
pub const NODES_PROPERTY: &str = "kvbridge.nodes";
/// Property holding the optional channel-count hint.
pub const CHANNELS_PROPERTY: &str = "kvbridge.channels";
/// Property holding the per-request timeout in milliseconds.
pub const TIMEOUT_PROPERTY: &str = "kvbridge.timeout_ms";

/// Environment variable equivalent of [`NODES_PROPERTY`].
pub const NODES_ENV: &str = "KVBRIDGE_NODES";
/// Environment variable equivalent of [`CHANNELS_PROPERTY`].
pub const CHANNELS_ENV: &str = "KVBRIDGE_CHANNELS";
/// Environment variable equivalent of [`TIMEOUT_PROPERTY`].
pub const TIMEOUT_ENV: &str = "KVBRIDGE_TIMEOUT_MS";

/// Errors raised while reading driver configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// No store node address was configured.
    #[error("no store nodes configured (set kvbridge.nodes or KVBRIDGE_NODES)")]
    MissingNodes,

    /// A numeric setting could not be parsed.
    #[error("invalid value '{value}' for {key}: expected a positive integer")]
    InvalidNumber {
        /// The setting name.
        key: String,
        /// The raw value.
        value: String,
    },
}

/// Settings for connecting the driver to a store cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Store node addresses; the first one is the primary.
    pub nodes: Vec<String>,
    /// Channel-count hint passed to the cluster client.
    pub channels: Option<usize>,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            channels: None,
            timeout_ms: DEFAULT_TIMEOUT.as_millis() as u64,
        }
    }
}

impl DriverConfig {
    /// Build and validate a config from already-parsed settings.
    pub fn new(
        nodes: Vec<String>,
        channels: Option<usize>,
        timeout_ms: u64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            nodes,
            channels,
            timeout_ms,
        };
        config.validate()?;
        Ok(config)
    }

    /// Build a config for an explicit node list.
    pub fn with_nodes<I, S>(nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            nodes: nodes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Read settings from a harness property map.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::from_lookup(
            |key| properties.get(key).cloned(),
            [NODES_PROPERTY, CHANNELS_PROPERTY, TIMEOUT_PROPERTY],
        )
    }

    /// Read settings from `KVBRIDGE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(
            |key| std::env::var(key).ok(),
            [NODES_ENV, CHANNELS_ENV, TIMEOUT_ENV],
        )
    }

    fn from_lookup<F>(
        lookup: F,
        [nodes_key, channels_key, timeout_key]: [&str; 3],
    ) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let nodes = lookup(nodes_key)
            .map(|list| parse_node_list(&list))
            .unwrap_or_default();

        let channels = lookup(channels_key)
            .map(|raw| parse_positive(channels_key, &raw))
            .transpose()?
            .map(|n| n as usize);

        let timeout_ms = match lookup(timeout_key) {
            Some(raw) => parse_positive(timeout_key, &raw)?,
            None => DriverConfig::default().timeout_ms,
        };

        Self::new(nodes, channels, timeout_ms)
    }

    /// Check that the config can produce a connection.
    ///
    /// A zero channel hint or zero timeout would make every request fail, so
    /// both are rejected alongside an empty node list.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes.is_empty() {
            return Err(ConfigError::MissingNodes);
        }
        if self.channels == Some(0) {
            return Err(zero_setting("channels"));
        }
        if self.timeout_ms == 0 {
            return Err(zero_setting("timeout_ms"));
        }
        Ok(())
    }

    /// The node every primitive is sent to: the first configured node.
    pub fn primary(&self) -> Option<&str> {
        self.nodes.first().map(String::as_str)
    }

    /// Connection tuning derived from these settings.
    pub fn cluster_options(&self) -> ClusterOptions {
        ClusterOptions {
            channels: self.channels,
            timeout: Duration::from_millis(self.timeout_ms),
        }
    }
}

/// Split a comma-separated address list, trimming entries and dropping
/// empty ones.
pub fn parse_node_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|node| !node.is_empty())
        .map(str::to_string)
        .collect()
}

fn zero_setting(key: &str) -> ConfigError {
    ConfigError::InvalidNumber {
        key: key.to_string(),
        value: "0".to_string(),
    }
}

fn parse_positive(key: &str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            key: key.to_string(),
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_parse_node_list() {
        assert_eq!(
            parse_node_list(" a:1, b:2 ,,c:3,"),
            vec!["a:1".to_string(), "b:2".to_string(), "c:3".to_string()]
        );
        assert!(parse_node_list(" , ").is_empty());
    }

    #[test]
    fn test_from_properties() {
        let config = DriverConfig::from_properties(&props(&[
            (NODES_PROPERTY, "10.0.0.1:7000,10.0.0.2:7000"),
            (CHANNELS_PROPERTY, "8"),
        ]))
        .unwrap();

        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.primary(), Some("10.0.0.1:7000"));
        assert_eq!(config.channels, Some(8));
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.cluster_options().channels, Some(8));
    }

    #[test]
    fn test_timeout_property() {
        let config = DriverConfig::from_properties(&props(&[
            (NODES_PROPERTY, "a:1"),
            (TIMEOUT_PROPERTY, "250"),
        ]))
        .unwrap();
        assert_eq!(config.cluster_options().timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_missing_nodes() {
        assert_eq!(
            DriverConfig::from_properties(&props(&[])).unwrap_err(),
            ConfigError::MissingNodes
        );
        assert_eq!(
            DriverConfig::from_properties(&props(&[(NODES_PROPERTY, " ,")])).unwrap_err(),
            ConfigError::MissingNodes
        );
    }

    #[test]
    fn test_invalid_channels() {
        for raw in ["zero", "0", "-2"] {
            let err = DriverConfig::from_properties(&props(&[
                (NODES_PROPERTY, "a:1"),
                (CHANNELS_PROPERTY, raw),
            ]))
            .unwrap_err();
            assert!(matches!(err, ConfigError::InvalidNumber { ref key, .. } if key == CHANNELS_PROPERTY));
        }
    }

    #[test]
    fn test_with_nodes_and_defaults() {
        let config = DriverConfig::with_nodes(["a:1"]);
        assert_eq!(config.primary(), Some("a:1"));
        assert!(config.validate().is_ok());
        assert_eq!(DriverConfig::default().validate(), Err(ConfigError::MissingNodes));
    }

    #[test]
    fn test_new_rejects_zero_settings() {
        let nodes = vec!["a:1".to_string()];

        let err = DriverConfig::new(nodes.clone(), Some(0), 1_000).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { ref key, .. } if key == "channels"));

        let err = DriverConfig::new(nodes.clone(), None, 0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidNumber { ref key, .. } if key == "timeout_ms"));

        let config = DriverConfig::new(nodes, Some(2), 500).unwrap();
        assert_eq!(config.cluster_options().timeout, Duration::from_millis(500));
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let config: DriverConfig = serde_json::from_str(r#"{"nodes":["a:1"]}"#).unwrap();
        assert_eq!(config.nodes, vec!["a:1".to_string()]);
        assert_eq!(config.channels, None);
        assert_eq!(config.timeout_ms, 30_000);
        assert!(config.validate().is_ok());

        let zero: DriverConfig =
            serde_json::from_str(r#"{"nodes":["a:1"],"timeout_ms":0}"#).unwrap();
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_from_env() {
        // The only test touching KVBRIDGE_* variables.
        std::env::set_var(NODES_ENV, "10.0.0.1:7000, 10.0.0.2:7000");
        std::env::set_var(CHANNELS_ENV, "4");
        std::env::remove_var(TIMEOUT_ENV);
        let config = DriverConfig::from_env();

        std::env::set_var(TIMEOUT_ENV, "0");
        let zero_timeout = DriverConfig::from_env();

        std::env::remove_var(NODES_ENV);
        std::env::remove_var(CHANNELS_ENV);
        std::env::remove_var(TIMEOUT_ENV);
        let missing = DriverConfig::from_env();

        let config = config.unwrap();
        assert_eq!(config.primary(), Some("10.0.0.1:7000"));
        assert_eq!(config.nodes.len(), 2);
        assert_eq!(config.channels, Some(4));
        assert_eq!(config.timeout_ms, 30_000);

        assert!(matches!(
            zero_timeout,
            Err(ConfigError::InvalidNumber { ref key, .. }) if key == TIMEOUT_ENV
        ));
        assert_eq!(missing.unwrap_err(), ConfigError::MissingNodes);
    }
}
