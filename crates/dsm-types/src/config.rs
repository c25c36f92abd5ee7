//! Cluster configuration, loaded once at process start.
//!
//! The file is a JSON document:
//!
//! ```json
//! {
//!   "address": "127.0.0.1",
//!   "port": 9090,
//!   "id": 1,
//!   "peers": [{ "address": "127.0.0.1", "port": 9091, "id": 2 }],
//!   "param_server": { "address": "127.0.0.1", "port": 9000 }
//! }
//! ```
//!
//! An optional `retry` object tunes parameter-server retries and lock
//! polling; see [`RetrySettings`].

use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::identity::{Peer, PeerId};

/// Full description of one node's view of the cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Address this node's request listener binds to.
    pub address: String,
    /// Port this node's request listener binds to.
    pub port: u16,
    /// This node's ordinal.
    pub id: PeerId,
    /// Every other member of the cluster.
    #[serde(default)]
    pub peers: Vec<Peer>,
    /// Where the parameter server listens.
    pub param_server: Endpoint,
    #[serde(default)]
    pub retry: RetrySettings,
}

/// A bare `address:port` pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoint {
    pub address: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self { address: address.into(), port }
    }

    pub fn authority(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.authority())
    }
}

/// Backoff and timeout knobs for blocking remote calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    /// `None` waits forever.
    pub timeout_ms: Option<u64>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            initial_backoff_ms: 5,
            max_backoff_ms: 500,
            timeout_ms: Some(30_000),
        }
    }
}

impl RetrySettings {
    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

impl ClusterConfig {
    /// Parse and validate a config from its JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate the config file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Check the invariants the lock protocol relies on: ordinals are unique
    /// across the cluster, and backoff bounds are sane.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        seen.insert(self.id);
        for peer in &self.peers {
            if !seen.insert(peer.id) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate peer id {}",
                    peer.id.get()
                )));
            }
        }
        if self.retry.initial_backoff_ms == 0 {
            return Err(ConfigError::Invalid("initial_backoff_ms must be positive".into()));
        }
        if self.retry.max_backoff_ms < self.retry.initial_backoff_ms {
            return Err(ConfigError::Invalid(
                "max_backoff_ms must not be below initial_backoff_ms".into(),
            ));
        }
        Ok(())
    }

    /// This node described as a [`Peer`].
    pub fn local_peer(&self) -> Peer {
        Peer::new(self.address.clone(), self.port, self.id)
    }

    /// `address:port` the request listener binds to.
    pub fn bind_authority(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Number of nodes in the cluster, this one included.
    pub fn cluster_size(&self) -> usize {
        self.peers.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const SAMPLE: &str = r#"{
        "address": "127.0.0.1",
        "port": 9090,
        "id": 1,
        "peers": [
            { "address": "127.0.0.1", "port": 9091, "id": 2 },
            { "address": "127.0.0.1", "port": 9092, "id": 3 }
        ],
        "param_server": { "address": "127.0.0.1", "port": 9000 }
    }"#;

    #[test]
    fn parse_sample() {
        let config = ClusterConfig::from_json(SAMPLE).unwrap();
        assert_eq!(config.id.get(), 1);
        assert_eq!(config.peers.len(), 2);
        assert_eq!(config.cluster_size(), 3);
        assert_eq!(config.param_server.base_url(), "http://127.0.0.1:9000");
        assert_eq!(config.bind_authority(), "127.0.0.1:9090");
        assert_eq!(config.retry, RetrySettings::default());
    }

    #[test]
    fn duplicate_ids_rejected() {
        let text = SAMPLE.replace(r#""port": 9092, "id": 3"#, r#""port": 9092, "id": 1"#);
        let err = ClusterConfig::from_json(&text).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn oversized_id_rejected() {
        let text = SAMPLE.replace(r#""id": 3"#, r#""id": 64"#);
        assert!(matches!(
            ClusterConfig::from_json(&text).unwrap_err(),
            ConfigError::Parse(_)
        ));
    }

    #[test]
    fn retry_section_overrides_defaults() {
        let text = SAMPLE.replace(
            r#""param_server""#,
            r#""retry": { "max_backoff_ms": 50, "timeout_ms": null }, "param_server""#,
        );
        let config = ClusterConfig::from_json(&text).unwrap();
        assert_eq!(config.retry.initial_backoff_ms, 5);
        assert_eq!(config.retry.max_backoff(), Duration::from_millis(50));
        assert_eq!(config.retry.timeout(), None);
    }

    #[test]
    fn inverted_backoff_rejected() {
        let text = SAMPLE.replace(
            r#""param_server""#,
            r#""retry": { "initial_backoff_ms": 100, "max_backoff_ms": 10 }, "param_server""#,
        );
        assert!(ClusterConfig::from_json(&text).is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = ClusterConfig::load(file.path()).unwrap();
        assert_eq!(config.local_peer().port, 9090);
    }

    #[test]
    fn load_missing_file() {
        let err = ClusterConfig::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
