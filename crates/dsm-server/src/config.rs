use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings for a standalone parameter server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamServerConfig {
    /// `host:port` to listen on.
    pub bind_addr: String,
}

impl Default for ParamServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9000".into(),
        }
    }
}

/// Process-local knobs for a node that are not part of the cluster file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeOptions {
    /// Upper bound on any single outbound HTTP request.
    pub request_timeout: Duration,
    /// How long to wait for the node's own listener, and for peers, to
    /// answer their health check.
    pub ready_timeout: Duration,
}

impl Default for NodeOptions {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            ready_timeout: Duration::from_secs(5),
        }
    }
}
