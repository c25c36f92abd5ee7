use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("peer id {0} out of range (max {max})", max = crate::identity::MAX_PEER_ID)]
    PeerIdOutOfRange(u32),

    #[error("value {0} is not a single-bit lock pattern")]
    InvalidPattern(i64),
}

/// Errors produced while loading or validating a [`ClusterConfig`](crate::ClusterConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error(transparent)]
    Type(#[from] TypeError),
}
