use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("listener at {addr} not ready after {elapsed:?}")]
    NotReady { addr: SocketAddr, elapsed: Duration },

    #[error("configuration error: {0}")]
    Config(#[from] dsm_types::ConfigError),

    #[error("link error: {0}")]
    Link(#[from] dsm_link::LinkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;
