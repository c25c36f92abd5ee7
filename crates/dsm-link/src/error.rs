use std::time::Duration;

use dsm_protocol::ProtocolError;
use dsm_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LinkError {
    /// The request never got an answer: connection refused, reset, timed out.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote party answered with a non-success status.
    #[error("remote error (status {status}): {message}")]
    Remote { status: u16, message: String },

    /// The answer could not be decoded.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Retries kept failing until the deadline.
    #[error("{operation} timed out after {elapsed:?}")]
    Timeout { operation: String, elapsed: Duration },

    /// A loopback call was rejected by the in-process store.
    #[error("local store error: {0}")]
    Local(#[from] StoreError),
}

impl LinkError {
    /// Whether another attempt could succeed. Definite answers (4xx, store
    /// rejections, undecodable bodies) are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Remote { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// The remote party already holds an object or slot under this name.
    pub fn is_already_exists(&self) -> bool {
        match self {
            Self::Remote { status, .. } => *status == 409,
            Self::Local(e) => matches!(
                e,
                StoreError::AlreadyExists { .. } | StoreError::ParamAlreadyExists { .. }
            ),
            _ => false,
        }
    }

    /// The remote party has no object or slot under this name.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Remote { status, .. } => *status == 404,
            Self::Local(e) => matches!(
                e,
                StoreError::NotFound { .. } | StoreError::ParamNotFound { .. }
            ),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for LinkError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

pub type LinkResult<T> = Result<T, LinkError>;
