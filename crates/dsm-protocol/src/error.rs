use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("invalid payload encoding: {0}")]
    InvalidEncoding(String),

    #[error("payload length mismatch: declared {declared}, decoded {actual}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("invalid integer body: {0:?}")]
    InvalidInteger(String),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
