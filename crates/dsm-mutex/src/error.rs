use std::time::Duration;

use dsm_link::LinkError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MutexError {
    /// Release of a lock the caller does not hold.
    #[error("lock {name}: expected slot value {expected}, found {found}")]
    ProtocolViolation {
        name: String,
        expected: i64,
        found: i64,
    },

    /// Acquisition of a lock the caller already holds.
    #[error("lock {name} is already held by this participant")]
    AlreadyHeld { name: String },

    #[error("lock {name} not acquired within {elapsed:?}")]
    Timeout { name: String, elapsed: Duration },

    #[error("parameter server: {0}")]
    Link(#[from] LinkError),
}

pub type MutexResult<T> = Result<T, MutexError>;
