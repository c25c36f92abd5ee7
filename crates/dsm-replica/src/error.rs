use dsm_store::StoreError;
use thiserror::Error;

/// Local contract violations. Peer failures are not errors at this layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicaError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ReplicaError> for StoreError {
    fn from(e: ReplicaError) -> Self {
        match e {
            ReplicaError::Store(inner) => inner,
        }
    }
}

pub type ReplicaResult<T> = Result<T, ReplicaError>;
