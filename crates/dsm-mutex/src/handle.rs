use std::time::Duration;

use crate::coordinator::MutexCoordinator;
use crate::error::MutexResult;

/// A named lock bound to the coordinator of one participant.
#[derive(Clone, Debug)]
pub struct DsmMutex {
    name: String,
    coordinator: MutexCoordinator,
}

impl DsmMutex {
    pub(crate) fn new(name: impl Into<String>, coordinator: MutexCoordinator) -> Self {
        Self {
            name: name.into(),
            coordinator,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn lock(&self) -> MutexResult<()> {
        self.coordinator.lock(&self.name).await
    }

    pub async fn lock_timeout(&self, timeout: Duration) -> MutexResult<()> {
        self.coordinator.lock_timeout(&self.name, timeout).await
    }

    pub async fn try_lock(&self) -> MutexResult<bool> {
        self.coordinator.try_lock(&self.name).await
    }

    pub async fn unlock(&self) -> MutexResult<()> {
        self.coordinator.unlock(&self.name).await
    }

    /// Remove the slot from the parameter server.
    pub async fn delete(self) -> MutexResult<()> {
        self.coordinator.delete(&self.name).await
    }
}
