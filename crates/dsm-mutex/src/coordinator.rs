use std::sync::Arc;
use std::time::{Duration, Instant};

use dsm_link::{ParamClient, RetryPolicy};
use dsm_types::{LockPattern, PeerId};

use crate::error::{MutexError, MutexResult};
use crate::handle::DsmMutex;

/// How a participant tries to take a free slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AcquireMode {
    /// One atomic `compare_and_swap(0 -> pattern)` at the parameter server.
    #[default]
    CompareAndSwap,
    /// Read the slot, and if it is free, write the pattern. Two participants
    /// that both read `0` before either writes will both believe they hold
    /// the lock. Kept only to reproduce that race.
    ReadThenWrite,
}

/// Acquires and releases named locks on behalf of one participant.
///
/// Cloning is cheap; clones share the parameter-server client.
#[derive(Clone)]
pub struct MutexCoordinator {
    id: PeerId,
    params: Arc<dyn ParamClient>,
    mode: AcquireMode,
    wait: RetryPolicy,
}

impl MutexCoordinator {
    /// `wait` paces the polling in [`lock`](Self::lock) and bounds how long
    /// it may take.
    pub fn new(id: PeerId, params: Arc<dyn ParamClient>, wait: RetryPolicy) -> Self {
        Self {
            id,
            params,
            mode: AcquireMode::default(),
            wait,
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: AcquireMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    pub fn mode(&self) -> AcquireMode {
        self.mode
    }

    fn pattern(&self) -> i64 {
        self.id.pattern().value()
    }

    /// Register a lock slot. A slot that already exists is left as is.
    pub async fn create(&self, name: &str) -> MutexResult<()> {
        match self.params.register_param(name).await {
            Ok(()) => {
                tracing::debug!(name, "lock created");
                Ok(())
            }
            Err(e) if e.is_already_exists() => {
                tracing::info!(name, "lock already exists");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Register a lock slot and return a handle to it.
    pub async fn create_mutex(&self, name: &str) -> MutexResult<DsmMutex> {
        self.create(name).await?;
        Ok(self.mutex(name))
    }

    /// Handle to a lock slot, without touching the parameter server.
    pub fn mutex(&self, name: &str) -> DsmMutex {
        DsmMutex::new(name, self.clone())
    }

    pub async fn delete(&self, name: &str) -> MutexResult<()> {
        self.params.deregister_param(name).await?;
        tracing::debug!(name, "lock deleted");
        Ok(())
    }

    /// Make one attempt to take the lock. Returns `false` if another
    /// participant holds it.
    pub async fn try_lock(&self, name: &str) -> MutexResult<bool> {
        let pattern = self.pattern();
        match self.mode {
            AcquireMode::CompareAndSwap => {
                let outcome = self
                    .params
                    .compare_and_swap(self.id, name, LockPattern::FREE, pattern)
                    .await?;
                if outcome.swapped {
                    return Ok(true);
                }
                if outcome.current == pattern {
                    return Err(MutexError::AlreadyHeld { name: name.to_string() });
                }
                Ok(false)
            }
            AcquireMode::ReadThenWrite => {
                let current = self.params.read_param(self.id, name).await?;
                if current == pattern {
                    return Err(MutexError::AlreadyHeld { name: name.to_string() });
                }
                if current != LockPattern::FREE {
                    return Ok(false);
                }
                self.params.write_param(self.id, name, pattern).await?;
                Ok(true)
            }
        }
    }

    /// Wait until the lock is taken, polling with exponential backoff.
    ///
    /// Fails with [`MutexError::Timeout`] once the wait policy's timeout
    /// elapses. Dropping the returned future abandons the wait.
    pub async fn lock(&self, name: &str) -> MutexResult<()> {
        let start = Instant::now();
        let mut backoff = self.wait.backoff();
        let mut attempts = 0u32;

        loop {
            attempts += 1;
            if self.try_lock(name).await? {
                tracing::debug!(name, id = self.id.get(), attempts, "lock acquired");
                return Ok(());
            }

            let mut delay = backoff.next_delay();
            if let Some(timeout) = self.wait.timeout {
                let elapsed = start.elapsed();
                if elapsed >= timeout {
                    tracing::warn!(name, id = self.id.get(), attempts, "lock wait timed out");
                    return Err(MutexError::Timeout {
                        name: name.to_string(),
                        elapsed,
                    });
                }
                delay = delay.min(timeout - elapsed);
            }
            tokio::time::sleep(delay).await;
        }
    }

    /// [`lock`](Self::lock) with an explicit bound on the wait.
    pub async fn lock_timeout(&self, name: &str, timeout: Duration) -> MutexResult<()> {
        let start = Instant::now();
        match tokio::time::timeout(timeout, self.lock(name)).await {
            Ok(result) => result,
            Err(_) => Err(MutexError::Timeout {
                name: name.to_string(),
                elapsed: start.elapsed(),
            }),
        }
    }

    /// Release the lock. Fails with [`MutexError::ProtocolViolation`] if the
    /// slot does not hold this participant's pattern; the slot is then left
    /// untouched.
    pub async fn unlock(&self, name: &str) -> MutexResult<()> {
        let pattern = self.pattern();
        let found = match self.mode {
            AcquireMode::CompareAndSwap => {
                let outcome = self
                    .params
                    .compare_and_swap(self.id, name, pattern, LockPattern::FREE)
                    .await?;
                if outcome.swapped {
                    None
                } else {
                    Some(outcome.current)
                }
            }
            AcquireMode::ReadThenWrite => {
                let current = self.params.read_param(self.id, name).await?;
                if current == pattern {
                    self.params.write_param(self.id, name, LockPattern::FREE).await?;
                    None
                } else {
                    Some(current)
                }
            }
        };

        match found {
            None => {
                tracing::debug!(name, id = self.id.get(), "lock released");
                Ok(())
            }
            Some(found) => {
                let holder = LockPattern::from_slot(found).ok().map(LockPattern::holder);
                tracing::warn!(name, id = self.id.get(), found, ?holder, "unlock of a lock not held");
                Err(MutexError::ProtocolViolation {
                    name: name.to_string(),
                    expected: pattern,
                    found,
                })
            }
        }
    }
}

impl std::fmt::Debug for MutexCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutexCoordinator")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .finish()
    }
}
