//! Distributed mutex for the DSM cluster.
//!
//! Each lock is one integer slot on the parameter server: `0` while free,
//! `1 << id` while held by participant `id`. Acquisition is a single
//! compare-and-swap `0 -> pattern`, so two contenders can never both win.
//! Release is the reverse swap `pattern -> 0`, which doubles as the check
//! that the caller actually held the lock.
//!
//! Locks are not reentrant, and nothing releases a lock whose holder died.

pub mod coordinator;
pub mod error;
pub mod handle;

pub use coordinator::{AcquireMode, MutexCoordinator};
pub use error::{MutexError, MutexResult};
pub use handle::DsmMutex;
