//! Foundation types for the DSM cluster.
//!
//! Every other DSM crate depends on `dsm-types`. It carries the identities
//! that are static for the lifetime of a process: who this node is, who its
//! peers are, and where the parameter server lives.
//!
//! # Key Types
//!
//! - [`PeerId`] -- Ordinal participant identity, the bit position in lock patterns
//! - [`LockPattern`] -- `1 << id`, the value a peer writes into a held lock slot
//! - [`Peer`] -- Address, port and ordinal of one cluster member
//! - [`ObjectInfo`] -- Name and size pair reported by `list-objects`
//! - [`CasOutcome`] -- Answer of a parameter-server compare-and-swap
//! - [`ClusterConfig`] -- JSON cluster description, loaded once at startup

pub mod config;
pub mod error;
pub mod identity;
pub mod object;
pub mod param;

pub use config::{ClusterConfig, Endpoint, RetrySettings};
pub use error::{ConfigError, TypeError};
pub use identity::{LockPattern, Peer, PeerId, MAX_PEER_ID};
pub use object::ObjectInfo;
pub use param::CasOutcome;
