//! Replication of named objects across the DSM cluster.
//!
//! Every mutation is applied to the local store first and then sent, with
//! its full payload, to every peer. Peer failures are logged and counted but
//! never rolled back, so a peer that misses a broadcast silently diverges
//! until the next write that covers the same bytes. Reads never leave the
//! node.

pub mod error;
pub mod manager;
pub mod stats;

pub use error::{ReplicaError, ReplicaResult};
pub use manager::ReplicationManager;
pub use stats::DeliveryStats;
