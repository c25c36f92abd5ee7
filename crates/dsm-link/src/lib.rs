//! Outbound links for the DSM cluster.
//!
//! A node talks to two kinds of remote party:
//!
//! - [`PeerLink`] -- another node's request listener. Used by the
//!   replication layer to broadcast create, delete and write. Calls are made
//!   once; failures are reported to the caller, never retried here.
//! - [`ParamClient`] -- the parameter server. Used by the mutex layer.
//!   Transport failures are retried under a [`RetryPolicy`] until the call
//!   succeeds or the policy's timeout elapses.
//!
//! Both come in an HTTP flavour (the real cluster) and a loopback flavour
//! that calls an in-process store directly, for tests and single-process
//! simulations.

pub mod error;
pub mod http;
pub mod memory;
pub mod param;
pub mod peer;
pub mod retry;

pub use error::{LinkError, LinkResult};
pub use http::{build_http_client, HttpParamClient, HttpPeerLink};
pub use memory::{LoopbackParamClient, LoopbackPeerLink};
pub use param::ParamClient;
pub use peer::PeerLink;
pub use retry::{Backoff, RetryPolicy};
