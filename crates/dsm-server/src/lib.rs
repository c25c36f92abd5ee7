//! HTTP services for the DSM cluster.
//!
//! Two axum services share the same shape: a router over shared state, served
//! on a bound TCP listener until a `/stop` request (or the owner) triggers a
//! graceful shutdown.
//!
//! - the request listener, one per node, applying peer requests to the
//!   node's local object store
//! - the parameter server, one per cluster, holding the lock slots
//!
//! [`DsmNode`] wires a listener, the outbound links and the replication and
//! mutex layers together from a [`ClusterConfig`](dsm_types::ClusterConfig).

pub mod api;
pub mod config;
pub mod error;
pub mod listener;
pub mod node;
pub mod param_server;
pub mod server;
pub mod shutdown;

pub use api::ApiError;
pub use config::{NodeOptions, ParamServerConfig};
pub use error::{ServerError, ServerResult};
pub use listener::{listener_router, RequestListener};
pub use node::DsmNode;
pub use param_server::{param_router, ParamServer};
pub use server::RunningServer;
pub use shutdown::Shutdown;
