use async_trait::async_trait;
use dsm_types::{ObjectInfo, Peer};

use crate::error::LinkResult;

/// Requests one node can make of another node's request listener.
#[async_trait]
pub trait PeerLink: Send + Sync {
    /// The node at the far end.
    fn peer(&self) -> &Peer;

    async fn create_object(&self, name: &str, size: usize) -> LinkResult<()>;

    async fn delete_object(&self, name: &str) -> LinkResult<()>;

    async fn read_object(&self, name: &str, offset: usize, length: usize) -> LinkResult<Vec<u8>>;

    async fn write_object(&self, name: &str, offset: usize, data: &[u8]) -> LinkResult<()>;

    async fn list_objects(&self) -> LinkResult<Vec<ObjectInfo>>;

    /// Succeeds once the listener answers its health check.
    async fn health(&self) -> LinkResult<()>;

    /// Ask the listener to shut down.
    async fn stop(&self) -> LinkResult<()>;
}
