//! In-process links that call a store directly instead of going over HTTP.
//!
//! Used to run several simulated peers inside one test process. A loopback
//! peer can be taken offline to exercise the broadcast failure path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dsm_store::{InMemoryObjectStore, ObjectStore, ParamTable};
use dsm_types::{CasOutcome, ObjectInfo, Peer, PeerId};

use crate::error::{LinkError, LinkResult};
use crate::param::ParamClient;
use crate::peer::PeerLink;

/// Link straight into another peer's in-memory store.
pub struct LoopbackPeerLink {
    peer: Peer,
    store: Arc<InMemoryObjectStore>,
    online: AtomicBool,
}

impl LoopbackPeerLink {
    pub fn new(peer: Peer, store: Arc<InMemoryObjectStore>) -> Self {
        Self {
            peer,
            store,
            online: AtomicBool::new(true),
        }
    }

    /// Simulate the peer going down (`false`) or coming back (`true`).
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    pub fn store(&self) -> &Arc<InMemoryObjectStore> {
        &self.store
    }

    fn reachable(&self) -> LinkResult<&InMemoryObjectStore> {
        if self.online.load(Ordering::SeqCst) {
            Ok(&self.store)
        } else {
            Err(LinkError::Transport(format!("{} unreachable", self.peer)))
        }
    }
}

#[async_trait]
impl PeerLink for LoopbackPeerLink {
    fn peer(&self) -> &Peer {
        &self.peer
    }

    async fn create_object(&self, name: &str, size: usize) -> LinkResult<()> {
        Ok(self.reachable()?.create(name, size)?)
    }

    async fn delete_object(&self, name: &str) -> LinkResult<()> {
        Ok(self.reachable()?.delete(name)?)
    }

    async fn read_object(&self, name: &str, offset: usize, length: usize) -> LinkResult<Vec<u8>> {
        Ok(ObjectStore::read(self.reachable()?, name, offset, length)?)
    }

    async fn write_object(&self, name: &str, offset: usize, data: &[u8]) -> LinkResult<()> {
        Ok(ObjectStore::write(self.reachable()?, name, offset, data)?)
    }

    async fn list_objects(&self) -> LinkResult<Vec<ObjectInfo>> {
        Ok(self.reachable()?.list())
    }

    async fn health(&self) -> LinkResult<()> {
        self.reachable().map(|_| ())
    }

    async fn stop(&self) -> LinkResult<()> {
        self.reachable()?;
        self.set_online(false);
        Ok(())
    }
}

/// Parameter-server client over a shared in-process [`ParamTable`].
#[derive(Clone, Debug)]
pub struct LoopbackParamClient {
    table: Arc<ParamTable>,
}

impl LoopbackParamClient {
    pub fn new(table: Arc<ParamTable>) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &Arc<ParamTable> {
        &self.table
    }
}

#[async_trait]
impl ParamClient for LoopbackParamClient {
    async fn register_param(&self, name: &str) -> LinkResult<()> {
        Ok(self.table.register(name)?)
    }

    async fn deregister_param(&self, name: &str) -> LinkResult<()> {
        Ok(self.table.deregister(name)?)
    }

    async fn read_param(&self, _id: PeerId, name: &str) -> LinkResult<i64> {
        Ok(self.table.read(name)?)
    }

    async fn write_param(&self, id: PeerId, name: &str, value: i64) -> LinkResult<()> {
        Ok(self.table.write(name, value, Some(id.get()))?)
    }

    async fn compare_and_swap(
        &self,
        id: PeerId,
        name: &str,
        expected: i64,
        new: i64,
    ) -> LinkResult<CasOutcome> {
        Ok(self.table.compare_and_swap(name, expected, new, Some(id.get()))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dsm_store::StoreError;

    fn peer(id: u32) -> Peer {
        Peer::new("127.0.0.1", 9000 + id as u16, PeerId::new(id).unwrap())
    }

    #[tokio::test]
    async fn loopback_peer_applies_to_store() {
        let store = Arc::new(InMemoryObjectStore::new());
        let link = LoopbackPeerLink::new(peer(2), Arc::clone(&store));

        link.create_object("a", 2).await.unwrap();
        link.write_object("a", 1, b"xyz").await.unwrap();
        assert_eq!(link.read_object("a", 0, 4).await.unwrap(), vec![0, b'x', b'y', b'z']);
        assert_eq!(link.list_objects().await.unwrap(), vec![ObjectInfo::new("a", 4)]);

        let err = link.create_object("a", 2).await.unwrap_err();
        assert!(matches!(err, LinkError::Local(StoreError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn offline_peer_is_transport_error() {
        let link = LoopbackPeerLink::new(peer(3), Arc::new(InMemoryObjectStore::new()));
        link.set_online(false);
        let err = link.create_object("a", 1).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(link.store().is_empty());

        link.set_online(true);
        link.health().await.unwrap();
        link.stop().await.unwrap();
        assert!(link.health().await.is_err());
    }

    #[tokio::test]
    async fn loopback_param_records_writer() {
        let client = LoopbackParamClient::new(Arc::new(ParamTable::new()));
        let id = PeerId::new(4).unwrap();

        client.register_param("m").await.unwrap();
        let outcome = client.compare_and_swap(id, "m", 0, 16).await.unwrap();
        assert!(outcome.swapped);
        assert_eq!(client.read_param(id, "m").await.unwrap(), 16);
        assert_eq!(client.table().entry("m").unwrap().last_writer, Some(4));

        client.deregister_param("m").await.unwrap();
        assert!(matches!(
            client.read_param(id, "m").await,
            Err(LinkError::Local(StoreError::ParamNotFound { .. }))
        ));
    }
}
