use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use dsm_link::{LinkResult, PeerLink};
use dsm_store::{
    InMemoryObjectStore, ObjectAccess, ObjectHandle, ObjectStore, StoreError, StoreResult,
};
use dsm_types::ObjectInfo;

use crate::error::ReplicaResult;
use crate::stats::{DeliveryCounters, DeliveryStats};

/// Front door for object operations on one node.
///
/// Owns the local store and one [`PeerLink`] per other node. Cloning is
/// cheap and clones share everything.
#[derive(Clone)]
pub struct ReplicationManager {
    inner: Arc<Inner>,
}

struct Inner {
    store: Arc<InMemoryObjectStore>,
    peers: Vec<Arc<dyn PeerLink>>,
    stats: DeliveryCounters,
}

impl ReplicationManager {
    pub fn new(store: Arc<InMemoryObjectStore>, peers: Vec<Arc<dyn PeerLink>>) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                peers,
                stats: DeliveryCounters::default(),
            }),
        }
    }

    /// The node-local store. The request listener applies peer requests
    /// here directly, without re-broadcasting them.
    pub fn local_store(&self) -> &Arc<InMemoryObjectStore> {
        &self.inner.store
    }

    pub fn peer_count(&self) -> usize {
        self.inner.peers.len()
    }

    pub fn stats(&self) -> DeliveryStats {
        self.inner.stats.snapshot()
    }

    fn handle(&self, name: &str) -> ObjectHandle {
        ObjectHandle::new(name, Arc::new(self.clone()) as Arc<dyn ObjectAccess>)
    }

    /// Handle to an object that already exists on this node.
    pub fn open(&self, name: &str) -> ReplicaResult<ObjectHandle> {
        if !self.inner.store.contains(name) {
            return Err(StoreError::NotFound { name: name.to_string() }.into());
        }
        Ok(self.handle(name))
    }

    /// Load-or-create. A newly created object is announced to every peer;
    /// an existing one is returned as is, whatever its size.
    pub async fn ensure(&self, name: &str, size: usize) -> ReplicaResult<ObjectHandle> {
        if self.inner.store.ensure(name, size)? {
            self.broadcast("create", name, |link| async move {
                match link.create_object(name, size).await {
                    Err(e) if e.is_already_exists() => Ok(()),
                    other => other,
                }
            })
            .await;
        }
        Ok(self.handle(name))
    }

    /// Delete locally, then on every peer.
    pub async fn remove(&self, name: &str) -> ReplicaResult<()> {
        self.inner.store.delete(name)?;
        self.broadcast("delete", name, |link| link.delete_object(name))
            .await;
        Ok(())
    }

    /// Read from the local copy only.
    pub fn read(&self, name: &str, offset: usize, length: usize) -> ReplicaResult<Vec<u8>> {
        Ok(ObjectStore::read(self.inner.store.as_ref(), name, offset, length)?)
    }

    /// Write locally, then send the same bytes and offset to every peer.
    pub async fn write(&self, name: &str, offset: usize, data: &[u8]) -> ReplicaResult<()> {
        ObjectStore::write(self.inner.store.as_ref(), name, offset, data)?;
        self.broadcast("write", name, |link| link.write_object(name, offset, data))
            .await;
        Ok(())
    }

    /// Local objects whose name starts with `prefix`, in trailing-index order.
    pub fn find(&self, prefix: &str) -> Vec<ObjectInfo> {
        self.inner.store.find_by_prefix(prefix)
    }

    /// An array of `count` element objects of `elem_size` bytes each.
    ///
    /// If exactly `count` objects named `<prefix>_...` already exist they are
    /// returned in index order. Otherwise a fresh batch named
    /// `<prefix>_<tag>_<i>` is created, with one random hex tag shared by the
    /// whole batch.
    pub async fn ensure_array(
        &self,
        prefix: &str,
        count: usize,
        elem_size: usize,
    ) -> ReplicaResult<Vec<ObjectHandle>> {
        let existing = self.find(&format!("{prefix}_"));
        if existing.len() == count {
            return Ok(existing.iter().map(|info| self.handle(&info.name)).collect());
        }

        let tag = format!("{:08x}", rand::random::<u32>());
        let mut handles = Vec::with_capacity(count);
        for i in 0..count {
            handles.push(self.ensure(&format!("{prefix}_{tag}_{i}"), elem_size).await?);
        }
        tracing::debug!(prefix, count, tag, "array allocated");
        Ok(handles)
    }

    async fn broadcast<'a, F, Fut>(&'a self, operation: &'static str, name: &str, call: F)
    where
        F: Fn(&'a dyn PeerLink) -> Fut,
        Fut: Future<Output = LinkResult<()>>,
    {
        let stats = &self.inner.stats;
        stats.broadcast();
        for link in &self.inner.peers {
            match call(link.as_ref()).await {
                Ok(()) => stats.delivered(),
                Err(e) => {
                    stats.failed();
                    tracing::warn!(
                        peer = %link.peer(),
                        operation,
                        name,
                        error = %e,
                        "peer delivery failed"
                    );
                }
            }
        }
    }
}

#[async_trait]
impl ObjectAccess for ReplicationManager {
    async fn read(&self, name: &str, offset: usize, length: usize) -> StoreResult<Vec<u8>> {
        Ok(ReplicationManager::read(self, name, offset, length)?)
    }

    async fn write(&self, name: &str, offset: usize, data: &[u8]) -> StoreResult<()> {
        Ok(ReplicationManager::write(self, name, offset, data).await?)
    }

    async fn size(&self, name: &str) -> StoreResult<usize> {
        self.inner.store.size_of(name)
    }
}

impl std::fmt::Debug for ReplicationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicationManager")
            .field("store", &self.inner.store)
            .field("peer_count", &self.inner.peers.len())
            .finish()
    }
}
