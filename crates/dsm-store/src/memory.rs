use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use dsm_types::ObjectInfo;

use crate::error::{StoreError, StoreResult};
use crate::handle::ObjectHandle;
use crate::traits::{ObjectAccess, ObjectStore};

/// Largest size an object may grow to, by creation or by write-extension.
pub const MAX_OBJECT_SIZE: usize = 1 << 30;

/// In-memory, HashMap-based object store.
///
/// One `RwLock` guards the whole map: reads share it, every mutation takes
/// it exclusively. Buffers are copied out on read.
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl InMemoryObjectStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(HashMap::new()),
        }
    }

    /// Number of objects currently stored.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store holds no objects.
    pub fn is_empty(&self) -> bool {
        self.objects.read().expect("lock poisoned").is_empty()
    }

    /// Total bytes across all stored objects.
    pub fn total_bytes(&self) -> u64 {
        self.objects
            .read()
            .expect("lock poisoned")
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    /// Create an object and return a local handle to it.
    pub fn create_handle(self: &Arc<Self>, name: &str, size: usize) -> StoreResult<ObjectHandle> {
        self.create(name, size)?;
        Ok(ObjectHandle::new(name, Arc::clone(self) as Arc<dyn ObjectAccess>))
    }
}

impl Default for InMemoryObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

fn check_size(name: &str, offset: usize, length: usize, size: usize) -> StoreResult<usize> {
    match offset.checked_add(length) {
        Some(end) if end <= MAX_OBJECT_SIZE => Ok(end),
        _ => Err(StoreError::OutOfRange {
            name: name.to_string(),
            offset: offset as u64,
            length: length as u64,
            size: size as u64,
        }),
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn create(&self, name: &str, size: usize) -> StoreResult<()> {
        check_size(name, 0, size, 0)?;
        let mut map = self.objects.write().expect("lock poisoned");
        if map.contains_key(name) {
            return Err(StoreError::AlreadyExists { name: name.to_string() });
        }
        map.insert(name.to_string(), vec![0; size]);
        tracing::debug!(name, size, "object created");
        Ok(())
    }

    fn ensure(&self, name: &str, size: usize) -> StoreResult<bool> {
        check_size(name, 0, size, 0)?;
        let mut map = self.objects.write().expect("lock poisoned");
        if map.contains_key(name) {
            return Ok(false);
        }
        map.insert(name.to_string(), vec![0; size]);
        tracing::debug!(name, size, "object created");
        Ok(true)
    }

    fn delete(&self, name: &str) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        map.remove(name).ok_or_else(|| StoreError::not_found(name))?;
        tracing::debug!(name, "object deleted");
        Ok(())
    }

    fn read(&self, name: &str, offset: usize, length: usize) -> StoreResult<Vec<u8>> {
        let map = self.objects.read().expect("lock poisoned");
        let data = map.get(name).ok_or_else(|| StoreError::not_found(name))?;
        let end = check_size(name, offset, length, data.len())?;
        if end > data.len() {
            return Err(StoreError::OutOfRange {
                name: name.to_string(),
                offset: offset as u64,
                length: length as u64,
                size: data.len() as u64,
            });
        }
        Ok(data[offset..end].to_vec())
    }

    fn write(&self, name: &str, offset: usize, bytes: &[u8]) -> StoreResult<()> {
        let mut map = self.objects.write().expect("lock poisoned");
        let data = map.get_mut(name).ok_or_else(|| StoreError::not_found(name))?;
        let end = check_size(name, offset, bytes.len(), data.len())?;
        if end > data.len() {
            data.resize(end, 0);
        }
        data[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    fn size_of(&self, name: &str) -> StoreResult<usize> {
        let map = self.objects.read().expect("lock poisoned");
        map.get(name)
            .map(Vec::len)
            .ok_or_else(|| StoreError::not_found(name))
    }

    fn contains(&self, name: &str) -> bool {
        self.objects.read().expect("lock poisoned").contains_key(name)
    }

    fn list(&self) -> Vec<ObjectInfo> {
        let map = self.objects.read().expect("lock poisoned");
        let mut infos: Vec<ObjectInfo> = map
            .iter()
            .map(|(name, data)| ObjectInfo::new(name.clone(), data.len() as u64))
            .collect();
        infos.sort();
        infos
    }
}

#[async_trait]
impl ObjectAccess for InMemoryObjectStore {
    async fn read(&self, name: &str, offset: usize, length: usize) -> StoreResult<Vec<u8>> {
        ObjectStore::read(self, name, offset, length)
    }

    async fn write(&self, name: &str, offset: usize, data: &[u8]) -> StoreResult<()> {
        ObjectStore::write(self, name, offset, data)
    }

    async fn size(&self, name: &str) -> StoreResult<usize> {
        self.size_of(name)
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("object_count", &self.len())
            .finish()
    }
}
