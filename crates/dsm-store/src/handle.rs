use std::fmt;
use std::sync::Arc;

use crate::error::StoreResult;
use crate::traits::ObjectAccess;

/// A named object plus the capability to read and write it.
///
/// Cloning a handle is cheap; clones share the same access path. Whether a
/// write stays local or is replicated to every peer depends on the
/// [`ObjectAccess`] the handle was built with.
#[derive(Clone)]
pub struct ObjectHandle {
    name: String,
    access: Arc<dyn ObjectAccess>,
}

impl ObjectHandle {
    pub fn new(name: impl Into<String>, access: Arc<dyn ObjectAccess>) -> Self {
        Self {
            name: name.into(),
            access,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub async fn read(&self, offset: usize, length: usize) -> StoreResult<Vec<u8>> {
        self.access.read(&self.name, offset, length).await
    }

    /// Read the whole object.
    pub async fn read_all(&self) -> StoreResult<Vec<u8>> {
        let size = self.size().await?;
        self.read(0, size).await
    }

    pub async fn write(&self, offset: usize, data: &[u8]) -> StoreResult<()> {
        self.access.write(&self.name, offset, data).await
    }

    pub async fn size(&self) -> StoreResult<usize> {
        self.access.size(&self.name).await
    }
}

impl fmt::Debug for ObjectHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHandle").field("name", &self.name).finish()
    }
}
