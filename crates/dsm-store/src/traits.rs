use async_trait::async_trait;
use dsm_types::ObjectInfo;

use crate::error::StoreResult;
use crate::names::sort_by_index;

/// Node-local store of named byte buffers.
///
/// All implementations must satisfy these invariants:
/// - Names are unique; `create` on an existing name fails with
///   `AlreadyExists` and leaves the existing object untouched.
/// - `write` past the current end grows the buffer; unwritten bytes read
///   back as zero.
/// - `read` past the current end fails with `OutOfRange`.
/// - Every operation is atomic with respect to the others.
pub trait ObjectStore: Send + Sync {
    /// Allocate a zero-filled object of `size` bytes.
    fn create(&self, name: &str, size: usize) -> StoreResult<()>;

    /// Allocate the object unless it already exists. Returns `true` if this
    /// call created it.
    fn ensure(&self, name: &str, size: usize) -> StoreResult<bool>;

    /// Remove an object.
    fn delete(&self, name: &str) -> StoreResult<()>;

    /// Copy `length` bytes starting at `offset`.
    fn read(&self, name: &str, offset: usize, length: usize) -> StoreResult<Vec<u8>>;

    /// Overwrite bytes starting at `offset`, extending the object if needed.
    fn write(&self, name: &str, offset: usize, data: &[u8]) -> StoreResult<()>;

    /// Current size of an object in bytes.
    fn size_of(&self, name: &str) -> StoreResult<usize>;

    /// Whether an object with this name exists.
    fn contains(&self, name: &str) -> bool;

    /// Every object, sorted by name.
    fn list(&self) -> Vec<ObjectInfo>;

    /// Objects whose name starts with `prefix`, ordered by their trailing
    /// numeric index.
    fn find_by_prefix(&self, prefix: &str) -> Vec<ObjectInfo> {
        let mut found: Vec<ObjectInfo> = self
            .list()
            .into_iter()
            .filter(|info| info.name.starts_with(prefix))
            .collect();
        sort_by_index(&mut found);
        found
    }
}

/// Narrow capability over named objects: read and write, nothing else.
///
/// Handles hold one of these instead of the full store, so a handle can
/// never create or delete objects. The local store implements it directly;
/// the replication layer implements it by replicating each write.
#[async_trait]
pub trait ObjectAccess: Send + Sync {
    async fn read(&self, name: &str, offset: usize, length: usize) -> StoreResult<Vec<u8>>;

    async fn write(&self, name: &str, offset: usize, data: &[u8]) -> StoreResult<()>;

    async fn size(&self, name: &str) -> StoreResult<usize>;
}
