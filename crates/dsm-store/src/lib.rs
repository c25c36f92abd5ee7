//! Node-local object storage for the DSM cluster.
//!
//! Each node holds an independent copy of every named object. This crate
//! owns that copy: a map from object name to a growable byte buffer, guarded
//! by one map-wide lock so the request listener and the application thread
//! can both touch it safely.
//!
//! # Components
//!
//! - [`ObjectStore`] -- the store contract (create, delete, read, write, find)
//! - [`InMemoryObjectStore`] -- the `HashMap` + `RwLock` implementation
//! - [`ObjectAccess`] / [`ObjectHandle`] -- a narrow read/write capability
//!   handed to callers instead of access to the whole store
//! - [`ParamTable`] -- named integer slots held by the parameter server
//!
//! # Design Rules
//!
//! 1. Object identity is its name; a second create of the same name fails.
//! 2. A write past the end extends the buffer, zero-filling any gap.
//! 3. A read past the end fails; it never returns partial data.
//! 4. `find_by_prefix` orders results by the trailing `_<n>` index of the name.

pub mod error;
pub mod handle;
pub mod memory;
pub mod names;
pub mod params;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use handle::ObjectHandle;
pub use memory::{InMemoryObjectStore, MAX_OBJECT_SIZE};
pub use names::{index_suffix, sort_by_index};
pub use params::{ParamEntry, ParamTable};
pub use traits::{ObjectAccess, ObjectStore};
