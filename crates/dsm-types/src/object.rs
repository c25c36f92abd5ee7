use serde::{Deserialize, Serialize};

/// Name and current size of one stored object, as reported by `list-objects`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectInfo {
    pub name: String,
    pub size: u64,
}

impl ObjectInfo {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self { name: name.into(), size }
    }
}
