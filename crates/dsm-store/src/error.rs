/// Errors from local object and parameter storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No object with this name exists on this node.
    #[error("object not found: {name}")]
    NotFound { name: String },

    /// An object with this name already exists on this node.
    #[error("object already exists: {name}")]
    AlreadyExists { name: String },

    /// The requested range does not fit inside the object.
    #[error("range {offset}+{length} out of bounds for {name} (size {size})")]
    OutOfRange {
        name: String,
        offset: u64,
        length: u64,
        size: u64,
    },

    /// No parameter slot with this name is registered.
    #[error("parameter not found: {name}")]
    ParamNotFound { name: String },

    /// A parameter slot with this name is already registered.
    #[error("parameter already exists: {name}")]
    ParamAlreadyExists { name: String },
}

impl StoreError {
    pub(crate) fn not_found(name: &str) -> Self {
        Self::NotFound { name: name.to_string() }
    }

    pub(crate) fn param_not_found(name: &str) -> Self {
        Self::ParamNotFound { name: name.to_string() }
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
